use std::fmt;

use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Position of a chunk on the infinite chunk grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ChunkCoordinate {
    pub cx: i32,
    pub cz: i32,
}

impl ChunkCoordinate {
    pub const fn new(cx: i32, cz: i32) -> Self {
        Self { cx, cz }
    }

    /// Chunk containing a world position. Only the x and z axes matter.
    pub fn from_world(position: Vec3, chunk_size: i32) -> Self {
        let size = chunk_size as f32;
        Self {
            cx: (position.x / size).floor() as i32,
            cz: (position.z / size).floor() as i32,
        }
    }

    /// World-space corner of this chunk (y is always 0).
    pub fn world_origin(self, chunk_size: i32) -> Vec3 {
        let size = chunk_size as f32;
        Vec3::new(self.cx as f32 * size, 0.0, self.cz as f32 * size)
    }

    /// Chessboard distance, saturating at `i32::MAX` for cells at opposite ends of the grid.
    pub fn chebyshev(self, other: ChunkCoordinate) -> i32 {
        let dx = (i64::from(self.cx) - i64::from(other.cx)).abs();
        let dz = (i64::from(self.cz) - i64::from(other.cz)).abs();
        i32::try_from(dx.max(dz)).unwrap_or(i32::MAX)
    }

    pub fn within(self, center: ChunkCoordinate, radius: i32) -> bool {
        self.chebyshev(center) <= radius
    }

    /// Every coordinate within `radius` of `self`, x-major, `(2r+1)²` items.
    /// Cells past the edge of the `i32` grid are skipped.
    pub fn square_around(self, radius: i32) -> impl Iterator<Item = ChunkCoordinate> {
        let xs = self.cx.saturating_sub(radius)..=self.cx.saturating_add(radius);
        let zs = self.cz.saturating_sub(radius)..=self.cz.saturating_add(radius);
        xs.flat_map(move |cx| zs.clone().map(move |cz| ChunkCoordinate::new(cx, cz)))
    }
}

impl fmt::Display for ChunkCoordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.cx, self.cz)
    }
}

impl From<(i32, i32)> for ChunkCoordinate {
    fn from((cx, cz): (i32, i32)) -> Self {
        Self::new(cx, cz)
    }
}

/// Observer's continuous position together with the chunk cell it falls in.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ObserverFrame {
    pub position: Vec3,
    pub chunk: ChunkCoordinate,
}

impl ObserverFrame {
    pub fn new(position: Vec3, chunk_size: i32) -> Self {
        Self {
            position,
            chunk: ChunkCoordinate::from_world(position, chunk_size),
        }
    }

    pub fn same_cell(&self, other: &ObserverFrame) -> bool {
        self.chunk == other.chunk
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn floor_division_handles_negative_positions() {
        assert_eq!(
            ChunkCoordinate::from_world(Vec3::new(-0.5, 3.0, 9.99), 10),
            ChunkCoordinate::new(-1, 0)
        );
        assert_eq!(
            ChunkCoordinate::from_world(Vec3::new(-10.0, 0.0, -10.01), 10),
            ChunkCoordinate::new(-1, -2)
        );
        assert_eq!(
            ChunkCoordinate::from_world(Vec3::new(12.0, 0.0, 0.0), 10),
            ChunkCoordinate::new(1, 0)
        );
    }

    #[test]
    fn square_around_covers_the_chebyshev_ball() {
        let center = ChunkCoordinate::new(3, -2);
        let cells: Vec<_> = center.square_around(2).collect();
        assert_eq!(cells.len(), 25);
        assert!(cells.iter().all(|c| c.chebyshev(center) <= 2));

        let zero: Vec<_> = center.square_around(0).collect();
        assert_eq!(zero, vec![center]);
    }

    #[test]
    fn observer_frames_in_one_cell_compare_equal() {
        let a = ObserverFrame::new(Vec3::new(1.0, 5.0, 1.0), 10);
        let b = ObserverFrame::new(Vec3::new(9.5, -3.0, 0.2), 10);
        let c = ObserverFrame::new(Vec3::new(10.0, 0.0, 0.0), 10);
        assert!(a.same_cell(&b));
        assert!(!a.same_cell(&c));
    }

    #[test]
    fn world_origin_scales_by_chunk_size() {
        let origin = ChunkCoordinate::new(-2, 3).world_origin(16);
        assert_eq!(origin, Vec3::new(-32.0, 0.0, 48.0));
    }

    #[test]
    fn far_coordinates_do_not_overflow() {
        let far = ChunkCoordinate::from_world(Vec3::new(3.0e9, 0.0, 0.0), 10);
        assert_eq!(far, ChunkCoordinate::new(300_000_000, 0));
        assert_eq!(far.world_origin(10), Vec3::new(3.0e9, 0.0, 0.0));

        let edge = ChunkCoordinate::new(i32::MAX, i32::MIN);
        let cells: Vec<_> = edge.square_around(1).collect();
        assert_eq!(cells.len(), 4);
        assert!(cells.iter().all(|c| c.within(edge, 1)));

        let opposite = ChunkCoordinate::new(i32::MIN, i32::MAX);
        assert_eq!(edge.chebyshev(opposite), i32::MAX);
    }
}
