//! Staged initial fill: the first working set is loaded a few chunks per tick
//! instead of in one blocking batch.

use std::collections::VecDeque;

use crate::core::ChunkCoordinate;

#[derive(Debug)]
pub struct BootstrapQueue {
    queue: VecDeque<ChunkCoordinate>,
    per_tick: usize,
}

impl BootstrapQueue {
    pub fn new(per_tick: usize) -> Self {
        Self {
            queue: VecDeque::new(),
            per_tick: per_tick.max(1),
        }
    }

    /// Queue every chunk within `radius` of `center`, nearest rings first.
    pub fn seed(&mut self, center: ChunkCoordinate, radius: i32) -> usize {
        self.queue.clear();
        let mut coords: Vec<_> = center.square_around(radius).collect();
        // Stable sort keeps x-major order within a ring
        coords.sort_by_key(|c| c.chebyshev(center));
        self.queue.extend(coords);
        self.queue.len()
    }

    /// Pop up to `per_tick` coordinates for this tick.
    pub fn next_batch(&mut self) -> Vec<ChunkCoordinate> {
        let take = self.per_tick.min(self.queue.len());
        self.queue.drain(..take).collect()
    }

    pub fn clear(&mut self) {
        self.queue.clear();
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn per_tick(&self) -> usize {
        self.per_tick
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drains_in_bounded_steps_center_first() {
        let mut queue = BootstrapQueue::new(4);
        let center = ChunkCoordinate::new(2, 2);
        assert_eq!(queue.seed(center, 1), 9);

        let first = queue.next_batch();
        assert_eq!(first.len(), 4);
        assert_eq!(first[0], center);

        assert_eq!(queue.next_batch().len(), 4);
        assert_eq!(queue.next_batch().len(), 1);
        assert!(queue.next_batch().is_empty());
        assert!(queue.is_empty());
    }

    #[test]
    fn reseeding_replaces_the_previous_fill() {
        let mut queue = BootstrapQueue::new(0);
        assert_eq!(queue.per_tick(), 1);
        queue.seed(ChunkCoordinate::new(0, 0), 2);
        queue.seed(ChunkCoordinate::new(5, 5), 0);
        assert_eq!(queue.len(), 1);
        assert_eq!(queue.next_batch(), vec![ChunkCoordinate::new(5, 5)]);
    }
}
