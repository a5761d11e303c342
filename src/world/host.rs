//! Seams between the streamer and the application that embeds it.

use glam::Vec3;
use parking_lot::RwLock;
use std::sync::Arc;

use crate::core::{ChunkCoordinate, Heightfield};
use crate::error::HostError;

/// Rendering/physics side that materializes chunks.
///
/// Calls arrive from worker threads during a recompute, one call per
/// coordinate, so implementations must be `Sync`. Handles are stored by the
/// streamer keyed by coordinate and passed back verbatim on eviction.
pub trait WorldHost: Sync {
    type Handle: Send;

    /// Create the representation for `coord` at `coord * chunk_size`.
    fn instantiate(
        &self,
        coord: ChunkCoordinate,
        heightfield: &Heightfield,
    ) -> Result<Self::Handle, HostError>;

    /// Tear down a representation previously returned by `instantiate`.
    fn destroy(&self, handle: Self::Handle);
}

/// Source of the observer's world position, sampled once per tick.
pub trait PositionProvider {
    fn position(&self) -> Vec3;
}

impl<F> PositionProvider for F
where
    F: Fn() -> Vec3,
{
    fn position(&self) -> Vec3 {
        self()
    }
}

/// Position shared with another owner (e.g. a player controller) that
/// writes it between ticks.
#[derive(Debug, Clone, Default)]
pub struct SharedPosition(Arc<RwLock<Vec3>>);

impl SharedPosition {
    pub fn new(position: Vec3) -> Self {
        Self(Arc::new(RwLock::new(position)))
    }

    pub fn set(&self, position: Vec3) {
        *self.0.write() = position;
    }
}

impl PositionProvider for SharedPosition {
    fn position(&self) -> Vec3 {
        *self.0.read()
    }
}
