use crate::core::heightfield::Heightfield;

/// Lifecycle of a chunk coordinate inside the streamer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChunkState {
    /// Scheduled for load; nothing materialized on the host yet.
    Pending,
    /// Host representation exists and the handle is stored in the entry.
    Active,
    /// Handle has been handed to the host for destruction.
    Unloading,
}

/// Per-coordinate record: state plus the host handle and terrain data it owns.
#[derive(Debug)]
pub struct ChunkEntry<H> {
    state: ChunkState,
    handle: Option<H>,
    heightfield: Option<Heightfield>,
}

impl<H> ChunkEntry<H> {
    pub fn pending() -> Self {
        Self {
            state: ChunkState::Pending,
            handle: None,
            heightfield: None,
        }
    }

    pub fn state(&self) -> ChunkState {
        self.state
    }

    pub fn is_active(&self) -> bool {
        self.state == ChunkState::Active
    }

    pub fn handle(&self) -> Option<&H> {
        self.handle.as_ref()
    }

    pub fn heightfield(&self) -> Option<&Heightfield> {
        self.heightfield.as_ref()
    }

    /// Pending -> Active.
    pub fn activate(&mut self, handle: H, heightfield: Heightfield) {
        debug_assert_eq!(self.state, ChunkState::Pending);
        self.state = ChunkState::Active;
        self.handle = Some(handle);
        self.heightfield = Some(heightfield);
    }

    /// Active -> Unloading, surrendering the handle and heightfield.
    pub fn begin_unload(&mut self) -> Option<(H, Option<Heightfield>)> {
        if self.state != ChunkState::Active {
            return None;
        }
        self.state = ChunkState::Unloading;
        let heightfield = self.heightfield.take();
        self.handle.take().map(|handle| (handle, heightfield))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entry_walks_pending_active_unloading() {
        let mut entry: ChunkEntry<u32> = ChunkEntry::pending();
        assert_eq!(entry.state(), ChunkState::Pending);
        assert!(entry.begin_unload().is_none());

        entry.activate(7, Heightfield::new(3));
        assert!(entry.is_active());
        assert_eq!(entry.handle(), Some(&7));

        let (handle, heightfield) = entry.begin_unload().unwrap();
        assert_eq!(handle, 7);
        assert_eq!(heightfield.map(|h| h.resolution()), Some(3));
        assert_eq!(entry.state(), ChunkState::Unloading);
        assert!(entry.handle().is_none());
        assert!(entry.begin_unload().is_none());
    }
}
