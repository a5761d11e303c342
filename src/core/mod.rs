//! Core data structures for the streamer
//! Contains chunk coordinates, chunk lifecycle state and heightfields.

pub mod chunk;
pub mod coord;
pub mod heightfield;

// Re-export commonly used types
pub use chunk::{ChunkEntry, ChunkState};
pub use coord::{ChunkCoordinate, ObserverFrame};
pub use heightfield::{Heightfield, HeightfieldPool};
