//! Terrain generation and chunk streaming modules
//! Contains heightmap synthesis, the host seam and the streaming scheduler.

pub mod bootstrap;
pub mod generator;
pub mod host;
pub mod streamer;
pub mod workers;

// Re-export commonly used types
pub use bootstrap::BootstrapQueue;
pub use generator::{ErosionParameters, HeightmapGenerator, NoiseParameters};
pub use host::{PositionProvider, SharedPosition, WorldHost};
pub use streamer::{ActiveSetView, ChunkStreamer, Decision, RecomputeStats, StreamerCounters};
pub use workers::WorkerPool;
