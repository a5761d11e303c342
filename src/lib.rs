// Core module with fundamental types
pub mod core;

// World module with generation and streaming
pub mod world;

// Settings and persistence helpers
pub mod utils;

// Other modules
pub mod constants;
pub mod error;

// Re-exports
pub use constants::*;
pub use crate::core::{
    ChunkCoordinate, ChunkEntry, ChunkState, Heightfield, HeightfieldPool, ObserverFrame,
};
pub use error::{ConfigError, HostError, SettingsError};
pub use utils::{Settings, StreamingSettings, TerrainSettings};
pub use world::{
    ActiveSetView, ChunkStreamer, ErosionParameters, HeightmapGenerator, NoiseParameters,
    PositionProvider, RecomputeStats, SharedPosition, WorldHost,
};
