//! Error taxonomy shared by the generator, the streamer and the settings layer.

use thiserror::Error;

use crate::core::ChunkCoordinate;

/// Invalid parameters, rejected at construction before any streaming starts.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigError {
    #[error("chunk size must be positive, got {0}")]
    ChunkSize(i32),
    #[error("view distance must not be negative, got {0}")]
    ViewDistance(i32),
    #[error("octaves must be at least 1, got {0}")]
    Octaves(i32),
    #[error("persistence must lie in [0, 1], got {0}")]
    Persistence(f32),
    #[error("lacunarity must be positive, got {0}")]
    Lacunarity(f32),
    #[error("noise scale must be positive, got {0}")]
    Scale(f32),
    #[error("seed offset must be finite, got ({0}, {1})")]
    SeedOffset(f32, f32),
    #[error("erosion strength must lie in [0, 1], got {0}")]
    ErosionStrength(f32),
    #[error("batch size must be positive")]
    BatchSize,
    #[error("bootstrap loads per tick must be positive")]
    BootstrapBudget,
}

/// Failure reported by a world host while materializing or tearing down a chunk.
#[derive(Debug, Error)]
pub enum HostError {
    #[error("host rejected chunk {coord}: {reason}")]
    Rejected {
        coord: ChunkCoordinate,
        reason: String,
    },
    #[error("host unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("settings i/o failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("settings encoding failed: {0}")]
    Encoding(#[from] bincode::Error),
    #[error("no settings directory available on this platform")]
    NoSettingsDir,
    #[error(transparent)]
    Invalid(#[from] ConfigError),
}
