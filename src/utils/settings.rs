use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

use crate::constants::*;
use crate::error::{ConfigError, SettingsError};
use crate::world::generator::{ErosionParameters, NoiseParameters};

pub const SETTINGS_FILE: &str = "settings.bin";

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct Settings {
    pub terrain: TerrainSettings,
    pub streaming: StreamingSettings,
}

impl Settings {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.streaming.validate()?;
        self.terrain.noise_parameters(0).validate()?;
        self.terrain.erosion_parameters().validate()
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct TerrainSettings {
    /// Drawn once at startup when absent
    pub seed: Option<u64>,
    pub octaves: i32,
    pub persistence: f32,
    pub lacunarity: f32,
    pub scale: f32,
    /// Rolled from the seed when absent
    pub seed_offset: Option<(f32, f32)>,
    pub erosion_iterations: u32,
    pub erosion_strength: f32,
    pub smoothing_iterations: u32,
    /// Vertical scale for hosts. Heights handed out are never multiplied by it.
    pub terrain_height: f32,
}

impl Default for TerrainSettings {
    fn default() -> Self {
        Self {
            seed: None,
            octaves: NOISE_OCTAVES,
            persistence: NOISE_PERSISTENCE,
            lacunarity: NOISE_LACUNARITY,
            scale: NOISE_SCALE,
            seed_offset: None,
            erosion_iterations: EROSION_ITERATIONS,
            erosion_strength: EROSION_STRENGTH,
            smoothing_iterations: SMOOTHING_ITERATIONS,
            terrain_height: TERRAIN_HEIGHT,
        }
    }
}

impl TerrainSettings {
    pub fn resolve_seed(&self) -> u64 {
        self.seed.unwrap_or_else(rand::random)
    }

    pub fn noise_parameters(&self, seed: u64) -> NoiseParameters {
        let rolled = NoiseParameters::from_seed(seed);
        NoiseParameters {
            octaves: self.octaves,
            persistence: self.persistence,
            lacunarity: self.lacunarity,
            scale: self.scale,
            seed_offset: self.seed_offset.unwrap_or(rolled.seed_offset),
        }
    }

    pub fn erosion_parameters(&self) -> ErosionParameters {
        ErosionParameters {
            iterations: self.erosion_iterations,
            strength: self.erosion_strength,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct StreamingSettings {
    pub chunk_size: i32,
    pub view_distance: i32,
    pub worker_count: usize, // 0 = one per core
    pub batch_size: usize,
    pub bootstrap_loads_per_tick: usize,
    pub heightfield_pool_capacity: usize,
}

impl Default for StreamingSettings {
    fn default() -> Self {
        Self {
            chunk_size: CHUNK_SIZE,
            view_distance: VIEW_DISTANCE,
            worker_count: 0,
            batch_size: BATCH_SIZE,
            bootstrap_loads_per_tick: MAX_CHUNKS_PER_TICK,
            heightfield_pool_capacity: HEIGHTFIELD_POOL_CAPACITY,
        }
    }
}

impl StreamingSettings {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.chunk_size <= 0 {
            return Err(ConfigError::ChunkSize(self.chunk_size));
        }
        if self.view_distance < 0 {
            return Err(ConfigError::ViewDistance(self.view_distance));
        }
        if self.batch_size == 0 {
            return Err(ConfigError::BatchSize);
        }
        if self.bootstrap_loads_per_tick == 0 {
            return Err(ConfigError::BootstrapBudget);
        }
        Ok(())
    }

    pub fn resolution(&self) -> usize {
        self.chunk_size as usize + 1
    }
}

pub fn default_settings_path() -> Result<PathBuf, SettingsError> {
    ProjectDirs::from("", "", "terrastream")
        .map(|dirs| dirs.config_dir().join(SETTINGS_FILE))
        .ok_or(SettingsError::NoSettingsDir)
}

pub fn save_settings(settings: &Settings, path: &Path) -> Result<(), SettingsError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let writer = BufWriter::new(File::create(path)?);
    bincode::serialize_into(writer, settings)?;
    Ok(())
}

pub fn load_settings(path: &Path) -> Result<Settings, SettingsError> {
    let reader = BufReader::new(File::open(path)?);
    let settings: Settings = bincode::deserialize_from(reader)?;
    settings.validate()?;
    Ok(settings)
}

/// Load settings from `path`, falling back to defaults when the file is
/// missing or unreadable.
pub fn load_or_default(path: &Path) -> Settings {
    if !path.exists() {
        return Settings::default();
    }
    match load_settings(path) {
        Ok(settings) => settings,
        Err(err) => {
            tracing::warn!("Ignoring settings at {}: {}", path.display(), err);
            Settings::default()
        }
    }
}
