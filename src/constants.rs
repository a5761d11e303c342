// World constants
pub const CHUNK_SIZE: i32 = 10;
pub const VIEW_DISTANCE: i32 = 5;

// Terrain constants
pub const TERRAIN_HEIGHT: f32 = 10.0;
pub const NOISE_SCALE: f32 = 20.0;
pub const NOISE_OCTAVES: i32 = 4;
pub const NOISE_PERSISTENCE: f32 = 0.5;
pub const NOISE_LACUNARITY: f32 = 2.0;
pub const SEED_OFFSET_RANGE: f32 = 9999.0;
// Noise lattice floors to i32, so sample coordinates stay inside this range
pub const NOISE_COORD_LIMIT: f32 = 1.0e9;
pub const EROSION_ITERATIONS: u32 = 5;
pub const EROSION_STRENGTH: f32 = 0.1;
pub const SMOOTHING_ITERATIONS: u32 = 5;
pub const SMOOTHING_BLEND: f32 = 0.5;
// Interior passes need at least one cell with four neighbours
pub const MIN_FILTER_RESOLUTION: usize = 3;

// Optimization constants
pub const BATCH_SIZE: usize = 64;
pub const MAX_CHUNKS_PER_TICK: usize = 4;
pub const HEIGHTFIELD_POOL_CAPACITY: usize = 64;
