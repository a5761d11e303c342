//! Heightmap synthesis using FastNoiseLite
//!
//! Fractal Perlin summation followed by a clamped diffusion (erosion) pass
//! and a softer smoothing pass. Generation is pure: the same seed and
//! parameters always give the same heightfield, so chunks are regenerated
//! on demand instead of being stored.

use fastnoise_lite::{FastNoiseLite, NoiseType};
use rand::rngs::StdRng;
use rand::{RngExt, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::constants::*;
use crate::core::{ChunkCoordinate, Heightfield};
use crate::error::ConfigError;

/// Parameters of the fractal noise sum.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NoiseParameters {
    pub octaves: i32,
    pub persistence: f32,
    pub lacunarity: f32,
    pub scale: f32,
    pub seed_offset: (f32, f32),
}

impl Default for NoiseParameters {
    fn default() -> Self {
        Self {
            octaves: NOISE_OCTAVES,
            persistence: NOISE_PERSISTENCE,
            lacunarity: NOISE_LACUNARITY,
            scale: NOISE_SCALE,
            seed_offset: (0.0, 0.0),
        }
    }
}

impl NoiseParameters {
    /// Default parameters with a sampling offset rolled once from `seed`.
    pub fn from_seed(seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        Self {
            seed_offset: (
                rng.random_range(0.0..SEED_OFFSET_RANGE),
                rng.random_range(0.0..SEED_OFFSET_RANGE),
            ),
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.octaves < 1 {
            return Err(ConfigError::Octaves(self.octaves));
        }
        if !(0.0..=1.0).contains(&self.persistence) {
            return Err(ConfigError::Persistence(self.persistence));
        }
        if !(self.lacunarity > 0.0 && self.lacunarity.is_finite()) {
            return Err(ConfigError::Lacunarity(self.lacunarity));
        }
        if !(self.scale > 0.0 && self.scale.is_finite()) {
            return Err(ConfigError::Scale(self.scale));
        }
        let (ox, oz) = self.seed_offset;
        if !(ox.is_finite() && oz.is_finite()) {
            return Err(ConfigError::SeedOffset(ox, oz));
        }
        Ok(())
    }
}

/// Parameters of the diffusion erosion pass.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ErosionParameters {
    pub iterations: u32,
    pub strength: f32,
}

impl Default for ErosionParameters {
    fn default() -> Self {
        Self {
            iterations: EROSION_ITERATIONS,
            strength: EROSION_STRENGTH,
        }
    }
}

impl ErosionParameters {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.strength) {
            return Err(ConfigError::ErosionStrength(self.strength));
        }
        Ok(())
    }
}

/// Thread-safe heightmap generator with a pre-configured Perlin source.
///
/// Output is left unnormalized: with several octaves the raw sum can exceed
/// 1.0 and only the erosion pass clamps interior cells into `[0, 1]`.
/// Grids smaller than 3×3 have no interior, so erosion and smoothing are
/// silently skipped for them and the raw noise is returned.
pub struct HeightmapGenerator {
    noise: FastNoiseLite,
    smoothing_iterations: u32,
    pub seed: u64,
}

impl HeightmapGenerator {
    pub fn new(seed: u64) -> Self {
        Self::with_smoothing(seed, SMOOTHING_ITERATIONS)
    }

    pub fn with_smoothing(seed: u64, smoothing_iterations: u32) -> Self {
        HeightmapGenerator {
            noise: Self::create_noise(seed),
            smoothing_iterations,
            seed,
        }
    }

    fn create_noise(seed: u64) -> FastNoiseLite {
        let mut noise = FastNoiseLite::with_seed((seed ^ (seed >> 32)) as i32);
        noise.set_noise_type(Some(NoiseType::Perlin));
        // Coordinates are pre-scaled by the caller
        noise.set_frequency(Some(1.0));
        noise
    }

    pub fn smoothing_iterations(&self) -> u32 {
        self.smoothing_iterations
    }

    /// Generate a standalone `resolution × resolution` heightfield, sampling
    /// cell `x` at `x / resolution`.
    pub fn generate(
        &self,
        resolution: usize,
        noise: &NoiseParameters,
        erosion: &ErosionParameters,
    ) -> Heightfield {
        let mut field = Heightfield::new(resolution);
        self.generate_into(&mut field, (0.0, 0.0), resolution as f32, noise, erosion);
        field
    }

    /// Generate the heightfield for one chunk. Samples are placed in world
    /// cells normalized by `chunk_size`, so neighbouring chunks share their
    /// edge rows exactly.
    pub fn generate_chunk(
        &self,
        coord: ChunkCoordinate,
        chunk_size: i32,
        noise: &NoiseParameters,
        erosion: &ErosionParameters,
    ) -> Heightfield {
        let mut field = Heightfield::new(chunk_size as usize + 1);
        self.generate_chunk_into(&mut field, coord, chunk_size, noise, erosion);
        field
    }

    /// Same as [`generate_chunk`](Self::generate_chunk) but fills a recycled buffer.
    pub fn generate_chunk_into(
        &self,
        field: &mut Heightfield,
        coord: ChunkCoordinate,
        chunk_size: i32,
        noise: &NoiseParameters,
        erosion: &ErosionParameters,
    ) {
        assert!(chunk_size > 0, "chunk size must be positive");
        assert_eq!(field.resolution(), chunk_size as usize + 1);
        let corner = coord.world_origin(chunk_size);
        let origin = (corner.x, corner.z);
        self.generate_into(field, origin, chunk_size as f32, noise, erosion);
    }

    fn generate_into(
        &self,
        field: &mut Heightfield,
        origin: (f32, f32),
        span: f32,
        noise: &NoiseParameters,
        erosion: &ErosionParameters,
    ) {
        assert!(field.resolution() >= 1, "heightfield resolution must be at least 1");
        assert!(noise.octaves >= 1, "octaves must be at least 1");

        self.fill_fractal(field, origin, span, noise);
        erode(field, erosion);
        smooth(field, self.smoothing_iterations);
    }

    fn fill_fractal(
        &self,
        field: &mut Heightfield,
        origin: (f32, f32),
        span: f32,
        noise: &NoiseParameters,
    ) {
        let resolution = field.resolution();
        for x in 0..resolution {
            for z in 0..resolution {
                let u = (origin.0 + x as f32) / span;
                let v = (origin.1 + z as f32) / span;
                field.set(x, z, self.fractal_height(u, v, noise));
            }
        }
    }

    /// Raw octave sum at normalized coordinates `(u, v)`.
    pub fn fractal_height(&self, u: f32, v: f32, params: &NoiseParameters) -> f32 {
        let mut amplitude = 1.0;
        let mut frequency = 1.0;
        let mut height = 0.0;

        for _ in 0..params.octaves {
            let sx = u * params.scale * frequency + params.seed_offset.0;
            let sz = v * params.scale * frequency + params.seed_offset.1;
            height += self.sample(sx, sz) * amplitude;

            amplitude *= params.persistence;
            frequency *= params.lacunarity;
        }

        height
    }

    // Perlin remapped from -1..1 to 0..1
    #[inline]
    fn sample(&self, x: f32, z: f32) -> f32 {
        let x = x.clamp(-NOISE_COORD_LIMIT, NOISE_COORD_LIMIT);
        let z = z.clamp(-NOISE_COORD_LIMIT, NOISE_COORD_LIMIT);
        (self.noise.get_noise_2d(x, z) + 1.0) * 0.5
    }
}

/// Run the clamped diffusion pass `iterations` times.
pub fn erode(field: &mut Heightfield, erosion: &ErosionParameters) {
    for _ in 0..erosion.iterations {
        erode_step(field, erosion.strength);
    }
}

/// One in-place erosion sweep over interior cells, clamped to `[0, 1]`.
pub fn erode_step(field: &mut Heightfield, strength: f32) {
    let resolution = field.resolution();
    if resolution < MIN_FILTER_RESOLUTION {
        return;
    }

    for x in 1..resolution - 1 {
        for z in 1..resolution - 1 {
            let current = field.get(x, z);
            let delta = field.neighbour_average(x, z) - current;
            field.set(x, z, (current + delta * strength).clamp(0.0, 1.0));
        }
    }
}

/// Run the unclamped half-step blend toward the neighbour mean `iterations` times.
pub fn smooth(field: &mut Heightfield, iterations: u32) {
    for _ in 0..iterations {
        smooth_step(field);
    }
}

pub fn smooth_step(field: &mut Heightfield) {
    let resolution = field.resolution();
    if resolution < MIN_FILTER_RESOLUTION {
        return;
    }

    for x in 1..resolution - 1 {
        for z in 1..resolution - 1 {
            let current = field.get(x, z);
            let average = field.neighbour_average(x, z);
            field.set(x, z, current + (average - current) * SMOOTHING_BLEND);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> (NoiseParameters, ErosionParameters) {
        (NoiseParameters::from_seed(42), ErosionParameters::default())
    }

    #[test]
    fn generation_is_deterministic() {
        let (noise, erosion) = params();
        let a = HeightmapGenerator::new(42).generate(33, &noise, &erosion);
        let b = HeightmapGenerator::new(42).generate(33, &noise, &erosion);
        assert_eq!(a, b);
    }

    #[test]
    fn seed_offset_is_rolled_once_per_seed() {
        let a = NoiseParameters::from_seed(7);
        let b = NoiseParameters::from_seed(7);
        let c = NoiseParameters::from_seed(8);
        assert_eq!(a.seed_offset, b.seed_offset);
        assert_ne!(a.seed_offset, c.seed_offset);
        assert!((0.0..SEED_OFFSET_RANGE).contains(&a.seed_offset.0));
        assert!((0.0..SEED_OFFSET_RANGE).contains(&a.seed_offset.1));
    }

    #[test]
    fn post_passes_never_touch_the_border() {
        let (noise, _) = params();
        let heavy = ErosionParameters {
            iterations: 20,
            strength: 1.0,
        };
        let raw = HeightmapGenerator::with_smoothing(42, 0).generate(
            17,
            &noise,
            &ErosionParameters {
                iterations: 0,
                strength: 0.0,
            },
        );
        let processed = HeightmapGenerator::new(42).generate(17, &noise, &heavy);

        let mut interior_changed = false;
        for x in 0..17 {
            for z in 0..17 {
                if raw.is_border(x, z) {
                    assert_eq!(raw.get(x, z), processed.get(x, z), "border ({x}, {z})");
                } else if raw.get(x, z) != processed.get(x, z) {
                    interior_changed = true;
                }
            }
        }
        assert!(interior_changed);
    }

    #[test]
    fn erosion_clamps_interior_to_unit_range() {
        let mut field = Heightfield::new(5);
        for x in 0..5 {
            for z in 0..5 {
                field.set(x, z, if (x + z) % 2 == 0 { 4.0 } else { -3.0 });
            }
        }

        for _ in 0..3 {
            erode_step(&mut field, 0.9);
            for x in 1..4 {
                for z in 1..4 {
                    let h = field.get(x, z);
                    assert!((0.0..=1.0).contains(&h), "({x}, {z}) = {h}");
                }
            }
        }
        assert_eq!(field.get(0, 0), 4.0);
        assert_eq!(field.get(4, 1), -3.0);
    }

    #[test]
    fn smoothing_flattens_a_spike_without_clamping() {
        let mut field = Heightfield::new(5);
        field.set(2, 2, 8.0);
        smooth_step(&mut field);
        // (1,2) and (2,1) were already blended to 1.0 in this sweep
        assert_eq!(field.get(2, 2), 4.25);
        assert!(field.get(2, 3) > 0.0);
        assert_eq!(field.get(2, 4), 0.0);
    }

    #[test]
    fn single_cell_returns_the_raw_noise_sample() {
        let (noise, erosion) = params();
        let generator = HeightmapGenerator::new(42);
        let field = generator.generate(1, &noise, &erosion);
        assert_eq!(field.samples().len(), 1);
        assert_eq!(field.get(0, 0), generator.fractal_height(0.0, 0.0, &noise));
    }

    #[test]
    fn two_by_two_grid_skips_post_passes() {
        let (noise, erosion) = params();
        let generator = HeightmapGenerator::new(42);
        let field = generator.generate(2, &noise, &erosion);
        for x in 0..2 {
            for z in 0..2 {
                let expected = generator.fractal_height(x as f32 / 2.0, z as f32 / 2.0, &noise);
                assert_eq!(field.get(x, z), expected);
            }
        }
    }

    #[test]
    fn neighbouring_chunks_share_edges() {
        let (noise, erosion) = params();
        let generator = HeightmapGenerator::new(42);
        let west = generator.generate_chunk(ChunkCoordinate::new(0, 0), 10, &noise, &erosion);
        let east = generator.generate_chunk(ChunkCoordinate::new(1, 0), 10, &noise, &erosion);
        assert_eq!(west.resolution(), 11);
        for z in 0..11 {
            assert_eq!(west.get(10, z), east.get(0, z));
        }
    }

    #[test]
    fn single_octave_stays_in_unit_range() {
        let noise = NoiseParameters {
            octaves: 1,
            ..NoiseParameters::from_seed(3)
        };
        let field = HeightmapGenerator::with_smoothing(3, 0).generate(
            9,
            &noise,
            &ErosionParameters {
                iterations: 0,
                strength: 0.0,
            },
        );
        let (lo, hi) = field.min_max();
        assert!(lo >= -1e-3 && hi <= 1.0 + 1e-3, "range {lo}..{hi}");
    }

    #[test]
    fn distant_chunks_generate_finite_heights() {
        let (noise, erosion) = params();
        let generator = HeightmapGenerator::new(5);
        for coord in [
            ChunkCoordinate::new(300_000_000, -300_000_000),
            ChunkCoordinate::new(i32::MIN, i32::MAX),
        ] {
            let field = generator.generate_chunk(coord, 10, &noise, &erosion);
            assert!(field.samples().iter().all(|h| h.is_finite()));
        }
    }

    #[test]
    fn validation_rejects_bad_parameters() {
        let bad_octaves = NoiseParameters {
            octaves: -1,
            ..NoiseParameters::default()
        };
        assert_eq!(bad_octaves.validate(), Err(ConfigError::Octaves(-1)));

        let bad_persistence = NoiseParameters {
            persistence: 1.5,
            ..NoiseParameters::default()
        };
        assert_eq!(
            bad_persistence.validate(),
            Err(ConfigError::Persistence(1.5))
        );

        let bad_scale = NoiseParameters {
            scale: 0.0,
            ..NoiseParameters::default()
        };
        assert_eq!(bad_scale.validate(), Err(ConfigError::Scale(0.0)));

        let bad_strength = ErosionParameters {
            iterations: 1,
            strength: -0.1,
        };
        assert_eq!(
            bad_strength.validate(),
            Err(ConfigError::ErosionStrength(-0.1))
        );
        assert!(NoiseParameters::default().validate().is_ok());
    }

    #[test]
    #[should_panic(expected = "octaves")]
    fn zero_octaves_fail_fast() {
        let noise = NoiseParameters {
            octaves: 0,
            ..NoiseParameters::default()
        };
        HeightmapGenerator::new(1).generate(4, &noise, &ErosionParameters::default());
    }
}
