//! Headless terrain streaming demo
//!
//! Walks an observer along a scripted path and streams chunks into a host
//! that only logs what it would build.

use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};

use clap::Parser;
use glam::Vec3;
use parking_lot::Mutex;
use rustc_hash::FxHashMap;

use terrastream::utils::settings::{default_settings_path, load_or_default, save_settings};
use terrastream::{ChunkCoordinate, ChunkStreamer, Heightfield, HostError, SharedPosition, WorldHost};

/// Stream procedurally generated terrain chunks around a moving observer
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// World seed (random when omitted and not set in the settings file)
    #[arg(long)]
    seed: Option<u64>,

    /// Chunk edge length in world units
    #[arg(long)]
    chunk_size: Option<i32>,

    /// Retention radius in chunks
    #[arg(long)]
    view_distance: Option<i32>,

    /// Number of simulation ticks to run
    #[arg(long, default_value_t = 200)]
    steps: u32,

    /// Observer speed in world units per tick
    #[arg(long, default_value_t = 1.5)]
    speed: f32,

    /// Settings file (defaults to the platform config directory)
    #[arg(long)]
    settings: Option<PathBuf>,

    /// Write the effective settings back to the settings file
    #[arg(long, default_value_t = false)]
    save_settings: bool,
}

/// Host that keeps a table of fake handles and logs chunk relief.
struct LoggingHost {
    next_handle: AtomicU64,
    live: Mutex<FxHashMap<u64, ChunkCoordinate>>,
    terrain_height: f32,
}

impl WorldHost for LoggingHost {
    type Handle = u64;

    fn instantiate(
        &self,
        coord: ChunkCoordinate,
        heightfield: &Heightfield,
    ) -> Result<u64, HostError> {
        let handle = self.next_handle.fetch_add(1, Ordering::Relaxed);
        let (lo, hi) = heightfield.min_max();
        tracing::debug!(
            "Instantiate chunk {} as #{} (relief {:.2}..{:.2})",
            coord,
            handle,
            lo * self.terrain_height,
            hi * self.terrain_height
        );
        self.live.lock().insert(handle, coord);
        Ok(handle)
    }

    fn destroy(&self, handle: u64) {
        if let Some(coord) = self.live.lock().remove(&handle) {
            tracing::debug!("Destroy chunk {} (#{})", coord, handle);
        }
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    if let Err(err) = run(args) {
        tracing::error!("{}", err);
        std::process::exit(1);
    }
}

fn run(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    let settings_path = match args.settings {
        Some(path) => path,
        None => default_settings_path()?,
    };
    let mut settings = load_or_default(&settings_path);
    if let Some(seed) = args.seed {
        settings.terrain.seed = Some(seed);
    }
    if let Some(chunk_size) = args.chunk_size {
        settings.streaming.chunk_size = chunk_size;
    }
    if let Some(view_distance) = args.view_distance {
        settings.streaming.view_distance = view_distance;
    }
    // Pin the seed so a saved file reproduces this run
    settings.terrain.seed = Some(settings.terrain.resolve_seed());

    if args.save_settings {
        save_settings(&settings, &settings_path)?;
        tracing::info!("Settings written to {}", settings_path.display());
    }

    let host = LoggingHost {
        next_handle: AtomicU64::new(0),
        live: Mutex::new(FxHashMap::default()),
        terrain_height: settings.terrain.terrain_height,
    };
    let position = SharedPosition::new(Vec3::ZERO);
    let mut streamer = ChunkStreamer::new(&settings, host, position.clone())?;
    streamer.activate();

    // Walk a square loop so cells are left and re-entered
    let mut observer = Vec3::ZERO;
    let directions = [Vec3::X, Vec3::Z, Vec3::NEG_X, Vec3::NEG_Z];
    let leg = settings.streaming.chunk_size as f32 * 3.0;
    for step in 0..args.steps {
        let travelled = step as f32 * args.speed;
        let heading = directions[((travelled / leg) as usize) % directions.len()];
        observer += heading * args.speed;
        position.set(observer);

        let stats = streamer.tick();
        if !stats.is_idle() {
            tracing::info!(
                "Tick {}: observer at {} -> +{} -{} ({} failed), {} active",
                step,
                ChunkCoordinate::from_world(observer, streamer.chunk_size()),
                stats.loaded,
                stats.unloaded,
                stats.failed,
                streamer.active_set().len()
            );
        }
    }

    let counters = streamer.counters();
    tracing::info!(
        "Done: {} recomputes, {} bootstrap steps, {} loads, {} unloads, {} failures",
        counters.recomputes,
        counters.bootstrap_steps,
        counters.loads,
        counters.unloads,
        counters.failures
    );
    streamer.shutdown();
    Ok(())
}
