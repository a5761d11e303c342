//! Observer-driven chunk streaming
//!
//! The streamer keeps every chunk within `view_distance` (Chebyshev, in
//! chunk units) of the observer materialized on the world host. Work is only
//! done when the observer crosses into a new chunk cell: the target square
//! is merged into the entry map, every entry is classified in parallel
//! (keep, load, unload or cancel) and the surviving Active set is published
//! in one swap.

use parking_lot::{Mutex, RwLock};
use rustc_hash::{FxHashMap, FxHashSet};
use std::sync::Arc;

use glam::Vec3;

use crate::core::{ChunkCoordinate, ChunkEntry, ChunkState, Heightfield, HeightfieldPool, ObserverFrame};
use crate::error::ConfigError;
use crate::utils::settings::Settings;
use crate::world::bootstrap::BootstrapQueue;
use crate::world::generator::{ErosionParameters, HeightmapGenerator, NoiseParameters};
use crate::world::host::{PositionProvider, WorldHost};
use crate::world::workers::WorkerPool;

/// Outcome of evaluating one entry during a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Keep,
    Loaded,
    Unloaded,
    /// Host refused the chunk; it stays absent until the next recompute.
    Failed,
    /// Pending entry that fell out of range before it was loaded.
    Cancelled,
}

/// Per-batch counts, returned from every recompute or bootstrap step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RecomputeStats {
    pub kept: usize,
    pub loaded: usize,
    pub unloaded: usize,
    pub failed: usize,
    pub cancelled: usize,
}

impl RecomputeStats {
    fn record(&mut self, decision: Decision) {
        match decision {
            Decision::Keep => self.kept += 1,
            Decision::Loaded => self.loaded += 1,
            Decision::Unloaded => self.unloaded += 1,
            Decision::Failed => self.failed += 1,
            Decision::Cancelled => self.cancelled += 1,
        }
    }

    pub fn from_decisions(decisions: &[Decision]) -> Self {
        let mut stats = Self::default();
        for &decision in decisions {
            stats.record(decision);
        }
        stats
    }

    /// True when no host call was made.
    pub fn is_idle(&self) -> bool {
        self.loaded == 0 && self.unloaded == 0 && self.failed == 0
    }
}

/// Lifetime totals for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StreamerCounters {
    pub recomputes: u64,
    pub bootstrap_steps: u64,
    pub loads: u64,
    pub unloads: u64,
    pub failures: u64,
}

impl StreamerCounters {
    fn add(&mut self, stats: &RecomputeStats) {
        self.loads += stats.loaded as u64;
        self.unloads += stats.unloaded as u64;
        self.failures += stats.failed as u64;
    }
}

/// Read handle on the published Active set. It is replaced as a whole after
/// every batch, so readers never observe a half-applied recompute.
#[derive(Debug, Clone, Default)]
pub struct ActiveSetView(Arc<RwLock<FxHashSet<ChunkCoordinate>>>);

impl ActiveSetView {
    pub fn contains(&self, coord: ChunkCoordinate) -> bool {
        self.0.read().contains(&coord)
    }

    pub fn len(&self) -> usize {
        self.0.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.read().is_empty()
    }

    /// Sorted copy of the current set.
    pub fn snapshot(&self) -> Vec<ChunkCoordinate> {
        let mut coords: Vec<_> = self.0.read().iter().copied().collect();
        coords.sort_unstable();
        coords
    }

    fn replace(&self, coords: FxHashSet<ChunkCoordinate>) {
        *self.0.write() = coords;
    }
}

type EntryMap<H> = FxHashMap<ChunkCoordinate, Mutex<ChunkEntry<H>>>;

/// Everything a worker needs to evaluate one entry. Borrowed for one batch.
struct BatchContext<'a, H: WorldHost> {
    host: &'a H,
    generator: &'a HeightmapGenerator,
    pool: &'a HeightfieldPool,
    noise: &'a NoiseParameters,
    erosion: &'a ErosionParameters,
    chunk_size: i32,
    view_distance: i32,
    center: ChunkCoordinate,
}

impl<H: WorldHost> BatchContext<'_, H> {
    fn evaluate(&self, coord: ChunkCoordinate, entry: &Mutex<ChunkEntry<H::Handle>>) -> Decision {
        let mut entry = entry.lock();
        let in_range = coord.within(self.center, self.view_distance);

        match (entry.state(), in_range) {
            (ChunkState::Active, true) => Decision::Keep,
            (ChunkState::Pending, true) => self.load(coord, &mut entry),
            (ChunkState::Active, false) => {
                if let Some((handle, heightfield)) = entry.begin_unload() {
                    self.host.destroy(handle);
                    if let Some(heightfield) = heightfield {
                        self.pool.release(heightfield);
                    }
                }
                Decision::Unloaded
            }
            (ChunkState::Pending, false) => Decision::Cancelled,
            // Already torn down by an earlier pass and awaiting removal
            (ChunkState::Unloading, _) => Decision::Keep,
        }
    }

    fn load(&self, coord: ChunkCoordinate, entry: &mut ChunkEntry<H::Handle>) -> Decision {
        let mut heightfield = self.pool.acquire(self.chunk_size as usize + 1);
        self.generator.generate_chunk_into(
            &mut heightfield,
            coord,
            self.chunk_size,
            self.noise,
            self.erosion,
        );

        match self.host.instantiate(coord, &heightfield) {
            Ok(handle) => {
                entry.activate(handle, heightfield);
                Decision::Loaded
            }
            Err(err) => {
                tracing::warn!("Chunk {} failed to load: {}", coord, err);
                self.pool.release(heightfield);
                Decision::Failed
            }
        }
    }
}

/// Keeps the host's chunk set in step with the observer.
pub struct ChunkStreamer<H: WorldHost, P: PositionProvider> {
    host: H,
    provider: P,
    generator: HeightmapGenerator,
    noise: NoiseParameters,
    erosion: ErosionParameters,
    chunk_size: i32,
    view_distance: i32,
    entries: EntryMap<H::Handle>,
    active: ActiveSetView,
    last_frame: Option<ObserverFrame>,
    bootstrap: BootstrapQueue,
    workers: WorkerPool,
    pool: HeightfieldPool,
    counters: StreamerCounters,
}

impl<H: WorldHost, P: PositionProvider> ChunkStreamer<H, P> {
    /// Validate `settings` and build an idle streamer. Nothing is loaded
    /// until [`activate`](Self::activate) or the first position update.
    pub fn new(settings: &Settings, host: H, provider: P) -> Result<Self, ConfigError> {
        settings.validate()?;

        let seed = settings.terrain.resolve_seed();
        let streaming = &settings.streaming;
        let workers = WorkerPool::with_worker_count(streaming.worker_count, streaming.batch_size);
        tracing::info!(
            "Chunk streamer ready: seed {}, chunk size {}, view distance {}, {} workers",
            seed,
            streaming.chunk_size,
            streaming.view_distance,
            workers.worker_count()
        );

        Ok(ChunkStreamer {
            host,
            provider,
            generator: HeightmapGenerator::with_smoothing(seed, settings.terrain.smoothing_iterations),
            noise: settings.terrain.noise_parameters(seed),
            erosion: settings.terrain.erosion_parameters(),
            chunk_size: streaming.chunk_size,
            view_distance: streaming.view_distance,
            entries: FxHashMap::default(),
            active: ActiveSetView::default(),
            last_frame: None,
            bootstrap: BootstrapQueue::new(streaming.bootstrap_loads_per_tick),
            workers,
            pool: HeightfieldPool::new(streaming.heightfield_pool_capacity),
            counters: StreamerCounters::default(),
        })
    }

    /// Start a staged fill around the provider's current position. The
    /// queued chunks are loaded a bounded number per [`tick`](Self::tick).
    pub fn activate(&mut self) -> usize {
        let frame = ObserverFrame::new(self.provider.position(), self.chunk_size);
        let queued = self.bootstrap.seed(frame.chunk, self.view_distance);
        for coord in frame.chunk.square_around(self.view_distance) {
            self.entries
                .entry(coord)
                .or_insert_with(|| Mutex::new(ChunkEntry::pending()));
        }
        self.last_frame = Some(frame);
        tracing::info!("Bootstrapping {} chunks around {}", queued, frame.chunk);
        queued
    }

    /// Per-tick entry point: sample the provider, recompute on a cell
    /// change, otherwise advance any pending bootstrap.
    pub fn tick(&mut self) -> RecomputeStats {
        let position = self.provider.position();
        match self.on_observer_moved(position) {
            Some(stats) => stats,
            None => self.advance_bootstrap(),
        }
    }

    /// Recompute the working set if `position` lies in a different chunk
    /// than the previous call. Returns `None` when nothing had to be done.
    pub fn on_observer_moved(&mut self, position: Vec3) -> Option<RecomputeStats> {
        let frame = ObserverFrame::new(position, self.chunk_size);
        if let Some(last) = self.last_frame {
            if last.same_cell(&frame) {
                return None;
            }
        }

        let stats = self.recompute(frame.chunk);
        self.last_frame = Some(frame);
        Some(stats)
    }

    fn recompute(&mut self, center: ChunkCoordinate) -> RecomputeStats {
        for coord in center.square_around(self.view_distance) {
            self.entries
                .entry(coord)
                .or_insert_with(|| Mutex::new(ChunkEntry::pending()));
        }

        let candidates: Vec<_> = self
            .entries
            .iter()
            .map(|(coord, entry)| (*coord, entry))
            .collect();
        let context = self.context(center);
        let decisions = self
            .workers
            .run(&candidates, |(coord, entry)| context.evaluate(*coord, entry));
        let stats = RecomputeStats::from_decisions(&decisions);

        // Anything not Active now is either evicted, cancelled or failed
        self.entries.retain(|_, entry| entry.get_mut().is_active());
        self.bootstrap.clear();
        self.publish();

        self.counters.recomputes += 1;
        self.counters.add(&stats);
        tracing::debug!(
            "Recomputed around {}: {} kept, {} loaded, {} unloaded, {} failed, {} cancelled",
            center,
            stats.kept,
            stats.loaded,
            stats.unloaded,
            stats.failed,
            stats.cancelled
        );
        stats
    }

    /// Load the next slice of the bootstrap queue.
    pub fn advance_bootstrap(&mut self) -> RecomputeStats {
        let Some(frame) = self.last_frame else {
            return RecomputeStats::default();
        };
        if self.bootstrap.is_empty() {
            return RecomputeStats::default();
        }

        let coords = self.bootstrap.next_batch();
        let candidates: Vec<_> = coords
            .iter()
            .filter_map(|coord| self.entries.get(coord).map(|entry| (*coord, entry)))
            .collect();
        let context = self.context(frame.chunk);
        let decisions = self
            .workers
            .run(&candidates, |(coord, entry)| context.evaluate(*coord, entry));
        let stats = RecomputeStats::from_decisions(&decisions);

        // Failed loads leave the map so the next recompute retries them
        for coord in &coords {
            let loaded = self
                .entries
                .get_mut(coord)
                .is_some_and(|entry| entry.get_mut().is_active());
            if !loaded {
                self.entries.remove(coord);
            }
        }
        self.publish();

        self.counters.bootstrap_steps += 1;
        self.counters.add(&stats);
        if self.bootstrap.is_empty() {
            tracing::info!("Bootstrap around {} complete", frame.chunk);
        } else {
            tracing::trace!(
                "Bootstrap step loaded {} chunks, {} remaining",
                stats.loaded,
                self.bootstrap.len()
            );
        }
        stats
    }

    fn context(&self, center: ChunkCoordinate) -> BatchContext<'_, H> {
        BatchContext {
            host: &self.host,
            generator: &self.generator,
            pool: &self.pool,
            noise: &self.noise,
            erosion: &self.erosion,
            chunk_size: self.chunk_size,
            view_distance: self.view_distance,
            center,
        }
    }

    fn publish(&mut self) {
        let coords = self
            .entries
            .iter_mut()
            .filter_map(|(coord, entry)| entry.get_mut().is_active().then_some(*coord))
            .collect();
        self.active.replace(coords);
    }

    /// Destroy every materialized chunk and forget all state.
    pub fn shutdown(&mut self) {
        let mut destroyed = 0;
        for (_, entry) in self.entries.drain() {
            if let Some((handle, _)) = entry.into_inner().begin_unload() {
                self.host.destroy(handle);
                destroyed += 1;
            }
        }
        self.bootstrap.clear();
        self.last_frame = None;
        self.counters.unloads += destroyed as u64;
        self.publish();
        tracing::info!("Chunk streamer shut down, {} chunks destroyed", destroyed);
    }

    pub fn active_set(&self) -> ActiveSetView {
        self.active.clone()
    }

    pub fn active_coordinates(&self) -> Vec<ChunkCoordinate> {
        self.active.snapshot()
    }

    pub fn state_of(&self, coord: ChunkCoordinate) -> Option<ChunkState> {
        self.entries.get(&coord).map(|entry| entry.lock().state())
    }

    /// Run `f` against the heightfield owned by an active chunk.
    pub fn with_heightfield<R>(
        &self,
        coord: ChunkCoordinate,
        f: impl FnOnce(&Heightfield) -> R,
    ) -> Option<R> {
        let entry = self.entries.get(&coord)?.lock();
        entry.heightfield().map(f)
    }

    pub fn observer_chunk(&self) -> Option<ChunkCoordinate> {
        self.last_frame.map(|frame| frame.chunk)
    }

    pub fn bootstrap_remaining(&self) -> usize {
        self.bootstrap.len()
    }

    pub fn counters(&self) -> StreamerCounters {
        self.counters
    }

    pub fn chunk_size(&self) -> i32 {
        self.chunk_size
    }

    pub fn view_distance(&self) -> i32 {
        self.view_distance
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn generator(&self) -> &HeightmapGenerator {
        &self.generator
    }
}
