//! Batched parallel evaluation of per-chunk jobs
//!
//! Candidates are split into fixed-size work items and pushed through a
//! crossbeam channel to a set of scoped worker threads. The calling thread
//! drains the queue too, so a batch always completes even if no extra
//! worker could be spawned. Every call blocks until all items are done.

use std::thread;

use crossbeam_channel::{Receiver, Sender, bounded, unbounded};

use crate::constants::BATCH_SIZE;

pub struct WorkerPool {
    worker_count: usize,
    batch_size: usize,
}

impl WorkerPool {
    /// Pool sized to the available cores with the default batch granularity.
    pub fn new() -> Self {
        Self::with_worker_count(0, BATCH_SIZE)
    }

    /// A `worker_count` of 0 means one worker per logical core.
    pub fn with_worker_count(worker_count: usize, batch_size: usize) -> Self {
        let worker_count = if worker_count > 0 {
            worker_count
        } else {
            num_cpus::get()
        };
        WorkerPool {
            worker_count: worker_count.max(1),
            batch_size: batch_size.max(1),
        }
    }

    pub fn worker_count(&self) -> usize {
        self.worker_count
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Apply `job` to every item, in parallel, and return the results in
    /// input order.
    pub fn run<T, R, F>(&self, items: &[T], job: F) -> Vec<R>
    where
        T: Sync,
        R: Send,
        F: Fn(&T) -> R + Sync,
    {
        let batch_count = items.len().div_ceil(self.batch_size);
        let workers = self.worker_count.min(batch_count);
        if workers <= 1 {
            return items.iter().map(&job).collect();
        }

        // Every work item is queued up front, so the queue never blocks
        let (work_tx, work_rx) = bounded::<(usize, &[T])>(batch_count);
        let (result_tx, result_rx) = unbounded::<(usize, Vec<R>)>();
        for work_item in items.chunks(self.batch_size).enumerate() {
            if work_tx.send(work_item).is_err() {
                break;
            }
        }
        drop(work_tx);

        thread::scope(|scope| {
            for worker_id in 1..workers {
                let rx = work_rx.clone();
                let tx = result_tx.clone();
                let job = &job;
                let spawned = thread::Builder::new()
                    .name(format!("chunk-batch-{}", worker_id))
                    .spawn_scoped(scope, move || drain(&rx, &tx, job));
                if let Err(err) = spawned {
                    tracing::warn!("Failed to spawn batch worker {}: {}", worker_id, err);
                }
            }
            drain(&work_rx, &result_tx, &job);
        });
        drop(result_tx);

        let mut finished: Vec<(usize, Vec<R>)> = result_rx.iter().collect();
        finished.sort_unstable_by_key(|(index, _)| *index);
        finished.into_iter().flat_map(|(_, results)| results).collect()
    }
}

impl Default for WorkerPool {
    fn default() -> Self {
        Self::new()
    }
}

fn drain<T, R, F>(rx: &Receiver<(usize, &[T])>, tx: &Sender<(usize, Vec<R>)>, job: &F)
where
    F: Fn(&T) -> R,
{
    while let Ok((index, batch)) = rx.recv() {
        let results = batch.iter().map(job).collect();
        if tx.send((index, results)).is_err() {
            // Collector is gone, nothing left to report to
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use rustc_hash::FxHashSet;

    #[test]
    fn results_keep_input_order() {
        let pool = WorkerPool::with_worker_count(4, 3);
        let items: Vec<u32> = (0..100).collect();
        let doubled = pool.run(&items, |x| x * 2);
        assert_eq!(doubled, items.iter().map(|x| x * 2).collect::<Vec<_>>());
    }

    #[test]
    fn work_is_spread_across_threads() {
        let pool = WorkerPool::with_worker_count(4, 1);
        let seen = Mutex::new(FxHashSet::default());
        let items: Vec<u32> = (0..64).collect();
        pool.run(&items, |_| {
            seen.lock().insert(thread::current().id());
            thread::sleep(std::time::Duration::from_millis(2));
        });
        assert!(seen.lock().len() > 1);
    }

    #[test]
    fn empty_and_single_batch_run_inline() {
        let pool = WorkerPool::with_worker_count(8, 64);
        let empty: Vec<u8> = Vec::new();
        assert!(pool.run(&empty, |x| *x).is_empty());

        let caller = thread::current().id();
        let items = [1, 2, 3];
        let threads = pool.run(&items, |_| thread::current().id());
        assert!(threads.iter().all(|id| *id == caller));
    }

    #[test]
    fn zero_workers_means_all_cores() {
        let pool = WorkerPool::with_worker_count(0, 0);
        assert_eq!(pool.worker_count(), num_cpus::get().max(1));
        assert_eq!(pool.batch_size(), 1);
    }
}
