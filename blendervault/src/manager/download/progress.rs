//! Progress aggregation for chunked downloads.
//!
//! Workers account their transferred bytes through shared lock-free
//! counters; concurrent updates from N workers never lose increments.
//! Observers receive [`DownloadEvent`]s over a channel and must tolerate
//! interleaved delivery; the aggregate counter, not event arrival order,
//! is what totals should be read from.

use std::sync::atomic::{AtomicU64, Ordering};

/// Events emitted by a download job on its observer channel.
#[derive(Debug, Clone)]
pub enum DownloadEvent {
    /// The probe finished and transfer is about to begin.
    Started {
        url: String,
        /// Advertised size in bytes; 0 when the server did not say.
        total_size: u64,
        worker_count: usize,
    },
    /// A chunk was written. Emitted at every chunk boundary.
    Progress {
        /// Aggregate bytes transferred across all workers.
        transferred: u64,
        /// Advertised size in bytes; 0 when unknown.
        total_size: u64,
        /// Per-worker transferred bytes, indexed by worker.
        per_worker: Vec<u64>,
    },
}

/// Shared transfer counters for one download job.
#[derive(Debug)]
pub struct ProgressCounters {
    /// Bytes transferred by each worker.
    per_worker: Vec<AtomicU64>,
    /// Aggregate bytes transferred.
    total: AtomicU64,
}

impl ProgressCounters {
    /// Create counters for the given number of workers.
    pub fn new(worker_count: usize) -> Self {
        Self {
            per_worker: (0..worker_count).map(|_| AtomicU64::new(0)).collect(),
            total: AtomicU64::new(0),
        }
    }

    /// Record bytes transferred by one worker; returns the aggregate after
    /// the update.
    pub fn record(&self, worker: usize, bytes: u64) -> u64 {
        if let Some(counter) = self.per_worker.get(worker) {
            counter.fetch_add(bytes, Ordering::SeqCst);
        }
        self.total.fetch_add(bytes, Ordering::SeqCst) + bytes
    }

    /// Aggregate bytes transferred so far.
    pub fn total(&self) -> u64 {
        self.total.load(Ordering::SeqCst)
    }

    /// Point-in-time copy of the per-worker counters.
    pub fn snapshot(&self) -> Vec<u64> {
        self.per_worker
            .iter()
            .map(|counter| counter.load(Ordering::SeqCst))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_counters_start_at_zero() {
        let counters = ProgressCounters::new(3);
        assert_eq!(counters.total(), 0);
        assert_eq!(counters.snapshot(), vec![0, 0, 0]);
    }

    #[test]
    fn test_record_updates_worker_and_aggregate() {
        let counters = ProgressCounters::new(2);

        assert_eq!(counters.record(0, 500), 500);
        assert_eq!(counters.record(1, 300), 800);

        assert_eq!(counters.total(), 800);
        assert_eq!(counters.snapshot(), vec![500, 300]);
    }

    #[test]
    fn test_concurrent_records_lose_nothing() {
        let counters = Arc::new(ProgressCounters::new(4));

        let handles: Vec<_> = (0..4)
            .map(|worker| {
                let counters = Arc::clone(&counters);
                thread::spawn(move || {
                    for _ in 0..1000 {
                        counters.record(worker, 1);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(counters.total(), 4000);
        assert_eq!(counters.snapshot(), vec![1000, 1000, 1000, 1000]);
    }

    #[test]
    fn test_out_of_range_worker_still_counts_aggregate() {
        let counters = ProgressCounters::new(1);
        counters.record(5, 10);
        assert_eq!(counters.total(), 10);
        assert_eq!(counters.snapshot(), vec![0]);
    }
}
