//! Chunked, concurrent download of release archives.
//!
//! # Architecture
//!
//! ```text
//! ChunkedDownloader
//!         │
//!         ├── RangeTransport (trait) ── HttpTransport (live) / mocks (tests)
//!         │
//!         ├── partition()        [0, total) → disjoint worker ranges
//!         │
//!         ├── ProgressCounters   lock-free per-worker + aggregate bytes
//!         │
//!         └── DownloadEvent      worker → observer channel, per chunk
//! ```
//!
//! The pipeline probes the resource size, preallocates the destination file
//! at full length, then fetches disjoint byte ranges from one worker thread
//! each. Workers write at their own offsets with a moving cursor, so writes
//! never extend the file and never overlap; only the transfer counters are
//! shared. The job succeeds only when the aggregate transferred byte count
//! matches the advertised size exactly.
//!
//! Servers without range support (no `Accept-Ranges`, an unknown size, or a
//! 200 answer to a ranged request) degrade the job to a single worker
//! spanning the whole file.

mod http;
mod partition;
mod progress;

pub use http::HttpTransport;
pub use partition::{partition, ByteRange};
pub use progress::{DownloadEvent, ProgressCounters};

use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::mpsc::Sender;
use std::thread;

use super::error::{ManagerError, ManagerResult};
use super::traits::RangeTransport;

/// A download prepared from a probe: what to fetch, where to, and how wide.
#[derive(Debug, Clone)]
pub struct DownloadJob {
    /// Source URL of the archive.
    pub url: String,
    /// Destination file, exclusively owned by the job for its lifetime.
    pub destination: PathBuf,
    /// Advertised size in bytes; 0 when the server did not say.
    pub total_size: u64,
    /// Number of range workers the job will run.
    pub worker_count: usize,
}

/// Result of a completed download.
#[derive(Debug, Clone)]
pub struct DownloadOutcome {
    /// Advertised size in bytes; equals `transferred` on success when known.
    pub total_size: u64,
    /// Aggregate bytes transferred.
    pub transferred: u64,
    /// Bytes transferred by each worker.
    pub per_worker: Vec<u64>,
    /// Whether the transfer ran range-partitioned or single-stream.
    pub chunked: bool,
}

/// Range-partitioned concurrent downloader.
pub struct ChunkedDownloader<T: RangeTransport> {
    transport: T,
}

impl ChunkedDownloader<HttpTransport> {
    /// Create a downloader over the live HTTP transport.
    pub fn new() -> ManagerResult<Self> {
        Ok(Self::with_transport(HttpTransport::new()?))
    }
}

impl<T: RangeTransport> ChunkedDownloader<T> {
    /// Create a downloader with an explicit transport (used by tests).
    pub fn with_transport(transport: T) -> Self {
        Self { transport }
    }

    /// Download `url` into `destination` with up to `worker_count` range
    /// workers, reporting progress on `events` at every chunk boundary.
    ///
    /// Fails with [`ManagerError::IncompleteDownload`] when the transfer
    /// ends short of the advertised size; the partial file is left on disk
    /// for the caller to inspect or delete. No ranges are retried here;
    /// retry policy belongs to the caller.
    pub fn download(
        &self,
        url: &str,
        destination: &Path,
        worker_count: usize,
        events: &Sender<DownloadEvent>,
    ) -> ManagerResult<DownloadOutcome> {
        let worker_count = worker_count.max(1);
        let probe = self.transport.probe(url)?;

        let total_size = match probe.total_size {
            Some(size) => size,
            None => {
                tracing::debug!("{}: size unknown, using a single stream", url);
                return self.download_single(url, destination, None, events);
            }
        };

        if worker_count == 1 || !probe.accepts_ranges {
            return self.download_single(url, destination, Some(total_size), events);
        }

        let job = DownloadJob {
            url: url.to_string(),
            destination: destination.to_path_buf(),
            total_size,
            worker_count,
        };

        match self.download_chunked(&job, events) {
            Err(ManagerError::RangeNotSupported { .. }) => {
                // The probe advertised ranges but the server ignored the
                // header; restart with one worker spanning the whole file.
                tracing::warn!("{}: range request ignored, degrading to single stream", url);
                self.download_single(url, destination, Some(total_size), events)
            }
            other => other,
        }
    }

    /// Single-stream download, used when the size is unknown, only one
    /// worker is requested, or the server lacks range support.
    fn download_single(
        &self,
        url: &str,
        destination: &Path,
        known_size: Option<u64>,
        events: &Sender<DownloadEvent>,
    ) -> ManagerResult<DownloadOutcome> {
        let total_size = known_size.unwrap_or(0);
        let _ = events.send(DownloadEvent::Started {
            url: url.to_string(),
            total_size,
            worker_count: 1,
        });

        let file = File::create(destination).map_err(|e| ManagerError::WriteFailed {
            path: destination.to_path_buf(),
            source: e,
        })?;
        let mut writer = BufWriter::new(file);

        let counters = ProgressCounters::new(1);
        let mut sink = |chunk: &[u8]| -> ManagerResult<()> {
            writer
                .write_all(chunk)
                .map_err(|e| ManagerError::WriteFailed {
                    path: destination.to_path_buf(),
                    source: e,
                })?;
            let transferred = counters.record(0, chunk.len() as u64);
            let _ = events.send(DownloadEvent::Progress {
                transferred,
                total_size,
                per_worker: counters.snapshot(),
            });
            Ok(())
        };

        self.transport.fetch(url, None, &mut sink)?;
        writer.flush().map_err(|e| ManagerError::WriteFailed {
            path: destination.to_path_buf(),
            source: e,
        })?;

        let transferred = counters.total();
        if let Some(expected) = known_size {
            if transferred != expected {
                return Err(ManagerError::IncompleteDownload {
                    url: url.to_string(),
                    expected,
                    transferred,
                });
            }
        }

        Ok(DownloadOutcome {
            total_size: known_size.unwrap_or(transferred),
            transferred,
            per_worker: counters.snapshot(),
            chunked: false,
        })
    }

    /// Range-partitioned download with one worker thread per range.
    fn download_chunked(
        &self,
        job: &DownloadJob,
        events: &Sender<DownloadEvent>,
    ) -> ManagerResult<DownloadOutcome> {
        let ranges = partition(job.total_size, job.worker_count);
        let counters = ProgressCounters::new(ranges.len());

        // Preallocate the destination at full size so concurrent range
        // writes never extend the file and never overlap.
        let file = File::create(&job.destination).map_err(|e| ManagerError::WriteFailed {
            path: job.destination.clone(),
            source: e,
        })?;
        file.set_len(job.total_size)
            .map_err(|e| ManagerError::WriteFailed {
                path: job.destination.clone(),
                source: e,
            })?;
        drop(file);

        let _ = events.send(DownloadEvent::Started {
            url: job.url.clone(),
            total_size: job.total_size,
            worker_count: ranges.len(),
        });

        tracing::info!(
            "downloading {} ({} bytes) with {} worker(s)",
            job.url,
            job.total_size,
            ranges.len()
        );

        let transport = &self.transport;
        let counters_ref = &counters;

        let results: Vec<ManagerResult<u64>> = thread::scope(|scope| {
            let handles: Vec<_> = ranges
                .iter()
                .enumerate()
                .map(|(index, &range)| {
                    let sender = events.clone();

                    scope.spawn(move || {
                        fetch_range_to_file(transport, job, range, index, counters_ref, &sender)
                    })
                })
                .collect();

            handles
                .into_iter()
                .map(|handle| {
                    handle.join().unwrap_or_else(|_| {
                        Err(ManagerError::Network {
                            url: job.url.clone(),
                            reason: "download worker panicked".to_string(),
                        })
                    })
                })
                .collect()
        });

        // Workers may finish in any order; the first hard error aborts the
        // job, with range refusal taking priority so the caller can degrade.
        let mut first_error = None;
        for result in results {
            match result {
                Err(err @ ManagerError::RangeNotSupported { .. }) => return Err(err),
                Err(err) if first_error.is_none() => first_error = Some(err),
                _ => {}
            }
        }
        if let Some(err) = first_error {
            return Err(err);
        }

        let transferred = counters.total();
        if transferred != job.total_size {
            return Err(ManagerError::IncompleteDownload {
                url: job.url.clone(),
                expected: job.total_size,
                transferred,
            });
        }

        Ok(DownloadOutcome {
            total_size: job.total_size,
            transferred,
            per_worker: counters.snapshot(),
            chunked: true,
        })
    }
}

/// Fetch one byte range into the (preallocated) destination file.
///
/// The worker seeks to its range start once and advances with every write,
/// so consecutive chunks land at `start + bytes_written_so_far`.
fn fetch_range_to_file<T: RangeTransport + ?Sized>(
    transport: &T,
    job: &DownloadJob,
    range: ByteRange,
    worker: usize,
    counters: &ProgressCounters,
    events: &Sender<DownloadEvent>,
) -> ManagerResult<u64> {
    let url = job.url.as_str();
    let destination = job.destination.as_path();
    let total_size = job.total_size;

    let mut file = OpenOptions::new()
        .write(true)
        .open(destination)
        .map_err(|e| ManagerError::WriteFailed {
            path: destination.to_path_buf(),
            source: e,
        })?;
    file.seek(SeekFrom::Start(range.start))
        .map_err(|e| ManagerError::WriteFailed {
            path: destination.to_path_buf(),
            source: e,
        })?;
    let mut writer = BufWriter::new(file);

    let expected = range.len();
    let mut written = 0u64;

    let mut sink = |chunk: &[u8]| -> ManagerResult<()> {
        if written + chunk.len() as u64 > expected {
            return Err(ManagerError::Network {
                url: url.to_string(),
                reason: format!(
                    "server delivered more than the {} requested bytes",
                    expected
                ),
            });
        }
        writer
            .write_all(chunk)
            .map_err(|e| ManagerError::WriteFailed {
                path: destination.to_path_buf(),
                source: e,
            })?;
        written += chunk.len() as u64;

        let transferred = counters.record(worker, chunk.len() as u64);
        let _ = events.send(DownloadEvent::Progress {
            transferred,
            total_size,
            per_worker: counters.snapshot(),
        });
        Ok(())
    };

    transport.fetch(url, Some(range), &mut sink)?;
    writer.flush().map_err(|e| ManagerError::WriteFailed {
        path: destination.to_path_buf(),
        source: e,
    })?;

    Ok(written)
}
