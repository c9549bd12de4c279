//! Download-and-install pipeline for release archives.
//!
//! This module turns a selected catalog entry into an installed Blender
//! copy:
//! - Chunked, concurrent archive download (`download`)
//! - Zip extraction and nested-folder normalization (`installer`)
//! - Shared error types (`error`) and transport seams (`traits`)
//!
//! A failed download or extraction aborts the current job but leaves the
//! rest of the engine untouched; partial artifacts stay on disk for
//! inspection except where the installer's success path removes the
//! archive.

pub mod download;
mod error;
pub mod installer;
mod traits;

pub use download::{
    partition, ByteRange, ChunkedDownloader, DownloadEvent, DownloadJob, DownloadOutcome,
    HttpTransport, ProgressCounters,
};
pub use error::{ManagerError, ManagerResult};
pub use installer::{install_dir_name, ArchiveInstaller, InstallOutcome};
pub use traits::{ChunkSink, RangeTransport, ResourceProbe};
