//! Error types for the download and install pipeline.

use std::io;
use std::path::PathBuf;

/// Result type for manager operations.
pub type ManagerResult<T> = Result<T, ManagerError>;

/// Errors that can occur while downloading or installing a release archive.
#[derive(Debug)]
pub enum ManagerError {
    /// Transport-level failure (connect, timeout, dropped body).
    Network { url: String, reason: String },

    /// The server answered with an unexpected HTTP status.
    Http { url: String, status: u16 },

    /// The server ignored a `Range` request.
    RangeNotSupported { url: String },

    /// Failed to read a file or directory.
    ReadFailed { path: PathBuf, source: io::Error },

    /// Failed to write a file or directory.
    WriteFailed { path: PathBuf, source: io::Error },

    /// Failed to create a directory.
    CreateDirFailed { path: PathBuf, source: io::Error },

    /// The transfer ended short of (or past) the advertised size.
    IncompleteDownload {
        url: String,
        expected: u64,
        transferred: u64,
    },

    /// The archive's central directory could not be parsed.
    CorruptArchive { path: PathBuf, reason: String },
}

impl std::fmt::Display for ManagerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Network { url, reason } => {
                write!(f, "request to {} failed: {}", url, reason)
            }
            Self::Http { url, status } => {
                write!(f, "HTTP {} from {}", status, url)
            }
            Self::RangeNotSupported { url } => {
                write!(f, "server ignored range request for {}", url)
            }
            Self::ReadFailed { path, source } => {
                write!(f, "failed to read {}: {}", path.display(), source)
            }
            Self::WriteFailed { path, source } => {
                write!(f, "failed to write {}: {}", path.display(), source)
            }
            Self::CreateDirFailed { path, source } => {
                write!(
                    f,
                    "failed to create directory {}: {}",
                    path.display(),
                    source
                )
            }
            Self::IncompleteDownload {
                url,
                expected,
                transferred,
            } => {
                write!(
                    f,
                    "download of {} incomplete: {} of {} bytes transferred",
                    url, transferred, expected
                )
            }
            Self::CorruptArchive { path, reason } => {
                write!(f, "archive {} is not readable: {}", path.display(), reason)
            }
        }
    }
}

impl std::error::Error for ManagerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::ReadFailed { source, .. } => Some(source),
            Self::WriteFailed { source, .. } => Some(source),
            Self::CreateDirFailed { source, .. } => Some(source),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_incomplete_download_display() {
        let err = ManagerError::IncompleteDownload {
            url: "http://mirror/archive.zip".to_string(),
            expected: 100,
            transferred: 42,
        };
        assert_eq!(
            err.to_string(),
            "download of http://mirror/archive.zip incomplete: 42 of 100 bytes transferred"
        );
    }

    #[test]
    fn test_corrupt_archive_display() {
        let err = ManagerError::CorruptArchive {
            path: PathBuf::from("/tmp/archive.zip"),
            reason: "invalid central directory".to_string(),
        };
        assert!(err.to_string().contains("/tmp/archive.zip"));
        assert!(err.to_string().contains("invalid central directory"));
    }

    #[test]
    fn test_io_error_source_preserved() {
        let err = ManagerError::WriteFailed {
            path: PathBuf::from("/tmp/file"),
            source: io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        };
        assert!(std::error::Error::source(&err).is_some());
    }
}
