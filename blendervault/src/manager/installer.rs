//! Archive extraction and layout normalization.
//!
//! Takes a downloaded zip archive, extracts it into a versioned destination
//! folder, and hoists the single wrapper directory most upstream archives
//! put around their payload. The archive file is deleted on success and
//! preserved on any failure so it can be inspected.

use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};

use zip::ZipArchive;

use super::error::{ManagerError, ManagerResult};

/// Result of a completed installation.
#[derive(Debug, Clone)]
pub struct InstallOutcome {
    /// Folder the archive was installed into.
    pub install_path: PathBuf,
    /// Number of files extracted.
    pub files_extracted: usize,
    /// Whether a single wrapper directory was hoisted away.
    pub hoisted: bool,
}

/// Extracts release archives into versioned destination folders.
#[derive(Debug, Default)]
pub struct ArchiveInstaller;

impl ArchiveInstaller {
    /// Create a new installer.
    pub fn new() -> Self {
        Self
    }

    /// Extract `archive_path` into `destination`, normalize the layout, and
    /// delete the archive.
    ///
    /// An unparseable archive fails with [`ManagerError::CorruptArchive`],
    /// distinct from network errors, so the caller can decide between
    /// re-downloading and abandoning. On any failure the archive file is
    /// left in place.
    pub fn install(&self, archive_path: &Path, destination: &Path) -> ManagerResult<InstallOutcome> {
        let files_extracted = self.extract(archive_path, destination)?;
        let hoisted = normalize_single_wrapper(destination)?;

        fs::remove_file(archive_path).map_err(|e| ManagerError::WriteFailed {
            path: archive_path.to_path_buf(),
            source: e,
        })?;

        tracing::info!(
            "installed {} file(s) into {}{}",
            files_extracted,
            destination.display(),
            if hoisted { " (wrapper hoisted)" } else { "" }
        );

        Ok(InstallOutcome {
            install_path: destination.to_path_buf(),
            files_extracted,
            hoisted,
        })
    }

    /// Extract every archive entry into `destination`, creating it if
    /// absent. Returns the number of files written.
    fn extract(&self, archive_path: &Path, destination: &Path) -> ManagerResult<usize> {
        fs::create_dir_all(destination).map_err(|e| ManagerError::CreateDirFailed {
            path: destination.to_path_buf(),
            source: e,
        })?;

        let file = File::open(archive_path).map_err(|e| ManagerError::ReadFailed {
            path: archive_path.to_path_buf(),
            source: e,
        })?;
        let mut archive = ZipArchive::new(file).map_err(|e| ManagerError::CorruptArchive {
            path: archive_path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let mut files_extracted = 0;
        for index in 0..archive.len() {
            let mut entry = archive
                .by_index(index)
                .map_err(|e| ManagerError::CorruptArchive {
                    path: archive_path.to_path_buf(),
                    reason: e.to_string(),
                })?;

            // Entries with absolute or parent-escaping names are rejected
            // rather than written outside the destination.
            let relative = match entry.enclosed_name() {
                Some(name) => name.to_path_buf(),
                None => {
                    return Err(ManagerError::CorruptArchive {
                        path: archive_path.to_path_buf(),
                        reason: format!("entry '{}' escapes the destination", entry.name()),
                    })
                }
            };
            let target = destination.join(relative);

            if entry.is_dir() {
                fs::create_dir_all(&target).map_err(|e| ManagerError::CreateDirFailed {
                    path: target.clone(),
                    source: e,
                })?;
                continue;
            }

            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent).map_err(|e| ManagerError::CreateDirFailed {
                    path: parent.to_path_buf(),
                    source: e,
                })?;
            }

            let mut output = File::create(&target).map_err(|e| ManagerError::WriteFailed {
                path: target.clone(),
                source: e,
            })?;
            io::copy(&mut entry, &mut output).map_err(|e| ManagerError::WriteFailed {
                path: target.clone(),
                source: e,
            })?;

            #[cfg(unix)]
            if let Some(mode) = entry.unix_mode() {
                use std::os::unix::fs::PermissionsExt;
                fs::set_permissions(&target, fs::Permissions::from_mode(mode)).ok();
            }

            files_extracted += 1;
        }

        Ok(files_extracted)
    }
}

/// Hoist a single wrapping directory.
///
/// If `destination` holds exactly one entry and that entry is a directory,
/// its contents move up one level and the empty wrapper is removed. A
/// multi-entry top level is left as-is: the archive was already flat.
fn normalize_single_wrapper(destination: &Path) -> ManagerResult<bool> {
    let entries: Vec<_> = fs::read_dir(destination)
        .map_err(|e| ManagerError::ReadFailed {
            path: destination.to_path_buf(),
            source: e,
        })?
        .filter_map(|entry| entry.ok())
        .collect();

    if entries.len() != 1 || !entries[0].path().is_dir() {
        return Ok(false);
    }

    let wrapper = entries[0].path();
    let children = fs::read_dir(&wrapper).map_err(|e| ManagerError::ReadFailed {
        path: wrapper.clone(),
        source: e,
    })?;

    for child in children.flatten() {
        let from = child.path();
        let to = destination.join(child.file_name());
        fs::rename(&from, &to).map_err(|e| ManagerError::WriteFailed {
            path: to,
            source: e,
        })?;
    }

    fs::remove_dir(&wrapper).map_err(|e| ManagerError::WriteFailed {
        path: wrapper.clone(),
        source: e,
    })?;

    Ok(true)
}

/// Destination folder name for a minor version archive.
///
/// Derives the version from the second dash-separated field of the archive
/// name: `blender-4.0.1-windows-x64.zip` → `Blender 4.0.1`. Archives that
/// do not follow the naming convention fall back to their file stem.
pub fn install_dir_name(minor_version: &str) -> String {
    match minor_version.split('-').nth(1) {
        Some(version) if !version.is_empty() => format!("Blender {}", version),
        _ => Path::new(minor_version)
            .file_stem()
            .and_then(|stem| stem.to_str())
            .unwrap_or(minor_version)
            .to_string(),
    }
}
