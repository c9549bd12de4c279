//! Registry of installed Blender copies.
//!
//! Maps a user-chosen name to the filesystem path of a Blender executable.
//! Entries are kept in insertion order and persisted through the
//! `[installations]` section of the configuration file, which this module
//! owns exclusively. Paths are verified when an entry is created or used,
//! not continuously monitored.

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::config::{ConfigError, ConfigFile};

/// Well-known executable name looked for during folder scans.
#[cfg(windows)]
pub const BLENDER_EXECUTABLE: &str = "blender.exe";

/// Well-known executable name looked for during folder scans.
#[cfg(not(windows))]
pub const BLENDER_EXECUTABLE: &str = "blender";

/// Result type for registry operations.
pub type RegistryResult<T> = Result<T, RegistryError>;

/// Errors that can occur during registry operations.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// An entry with the same name is already registered.
    #[error("an installation named '{name}' already exists")]
    DuplicateName { name: String },

    /// The name is empty or otherwise unusable as a key.
    #[error("'{name}' is not a valid installation name")]
    InvalidName { name: String },

    /// The executable path does not point at an existing file.
    #[error("'{}' is not an existing executable file", path.display())]
    InvalidPath { path: PathBuf },

    /// No entry with the given name exists.
    #[error("no installation named '{name}'")]
    NotFound { name: String },

    /// The persisted store could not be updated.
    #[error("failed to persist installation table: {0}")]
    Store(#[from] ConfigError),
}

/// A registered Blender installation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallationEntry {
    /// User-chosen name, unique within the registry.
    pub name: String,
    /// Absolute path of the Blender executable.
    pub executable: PathBuf,
}

/// Ordered registry of named Blender installations.
///
/// Owns the configuration file and persists it on every successful mutation.
#[derive(Debug)]
pub struct InstallationRegistry {
    config: ConfigFile,
}

impl InstallationRegistry {
    /// Create a registry over a loaded configuration.
    pub fn new(config: ConfigFile) -> Self {
        Self { config }
    }

    /// The underlying configuration.
    pub fn config(&self) -> &ConfigFile {
        &self.config
    }

    /// Registered entries in insertion order.
    pub fn list(&self) -> &[InstallationEntry] {
        self.config.installations()
    }

    /// Look up an entry by name.
    pub fn get(&self, name: &str) -> Option<&InstallationEntry> {
        self.config
            .installations()
            .iter()
            .find(|entry| entry.name == name)
    }

    /// Register a new installation.
    ///
    /// Fails if the name is already taken or the path is not an existing
    /// file. Persists immediately on success.
    pub fn add(&mut self, name: &str, executable: &Path) -> RegistryResult<()> {
        if name.trim().is_empty() {
            return Err(RegistryError::InvalidName {
                name: name.to_string(),
            });
        }
        if self.get(name).is_some() {
            return Err(RegistryError::DuplicateName {
                name: name.to_string(),
            });
        }
        if !executable.is_file() {
            return Err(RegistryError::InvalidPath {
                path: executable.to_path_buf(),
            });
        }

        self.config.installations_mut().push(InstallationEntry {
            name: name.to_string(),
            executable: executable.to_path_buf(),
        });
        self.config.save()?;

        tracing::info!("registered installation '{}'", name);
        Ok(())
    }

    /// Rename an entry and replace its executable path in one step.
    ///
    /// Atomic from the caller's view: if the new path is invalid or the new
    /// name collides with another entry, the old entry is left untouched.
    pub fn rename(&mut self, old_name: &str, new_name: &str, executable: &Path) -> RegistryResult<()> {
        if new_name.trim().is_empty() {
            return Err(RegistryError::InvalidName {
                name: new_name.to_string(),
            });
        }
        if self.get(old_name).is_none() {
            return Err(RegistryError::NotFound {
                name: old_name.to_string(),
            });
        }
        if new_name != old_name && self.get(new_name).is_some() {
            return Err(RegistryError::DuplicateName {
                name: new_name.to_string(),
            });
        }
        if !executable.is_file() {
            return Err(RegistryError::InvalidPath {
                path: executable.to_path_buf(),
            });
        }

        let entries = self.config.installations_mut();
        if let Some(entry) = entries.iter_mut().find(|entry| entry.name == old_name) {
            entry.name = new_name.to_string();
            entry.executable = executable.to_path_buf();
        }
        self.config.save()?;

        tracing::info!("renamed installation '{}' to '{}'", old_name, new_name);
        Ok(())
    }

    /// Remove an entry, returning it.
    pub fn remove(&mut self, name: &str) -> RegistryResult<InstallationEntry> {
        let entries = self.config.installations_mut();
        let index = entries
            .iter()
            .position(|entry| entry.name == name)
            .ok_or_else(|| RegistryError::NotFound {
                name: name.to_string(),
            })?;

        let removed = entries.remove(index);
        self.config.save()?;

        tracing::info!("removed installation '{}'", name);
        Ok(removed)
    }

    /// Scan a folder for installations and register any new ones.
    ///
    /// Each immediate subdirectory containing the well-known executable is
    /// registered under the directory's base name, unless that name is
    /// already taken. Re-scanning a stable folder registers nothing new.
    /// Returns the names that were newly registered.
    pub fn scan(&mut self, folder: &Path) -> RegistryResult<Vec<String>> {
        let entries = folder.read_dir().map_err(|_| RegistryError::InvalidPath {
            path: folder.to_path_buf(),
        })?;

        let mut discovered = Vec::new();
        for entry in entries.flatten() {
            let dir = entry.path();
            if !dir.is_dir() {
                continue;
            }

            let executable = dir.join(BLENDER_EXECUTABLE);
            if !executable.is_file() {
                continue;
            }

            let name = match dir.file_name().and_then(|n| n.to_str()) {
                Some(name) => name.to_string(),
                None => continue,
            };
            if self.get(&name).is_some() {
                continue;
            }

            self.config.installations_mut().push(InstallationEntry {
                name: name.clone(),
                executable,
            });
            discovered.push(name);
        }

        if !discovered.is_empty() {
            self.config.save()?;
            tracing::info!(
                "scan of {} registered {} installation(s)",
                folder.display(),
                discovered.len()
            );
        }

        Ok(discovered)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn registry_in(temp: &TempDir) -> InstallationRegistry {
        let config = ConfigFile::load_from(temp.path().join("config.ini")).unwrap();
        InstallationRegistry::new(config)
    }

    fn fake_executable(temp: &TempDir, name: &str) -> PathBuf {
        let path = temp.path().join(name);
        fs::write(&path, b"#!/bin/sh\n").unwrap();
        path
    }

    #[test]
    fn test_add_then_list_contains_entry_once() {
        let temp = TempDir::new().unwrap();
        let mut registry = registry_in(&temp);
        let exe = fake_executable(&temp, "blender");

        registry.add("Blender 4.0.1", &exe).unwrap();

        let matches: Vec<_> = registry
            .list()
            .iter()
            .filter(|e| e.name == "Blender 4.0.1" && e.executable == exe)
            .collect();
        assert_eq!(matches.len(), 1);
    }

    #[test]
    fn test_add_duplicate_name_fails_and_preserves_entry() {
        let temp = TempDir::new().unwrap();
        let mut registry = registry_in(&temp);
        let first = fake_executable(&temp, "blender-a");
        let second = fake_executable(&temp, "blender-b");

        registry.add("stable", &first).unwrap();
        let err = registry.add("stable", &second).unwrap_err();

        assert!(matches!(err, RegistryError::DuplicateName { .. }));
        assert_eq!(registry.get("stable").unwrap().executable, first);
    }

    #[test]
    fn test_add_missing_path_fails() {
        let temp = TempDir::new().unwrap();
        let mut registry = registry_in(&temp);

        let err = registry
            .add("ghost", &temp.path().join("does-not-exist"))
            .unwrap_err();

        assert!(matches!(err, RegistryError::InvalidPath { .. }));
        assert!(registry.list().is_empty());
    }

    #[test]
    fn test_add_empty_name_fails() {
        let temp = TempDir::new().unwrap();
        let mut registry = registry_in(&temp);
        let exe = fake_executable(&temp, "blender");

        assert!(matches!(
            registry.add("  ", &exe),
            Err(RegistryError::InvalidName { .. })
        ));
    }

    #[test]
    fn test_rename_swaps_name_and_path() {
        let temp = TempDir::new().unwrap();
        let mut registry = registry_in(&temp);
        let old_exe = fake_executable(&temp, "blender-old");
        let new_exe = fake_executable(&temp, "blender-new");

        registry.add("old", &old_exe).unwrap();
        registry.rename("old", "new", &new_exe).unwrap();

        assert!(registry.get("old").is_none());
        assert_eq!(registry.get("new").unwrap().executable, new_exe);
    }

    #[test]
    fn test_rename_with_invalid_path_leaves_entry_untouched() {
        let temp = TempDir::new().unwrap();
        let mut registry = registry_in(&temp);
        let exe = fake_executable(&temp, "blender");

        registry.add("stable", &exe).unwrap();
        let err = registry
            .rename("stable", "renamed", &temp.path().join("missing"))
            .unwrap_err();

        assert!(matches!(err, RegistryError::InvalidPath { .. }));
        assert!(registry.get("renamed").is_none());
        assert_eq!(registry.get("stable").unwrap().executable, exe);
    }

    #[test]
    fn test_rename_collision_rejected() {
        let temp = TempDir::new().unwrap();
        let mut registry = registry_in(&temp);
        let first = fake_executable(&temp, "blender-a");
        let second = fake_executable(&temp, "blender-b");

        registry.add("first", &first).unwrap();
        registry.add("second", &second).unwrap();

        let err = registry.rename("first", "second", &first).unwrap_err();
        assert!(matches!(err, RegistryError::DuplicateName { .. }));
        assert_eq!(registry.get("first").unwrap().executable, first);
    }

    #[test]
    fn test_rename_preserves_position() {
        let temp = TempDir::new().unwrap();
        let mut registry = registry_in(&temp);
        let a = fake_executable(&temp, "a");
        let b = fake_executable(&temp, "b");
        let c = fake_executable(&temp, "c");

        registry.add("a", &a).unwrap();
        registry.add("b", &b).unwrap();
        registry.add("c", &c).unwrap();
        registry.rename("b", "b2", &b).unwrap();

        let names: Vec<&str> = registry.list().iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b2", "c"]);
    }

    #[test]
    fn test_remove_missing_fails() {
        let temp = TempDir::new().unwrap();
        let mut registry = registry_in(&temp);

        assert!(matches!(
            registry.remove("nope"),
            Err(RegistryError::NotFound { .. })
        ));
    }

    #[test]
    fn test_remove_returns_entry() {
        let temp = TempDir::new().unwrap();
        let mut registry = registry_in(&temp);
        let exe = fake_executable(&temp, "blender");

        registry.add("stable", &exe).unwrap();
        let removed = registry.remove("stable").unwrap();

        assert_eq!(removed.name, "stable");
        assert!(registry.list().is_empty());
    }

    #[test]
    fn test_scan_registers_versioned_folders() {
        let temp = TempDir::new().unwrap();
        let mut registry = registry_in(&temp);

        let versions = temp.path().join("versions");
        for name in ["Blender 4.0.1", "Blender 3.6.2"] {
            let dir = versions.join(name);
            fs::create_dir_all(&dir).unwrap();
            fs::write(dir.join(BLENDER_EXECUTABLE), b"bin").unwrap();
        }
        // A folder without the executable must be ignored.
        fs::create_dir_all(versions.join("downloads")).unwrap();

        let mut found = registry.scan(&versions).unwrap();
        found.sort();
        assert_eq!(found, vec!["Blender 3.6.2", "Blender 4.0.1"]);
        assert_eq!(registry.list().len(), 2);
    }

    #[test]
    fn test_scan_is_idempotent_and_never_overwrites() {
        let temp = TempDir::new().unwrap();
        let mut registry = registry_in(&temp);

        let versions = temp.path().join("versions");
        let dir = versions.join("Blender 4.0.1");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join(BLENDER_EXECUTABLE), b"bin").unwrap();

        // Manual mapping under the same name, pointing somewhere else.
        let manual = fake_executable(&temp, "custom-blender");
        registry.add("Blender 4.0.1", &manual).unwrap();

        let found = registry.scan(&versions).unwrap();
        assert!(found.is_empty());
        assert_eq!(registry.get("Blender 4.0.1").unwrap().executable, manual);

        // Second scan of a stable folder registers nothing new either.
        assert!(registry.scan(&versions).unwrap().is_empty());
    }

    #[test]
    fn test_scan_missing_folder_fails() {
        let temp = TempDir::new().unwrap();
        let mut registry = registry_in(&temp);

        assert!(matches!(
            registry.scan(&temp.path().join("absent")),
            Err(RegistryError::InvalidPath { .. })
        ));
    }

    #[test]
    fn test_persistence_roundtrip() {
        let temp = TempDir::new().unwrap();
        let config_path = temp.path().join("config.ini");
        let exe = fake_executable(&temp, "blender");

        {
            let config = ConfigFile::load_from(&config_path).unwrap();
            let mut registry = InstallationRegistry::new(config);
            registry.add("stable", &exe).unwrap();
        }

        let config = ConfigFile::load_from(&config_path).unwrap();
        let registry = InstallationRegistry::new(config);
        assert_eq!(registry.get("stable").unwrap().executable, exe);
    }
}
