//! Engine facade wiring the components into the install control flow.
//!
//! Catalog listing → chunked download → extraction/normalization →
//! registration. Each long-running step reports through observer channels;
//! a failed download or extraction never touches the registry.

use std::path::PathBuf;
use std::sync::mpsc::Sender;

use crate::catalog::{CatalogError, ReleaseCatalog, ReqwestClient};
use crate::config::{ConfigError, ConfigFile, Preferences};
use crate::launch::{LaunchError, LaunchEvent, LaunchHandle, LaunchSupervisor};
use crate::manager::{
    install_dir_name, ArchiveInstaller, ChunkedDownloader, DownloadEvent, HttpTransport,
    ManagerError,
};
use crate::registry::{InstallationEntry, InstallationRegistry, RegistryError, BLENDER_EXECUTABLE};

/// Errors surfaced by the engine facade.
#[derive(Debug)]
pub enum EngineError {
    /// Configuration could not be loaded or persisted.
    Config(ConfigError),

    /// A registry operation failed.
    Registry(RegistryError),

    /// The release mirror could not be scraped.
    Catalog(CatalogError),

    /// Download or installation failed.
    Manager(ManagerError),

    /// The child process could not be launched.
    Launch(LaunchError),

    /// No usable versions folder is configured.
    MissingVersionsFolder { path: PathBuf },
}

impl std::fmt::Display for EngineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EngineError::Config(e) => write!(f, "configuration error: {}", e),
            EngineError::Registry(e) => write!(f, "registry error: {}", e),
            EngineError::Catalog(e) => write!(f, "catalog error: {}", e),
            EngineError::Manager(e) => write!(f, "download/install error: {}", e),
            EngineError::Launch(e) => write!(f, "launch error: {}", e),
            EngineError::MissingVersionsFolder { path } => {
                if path.as_os_str().is_empty() {
                    write!(f, "no versions folder configured; set preferences.FolderPath first")
                } else {
                    write!(f, "versions folder {} does not exist", path.display())
                }
            }
        }
    }
}

impl std::error::Error for EngineError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            EngineError::Config(e) => Some(e),
            EngineError::Registry(e) => Some(e),
            EngineError::Catalog(e) => Some(e),
            EngineError::Manager(e) => Some(e),
            EngineError::Launch(e) => Some(e),
            EngineError::MissingVersionsFolder { .. } => None,
        }
    }
}

impl From<ConfigError> for EngineError {
    fn from(e: ConfigError) -> Self {
        EngineError::Config(e)
    }
}

impl From<RegistryError> for EngineError {
    fn from(e: RegistryError) -> Self {
        EngineError::Registry(e)
    }
}

impl From<CatalogError> for EngineError {
    fn from(e: CatalogError) -> Self {
        EngineError::Catalog(e)
    }
}

impl From<ManagerError> for EngineError {
    fn from(e: ManagerError) -> Self {
        EngineError::Manager(e)
    }
}

impl From<LaunchError> for EngineError {
    fn from(e: LaunchError) -> Self {
        EngineError::Launch(e)
    }
}

/// The version-repository management engine.
///
/// Owns the registry (and through it the persisted configuration), the
/// release catalog, and the download/install pipeline. Mutating operations
/// run on the caller's thread; long-running steps report progress through
/// channels so an observing thread only ever watches.
pub struct Engine {
    registry: InstallationRegistry,
    catalog: ReleaseCatalog<ReqwestClient>,
    downloader: ChunkedDownloader<HttpTransport>,
    installer: ArchiveInstaller,
}

impl Engine {
    /// Open the engine over the configuration at the default location.
    pub fn open() -> Result<Self, EngineError> {
        Self::with_config(ConfigFile::load()?)
    }

    /// Open the engine over an explicit configuration.
    pub fn with_config(config: ConfigFile) -> Result<Self, EngineError> {
        let catalog = ReleaseCatalog::new(config.preferences.source_url.clone())?;
        let downloader = ChunkedDownloader::new()?;

        Ok(Self {
            registry: InstallationRegistry::new(config),
            catalog,
            downloader,
            installer: ArchiveInstaller::new(),
        })
    }

    /// Current user preferences.
    pub fn preferences(&self) -> &Preferences {
        &self.registry.config().preferences
    }

    /// The installation registry.
    pub fn registry(&self) -> &InstallationRegistry {
        &self.registry
    }

    /// Mutable access to the installation registry.
    pub fn registry_mut(&mut self) -> &mut InstallationRegistry {
        &mut self.registry
    }

    /// List major version folders on the configured mirror.
    pub fn list_major_versions(&self) -> Result<Vec<String>, EngineError> {
        Ok(self.catalog.list_major_versions()?)
    }

    /// List downloadable archives inside a major version folder.
    pub fn list_minor_versions(&self, major_version: &str) -> Result<Vec<String>, EngineError> {
        Ok(self.catalog.list_minor_versions(major_version)?)
    }

    /// Re-scan the watched folder when auto-fetch is enabled.
    ///
    /// Returns the names of newly discovered installations; a disabled
    /// auto-fetch or an unset folder scans nothing.
    pub fn refresh_watched_folder(&mut self) -> Result<Vec<String>, EngineError> {
        if !self.preferences().auto_fetch {
            return Ok(Vec::new());
        }
        let folder = self.preferences().folder_path.clone();
        if !folder.is_dir() {
            return Ok(Vec::new());
        }
        Ok(self.registry.scan(&folder)?)
    }

    /// Download, install, and register a release.
    ///
    /// The archive lands in the versions folder, is extracted into a
    /// `Blender <version>` subfolder with wrapper normalization, removed on
    /// success, and the new installation is registered under the folder
    /// name. Progress arrives on `events` while the transfer runs.
    pub fn install_release(
        &mut self,
        major_version: &str,
        minor_version: &str,
        events: &Sender<DownloadEvent>,
    ) -> Result<InstallationEntry, EngineError> {
        let folder = self.preferences().folder_path.clone();
        if folder.as_os_str().is_empty() || !folder.is_dir() {
            return Err(EngineError::MissingVersionsFolder { path: folder });
        }

        let url = self.catalog.archive_url(major_version, minor_version);
        let archive_path = folder.join(minor_version);
        let worker_count = self.preferences().thread_count;

        self.downloader
            .download(&url, &archive_path, worker_count, events)?;

        let name = install_dir_name(minor_version);
        let destination = folder.join(&name);
        self.installer.install(&archive_path, &destination)?;

        let executable = destination.join(BLENDER_EXECUTABLE);
        let entry = InstallationEntry {
            name: name.clone(),
            executable: executable.clone(),
        };

        // Reinstalling over an existing registration of the same copy is
        // fine; a name collision with a different executable is not.
        let needs_registration = match self.registry.get(&name) {
            Some(existing) if existing.executable == executable => false,
            Some(_) => {
                return Err(EngineError::Registry(RegistryError::DuplicateName { name }));
            }
            None => true,
        };
        if needs_registration {
            self.registry.add(&name, &executable)?;
        }

        Ok(entry)
    }

    /// Launch a registered installation, supervised on its own thread.
    pub fn launch(
        &self,
        name: &str,
        events: Sender<LaunchEvent>,
    ) -> Result<LaunchHandle, EngineError> {
        let entry = self
            .registry
            .get(name)
            .ok_or_else(|| RegistryError::NotFound {
                name: name.to_string(),
            })?;

        Ok(LaunchSupervisor::launch(&entry.executable, events)?)
    }
}
