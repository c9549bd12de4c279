//! Persisted configuration for BlenderVault.
//!
//! Configuration lives in a single INI file with two sections:
//! - `[preferences]` - user settings (mirror URL, watched folder, worker count)
//! - `[installations]` - the registered name -> executable table, owned by the
//!   [`crate::registry::InstallationRegistry`]
//!
//! The file is loaded once with typed fallback defaults and written back in
//! full on every mutation (write-through, no partial writes).

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use ini::Ini;
use thiserror::Error;

use crate::registry::InstallationEntry;

/// File name of the persisted configuration.
pub const CONFIG_FILE_NAME: &str = "config.ini";

/// Default release mirror scraped for downloadable versions.
pub const DEFAULT_SOURCE_URL: &str = "https://mirrors.aliyun.com/blender/release/";

/// Default number of download workers.
pub const DEFAULT_THREAD_COUNT: usize = 4;

/// Lowest accepted download worker count.
pub const MIN_THREAD_COUNT: usize = 1;

/// Highest accepted download worker count.
pub const MAX_THREAD_COUNT: usize = 10;

const PREFERENCES_SECTION: &str = "preferences";
const INSTALLATIONS_SECTION: &str = "installations";

/// Result type for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Errors that can occur while loading or persisting configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the configuration file.
    #[error("failed to read configuration {path}: {source}")]
    Read { path: PathBuf, source: io::Error },

    /// Failed to write the configuration file.
    #[error("failed to write configuration {path}: {source}")]
    Write { path: PathBuf, source: io::Error },

    /// The configuration file exists but could not be parsed.
    #[error("failed to parse configuration {path}: {reason}")]
    Parse { path: PathBuf, reason: String },

    /// A value rejected by a typed setting.
    #[error("invalid value for {key}: {reason}")]
    InvalidValue { key: String, reason: String },
}

/// Path of the configuration file in the platform config directory.
pub fn config_file_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("blendervault")
        .join(CONFIG_FILE_NAME)
}

/// User preferences from the `[preferences]` section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Preferences {
    /// Re-scan the watched folder before listing installations.
    pub auto_fetch: bool,
    /// Folder where versions are installed and scanned for.
    pub folder_path: PathBuf,
    /// Base URL of the release mirror.
    pub source_url: String,
    /// Number of concurrent download workers (clamped to 1–10).
    pub thread_count: usize,
    /// Theme selection, persisted for the presentation layer.
    pub theme: String,
    /// Language selection, persisted for the presentation layer.
    pub language: String,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            auto_fetch: false,
            folder_path: PathBuf::new(),
            source_url: DEFAULT_SOURCE_URL.to_string(),
            thread_count: DEFAULT_THREAD_COUNT,
            theme: String::new(),
            language: String::new(),
        }
    }
}

/// The persisted configuration: preferences plus the installation table.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    /// User preferences.
    pub preferences: Preferences,
    /// Registered installations, in insertion order.
    installations: Vec<InstallationEntry>,
    /// Where this configuration is persisted.
    path: PathBuf,
}

impl ConfigFile {
    /// Load the configuration from the default location.
    ///
    /// A missing file materializes defaults and writes them back immediately.
    pub fn load() -> ConfigResult<Self> {
        Self::load_from(config_file_path())
    }

    /// Load the configuration from an explicit path.
    pub fn load_from(path: impl Into<PathBuf>) -> ConfigResult<Self> {
        let path = path.into();

        if !path.exists() {
            let config = Self {
                preferences: Preferences::default(),
                installations: Vec::new(),
                path,
            };
            config.save()?;
            return Ok(config);
        }

        let ini = Ini::load_from_file(&path).map_err(|e| match e {
            ini::Error::Io(source) => ConfigError::Read {
                path: path.clone(),
                source,
            },
            ini::Error::Parse(parse) => ConfigError::Parse {
                path: path.clone(),
                reason: parse.to_string(),
            },
        })?;

        let preferences = read_preferences(&ini);
        let installations = read_installations(&ini);

        Ok(Self {
            preferences,
            installations,
            path,
        })
    }

    /// Persist the whole configuration.
    pub fn save(&self) -> ConfigResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| ConfigError::Write {
                    path: parent.to_path_buf(),
                    source: e,
                })?;
            }
        }

        let mut ini = Ini::new();
        ini.with_section(Some(PREFERENCES_SECTION))
            .set("AutoFetch", bool_str(self.preferences.auto_fetch))
            .set("FolderPath", self.preferences.folder_path.display().to_string())
            .set("SourceURL", self.preferences.source_url.clone())
            .set("ThreadCount", self.preferences.thread_count.to_string())
            .set("Theme", self.preferences.theme.clone())
            .set("Language", self.preferences.language.clone());

        for entry in &self.installations {
            ini.with_section(Some(INSTALLATIONS_SECTION))
                .set(entry.name.clone(), entry.executable.display().to_string());
        }

        ini.write_to_file(&self.path).map_err(|e| ConfigError::Write {
            path: self.path.clone(),
            source: e,
        })
    }

    /// Where this configuration is persisted.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The registered installations, in insertion order.
    pub fn installations(&self) -> &[InstallationEntry] {
        &self.installations
    }

    /// Mutable access to the installation table.
    ///
    /// Reserved for the registry, which owns this section exclusively.
    pub(crate) fn installations_mut(&mut self) -> &mut Vec<InstallationEntry> {
        &mut self.installations
    }
}

fn read_preferences(ini: &Ini) -> Preferences {
    let defaults = Preferences::default();
    let section = match ini.section(Some(PREFERENCES_SECTION)) {
        Some(section) => section,
        None => return defaults,
    };

    let auto_fetch = section
        .get("AutoFetch")
        .map(parse_bool)
        .unwrap_or(defaults.auto_fetch);
    let folder_path = section
        .get("FolderPath")
        .map(PathBuf::from)
        .unwrap_or(defaults.folder_path);
    let source_url = section
        .get("SourceURL")
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .unwrap_or(defaults.source_url);
    let thread_count = section
        .get("ThreadCount")
        .and_then(|s| s.parse::<usize>().ok())
        .map(|n| n.clamp(MIN_THREAD_COUNT, MAX_THREAD_COUNT))
        .unwrap_or(defaults.thread_count);
    let theme = section.get("Theme").unwrap_or_default().to_string();
    let language = section.get("Language").unwrap_or_default().to_string();

    Preferences {
        auto_fetch,
        folder_path,
        source_url,
        thread_count,
        theme,
        language,
    }
}

fn read_installations(ini: &Ini) -> Vec<InstallationEntry> {
    let section = match ini.section(Some(INSTALLATIONS_SECTION)) {
        Some(section) => section,
        None => return Vec::new(),
    };

    section
        .iter()
        .map(|(name, value)| InstallationEntry {
            name: name.to_string(),
            executable: PathBuf::from(value),
        })
        .collect()
}

fn parse_bool(value: &str) -> bool {
    value.eq_ignore_ascii_case("true") || value == "1"
}

fn bool_str(value: bool) -> &'static str {
    if value {
        "true"
    } else {
        "false"
    }
}

/// Typed handle on a single preference, for the CLI `config` surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigKey {
    AutoFetch,
    FolderPath,
    SourceUrl,
    ThreadCount,
    Theme,
    Language,
}

impl ConfigKey {
    /// All recognized keys, in display order.
    pub fn all() -> &'static [ConfigKey] {
        &[
            ConfigKey::AutoFetch,
            ConfigKey::FolderPath,
            ConfigKey::SourceUrl,
            ConfigKey::ThreadCount,
            ConfigKey::Theme,
            ConfigKey::Language,
        ]
    }

    /// Section this key belongs to.
    pub fn section(&self) -> &'static str {
        PREFERENCES_SECTION
    }

    /// Key name inside the section.
    pub fn key_name(&self) -> &'static str {
        match self {
            ConfigKey::AutoFetch => "AutoFetch",
            ConfigKey::FolderPath => "FolderPath",
            ConfigKey::SourceUrl => "SourceURL",
            ConfigKey::ThreadCount => "ThreadCount",
            ConfigKey::Theme => "Theme",
            ConfigKey::Language => "Language",
        }
    }

    /// Fully qualified `section.key` name.
    pub fn name(&self) -> String {
        format!("{}.{}", self.section(), self.key_name())
    }

    /// Read the current value as a display string.
    pub fn get(&self, config: &ConfigFile) -> String {
        match self {
            ConfigKey::AutoFetch => bool_str(config.preferences.auto_fetch).to_string(),
            ConfigKey::FolderPath => config.preferences.folder_path.display().to_string(),
            ConfigKey::SourceUrl => config.preferences.source_url.clone(),
            ConfigKey::ThreadCount => config.preferences.thread_count.to_string(),
            ConfigKey::Theme => config.preferences.theme.clone(),
            ConfigKey::Language => config.preferences.language.clone(),
        }
    }

    /// Parse and apply a new value.
    ///
    /// The caller is expected to `save()` the configuration afterwards.
    pub fn set(&self, config: &mut ConfigFile, value: &str) -> ConfigResult<()> {
        match self {
            ConfigKey::AutoFetch => {
                let parsed = match value.to_ascii_lowercase().as_str() {
                    "true" | "1" => true,
                    "false" | "0" => false,
                    _ => {
                        return Err(ConfigError::InvalidValue {
                            key: self.name(),
                            reason: format!("expected true or false, got '{}'", value),
                        })
                    }
                };
                config.preferences.auto_fetch = parsed;
            }
            ConfigKey::FolderPath => {
                config.preferences.folder_path = PathBuf::from(value);
            }
            ConfigKey::SourceUrl => {
                if value.is_empty() {
                    return Err(ConfigError::InvalidValue {
                        key: self.name(),
                        reason: "source URL must not be empty".to_string(),
                    });
                }
                config.preferences.source_url = value.to_string();
            }
            ConfigKey::ThreadCount => {
                let parsed: usize = value.parse().map_err(|_| ConfigError::InvalidValue {
                    key: self.name(),
                    reason: format!("expected an integer, got '{}'", value),
                })?;
                if !(MIN_THREAD_COUNT..=MAX_THREAD_COUNT).contains(&parsed) {
                    return Err(ConfigError::InvalidValue {
                        key: self.name(),
                        reason: format!(
                            "worker count must be between {} and {}",
                            MIN_THREAD_COUNT, MAX_THREAD_COUNT
                        ),
                    });
                }
                config.preferences.thread_count = parsed;
            }
            ConfigKey::Theme => {
                config.preferences.theme = value.to_string();
            }
            ConfigKey::Language => {
                config.preferences.language = value.to_string();
            }
        }

        Ok(())
    }
}

impl fmt::Display for ConfigKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for ConfigKey {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ConfigKey::all()
            .iter()
            .copied()
            .find(|key| key.name() == s || key.key_name().eq_ignore_ascii_case(s))
            .ok_or(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn config_in(dir: &TempDir) -> PathBuf {
        dir.path().join(CONFIG_FILE_NAME)
    }

    #[test]
    fn test_missing_file_materializes_defaults() {
        let temp = TempDir::new().unwrap();
        let path = config_in(&temp);

        let config = ConfigFile::load_from(&path).unwrap();

        assert!(path.exists(), "defaults should be written back");
        assert_eq!(config.preferences, Preferences::default());
        assert!(config.installations().is_empty());
    }

    #[test]
    fn test_preferences_roundtrip() {
        let temp = TempDir::new().unwrap();
        let path = config_in(&temp);

        let mut config = ConfigFile::load_from(&path).unwrap();
        config.preferences.auto_fetch = true;
        config.preferences.folder_path = PathBuf::from("/opt/blender");
        config.preferences.thread_count = 8;
        config.preferences.theme = "dark".to_string();
        config.save().unwrap();

        let reloaded = ConfigFile::load_from(&path).unwrap();
        assert_eq!(reloaded.preferences, config.preferences);
    }

    #[test]
    fn test_installation_order_preserved() {
        let temp = TempDir::new().unwrap();
        let path = config_in(&temp);

        let mut config = ConfigFile::load_from(&path).unwrap();
        for name in ["Blender 4.0.1", "Blender 3.6.2", "custom build"] {
            config.installations_mut().push(InstallationEntry {
                name: name.to_string(),
                executable: PathBuf::from(format!("/opt/{}/blender", name)),
            });
        }
        config.save().unwrap();

        let reloaded = ConfigFile::load_from(&path).unwrap();
        let names: Vec<&str> = reloaded
            .installations()
            .iter()
            .map(|e| e.name.as_str())
            .collect();
        assert_eq!(names, vec!["Blender 4.0.1", "Blender 3.6.2", "custom build"]);
    }

    #[test]
    fn test_thread_count_clamped_on_load() {
        let temp = TempDir::new().unwrap();
        let path = config_in(&temp);
        std::fs::write(&path, "[preferences]\nThreadCount=99\n").unwrap();

        let config = ConfigFile::load_from(&path).unwrap();
        assert_eq!(config.preferences.thread_count, MAX_THREAD_COUNT);
    }

    #[test]
    fn test_legacy_python_booleans_accepted() {
        let temp = TempDir::new().unwrap();
        let path = config_in(&temp);
        std::fs::write(&path, "[preferences]\nAutoFetch=True\n").unwrap();

        let config = ConfigFile::load_from(&path).unwrap();
        assert!(config.preferences.auto_fetch);
    }

    #[test]
    fn test_config_key_parse() {
        let key: ConfigKey = "preferences.ThreadCount".parse().unwrap();
        assert_eq!(key, ConfigKey::ThreadCount);

        let key: ConfigKey = "autofetch".parse().unwrap();
        assert_eq!(key, ConfigKey::AutoFetch);

        assert!("preferences.bogus".parse::<ConfigKey>().is_err());
    }

    #[test]
    fn test_config_key_thread_count_bounds() {
        let temp = TempDir::new().unwrap();
        let mut config = ConfigFile::load_from(config_in(&temp)).unwrap();

        ConfigKey::ThreadCount.set(&mut config, "10").unwrap();
        assert_eq!(config.preferences.thread_count, 10);

        assert!(ConfigKey::ThreadCount.set(&mut config, "0").is_err());
        assert!(ConfigKey::ThreadCount.set(&mut config, "11").is_err());
        assert!(ConfigKey::ThreadCount.set(&mut config, "four").is_err());
        assert_eq!(config.preferences.thread_count, 10);
    }

    #[test]
    fn test_config_key_auto_fetch_rejects_garbage() {
        let temp = TempDir::new().unwrap();
        let mut config = ConfigFile::load_from(config_in(&temp)).unwrap();

        assert!(ConfigKey::AutoFetch.set(&mut config, "maybe").is_err());
        ConfigKey::AutoFetch.set(&mut config, "true").unwrap();
        assert!(config.preferences.auto_fetch);
    }
}
