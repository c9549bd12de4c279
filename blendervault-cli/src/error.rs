//! CLI error type.

use blendervault::config::ConfigError;
use blendervault::registry::RegistryError;
use blendervault::EngineError;

/// Errors surfaced to the terminal as a single descriptive message.
#[derive(Debug)]
pub enum CliError {
    /// Configuration problem (unknown key, bad value, store failure).
    Config(String),

    /// An engine operation failed.
    Engine(EngineError),

    /// A background worker died without reporting a result.
    Worker(String),
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CliError::Config(msg) => write!(f, "{}", msg),
            CliError::Engine(e) => write!(f, "{}", e),
            CliError::Worker(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::Engine(e) => Some(e),
            _ => None,
        }
    }
}

impl From<EngineError> for CliError {
    fn from(e: EngineError) -> Self {
        CliError::Engine(e)
    }
}

impl From<ConfigError> for CliError {
    fn from(e: ConfigError) -> Self {
        CliError::Config(e.to_string())
    }
}

impl From<RegistryError> for CliError {
    fn from(e: RegistryError) -> Self {
        CliError::Engine(EngineError::from(e))
    }
}
