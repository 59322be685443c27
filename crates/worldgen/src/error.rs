// ---------------------------------------------------------------------------
// ConfigError: typed errors for loading and validating generation parameters
// ---------------------------------------------------------------------------

use std::fmt;

/// Errors that can occur while loading or validating a
/// [`crate::config::WorldGenConfig`].
///
/// `WorldGenerator::generate` returns this for a config that fails
/// validation. Past that point placement and pathfinding failures are
/// ordinary outcomes reported through stats, so this is the only error type.
#[derive(Debug)]
pub enum ConfigError {
    /// I/O error reading the config file.
    Io(std::io::Error),
    /// The document is not valid JSON or does not match the schema.
    Parse(serde_json::Error),
    /// The document parsed but describes an impossible world.
    Invalid(String),
}

impl ConfigError {
    pub(crate) fn invalid(msg: &str) -> Self {
        ConfigError::Invalid(msg.to_string())
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "I/O error: {e}"),
            ConfigError::Parse(e) => write!(f, "Config parse error: {e}"),
            ConfigError::Invalid(msg) => write!(f, "Invalid config: {msg}"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io(e) => Some(e),
            ConfigError::Parse(e) => Some(e),
            ConfigError::Invalid(_) => None,
        }
    }
}

impl From<std::io::Error> for ConfigError {
    fn from(e: std::io::Error) -> Self {
        ConfigError::Io(e)
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(e: serde_json::Error) -> Self {
        ConfigError::Parse(e)
    }
}
