//! Configuration management for sysknobs
//!
//! TOML bootstrap only: port and logging. These settings cannot change
//! during runtime; the daemon must restart to pick up changes. Everything
//! the daemon actually controls lives behind the attribute surface, not in
//! the config file.
//!
//! Settings sources priority:
//! 1. Command-line arguments (--port)
//! 2. Environment variables (SYSKNOBS_PORT)
//! 3. TOML configuration file
//! 4. Built-in defaults (code constants)

use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::warn;

use crate::error::{Error, Result};

/// Bootstrap configuration loaded from TOML file
#[derive(Debug, Clone, Deserialize)]
pub struct TomlConfig {
    /// HTTP server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Logging configuration (optional)
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log file path (optional, logs to stderr if not specified)
    #[serde(default)]
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: None,
        }
    }
}

impl Default for TomlConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            logging: LoggingConfig::default(),
        }
    }
}

fn default_port() -> u16 {
    5760
}

fn default_log_level() -> String {
    "info".to_string()
}

impl TomlConfig {
    /// Load configuration from a TOML file.
    ///
    /// A missing file is not an error: the daemon runs fine on built-in
    /// defaults. A file that exists but does not parse is a real
    /// configuration error and is reported.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };

        let contents = match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!(
                    "config file {} not found, using built-in defaults",
                    path.display()
                );
                return Ok(Self::default());
            }
            Err(e) => return Err(Error::Io(e)),
        };

        toml::from_str(&contents)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_without_file() {
        let config = TomlConfig::load(None).unwrap();
        assert_eq!(config.port, 5760);
        assert_eq!(config.logging.level, "info");
        assert!(config.logging.file.is_none());
    }

    #[test]
    fn test_missing_file_falls_back_to_defaults() {
        let config = TomlConfig::load(Some(Path::new("/nonexistent/sysknobs.toml"))).unwrap();
        assert_eq!(config.port, 5760);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "port = 6100\n\n[logging]\nlevel = \"debug\"").unwrap();

        let config = TomlConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.port, 6100);
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[logging]\nlevel = \"trace\"").unwrap();

        let config = TomlConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.port, 5760);
        assert_eq!(config.logging.level, "trace");
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "port = \"not a number\"").unwrap();

        let err = TomlConfig::load(Some(file.path())).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
