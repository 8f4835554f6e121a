//! TOML configuration shared by kestrel binaries.
//!
//! A node reads one file. Its `[shared]` table maps onto [`SharedConfig`];
//! the other tables belong to the node. Any `DeserializeOwned` type gets
//! [`ConfigLoader`] for free.
//!
//! ```rust,no_run
//! use kestrel_common::config::{ConfigError, ConfigLoader, SharedConfig};
//! use serde::Deserialize;
//! use std::path::Path;
//!
//! #[derive(Deserialize)]
//! struct Monitor {
//!     shared: SharedConfig,
//!     threshold_volts: f32,
//! }
//!
//! fn main() -> Result<(), ConfigError> {
//!     let monitor = Monitor::load(Path::new("monitor.toml"))?;
//!     monitor.shared.validate()?;
//!     Ok(())
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// Why a configuration could not be produced.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("no configuration file at {}", .0.display())]
    FileNotFound(PathBuf),

    /// The file exists but could not be read, or its TOML did not match.
    #[error("invalid configuration: {0}")]
    ParseError(String),

    /// Parsed, but a value is out of range.
    #[error("rejected configuration: {0}")]
    ValidationError(String),
}

/// Verbosity passed to the tracing filter. Written lowercase in TOML.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// Directive string understood by `EnvFilter`.
    pub const fn as_str(self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

/// The `[shared]` table every node file carries.
///
/// ```toml
/// [shared]
/// log_level = "debug"
/// service_name = "kestrel-node"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SharedConfig {
    #[serde(default)]
    pub log_level: LogLevel,

    /// Name used in log lines and the status report.
    pub service_name: String,
}

impl SharedConfig {
    /// # Errors
    ///
    /// `ConfigError::ValidationError` if `service_name` is blank.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.service_name.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "shared.service_name is blank".to_string(),
            ));
        }
        Ok(())
    }
}

/// Deserialize a configuration from TOML text or a TOML file.
///
/// Loading does not validate; callers run their own `validate` afterwards.
pub trait ConfigLoader: Sized + serde::de::DeserializeOwned {
    /// # Errors
    ///
    /// `FileNotFound` carrying `path`, or `ParseError` for unreadable files
    /// and malformed TOML.
    fn load(path: &Path) -> Result<Self, ConfigError> {
        debug!("Reading configuration {}", path.display());
        let content = std::fs::read_to_string(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => ConfigError::FileNotFound(path.to_path_buf()),
            _ => ConfigError::ParseError(format!("{}: {e}", path.display())),
        })?;
        Self::from_toml(&content)
    }

    /// # Errors
    ///
    /// `ParseError` with the TOML diagnostic.
    fn from_toml(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))
    }
}

impl<T: serde::de::DeserializeOwned> ConfigLoader for T {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[derive(Debug, Deserialize)]
    struct Monitor {
        shared: SharedConfig,
        threshold_volts: f32,
    }

    #[test]
    fn test_level_directives_match_toml_names() {
        #[derive(Deserialize)]
        struct Level {
            level: LogLevel,
        }

        for level in [LogLevel::Trace, LogLevel::Warn, LogLevel::Error] {
            let text = format!("level = \"{}\"", level.as_str());
            assert_eq!(Level::from_toml(&text).unwrap().level, level);
        }
        assert!(Level::from_toml("level = \"WARN\"").is_err());
    }

    #[test]
    fn test_blank_service_name_rejected() {
        let shared = SharedConfig {
            log_level: LogLevel::default(),
            service_name: "  ".to_string(),
        };
        assert!(matches!(
            shared.validate(),
            Err(ConfigError::ValidationError(_))
        ));
    }

    #[test]
    fn test_missing_file_names_path() {
        let path = Path::new("/nonexistent/kestrel/monitor.toml");
        let err = Monitor::load(path).unwrap_err();
        assert_eq!(err, ConfigError::FileNotFound(path.to_path_buf()));
        assert!(err.to_string().contains("monitor.toml"));
    }

    #[test]
    fn test_missing_table_is_parse_error() {
        let err = Monitor::from_toml("threshold_volts = 10.5\n").unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(msg) if msg.contains("shared")));
    }

    #[test]
    fn test_load_defaults_log_level() {
        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            "threshold_volts = 11.1\n\n[shared]\nservice_name = \"bench-rig\"\n"
        )
        .unwrap();
        file.flush().unwrap();

        let monitor = Monitor::load(file.path()).unwrap();
        assert_eq!(monitor.shared.log_level, LogLevel::Info);
        assert_eq!(monitor.shared.service_name, "bench-rig");
        assert!((monitor.threshold_volts - 11.1).abs() < 1e-4);
        assert!(monitor.shared.validate().is_ok());
    }
}
