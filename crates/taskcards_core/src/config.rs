//! Runtime configuration.
//!
//! # Responsibility
//! - Load `taskcards.toml` with every field defaulted.
//! - Validate values before any component is built from them.
//!
//! # Invariants
//! - A missing config file is not an error; defaults apply.
//! - `dedup.threshold` is finite and non-negative after loading.

use crate::logging::default_log_level;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

/// Distance below which two task names are treated as the same task.
pub const DEFAULT_DEDUP_THRESHOLD: f64 = 0.1;

const APP_DIR_NAME: &str = "taskcards";
const DB_FILE_NAME: &str = "tasks.db";

#[derive(Debug)]
pub enum ConfigError {
    Io { path: PathBuf, source: std::io::Error },
    Parse { path: PathBuf, message: String },
    InvalidThreshold(f64),
    NoDataDir,
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "cannot read config `{}`: {source}", path.display())
            }
            Self::Parse { path, message } => {
                write!(f, "invalid config `{}`: {message}", path.display())
            }
            Self::InvalidThreshold(value) => write!(
                f,
                "dedup threshold must be a finite non-negative number, got {value}"
            ),
            Self::NoDataDir => write!(
                f,
                "no platform data directory; set `database.path` explicitly"
            ),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub dedup: DedupConfig,
    pub logging: LoggingConfig,
    pub printer: PrinterConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DatabaseConfig {
    /// Defaults to `<data dir>/taskcards/tasks.db`.
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DedupConfig {
    pub threshold: f64,
}

impl Default for DedupConfig {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_DEDUP_THRESHOLD,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingConfig {
    /// `trace|debug|info|warn|error`; build-mode default when unset.
    pub level: Option<String>,
    /// Absolute directory for rolling log files. File logging is off when unset.
    pub dir: Option<PathBuf>,
}

impl LoggingConfig {
    pub fn effective_level(&self) -> &str {
        self.level.as_deref().unwrap_or(default_log_level())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PrinterConfig {
    /// Forward newly stored tasks to the card printer.
    pub enabled: bool,
}

impl AppConfig {
    /// Loads and validates `path`; returns defaults when the file is absent.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = toml::from_str::<Self>(&contents).map_err(|err| ConfigError::Parse {
            path: path.to_path_buf(),
            message: err.message().to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_threshold(self.dedup.threshold)
    }

    /// Resolves the database file location.
    pub fn db_path(&self) -> Result<PathBuf, ConfigError> {
        if let Some(path) = &self.database.path {
            return Ok(path.clone());
        }
        dirs::data_dir()
            .map(|dir| dir.join(APP_DIR_NAME).join(DB_FILE_NAME))
            .ok_or(ConfigError::NoDataDir)
    }
}

/// Default config file location: `<config dir>/taskcards/taskcards.toml`.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(APP_DIR_NAME).join("taskcards.toml"))
}

pub(crate) fn validate_threshold(threshold: f64) -> Result<(), ConfigError> {
    if threshold.is_finite() && threshold >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::InvalidThreshold(threshold))
    }
}
