//! Core runtime configuration.
//!
//! # Responsibility
//! - Describe logging and storage settings as serde data.
//! - Turn storage settings into a `StoreFactory` for deployed registries.
//!
//! # Invariants
//! - Unknown fields are rejected.
//! - A validated config has a supported level, an absolute log dir (if any)
//!   and a non-empty SQLite path (if any).

use crate::logging::{default_log_level, init_logging, normalize_level, LoggingError};
use crate::repo::record_store::{RecordStore, StoreResult};
use crate::repo::sqlite_store::SqliteRecordStore;
use crate::service::directory::{memory_store_factory, StoreFactory};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use uuid::Uuid;

/// Where deployed registries keep their records.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case", deny_unknown_fields)]
pub enum StorageConfig {
    #[default]
    Memory,
    /// One shared database file; each registry gets its own row scope.
    Sqlite { path: PathBuf },
}

impl StorageConfig {
    /// Builds the factory used by `OrganisationDirectory::with_store_factory`.
    pub fn store_factory(&self) -> StoreFactory {
        match self {
            Self::Memory => memory_store_factory(),
            Self::Sqlite { path } => {
                let path = path.clone();
                Arc::new(move |registry_id: Uuid| -> StoreResult<Box<dyn RecordStore>> {
                    Ok(Box::new(SqliteRecordStore::open_scope(&path, registry_id)?))
                })
            }
        }
    }
}

/// Top-level configuration for embedding the registry core.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CoreConfig {
    pub log_level: String,
    /// Logging stays disabled when unset.
    pub log_dir: Option<PathBuf>,
    pub storage: StorageConfig,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level().to_string(),
            log_dir: None,
            storage: StorageConfig::default(),
        }
    }
}

impl CoreConfig {
    /// Parses and validates JSON text.
    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_json::from_str(text).map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|err| ConfigError::Read {
            path: path.to_path_buf(),
            message: err.to_string(),
        })?;
        Self::from_json_str(&text)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        normalize_level(&self.log_level)?;
        if let Some(log_dir) = &self.log_dir {
            if !log_dir.is_absolute() {
                return Err(ConfigError::Logging(LoggingError::RelativeLogDir(
                    log_dir.clone(),
                )));
            }
        }
        if let StorageConfig::Sqlite { path } = &self.storage {
            if path.as_os_str().is_empty() {
                return Err(ConfigError::EmptySqlitePath);
            }
        }
        Ok(())
    }

    /// Starts file logging when `log_dir` is set. Returns whether it did.
    pub fn apply_logging(&self) -> Result<bool, ConfigError> {
        let Some(log_dir) = &self.log_dir else {
            return Ok(false);
        };
        init_logging(&self.log_level, log_dir)?;
        Ok(true)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    Read { path: PathBuf, message: String },
    Parse(String),
    Logging(LoggingError),
    EmptySqlitePath,
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Read { path, message } => {
                write!(f, "failed to read config `{}`: {message}", path.display())
            }
            Self::Parse(message) => write!(f, "invalid config: {message}"),
            Self::Logging(err) => write!(f, "{err}"),
            Self::EmptySqlitePath => write!(f, "sqlite storage path must not be empty"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Logging(err) => Some(err),
            _ => None,
        }
    }
}

impl From<LoggingError> for ConfigError {
    fn from(value: LoggingError) -> Self {
        Self::Logging(value)
    }
}
