//! Runtime configuration for embedding the registry core.
//!
//! # Responsibility
//! - Carry the database location, logging settings and delete policy chosen
//!   by the host process.
//! - Open the configured store and start logging with those settings.
//!
//! # Invariants
//! - `db_path: None` means a private in-memory database.
//! - Relative log directories resolve against the current working directory.

use crate::db::{open_db, open_db_in_memory, DbResult};
use crate::logging::{default_log_level, init_logging, LoggingError};
use crate::registry::DeleteMode;
use rusqlite::Connection;
use std::path::PathBuf;

const DEFAULT_LOG_DIR_NAME: &str = "coop-logs";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoreConfig {
    pub db_path: Option<PathBuf>,
    pub log_level: String,
    pub log_dir: Option<PathBuf>,
    pub delete_mode: DeleteMode,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            db_path: None,
            log_level: default_log_level().to_string(),
            log_dir: None,
            delete_mode: DeleteMode::default(),
        }
    }
}

impl CoreConfig {
    /// Opens the configured database with migrations applied.
    pub fn open_db(&self) -> DbResult<Connection> {
        match &self.db_path {
            Some(path) => open_db(path),
            None => open_db_in_memory(),
        }
    }

    /// Absolute log directory; defaults to `coop-logs` under the system temp dir.
    pub fn resolved_log_dir(&self) -> Result<PathBuf, LoggingError> {
        let dir = match &self.log_dir {
            Some(dir) => dir.clone(),
            None => std::env::temp_dir().join(DEFAULT_LOG_DIR_NAME),
        };
        if dir.is_absolute() {
            return Ok(dir);
        }
        std::env::current_dir()
            .map(|cwd| cwd.join(&dir))
            .map_err(|err| LoggingError::InvalidDirectory {
                path: dir,
                reason: err.to_string(),
            })
    }

    pub fn init_logging(&self) -> Result<(), LoggingError> {
        init_logging(&self.log_level, self.resolved_log_dir()?)
    }
}

#[cfg(test)]
mod tests {
    use super::CoreConfig;
    use crate::registry::DeleteMode;
    use std::path::PathBuf;

    #[test]
    fn default_config_uses_memory_db_and_soft_delete() {
        let config = CoreConfig::default();
        assert!(config.db_path.is_none());
        assert_eq!(config.delete_mode, DeleteMode::Soft);
        assert!(config.open_db().is_ok());
    }

    #[test]
    fn relative_log_dir_resolves_against_cwd() {
        let config = CoreConfig {
            log_dir: Some(PathBuf::from("logs")),
            ..CoreConfig::default()
        };
        let resolved = config.resolved_log_dir().unwrap();
        assert!(resolved.is_absolute());
        assert!(resolved.ends_with("logs"));
    }

    #[test]
    fn file_db_is_created_on_open() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("coop.sqlite3");
        let config = CoreConfig {
            db_path: Some(path.clone()),
            ..CoreConfig::default()
        };
        config.open_db().unwrap();
        assert!(path.exists());
    }
}
