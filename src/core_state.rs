//! Shared application state.
//!
//! Holds what every request needs: where the database lives and how result
//! notifications are delivered. Each caller opens its own connection.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::db;
use crate::notifications::{Notifier, TracingNotifier};

pub struct CoreState {
    db_path: PathBuf,
    notifier: Arc<dyn Notifier>,
}

impl CoreState {
    /// State over the database at `db_path`, delivering through the log.
    pub fn new(db_path: impl Into<PathBuf>) -> Self {
        Self::with_notifier(db_path, Arc::new(TracingNotifier))
    }

    pub fn with_notifier(db_path: impl Into<PathBuf>, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            db_path: db_path.into(),
            notifier,
        }
    }

    /// Open a database connection (migrations are applied on open).
    pub fn open_db(&self) -> Result<rusqlite::Connection, CoreError> {
        db::open_database(&self.db_path).map_err(CoreError::Database)
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    pub fn notifier(&self) -> &dyn Notifier {
        self.notifier.as_ref()
    }

    /// Create the database directory and apply migrations once at startup.
    pub fn prepare_storage(&self) -> Result<(), CoreError> {
        if let Some(parent) = self.db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| CoreError::Storage(e.to_string()))?;
        }
        let conn = self.open_db()?;
        let version = db::get_current_version(&conn);
        tracing::info!(path = %self.db_path.display(), version, "Database ready");
        Ok(())
    }
}

/// Errors from CoreState operations.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Database error: {0}")]
    Database(#[from] db::DatabaseError),
    #[error("Storage error: {0}")]
    Storage(String),
}
