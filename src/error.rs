//! Error types for the tracker.
//!
//! Validation failures surface at the boundary before anything is persisted;
//! the salary engine itself is total over validated inputs and has no error
//! cases of its own.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TrackerError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("cafe {0} not found")]
    CafeNotFound(i64),

    #[error("invalid {field}: {reason}")]
    Invalid { field: &'static str, reason: String },

    #[error("home directory not found")]
    HomeDirNotFound,

    #[error("failed to create database directory: {0}")]
    CreateDir(std::io::Error),

    #[error("migration failed: {0}")]
    Migration(String),
}

impl TrackerError {
    pub fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            field,
            reason: reason.into(),
        }
    }

    /// Returns true when the error means the caller referenced something
    /// that does not exist (maps to 404 in an HTTP adapter).
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::CafeNotFound(_))
    }
}
