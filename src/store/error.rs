//! Store error type.

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// The step of the rename-recreate-copy-drop migration that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MigrationStep {
    Inspect,
    Restore,
    Rename,
    Create,
    Copy,
    Drop,
    Commit,
}

impl fmt::Display for MigrationStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MigrationStep::Inspect => "inspect table",
            MigrationStep::Restore => "restore backup table",
            MigrationStep::Rename => "rename table",
            MigrationStep::Create => "create table",
            MigrationStep::Copy => "copy rows",
            MigrationStep::Drop => "drop backup table",
            MigrationStep::Commit => "commit",
        };
        f.write_str(name)
    }
}

/// Errors that can occur during store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A database error occurred.
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// A schema migration step failed and the migration was abandoned.
    #[error("migration failed at step '{step}': {source}")]
    Migration {
        step: MigrationStep,
        #[source]
        source: rusqlite::Error,
    },

    /// An I/O error occurred.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
