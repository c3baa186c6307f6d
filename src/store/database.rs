//! Connection management for the notes database.

use crate::store::schema::{Migration, create_tombstone_table, ensure_schema};
use crate::store::transaction::Transaction;
use crate::store::{StoreError, StoreResult};
use rusqlite::Connection;
use std::fs;
use std::path::Path;
use tracing::{debug, error, info};

/// The notes database: one SQLite connection holding `notes` and `deleted_notes`.
///
/// Constructed once at startup and handed to the synchronization service,
/// which owns it for the rest of the process.
pub struct Database {
    conn: Connection,
    migration: Option<Migration>,
}

impl Database {
    // ===========================================
    // In-Memory Connection
    // ===========================================

    /// Opens an in-memory database with the notes schema.
    ///
    /// This is useful for testing and for runs that don't need persistence.
    pub fn open_in_memory() -> StoreResult<Self> {
        let conn = Connection::open_in_memory()?;
        Self::init(conn)
    }

    // ===========================================
    // File-Based Connection
    // ===========================================

    /// Opens or creates the database at the given path.
    ///
    /// Creates parent directories if they don't exist, then brings the schema
    /// up to date.
    pub fn open(path: &Path) -> StoreResult<Self> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            fs::create_dir_all(parent).map_err(|e| StoreError::Io {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        let conn = Connection::open(path)?;
        info!(path = %path.display(), "opened notes database");
        Self::init(conn)
    }

    /// Runs the migrator, then creates the tombstone table.
    ///
    /// A failed migration is logged and startup continues with whatever
    /// schema exists.
    fn init(conn: Connection) -> StoreResult<Self> {
        let migration = match ensure_schema(&conn) {
            Ok(migration) => {
                debug!(?migration, "schema check finished");
                Some(migration)
            }
            Err(e) => {
                error!(error = %e, "schema migration abandoned, continuing with existing schema");
                None
            }
        };
        create_tombstone_table(&conn)?;
        Ok(Self { conn, migration })
    }

    // ===========================================
    // Accessors
    // ===========================================

    /// Returns what the migrator did when this database was opened.
    ///
    /// `None` means the migration failed.
    pub fn migration(&self) -> Option<&Migration> {
        self.migration.as_ref()
    }

    /// Returns a reference to the underlying SQLite connection.
    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Begins a new transaction.
    ///
    /// The transaction will automatically rollback on drop unless `commit()` is called.
    pub fn transaction(&mut self) -> StoreResult<Transaction<'_>> {
        Ok(Transaction::begin(&self.conn)?)
    }
}
