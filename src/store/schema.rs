//! SQLite schema creation and the notes table migrator.

use crate::store::transaction::Transaction;
use crate::store::{MigrationStep, StoreError, StoreResult};
use rusqlite::Connection;
use tracing::{info, warn};

/// Columns the `notes` table must have, in declaration order.
pub const NOTE_COLUMNS: [&str; 5] = ["id", "title", "content", "updatedAt", "coverImage"];

/// Temporary name the old table takes while it is being rebuilt.
pub const BACKUP_TABLE: &str = "notes_old";

const CREATE_NOTES: &str = "CREATE TABLE notes (
    id TEXT PRIMARY KEY,
    title TEXT,
    content TEXT,
    updatedAt TEXT,
    coverImage TEXT
);";

/// What `ensure_schema` did to the notes table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Migration {
    /// The table did not exist and was created.
    Created,
    /// The table already had every required column. Nothing was touched.
    UpToDate,
    /// The table was rebuilt with the full column set.
    Upgraded {
        added_columns: Vec<String>,
        copied_rows: usize,
    },
}

/// Ensures the `notes` table exists with every column in [`NOTE_COLUMNS`].
///
/// An outdated table is rebuilt with rename, create, copy and drop. Only the
/// columns present in both the old and new tables are copied. The whole
/// sequence runs in one transaction, so a failing step leaves the previous
/// schema in place and is reported as [`StoreError::Migration`].
///
/// A backup table left behind without a `notes` table (an interrupted
/// upgrade by an older build) is renamed back before anything else.
///
/// Idempotent: on an up-to-date table this is a read-only no-op.
pub fn ensure_schema(conn: &Connection) -> StoreResult<Migration> {
    let tx = Transaction::begin(conn).map_err(failed(MigrationStep::Inspect))?;

    if !table_exists(tx.conn(), "notes").map_err(failed(MigrationStep::Inspect))? {
        if table_exists(tx.conn(), BACKUP_TABLE).map_err(failed(MigrationStep::Inspect))? {
            warn!(backup = BACKUP_TABLE, "restoring notes table from interrupted migration");
            tx.conn()
                .execute_batch(&format!("ALTER TABLE {BACKUP_TABLE} RENAME TO notes"))
                .map_err(failed(MigrationStep::Restore))?;
        } else {
            tx.conn()
                .execute_batch(CREATE_NOTES)
                .map_err(failed(MigrationStep::Create))?;
            tx.commit().map_err(failed(MigrationStep::Commit))?;
            info!("created notes table");
            return Ok(Migration::Created);
        }
    }

    let existing = table_columns(tx.conn(), "notes").map_err(failed(MigrationStep::Inspect))?;
    let has = |column: &str| existing.iter().any(|c| c.eq_ignore_ascii_case(column));

    let added_columns: Vec<String> = NOTE_COLUMNS
        .iter()
        .copied()
        .filter(|&column| !has(column))
        .map(|column| column.to_string())
        .collect();

    if added_columns.is_empty() {
        tx.commit().map_err(failed(MigrationStep::Commit))?;
        return Ok(Migration::UpToDate);
    }

    info!(missing = ?added_columns, "migrating notes table");

    tx.conn()
        .execute_batch(&format!("ALTER TABLE notes RENAME TO {BACKUP_TABLE}"))
        .map_err(failed(MigrationStep::Rename))?;

    tx.conn()
        .execute_batch(CREATE_NOTES)
        .map_err(failed(MigrationStep::Create))?;

    let shared = NOTE_COLUMNS
        .iter()
        .copied()
        .filter(|&column| has(column))
        .map(|column| format!("\"{column}\""))
        .collect::<Vec<_>>()
        .join(", ");

    let copied_rows = if shared.is_empty() {
        0
    } else {
        tx.conn()
            .execute(
                &format!("INSERT INTO notes ({shared}) SELECT {shared} FROM {BACKUP_TABLE}"),
                [],
            )
            .map_err(failed(MigrationStep::Copy))?
    };

    tx.conn()
        .execute_batch(&format!("DROP TABLE {BACKUP_TABLE}"))
        .map_err(failed(MigrationStep::Drop))?;

    tx.commit().map_err(failed(MigrationStep::Commit))?;

    info!(copied_rows, "notes table migration complete");
    Ok(Migration::Upgraded {
        added_columns,
        copied_rows,
    })
}

/// Creates the `deleted_notes` table if it does not exist.
pub fn create_tombstone_table(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS deleted_notes (
            id TEXT PRIMARY KEY,
            deletedAt TEXT
        );",
    )
}

/// Returns the column names of a table, in declaration order.
pub fn table_columns(conn: &Connection, table: &str) -> rusqlite::Result<Vec<String>> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table})"))?;
    let columns = stmt
        .query_map([], |row| row.get::<_, String>(1))?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(columns)
}

fn table_exists(conn: &Connection, name: &str) -> rusqlite::Result<bool> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?",
        [name],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

fn failed(step: MigrationStep) -> impl Fn(rusqlite::Error) -> StoreError {
    move |source| StoreError::Migration { step, source }
}
