//! Note rows: full-scan read, upsert, delete.

use crate::domain::{Note, NoteId};
use crate::store::{Database, StoreError, StoreResult, Transaction};
use rusqlite::{Connection, params};
use std::collections::VecDeque;
use tracing::{debug, warn};

const UPSERT_NOTE: &str = "INSERT OR REPLACE INTO notes (id, title, content, updatedAt, coverImage)
     VALUES (?1, ?2, ?3, ?4, ?5)";

/// Outcome of a batch upsert.
///
/// Rows are written independently: one failing row does not stop the rest.
#[derive(Debug, Default)]
pub struct BatchReport {
    pub written: usize,
    pub failed: Vec<(NoteId, StoreError)>,
}

impl BatchReport {
    /// Returns true if every row was written.
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

impl Database {
    /// Returns every note row, tombstoned or not.
    ///
    /// Filtering deleted notes is the caller's job. Rows whose id is blank
    /// cannot be represented and are skipped with a warning.
    pub fn read_all(&self) -> StoreResult<Vec<Note>> {
        let mut stmt = self.conn().prepare(
            "SELECT id, title, content, updatedAt, coverImage FROM notes ORDER BY rowid",
        )?;
        let rows = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, Option<String>>(0)?,
                    row.get::<_, Option<String>>(1)?,
                    row.get::<_, Option<String>>(2)?,
                    row.get::<_, Option<String>>(3)?,
                    row.get::<_, Option<String>>(4)?,
                ))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        let mut notes = Vec::with_capacity(rows.len());
        for (id, title, content, updated_at, cover_image) in rows {
            let id = match id.unwrap_or_default().parse::<NoteId>() {
                Ok(id) => id,
                Err(e) => {
                    warn!(error = %e, "skipping note row with unusable id");
                    continue;
                }
            };
            notes.push(Note::from_stored(
                id,
                title.unwrap_or_default(),
                content.unwrap_or_default(),
                updated_at,
                cover_image,
            ));
        }
        Ok(notes)
    }

    /// Inserts or replaces one note by id, normalizing `updatedAt`.
    pub fn upsert_note(&self, note: &Note) -> StoreResult<()> {
        write_row(self.conn(), note)?;
        Ok(())
    }

    /// Inserts or replaces many notes with one prepared statement in one transaction.
    ///
    /// A row that fails is logged, recorded in the report, and skipped. If
    /// the failure made SQLite abandon the transaction, the rows already
    /// written are replayed in a fresh one so only the failing row is lost.
    /// Only failing to open or commit a transaction fails the whole batch.
    pub fn upsert_notes<'n>(
        &mut self,
        notes: impl IntoIterator<Item = &'n Note>,
    ) -> StoreResult<BatchReport> {
        let mut queue: VecDeque<&Note> = notes.into_iter().collect();
        let mut written: Vec<&Note> = Vec::with_capacity(queue.len());
        let mut report = BatchReport::default();

        let mut tx = Transaction::begin(self.conn())?;
        while let Some(note) = queue.pop_front() {
            match write_row(tx.conn(), note) {
                Ok(()) => written.push(note),
                Err(e) => {
                    warn!(id = %note.id(), error = %e, "failed to save note, skipping it");
                    report.failed.push((note.id().clone(), e.into()));
                    if !tx.is_active() {
                        warn!(replayed = written.len(), "batch transaction was rolled back");
                        for earlier in written.drain(..).rev() {
                            queue.push_front(earlier);
                        }
                        drop(tx);
                        tx = Transaction::begin(self.conn())?;
                    }
                }
            }
        }
        tx.commit()?;

        report.written = written.len();
        debug!(written = report.written, failed = report.failed.len(), "batch upsert finished");
        Ok(report)
    }

    /// Deletes a note row. Returns whether a row existed.
    pub fn delete_note(&self, id: &NoteId) -> StoreResult<bool> {
        let rows = self
            .conn()
            .execute("DELETE FROM notes WHERE id = ?", [id.as_str()])?;
        Ok(rows > 0)
    }

    /// Deletes a note row, then records its tombstone, in one transaction.
    ///
    /// If the delete fails the tombstone is never written. Returns whether a
    /// row existed.
    pub fn delete_with_tombstone(&mut self, id: &NoteId, deleted_at: &str) -> StoreResult<bool> {
        let tx = self.transaction()?;
        let rows = tx.execute("DELETE FROM notes WHERE id = ?", [id.as_str()])?;
        tx.execute(
            "INSERT OR REPLACE INTO deleted_notes (id, deletedAt) VALUES (?, ?)",
            [id.as_str(), deleted_at],
        )?;
        tx.commit()?;
        Ok(rows > 0)
    }

    /// Deletes many note rows in one transaction. Returns the number removed.
    pub fn purge_notes(&mut self, ids: &[NoteId]) -> StoreResult<usize> {
        if ids.is_empty() {
            return Ok(0);
        }
        let tx = self.transaction()?;
        let mut removed = 0;
        {
            let mut stmt = tx.conn().prepare_cached("DELETE FROM notes WHERE id = ?")?;
            for id in ids {
                removed += stmt.execute([id.as_str()])?;
            }
        }
        tx.commit()?;
        Ok(removed)
    }
}

fn write_row(conn: &Connection, note: &Note) -> rusqlite::Result<()> {
    let mut stmt = conn.prepare_cached(UPSERT_NOTE)?;
    stmt.execute(params![
        note.id().as_str(),
        note.title(),
        note.content(),
        note.normalized_updated_at(),
        note.cover_image(),
    ])?;
    Ok(())
}
