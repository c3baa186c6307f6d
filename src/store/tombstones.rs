//! Durable record of deleted note ids.

use crate::domain::{NoteId, Tombstone};
use crate::store::{Database, StoreResult};
use std::collections::HashSet;
use tracing::{info, warn};

impl Database {
    /// Records that a note was deleted. Re-recording an id replaces its timestamp.
    pub fn record_deletion(&self, id: &NoteId, deleted_at: &str) -> StoreResult<()> {
        self.conn().execute(
            "INSERT OR REPLACE INTO deleted_notes (id, deletedAt) VALUES (?, ?)",
            [id.as_str(), deleted_at],
        )?;
        Ok(())
    }

    /// Loads every tombstoned id. Called once at startup to seed the in-memory set.
    pub fn load_tombstones(&self) -> StoreResult<HashSet<NoteId>> {
        let ids: HashSet<NoteId> = self
            .tombstones()?
            .into_iter()
            .map(|tombstone| tombstone.id)
            .collect();
        info!(count = ids.len(), "loaded deleted note ids");
        Ok(ids)
    }

    /// Returns every tombstone with its deletion time, oldest first.
    pub fn tombstones(&self) -> StoreResult<Vec<Tombstone>> {
        let mut stmt = self
            .conn()
            .prepare("SELECT id, deletedAt FROM deleted_notes ORDER BY deletedAt, id")?;
        let rows = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, Option<String>>(0)?,
                    row.get::<_, Option<String>>(1)?,
                ))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(rows
            .into_iter()
            .filter_map(|(id, deleted_at)| match id.unwrap_or_default().parse() {
                Ok(id) => Some(Tombstone {
                    id,
                    deleted_at: deleted_at.unwrap_or_default(),
                }),
                Err(e) => {
                    warn!(error = %e, "skipping tombstone row with unusable id");
                    None
                }
            })
            .collect())
    }
}
