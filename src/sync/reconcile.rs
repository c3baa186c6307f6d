//! The reconciliation pass: merge, purge, re-persist.

use crate::domain::{Note, NoteId};
use crate::store::{Database, StoreResult};
use crate::sync::{TombstoneSet, WorkingSet};
use serde::Serialize;
use std::collections::HashMap;
use tracing::{error, warn};

/// What one reconciliation pass did.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReconcileReport {
    /// Live notes after the merge.
    pub live: usize,
    /// Live notes written back successfully.
    pub written: usize,
    /// Live notes whose write failed.
    pub failed: usize,
    /// Tombstoned rows removed from the notes table.
    pub purged: usize,
}

/// Runs one pass against the database.
///
/// Durable rows are merged with the working set (the working-set copy
/// wins), tombstoned ids are purged from both, and the live set is written
/// back. Purge and per-row write failures are logged and the pass carries
/// on. Only a failed read or a failed batch transaction aborts it.
pub fn reconcile(
    db: &mut Database,
    working_set: &WorkingSet,
    tombstones: &TombstoneSet,
) -> StoreResult<ReconcileReport> {
    let mut merged: HashMap<NoteId, Note> = db
        .read_all()?
        .into_iter()
        .map(|note| (note.id().clone(), note))
        .collect();
    for note in working_set.snapshot() {
        merged.insert(note.id().clone(), note);
    }

    let (deleted, live): (Vec<Note>, Vec<Note>) = merged
        .into_values()
        .partition(|note| tombstones.contains(note.id()));

    let deleted_ids: Vec<NoteId> = deleted.iter().map(|note| note.id().clone()).collect();
    working_set.remove_all(&deleted_ids);

    let purged = match db.purge_notes(&deleted_ids) {
        Ok(purged) => purged,
        Err(e) => {
            error!(error = %e, count = deleted_ids.len(), "failed to purge deleted notes");
            0
        }
    };

    let batch = db.upsert_notes(&live)?;
    if !batch.is_complete() {
        warn!(failed = batch.failed.len(), "reconciliation could not write every note");
    }

    Ok(ReconcileReport {
        live: live.len(),
        written: batch.written,
        failed: batch.failed.len(),
        purged,
    })
}
