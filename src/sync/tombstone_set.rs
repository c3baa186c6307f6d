//! In-memory mirror of the `deleted_notes` table.

use crate::domain::NoteId;
use std::collections::HashSet;
use std::sync::{PoisonError, RwLock};

/// Write-through cache of deleted note ids.
///
/// Seeded once from the durable table at startup. An id is inserted only
/// after its tombstone row has committed, so a deletion never looks
/// complete in memory while it could still be lost on a crash.
#[derive(Debug, Default)]
pub struct TombstoneSet {
    ids: RwLock<HashSet<NoteId>>,
}

impl TombstoneSet {
    pub fn new(ids: HashSet<NoteId>) -> Self {
        Self {
            ids: RwLock::new(ids),
        }
    }

    pub fn contains(&self, id: &NoteId) -> bool {
        self.ids
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(id)
    }

    pub fn len(&self) -> usize {
        self.ids.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Marks an id as deleted. Callers must have committed the durable row first.
    pub(crate) fn insert(&self, id: NoteId) {
        self.ids
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id);
    }
}
