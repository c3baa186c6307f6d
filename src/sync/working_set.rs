//! Latest copy of every note the presentation layer has asked to save.

use crate::domain::{Note, NoteId};
use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

/// The service's mirror of the presentation layer's in-memory notes.
///
/// Every save stages the note here before it is written, so a write that
/// fails is retried by the next reconciliation pass.
#[derive(Debug, Default)]
pub struct WorkingSet {
    notes: Mutex<HashMap<NoteId, Note>>,
}

impl WorkingSet {
    /// Records the given notes, replacing older copies with the same id.
    pub fn stage<'n>(&self, notes: impl IntoIterator<Item = &'n Note>) {
        let mut staged = self.notes.lock().unwrap_or_else(PoisonError::into_inner);
        for note in notes {
            staged.insert(note.id().clone(), note.clone());
        }
    }

    pub fn remove(&self, id: &NoteId) {
        self.notes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(id);
    }

    pub fn remove_all(&self, ids: &[NoteId]) {
        let mut staged = self.notes.lock().unwrap_or_else(PoisonError::into_inner);
        for id in ids {
            staged.remove(id);
        }
    }

    /// Returns a copy of every staged note.
    pub fn snapshot(&self) -> Vec<Note> {
        self.notes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.notes.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
