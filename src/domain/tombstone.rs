//! Deletion marker for a note id.

use crate::domain::NoteId;
use serde::Serialize;

/// A durable record that a note was deleted.
///
/// Once an id has a tombstone it must never be served again, even if a stale
/// copy of the note is saved later.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Tombstone {
    pub id: NoteId,
    pub deleted_at: String,
}
