//! Core types: Note, NoteId, Timestamp, Tombstone

mod note;
mod note_id;
mod timestamp;
mod tombstone;

pub use note::Note;
pub use note_id::{NoteId, ParseNoteIdError};
pub use timestamp::{Timestamp, iso_now};
pub use tombstone::Tombstone;
