//! Note struct: a user document as exchanged with the presentation layer.

use crate::domain::{NoteId, Timestamp};
use serde::{Deserialize, Deserializer, Serialize};

/// A user document.
///
/// The persistence core never looks inside `content`: it is rich text
/// serialized as markup and stored as-is. `created_at` is carried for the
/// presentation layer but never persisted.
///
/// # Examples
///
/// ```
/// use notekeep::domain::{Note, NoteId};
///
/// let id: NoteId = "n1".parse().unwrap();
/// let note = Note::new(id, "Hi", "<p>hello</p>");
/// assert_eq!(note.title(), "Hi");
/// assert!(note.updated_at().is_some());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    id: NoteId,
    #[serde(default, deserialize_with = "null_as_empty")]
    title: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    content: String,
    #[serde(
        default,
        deserialize_with = "crate::domain::timestamp::deserialize_lenient",
        skip_serializing_if = "Option::is_none"
    )]
    created_at: Option<Timestamp>,
    #[serde(
        default,
        deserialize_with = "crate::domain::timestamp::deserialize_lenient",
        skip_serializing_if = "Option::is_none"
    )]
    updated_at: Option<Timestamp>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    cover_image: Option<String>,
}

impl Note {
    /// Creates a note stamped with the current time as both created and updated.
    pub fn new(id: NoteId, title: impl Into<String>, content: impl Into<String>) -> Self {
        let now = Timestamp::now();
        Self {
            id,
            title: title.into(),
            content: content.into(),
            created_at: Some(now.clone()),
            updated_at: Some(now),
            cover_image: None,
        }
    }

    /// Rebuilds a note from a stored row.
    pub(crate) fn from_stored(
        id: NoteId,
        title: String,
        content: String,
        updated_at: Option<String>,
        cover_image: Option<String>,
    ) -> Self {
        Self {
            id,
            title,
            content,
            created_at: None,
            updated_at: updated_at.map(Timestamp::Text),
            cover_image,
        }
    }

    /// Sets the cover image.
    pub fn with_cover_image(mut self, data_uri: impl Into<String>) -> Self {
        self.cover_image = Some(data_uri.into());
        self
    }

    /// Sets the update timestamp, or clears it with `None`.
    pub fn with_updated_at(mut self, updated_at: Option<Timestamp>) -> Self {
        self.updated_at = updated_at;
        self
    }

    /// Returns the note's identifier.
    pub fn id(&self) -> &NoteId {
        &self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn created_at(&self) -> Option<&Timestamp> {
        self.created_at.as_ref()
    }

    pub fn updated_at(&self) -> Option<&Timestamp> {
        self.updated_at.as_ref()
    }

    pub fn cover_image(&self) -> Option<&str> {
        self.cover_image.as_deref()
    }

    /// Returns the `updatedAt` value that would be written to storage.
    pub fn normalized_updated_at(&self) -> String {
        Timestamp::normalize(self.updated_at.as_ref())
    }

    // ===========================================
    // Mutations (each one touches updatedAt)
    // ===========================================

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = title.into();
        self.touch();
    }

    pub fn set_content(&mut self, content: impl Into<String>) {
        self.content = content.into();
        self.touch();
    }

    /// Replaces or removes the cover image.
    pub fn set_cover_image(&mut self, cover_image: Option<String>) {
        self.cover_image = cover_image;
        self.touch();
    }

    fn touch(&mut self) {
        self.updated_at = Some(Timestamp::now());
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}
