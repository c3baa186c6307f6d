//! Builder for test notes with sensible defaults.

// Allow dead code since this is a test utility shared by several suites
#![allow(dead_code)]

use notekeep::domain::{Note, NoteId, Timestamp};
use serde_json::{Value, json};

/// Builder for creating test notes with sensible defaults.
///
/// Automatically generates an ID and a fixed update timestamp, with a
/// fluent API for setting optional fields.
#[derive(Debug, Clone)]
pub struct TestNote {
    id: NoteId,
    title: String,
    content: String,
    updated_at: Timestamp,
    cover_image: Option<String>,
}

impl TestNote {
    /// Creates a new test note with the given title.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            id: NoteId::new(),
            title: title.into(),
            content: String::new(),
            updated_at: Timestamp::Text("2024-01-15T10:30:00.000Z".to_string()),
            cover_image: None,
        }
    }

    /// Sets an explicit ID for the note.
    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into().parse().expect("Invalid NoteId");
        self
    }

    /// Sets the rich-text content.
    pub fn content(mut self, content: impl Into<String>) -> Self {
        self.content = content.into();
        self
    }

    /// Sets `updatedAt` as epoch milliseconds.
    pub fn updated_millis(mut self, millis: i64) -> Self {
        self.updated_at = Timestamp::Millis(millis);
        self
    }

    /// Sets `updatedAt` as a string.
    pub fn updated(mut self, updated_at: impl Into<String>) -> Self {
        self.updated_at = Timestamp::Text(updated_at.into());
        self
    }

    pub fn cover(mut self, data_uri: impl Into<String>) -> Self {
        self.cover_image = Some(data_uri.into());
        self
    }

    /// Returns the note's id as a string.
    pub fn id_str(&self) -> &str {
        self.id.as_str()
    }

    pub fn get_title(&self) -> &str {
        &self.title
    }

    /// Converts to a domain `Note`.
    pub fn to_note(&self) -> Note {
        let note = Note::new(self.id.clone(), self.title.clone(), self.content.clone())
            .with_updated_at(Some(self.updated_at.clone()));
        match &self.cover_image {
            Some(cover) => note.with_cover_image(cover.clone()),
            None => note,
        }
    }

    /// Converts to the wire shape the presentation layer sends.
    pub fn to_json(&self) -> Value {
        let mut value = json!({
            "id": self.id.as_str(),
            "title": self.title,
            "content": self.content,
            "updatedAt": self.updated_at,
        });
        if let Some(cover) = &self.cover_image {
            value["coverImage"] = json!(cover);
        }
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_note_defaults() {
        let note = TestNote::new("Defaults").to_note();
        assert_eq!(note.title(), "Defaults");
        assert_eq!(note.content(), "");
        assert!(note.cover_image().is_none());
    }

    #[test]
    fn test_note_json_matches_domain_shape() {
        let test_note = TestNote::new("Wire").id("n1").content("<p>x</p>").cover("data:c");
        let parsed: Note = serde_json::from_value(test_note.to_json()).unwrap();
        assert_eq!(parsed.id().as_str(), "n1");
        assert_eq!(parsed.content(), "<p>x</p>");
        assert_eq!(parsed.cover_image(), Some("data:c"));
    }
}
