//! Output format types for CLI commands.

use clap::ValueEnum;
use serde::Serialize;

use crate::domain::Note;
use crate::store::Migration;

/// Output format for command results.
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable output (default)
    #[default]
    Human,
    /// JSON output for programmatic consumption
    Json,
}

/// Wrapper for serializable command output.
#[derive(Debug, Serialize)]
pub struct Output<T: Serialize> {
    pub data: T,
}

impl<T: Serialize> Output<T> {
    pub fn new(data: T) -> Self {
        Self { data }
    }
}

/// A single note in listing output.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteListing {
    pub id: String,
    pub title: String,
    pub updated_at: Option<String>,
    pub has_cover: bool,
}

impl From<&Note> for NoteListing {
    fn from(note: &Note) -> Self {
        Self {
            id: note.id().to_string(),
            title: note.title().to_string(),
            updated_at: note.updated_at().map(|t| t.to_string()),
            has_cover: note.cover_image().is_some(),
        }
    }
}

/// Outcome of `migrate`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MigrationReport {
    pub path: String,
    pub outcome: &'static str,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub added_columns: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub copied_rows: Option<usize>,
    pub tombstones: usize,
}

impl MigrationReport {
    pub fn new(path: String, migration: Option<&Migration>, tombstones: usize) -> Self {
        let (outcome, added_columns, copied_rows) = match migration {
            Some(Migration::Created) => ("created", Vec::new(), None),
            Some(Migration::UpToDate) => ("up-to-date", Vec::new(), None),
            Some(Migration::Upgraded {
                added_columns,
                copied_rows,
            }) => ("upgraded", added_columns.clone(), Some(*copied_rows)),
            None => ("failed", Vec::new(), None),
        };
        Self {
            path,
            outcome,
            added_columns,
            copied_rows,
            tombstones,
        }
    }
}
