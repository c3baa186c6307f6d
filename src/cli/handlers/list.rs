//! List command handler.

use anyhow::{Context, Result};
use std::path::Path;

use super::{open_database, truncate_str};
use crate::cli::ListArgs;
use crate::cli::output::{NoteListing, Output, OutputFormat};
use crate::domain::Note;

pub fn handle_list(args: &ListArgs, db_path: &Path) -> Result<()> {
    let db = open_database(db_path)?;
    let notes = live_notes(&db)?;

    match args.format {
        OutputFormat::Human => {
            if notes.is_empty() {
                println!("No notes found.");
            } else {
                println!("{:<26}  {:<40}  {:>10}", "ID", "Title", "Updated");
                println!(
                    "{:<26}  {:<40}  {:>10}",
                    "--------------------------",
                    "----------------------------------------",
                    "----------"
                );

                for note in &notes {
                    println!("{}", format_row(note));
                }

                println!();
                println!("{} note(s)", notes.len());
            }
        }
        OutputFormat::Json => {
            let listings: Vec<NoteListing> = notes.iter().map(NoteListing::from).collect();
            let output = Output::new(listings);
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }

    Ok(())
}

/// Every stored note that hasn't been deleted, most recently updated first.
pub(crate) fn live_notes(db: &crate::store::Database) -> Result<Vec<Note>> {
    let tombstones = db
        .load_tombstones()
        .context("failed to load deleted notes")?;
    let mut notes = db.read_all().context("failed to read notes")?;
    notes.retain(|n| !tombstones.contains(n.id()));
    notes.sort_by_key(|n| std::cmp::Reverse(n.updated_at().map(|t| t.to_string())));
    Ok(notes)
}

pub(crate) fn format_row(note: &Note) -> String {
    let title = if note.title().is_empty() {
        "(untitled)".to_string()
    } else {
        truncate_str(note.title(), 40)
    };
    let updated = note
        .updated_at()
        .map(|t| t.to_string().chars().take(10).collect::<String>())
        .unwrap_or_default();
    format!("{:<26}  {:<40}  {:>10}", truncate_str(note.id().as_str(), 26), title, updated)
}
