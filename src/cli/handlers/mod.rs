//! Command handlers for the CLI.

mod completions;
mod list;
mod migrate;
mod serve;


use anyhow::{Context, Result};
use std::path::Path;

use crate::store::Database;

// Re-export public items
pub use completions::handle_completions;
pub use list::handle_list;
pub use migrate::handle_migrate;
pub use serve::handle_serve;

// ===========================================
// Shared Utilities
// ===========================================

/// Opens the notes database, running the schema migrator.
pub(crate) fn open_database(db_path: &Path) -> Result<Database> {
    Database::open(db_path)
        .with_context(|| format!("failed to open database at {}", db_path.display()))
}

/// Truncates a string to a maximum display width, adding ellipsis if needed.
pub(crate) fn truncate_str(s: &str, max_width: usize) -> String {
    if s.chars().count() <= max_width {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max_width.saturating_sub(1)).collect();
        format!("{}…", truncated)
    }
}
