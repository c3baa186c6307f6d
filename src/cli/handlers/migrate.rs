//! Migrate command handler.

use anyhow::{Context, Result};
use std::path::Path;

use super::open_database;
use crate::cli::MigrateArgs;
use crate::cli::output::{MigrationReport, Output, OutputFormat};

pub fn handle_migrate(args: &MigrateArgs, db_path: &Path) -> Result<()> {
    let db = open_database(db_path)?;
    let tombstones = db
        .load_tombstones()
        .context("failed to load deleted notes")?
        .len();
    let report = MigrationReport::new(db_path.display().to_string(), db.migration(), tombstones);

    match args.format {
        OutputFormat::Human => {
            match report.outcome {
                "created" => println!("Created new database at {}", report.path),
                "up-to-date" => println!("Schema is up to date: {}", report.path),
                "upgraded" => {
                    println!("Upgraded schema at {}", report.path);
                    println!("  added columns: {}", report.added_columns.join(", "));
                    println!("  copied rows:   {}", report.copied_rows.unwrap_or(0));
                }
                _ => eprintln!("Migration failed, continuing with the existing schema"),
            }
            println!("{} deleted note(s) on record", report.tombstones);
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&Output::new(&report))?);
        }
    }

    Ok(())
}
