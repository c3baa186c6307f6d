//! SQLite-backed note and tombstone storage.

mod database;
mod error;
mod notes;
pub mod schema;
mod tombstones;
mod transaction;


pub use database::Database;
pub use error::{MigrationStep, StoreError, StoreResult};
pub use notes::BatchReport;
pub use schema::Migration;
pub use transaction::Transaction;
