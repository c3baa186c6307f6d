//! Isolated test environment with temp directory.

// Allow dead code since this is a test utility shared by several suites
#![allow(dead_code)]

use super::{NotekeepCommand, TestNote};
use notekeep::domain::NoteId;
use notekeep::store::Database;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Isolated test environment with a temporary home and database.
///
/// Creates a temp directory that is automatically cleaned up on drop.
/// Commands built from it never see the user's real configuration.
pub struct TestEnv {
    /// The temporary directory (kept for lifetime management)
    _temp_dir: TempDir,
    /// Stand-in home directory
    home: PathBuf,
}

impl TestEnv {
    /// Creates a new isolated test environment.
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let home = temp_dir.path().to_path_buf();
        Self {
            _temp_dir: temp_dir,
            home,
        }
    }

    /// Returns the stand-in home directory.
    pub fn home(&self) -> &Path {
        &self.home
    }

    /// Returns the path the database lives at.
    pub fn db_path(&self) -> PathBuf {
        self.home.join("data").join("notes.db")
    }

    /// Opens the environment's database directly.
    pub fn open_db(&self) -> Database {
        Database::open(&self.db_path()).expect("Failed to open test database")
    }

    /// Stores a test note in the database.
    pub fn add_note(&self, test_note: &TestNote) {
        self.open_db()
            .upsert_note(&test_note.to_note())
            .expect("Failed to write test note");
    }

    /// Records a tombstone for `id` without touching the notes table.
    pub fn tombstone(&self, id: &str) {
        let id: NoteId = id.parse().expect("Invalid NoteId");
        self.open_db()
            .record_deletion(&id, "2024-01-16T00:00:00.000Z")
            .expect("Failed to record tombstone");
    }

    /// Ids stored in the notes table, sorted, tombstoned or not.
    pub fn stored_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self
            .open_db()
            .read_all()
            .expect("Failed to read notes")
            .iter()
            .map(|n| n.id().to_string())
            .collect();
        ids.sort();
        ids
    }

    /// Writes `config.toml` where the binary will look for it.
    pub fn write_config(&self, content: &str) -> PathBuf {
        let dir = self.home.join(".config").join("notekeep");
        std::fs::create_dir_all(&dir).expect("Failed to create config dir");
        let path = dir.join("config.toml");
        std::fs::write(&path, content).expect("Failed to write config");
        path
    }

    /// Creates a NotekeepCommand configured for this test environment.
    pub fn cmd(&self) -> NotekeepCommand {
        self.cmd_without_db().db(&self.db_path())
    }

    /// Like [`TestEnv::cmd`] but leaves the database path to config resolution.
    pub fn cmd_without_db(&self) -> NotekeepCommand {
        NotekeepCommand::new().home(&self.home)
    }
}

impl Default for TestEnv {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ===========================================
    // TestEnv Foundation
    // ===========================================

    #[test]
    fn test_env_creates_temp_directory() {
        let env = TestEnv::new();
        assert!(env.home().is_dir(), "home should be a directory");
    }

    #[test]
    fn test_env_cleanup_on_drop() {
        let path = {
            let env = TestEnv::new();
            env.home().to_path_buf()
        };
        assert!(!path.exists(), "temp directory should be cleaned up on drop");
    }

    #[test]
    fn test_env_provides_command() {
        let env = TestEnv::new();
        let cmd = env.cmd();
        let args = cmd.get_args();
        assert_eq!(args[0], "--db");
        assert_eq!(args[1], env.db_path().to_string_lossy());
    }

    // ===========================================
    // TestEnv Note Addition
    // ===========================================

    #[test]
    fn test_env_add_note_persists() {
        let env = TestEnv::new();
        env.add_note(&TestNote::new("Stored").id("a"));
        env.add_note(&TestNote::new("Also stored").id("b"));

        assert_eq!(env.stored_ids(), vec!["a", "b"]);
    }

    #[test]
    fn test_env_tombstone_recorded() {
        let env = TestEnv::new();
        env.tombstone("gone");

        let tombstones = env.open_db().load_tombstones().unwrap();
        assert!(tombstones.contains("gone"));
    }
}
