//! Configuration file support.

use anyhow::{Context, Result, bail};
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

use crate::sync::DEFAULT_RECONCILE_INTERVAL;

/// Application configuration loaded from config file.
#[derive(Debug, Default, Deserialize)]
pub struct Config {
    /// Notes database file
    pub db_path: Option<PathBuf>,

    /// Seconds between reconciliation passes
    pub reconcile_interval_secs: Option<u64>,
}

impl Config {
    /// Load configuration from the default config file location.
    ///
    /// Returns default config if the file doesn't exist.
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path();

        if !config_path.exists() {
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(&config_path)
            .with_context(|| format!("failed to read config file: {}", config_path.display()))?;

        toml::from_str(&contents)
            .with_context(|| format!("failed to parse config file: {}", config_path.display()))
    }

    /// Returns the path to the config file.
    ///
    /// Default: `~/.config/notekeep/config.toml`
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("notekeep")
            .join("config.toml")
    }

    /// Resolve the database path, with CLI argument taking precedence.
    ///
    /// Precedence order:
    /// 1. CLI `--db` argument
    /// 2. Config file `db_path` setting
    /// 3. `notes.db` in the platform data directory
    pub fn db_path(&self, cli_db: Option<&PathBuf>) -> PathBuf {
        cli_db
            .cloned()
            .or_else(|| self.db_path.clone())
            .unwrap_or_else(|| {
                dirs::data_dir()
                    .unwrap_or_else(|| PathBuf::from("."))
                    .join("notekeep")
                    .join("notes.db")
            })
    }

    /// Resolve the reconciliation interval: CLI, then config, then 10 seconds.
    pub fn reconcile_interval(&self, cli_secs: Option<u64>) -> Result<Duration> {
        match cli_secs.or(self.reconcile_interval_secs) {
            Some(0) => bail!("reconcile interval must be at least one second"),
            Some(secs) => Ok(Duration::from_secs(secs)),
            None => Ok(DEFAULT_RECONCILE_INTERVAL),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_has_no_db_path() {
        let config = Config::default();
        assert!(config.db_path.is_none());
    }

    #[test]
    fn db_path_prefers_cli_arg() {
        let config = Config {
            db_path: Some(PathBuf::from("/config/notes.db")),
            reconcile_interval_secs: None,
        };
        let cli_db = PathBuf::from("/cli/notes.db");
        assert_eq!(config.db_path(Some(&cli_db)), PathBuf::from("/cli/notes.db"));
    }

    #[test]
    fn db_path_falls_back_to_config() {
        let config = Config {
            db_path: Some(PathBuf::from("/config/notes.db")),
            reconcile_interval_secs: None,
        };
        assert_eq!(config.db_path(None), PathBuf::from("/config/notes.db"));
    }

    #[test]
    fn db_path_defaults_to_data_dir() {
        let config = Config::default();
        assert!(config.db_path(None).ends_with("notekeep/notes.db"));
    }

    #[test]
    fn interval_precedence() {
        let config = Config {
            db_path: None,
            reconcile_interval_secs: Some(30),
        };
        assert_eq!(config.reconcile_interval(None).unwrap(), Duration::from_secs(30));
        assert_eq!(config.reconcile_interval(Some(2)).unwrap(), Duration::from_secs(2));
        assert_eq!(
            Config::default().reconcile_interval(None).unwrap(),
            Duration::from_secs(10)
        );
    }

    #[test]
    fn zero_interval_is_rejected() {
        assert!(Config::default().reconcile_interval(Some(0)).is_err());
    }

    #[test]
    fn parses_toml() {
        let config: Config =
            toml::from_str("db_path = \"/tmp/n.db\"\nreconcile_interval_secs = 5\n").unwrap();
        assert_eq!(config.db_path, Some(PathBuf::from("/tmp/n.db")));
        assert_eq!(config.reconcile_interval_secs, Some(5));
    }

    #[test]
    fn config_path_is_in_config_dir() {
        let path = Config::config_path();
        assert!(path.ends_with("notekeep/config.toml"));
    }
}
