//! Application configuration
//!
//! Loaded from `config.toml` under the platform data directory. Every
//! field has a default; a missing file means all defaults.

use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use serde::Deserialize;

use campusloop_core::{Error, Result};

/// Default interval between expiry sweeps, in minutes
const DEFAULT_SWEEP_INTERVAL_MINUTES: u64 = 10;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Port for the notification server
    pub port: u16,
    /// Database file path; defaults to the platform data directory
    pub database_path: Option<PathBuf>,
    /// Minutes between expiry sweeps
    pub sweep_interval_minutes: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: campusloop_notify::DEFAULT_PORT,
            database_path: None,
            sweep_interval_minutes: DEFAULT_SWEEP_INTERVAL_MINUTES,
        }
    }
}

impl Config {
    /// Load configuration from the default location
    pub fn load() -> Result<Self> {
        let path = data_dir()?.join("config.toml");
        Self::load_from(&path)
    }

    /// Load configuration from a specific file, falling back to
    /// defaults when it does not exist
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(path)?;
        toml::from_str(&contents)
            .map_err(|e| Error::InvalidInput(format!("Bad config {}: {}", path.display(), e)))
    }

    /// Resolve the database path, creating parent directories
    pub fn resolve_database_path(&self) -> Result<PathBuf> {
        let path = match &self.database_path {
            Some(path) => path.clone(),
            None => data_dir()?.join("campusloop.db"),
        };

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        Ok(path)
    }
}

/// Platform data directory for Campusloop
fn data_dir() -> Result<PathBuf> {
    let dirs = ProjectDirs::from("org", "campusloop", "campusloop").ok_or_else(|| {
        Error::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "Could not determine data directory",
        ))
    })?;

    Ok(dirs.data_dir().to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_uses_defaults() {
        let config = Config::load_from(Path::new("/nonexistent/config.toml")).unwrap();
        assert_eq!(config.port, campusloop_notify::DEFAULT_PORT);
        assert_eq!(config.sweep_interval_minutes, DEFAULT_SWEEP_INTERVAL_MINUTES);
        assert!(config.database_path.is_none());
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "port = 9000\n").unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.port, 9000);
        assert_eq!(config.sweep_interval_minutes, DEFAULT_SWEEP_INTERVAL_MINUTES);
    }

    #[test]
    fn test_bad_file_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "port = \"not a number\"\n").unwrap();

        assert!(Config::load_from(&path).is_err());
    }

    #[test]
    fn test_explicit_database_path() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("nested").join("booking.db");

        let config = Config {
            database_path: Some(db_path.clone()),
            ..Config::default()
        };

        let resolved = config.resolve_database_path().unwrap();
        assert_eq!(resolved, db_path);
        // Parent directory was created
        assert!(db_path.parent().unwrap().exists());
    }
}
