//! File system paths for the bridge.

use crate::{CoreError, CoreResult};
use std::path::PathBuf;

const BASE_DIR_NAME: &str = ".fb-bridge";

/// Manages file system paths for the bridge.
#[derive(Debug, Clone)]
pub struct Paths {
    /// Base directory for bridge files (~/.fb-bridge)
    base_dir: PathBuf,
}

impl Paths {
    /// Create a new Paths instance rooted at `~/.fb-bridge`.
    pub fn new() -> CoreResult<Self> {
        let home = dirs::home_dir()
            .ok_or_else(|| CoreError::Path("Could not determine home directory".to_string()))?;

        Ok(Self {
            base_dir: home.join(BASE_DIR_NAME),
        })
    }

    /// Create a new Paths instance with a custom base directory.
    pub fn with_base_dir(base_dir: PathBuf) -> Self {
        Self { base_dir }
    }

    /// Get the base directory (~/.fb-bridge).
    pub fn base_dir(&self) -> &PathBuf {
        &self.base_dir
    }

    /// Get the config file path (~/.fb-bridge/config.json).
    pub fn config_file(&self) -> PathBuf {
        self.base_dir.join("config.json")
    }

    /// Get the logs directory (~/.fb-bridge/logs).
    pub fn logs_dir(&self) -> PathBuf {
        self.base_dir.join("logs")
    }

    /// Get the JSONL log file path (~/.fb-bridge/logs/bridge.jsonl).
    pub fn log_file(&self) -> PathBuf {
        self.logs_dir().join("bridge.jsonl")
    }

    /// Ensure all required directories exist.
    pub fn ensure_dirs(&self) -> CoreResult<()> {
        std::fs::create_dir_all(&self.base_dir)?;
        std::fs::create_dir_all(self.logs_dir())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_paths_with_base_dir() {
        let paths = Paths::with_base_dir(PathBuf::from("/tmp/bridge"));
        assert_eq!(paths.base_dir(), &PathBuf::from("/tmp/bridge"));
        assert_eq!(paths.config_file(), PathBuf::from("/tmp/bridge/config.json"));
        assert_eq!(
            paths.log_file(),
            PathBuf::from("/tmp/bridge/logs/bridge.jsonl")
        );
    }

    #[test]
    fn test_ensure_dirs_creates_logs_dir() {
        let dir = tempdir().unwrap();
        let paths = Paths::with_base_dir(dir.path().join("nested"));

        paths.ensure_dirs().unwrap();
        assert!(paths.logs_dir().is_dir());
    }
}
