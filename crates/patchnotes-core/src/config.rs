//! Configuration and data directory management.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable overriding the rules file location.
pub const RULES_ENV: &str = "PATCHNOTES_RULES";

/// Paths to all data files used by the classifier.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataPaths {
    /// Root data directory (e.g., `data/`).
    pub root: PathBuf,
    /// SQLite database (`data/patchnotes.db`).
    pub database: PathBuf,
    /// Optional classification rules (`data/rules.json`).
    pub rules_file: PathBuf,
}

impl DataPaths {
    /// Create data paths from a root directory. Creates the directory if needed.
    pub fn new(root: impl AsRef<Path>) -> std::io::Result<Self> {
        let root = root.as_ref().to_path_buf();
        std::fs::create_dir_all(&root)?;
        Ok(Self {
            database: root.join("patchnotes.db"),
            rules_file: root.join("rules.json"),
            root,
        })
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatchNotesConfig {
    /// Data directory paths.
    pub data_paths: DataPaths,
    /// Rules file to load; falls back to built-in rules when the file is absent.
    pub rules_path: PathBuf,
}

impl PatchNotesConfig {
    /// Create configuration from environment and defaults.
    pub fn from_env(data_dir: impl AsRef<Path>) -> std::io::Result<Self> {
        let data_paths = DataPaths::new(data_dir)?;
        let rules_path = std::env::var(RULES_ENV)
            .ok()
            .filter(|p| !p.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| data_paths.rules_file.clone());

        Ok(Self {
            data_paths,
            rules_path,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_paths_layout() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("data");
        let paths = DataPaths::new(&root).unwrap();
        assert!(root.is_dir());
        assert_eq!(paths.database, root.join("patchnotes.db"));
        assert_eq!(paths.rules_file, root.join("rules.json"));
    }
}
