//! Path management for branchbook
//!
//! ## Path Resolution Order
//!
//! 1. `BRANCHBOOK_DATA_DIR` environment variable (if set)
//! 2. The platform config directory from `directories` (e.g. `~/.config/branchbook`)

use std::path::PathBuf;

use directories::ProjectDirs;

use crate::error::BranchbookError;

/// Manages all paths used by branchbook
#[derive(Debug, Clone)]
pub struct BranchbookPaths {
    /// Base directory for all branchbook data
    base_dir: PathBuf,
}

impl BranchbookPaths {
    /// Create a new BranchbookPaths instance
    ///
    /// # Errors
    ///
    /// Returns an error if no home directory can be determined.
    pub fn new() -> Result<Self, BranchbookError> {
        let base_dir = if let Ok(custom) = std::env::var("BRANCHBOOK_DATA_DIR") {
            PathBuf::from(custom)
        } else {
            resolve_default_path()?
        };

        Ok(Self { base_dir })
    }

    /// Create paths with a custom base directory (useful for testing)
    pub fn with_base_dir(base_dir: PathBuf) -> Self {
        Self { base_dir }
    }

    /// Get the base directory
    pub fn base_dir(&self) -> &PathBuf {
        &self.base_dir
    }

    /// Get the data directory holding one JSON file per table
    pub fn data_dir(&self) -> PathBuf {
        self.base_dir.join("data")
    }

    /// Get the path to the settings file
    pub fn settings_file(&self) -> PathBuf {
        self.base_dir.join("config.json")
    }

    /// Get the path to the audit log
    pub fn audit_log(&self) -> PathBuf {
        self.base_dir.join("audit.log")
    }

    /// Get the path of a table file (`data/<table>.json`)
    pub fn table_file(&self, table: &str) -> PathBuf {
        self.data_dir().join(format!("{}.json", table))
    }

    /// Ensure the base and data directories exist
    pub fn ensure_directories(&self) -> Result<(), BranchbookError> {
        std::fs::create_dir_all(&self.base_dir).map_err(|e| {
            BranchbookError::Io(format!("Failed to create base directory: {}", e))
        })?;

        std::fs::create_dir_all(self.data_dir()).map_err(|e| {
            BranchbookError::Io(format!("Failed to create data directory: {}", e))
        })?;

        Ok(())
    }

    /// Check if branchbook has been initialized (config file exists)
    pub fn is_initialized(&self) -> bool {
        self.settings_file().exists()
    }
}

fn resolve_default_path() -> Result<PathBuf, BranchbookError> {
    ProjectDirs::from("", "", "branchbook")
        .map(|dirs| dirs.config_dir().to_path_buf())
        .ok_or_else(|| BranchbookError::Config("Could not determine home directory".into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use tempfile::TempDir;

    #[test]
    fn test_custom_base_dir() {
        let temp_dir = TempDir::new().unwrap();
        let paths = BranchbookPaths::with_base_dir(temp_dir.path().to_path_buf());

        assert_eq!(paths.base_dir(), temp_dir.path());
        assert_eq!(paths.data_dir(), temp_dir.path().join("data"));
        assert_eq!(paths.audit_log(), temp_dir.path().join("audit.log"));
    }

    #[test]
    fn test_env_var_override() {
        let temp_dir = TempDir::new().unwrap();
        let custom_path = temp_dir.path().to_str().unwrap();

        env::set_var("BRANCHBOOK_DATA_DIR", custom_path);

        let paths = BranchbookPaths::new().unwrap();
        assert_eq!(paths.base_dir(), temp_dir.path());

        env::remove_var("BRANCHBOOK_DATA_DIR");
    }

    #[test]
    fn test_ensure_directories() {
        let temp_dir = TempDir::new().unwrap();
        let paths = BranchbookPaths::with_base_dir(temp_dir.path().join("nested"));

        paths.ensure_directories().unwrap();

        assert!(paths.data_dir().exists());
    }

    #[test]
    fn test_table_file() {
        let temp_dir = TempDir::new().unwrap();
        let paths = BranchbookPaths::with_base_dir(temp_dir.path().to_path_buf());

        assert_eq!(paths.settings_file(), temp_dir.path().join("config.json"));
        assert_eq!(
            paths.table_file("sales"),
            temp_dir.path().join("data").join("sales.json")
        );
    }
}
