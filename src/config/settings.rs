//! User settings for branchbook
//!
//! Manages display preferences, report defaults and the log level.

use serde::{Deserialize, Serialize};

use super::paths::BranchbookPaths;
use crate::error::BranchbookError;
use crate::models::BucketSize;

/// User settings for branchbook
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Schema version for migration support
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,

    /// Currency symbol used when printing amounts
    #[serde(default = "default_currency")]
    pub currency_symbol: String,

    /// Page size used when a view does not specify `limit`
    #[serde(default = "default_page_limit")]
    pub default_page_limit: usize,

    /// Time bucket used by series reports when none is given
    #[serde(default)]
    pub default_bucket: BucketSize,

    /// Default tracing filter directive (overridden by `BRANCHBOOK_LOG`)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Minimum stock level applied to products created without one
    #[serde(default = "default_low_stock")]
    pub low_stock_default: i64,
}

fn default_schema_version() -> u32 {
    1
}

fn default_currency() -> String {
    "$".to_string()
}

fn default_page_limit() -> usize {
    10
}

fn default_log_level() -> String {
    "branchbook=info".to_string()
}

fn default_low_stock() -> i64 {
    5
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            schema_version: default_schema_version(),
            currency_symbol: default_currency(),
            default_page_limit: default_page_limit(),
            default_bucket: BucketSize::default(),
            log_level: default_log_level(),
            low_stock_default: default_low_stock(),
        }
    }
}

impl Settings {
    /// Load settings from disk, or return defaults if the file doesn't exist
    pub fn load_or_create(paths: &BranchbookPaths) -> Result<Self, BranchbookError> {
        let settings_path = paths.settings_file();

        if settings_path.exists() {
            let contents = std::fs::read_to_string(&settings_path).map_err(|e| {
                BranchbookError::Io(format!("Failed to read settings file: {}", e))
            })?;

            let settings: Settings = serde_json::from_str(&contents).map_err(|e| {
                BranchbookError::Config(format!("Failed to parse settings file: {}", e))
            })?;

            Ok(settings)
        } else {
            // Don't save yet - let caller decide when to persist
            Ok(Settings::default())
        }
    }

    /// Save settings to disk
    pub fn save(&self, paths: &BranchbookPaths) -> Result<(), BranchbookError> {
        paths.ensure_directories()?;

        let contents = serde_json::to_string_pretty(self).map_err(|e| {
            BranchbookError::Config(format!("Failed to serialize settings: {}", e))
        })?;

        std::fs::write(paths.settings_file(), contents).map_err(|e| {
            BranchbookError::Io(format!("Failed to write settings file: {}", e))
        })?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.default_page_limit, 10);
        assert_eq!(settings.default_bucket, BucketSize::Day);
        assert_eq!(settings.currency_symbol, "$");
    }

    #[test]
    fn test_save_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let paths = BranchbookPaths::with_base_dir(temp_dir.path().to_path_buf());

        let mut settings = Settings::default();
        settings.default_bucket = BucketSize::Month;
        settings.default_page_limit = 25;

        settings.save(&paths).unwrap();

        let loaded = Settings::load_or_create(&paths).unwrap();
        assert_eq!(loaded.default_bucket, BucketSize::Month);
        assert_eq!(loaded.default_page_limit, 25);
    }

    #[test]
    fn test_missing_fields_use_defaults() {
        let settings: Settings = serde_json::from_str(r#"{"currency_symbol": "Rp"}"#).unwrap();
        assert_eq!(settings.currency_symbol, "Rp");
        assert_eq!(settings.low_stock_default, 5);
        assert_eq!(settings.log_level, "branchbook=info");
    }
}
