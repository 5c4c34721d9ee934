//! Engine configuration
//!
//! Settings are plain JSON. Missing fields take their defaults, so an empty
//! object is a valid configuration.

use crate::{Result, TableError};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Tunables of the table engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TableConfig {
    /// Rows of a table inserted without an explicit size
    pub default_rows: usize,
    /// Columns of a table inserted without an explicit size
    pub default_columns: usize,
    /// Lower bound for a column width produced by normalization or resizing
    pub min_column_width_percent: f64,
    /// Maximum number of full post-fixer passes per edit batch
    pub post_fixer_iteration_limit: usize,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            default_rows: 2,
            default_columns: 2,
            min_column_width_percent: 5.0,
            post_fixer_iteration_limit: 16,
        }
    }
}

impl TableConfig {
    /// Parse and validate a JSON configuration
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: TableConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    /// Load a configuration file, falling back to defaults when it is missing or invalid
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        if !path.exists() {
            return Self::default();
        }
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    "Failed to load table config, using defaults: {}",
                    e
                );
                Self::default()
            }
        }
    }

    /// Write the configuration as pretty-printed JSON
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.default_rows == 0 || self.default_columns == 0 {
            return Err(TableError::Config(
                "default table size must be at least 1x1".to_string(),
            ));
        }
        if !(0.0..=100.0).contains(&self.min_column_width_percent) {
            return Err(TableError::Config(format!(
                "min_column_width_percent must be within 0..=100, got {}",
                self.min_column_width_percent
            )));
        }
        if self.post_fixer_iteration_limit == 0 {
            return Err(TableError::Config(
                "post_fixer_iteration_limit must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_fields_use_defaults() {
        let config = TableConfig::from_json_str(r#"{ "default_rows": 4 }"#).unwrap();
        assert_eq!(config.default_rows, 4);
        assert_eq!(config.default_columns, 2);
        assert_eq!(config.post_fixer_iteration_limit, 16);
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        assert!(matches!(
            TableConfig::from_json_str(r#"{ "min_column_width_percent": 120 }"#),
            Err(TableError::Config(_))
        ));
        assert!(matches!(
            TableConfig::from_json_str(r#"{ "post_fixer_iteration_limit": 0 }"#),
            Err(TableError::Config(_))
        ));
        assert!(matches!(
            TableConfig::from_json_str("not json"),
            Err(TableError::Json(_))
        ));
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("table.json");
        let config = TableConfig {
            min_column_width_percent: 10.0,
            ..TableConfig::default()
        };
        config.save(&path).unwrap();
        assert_eq!(TableConfig::load(&path).unwrap(), config);
    }

    #[test]
    fn test_load_or_default_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.json");
        std::fs::write(&path, "{ broken").unwrap();
        assert_eq!(TableConfig::load_or_default(&path), TableConfig::default());
        assert_eq!(
            TableConfig::load_or_default(dir.path().join("missing.json")),
            TableConfig::default()
        );
    }
}
