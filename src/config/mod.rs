//! # Configuration
//!
//! `questgraph` reads an optional TOML file (`questgraph.toml` by default) that
//! names the dataset, the report files and a few validation switches. Every key
//! has a default, so a missing file or a partial one is fine; a file that does
//! not parse is a fatal error.
//!
//! ## Sections
//!
//! - [`DatasetConfig`] - where the quest dataset lives
//! - [`ReportsConfig`] - output paths of the report files
//! - [`ValidationConfig`] - optional validation checks
//! - [`RepairConfig`] - behavior of the `fix` command
//! - [`LoggingConfig`] - log level and optional log file
//!
//! ## Usage
//!
//! ```rust,no_run
//! use questgraph::config::Config;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load_or_default("questgraph.toml").await?;
//!     println!("Dataset: {}", config.dataset.path);
//!     Ok(())
//! }
//! ```
//!
//! ## File format
//!
//! ```toml
//! [dataset]
//! path = "quests-database.json"
//!
//! [reports]
//! validation = "prerequisites_validation_report.json"
//!
//! [validation]
//! duplicate_ids_are_errors = true
//! check_tier_order = true
//!
//! [logging]
//! level = "info"
//! ```

use std::path::Path;

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use tokio::fs;

use crate::questdb::ValidationOptions;

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub dataset: DatasetConfig,
    #[serde(default)]
    pub reports: ReportsConfig,
    #[serde(default)]
    pub validation: ValidationConfig,
    #[serde(default)]
    pub repair: RepairConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DatasetConfig {
    #[serde(default = "default_dataset_path")]
    pub path: String,
}

fn default_dataset_path() -> String {
    "quests-database.json".to_string()
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            path: default_dataset_path(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReportsConfig {
    #[serde(default = "default_validation_report")]
    pub validation: String,
    #[serde(default = "default_availability_report")]
    pub availability: String,
    #[serde(default = "default_suspects_report")]
    pub suspects: String,
    #[serde(default = "default_fixes_report")]
    pub fixes: String,
}

fn default_validation_report() -> String {
    "prerequisites_validation_report.json".to_string()
}

fn default_availability_report() -> String {
    "quest_availability_simulation.json".to_string()
}

fn default_suspects_report() -> String {
    "missing_prerequisites_report.json".to_string()
}

fn default_fixes_report() -> String {
    "prerequisite_fixes_report.json".to_string()
}

impl Default for ReportsConfig {
    fn default() -> Self {
        Self {
            validation: default_validation_report(),
            availability: default_availability_report(),
            suspects: default_suspects_report(),
            fixes: default_fixes_report(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ValidationConfig {
    /// Report quest ids shared across records as errors (`false`: warnings).
    #[serde(default = "default_true")]
    pub duplicate_ids_are_errors: bool,
    /// Warn when a quest is listed after a higher-tier quest of the same NPC.
    #[serde(default = "default_true")]
    pub check_tier_order: bool,
}

fn default_true() -> bool {
    true
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            duplicate_ids_are_errors: true,
            check_tier_order: true,
        }
    }
}

impl From<&ValidationConfig> for ValidationOptions {
    fn from(config: &ValidationConfig) -> Self {
        ValidationOptions {
            duplicate_ids_are_errors: config.duplicate_ids_are_errors,
            check_tier_order: config.check_tier_order,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RepairConfig {
    /// Re-run validation on the repaired dataset and write its report.
    #[serde(default = "default_true")]
    pub revalidate_after_apply: bool,
}

impl Default for RepairConfig {
    fn default() -> Self {
        Self {
            revalidate_after_apply: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: None,
        }
    }
}

impl LoggingConfig {
    /// Configured level; unknown names fall back to `Info`.
    pub fn level_filter(&self) -> log::LevelFilter {
        self.level.parse().unwrap_or(log::LevelFilter::Info)
    }
}

impl Config {
    /// Load configuration from a file
    pub async fn load(path: &str) -> Result<Self> {
        let content = fs::read_to_string(path)
            .await
            .map_err(|e| anyhow!("Failed to read config file {}: {}", path, e))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| anyhow!("Failed to parse config file {}: {}", path, e))?;

        Ok(config)
    }

    /// Like [`Config::load`], but a missing file yields the defaults.
    pub async fn load_or_default(path: &str) -> Result<Self> {
        if !fs::try_exists(path).await.unwrap_or(false) {
            return Ok(Config::default());
        }
        Config::load(path).await
    }

    /// Create a default configuration file
    pub async fn create_default(path: &str) -> Result<()> {
        let config = Config::default();
        let content = toml::to_string_pretty(&config)
            .map_err(|e| anyhow!("Failed to serialize default config: {}", e))?;

        if let Some(parent) = Path::new(path).parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await?;
            }
        }
        fs::write(path, content)
            .await
            .map_err(|e| anyhow!("Failed to write config file {}: {}", path, e))?;

        Ok(())
    }

    pub fn validation_options(&self) -> ValidationOptions {
        ValidationOptions::from(&self.validation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_file_uses_defaults() {
        let config: Config = toml::from_str("[dataset]\npath = \"data/quests.json\"\n").unwrap();
        assert_eq!(config.dataset.path, "data/quests.json");
        assert_eq!(config.reports, ReportsConfig::default());
        assert!(config.validation.duplicate_ids_are_errors);
        assert!(config.repair.revalidate_after_apply);
    }

    #[test]
    fn test_validation_options_from_config() {
        let config: Config =
            toml::from_str("[validation]\nduplicate_ids_are_errors = false\n").unwrap();
        let options = config.validation_options();
        assert!(!options.duplicate_ids_are_errors);
        assert!(options.check_tier_order);
    }

    #[test]
    fn test_level_filter_fallback() {
        let mut logging = LoggingConfig::default();
        assert_eq!(logging.level_filter(), log::LevelFilter::Info);
        logging.level = "DEBUG".to_string();
        assert_eq!(logging.level_filter(), log::LevelFilter::Debug);
        logging.level = "chatty".to_string();
        assert_eq!(logging.level_filter(), log::LevelFilter::Info);
    }

    #[test]
    fn test_default_serializes_without_log_file() {
        let text = toml::to_string_pretty(&Config::default()).unwrap();
        assert!(text.contains("[dataset]"));
        assert!(!text.contains("file"));
    }
}
