use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::constants::{
    DEFAULT_DELIMITER, DEFAULT_DELIVERY_DAYS_BINS, DEFAULT_MISSING_COMMENT, DEFAULT_TIMESTAMP_FORMAT,
};
use crate::error::{PipelineError, Result};

/// Environment variable naming the config file
pub const CONFIG_PATH_ENV: &str = "DELIVERY_INSIGHTS_CONFIG";
/// Environment variable re-rooting relative input paths
pub const DATA_DIR_ENV: &str = "DELIVERY_INSIGHTS_DATA_DIR";

const DEFAULT_CONFIG_PATH: &str = "config.toml";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub inputs: InputConfig,
    pub cleaning: CleaningConfig,
    pub aggregation: AggregationConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InputConfig {
    pub orders: PathBuf,
    pub payments: PathBuf,
    pub items: PathBuf,
    pub reviews: PathBuf,
    pub delimiter: String,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            orders: PathBuf::from("orders_dataset.csv"),
            payments: PathBuf::from("order_payments_dataset.csv"),
            items: PathBuf::from("order_items_dataset.csv"),
            reviews: PathBuf::from("order_reviews_dataset.csv"),
            delimiter: DEFAULT_DELIMITER.to_string(),
        }
    }
}

impl InputConfig {
    pub fn delimiter_byte(&self) -> Result<u8> {
        match self.delimiter.as_bytes() {
            [byte] => Ok(*byte),
            _ => Err(PipelineError::Config(format!(
                "delimiter must be a single ASCII character, got '{}'",
                self.delimiter
            ))),
        }
    }

    /// Resolve relative input paths against `dir`
    pub fn rebase(&mut self, dir: &Path) {
        for path in [&mut self.orders, &mut self.payments, &mut self.items, &mut self.reviews] {
            if path.is_relative() {
                *path = dir.join(&*path);
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CleaningConfig {
    /// chrono format string for the order timestamps
    pub timestamp_format: String,
    /// Substituted for a missing review comment
    pub missing_comment: String,
}

impl Default for CleaningConfig {
    fn default() -> Self {
        Self {
            timestamp_format: DEFAULT_TIMESTAMP_FORMAT.to_string(),
            missing_comment: DEFAULT_MISSING_COMMENT.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AggregationConfig {
    pub delivery_days_bins: Vec<i64>,
}

impl Default for AggregationConfig {
    fn default() -> Self {
        Self {
            delivery_days_bins: DEFAULT_DELIVERY_DAYS_BINS.to_vec(),
        }
    }
}

impl Config {
    /// Load from `DELIVERY_INSIGHTS_CONFIG` or `config.toml`. A missing
    /// default file falls back to built-in defaults.
    pub fn load() -> Result<Self> {
        let config = match std::env::var(CONFIG_PATH_ENV) {
            Ok(path) if !path.trim().is_empty() => Self::load_from(Path::new(path.trim()))?,
            _ if Path::new(DEFAULT_CONFIG_PATH).is_file() => {
                Self::load_from(Path::new(DEFAULT_CONFIG_PATH))?
            }
            _ => {
                info!("No config file found, using defaults");
                Self::default()
            }
        };
        config.with_env_overrides().validated()
    }

    /// Load an explicit config file; it must exist
    pub fn load_from(path: &Path) -> Result<Self> {
        let config_content = fs::read_to_string(path).map_err(|e| {
            PipelineError::Config(format!("Failed to read config file '{}': {}", path.display(), e))
        })?;
        let config = Self::from_toml_str(&config_content)?;
        info!("Loaded config from {}", path.display());
        Ok(config)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(dir) = std::env::var(DATA_DIR_ENV) {
            if !dir.trim().is_empty() {
                self.inputs.rebase(Path::new(dir.trim()));
            }
        }
        self
    }

    pub fn validate(&self) -> Result<()> {
        self.inputs.delimiter_byte()?;
        if self.cleaning.timestamp_format.trim().is_empty() {
            return Err(PipelineError::Config("timestamp_format must not be empty".to_string()));
        }
        let bins = &self.aggregation.delivery_days_bins;
        if bins.len() < 2 || bins.windows(2).any(|w| w[0] >= w[1]) {
            return Err(PipelineError::Config(format!(
                "delivery_days_bins must hold at least two strictly ascending edges, got {:?}",
                bins
            )));
        }
        Ok(())
    }

    pub fn validated(self) -> Result<Self> {
        self.validate()?;
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_source_dataset() {
        let config = Config::default();
        assert_eq!(config.inputs.delimiter_byte().unwrap(), b';');
        assert_eq!(config.cleaning.timestamp_format, "%d/%m/%Y %H:%M");
        assert_eq!(config.cleaning.missing_comment, "No Comment");
        assert_eq!(config.aggregation.delivery_days_bins, vec![25, 50, 75, 100, 125, 225]);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = Config::from_toml_str(
            r#"
            [inputs]
            orders = "data/orders.csv"
            delimiter = ","

            [aggregation]
            delivery_days_bins = [0, 10, 20]
            "#,
        )
        .unwrap();

        assert_eq!(config.inputs.orders, PathBuf::from("data/orders.csv"));
        assert_eq!(config.inputs.reviews, PathBuf::from("order_reviews_dataset.csv"));
        assert_eq!(config.inputs.delimiter_byte().unwrap(), b',');
        assert_eq!(config.cleaning.missing_comment, "No Comment");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = Config::default();
        config.inputs.delimiter = ";;".to_string();
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.aggregation.delivery_days_bins = vec![50, 25];
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.aggregation.delivery_days_bins = vec![1];
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rebase_only_touches_relative_paths() {
        let mut inputs = InputConfig {
            orders: PathBuf::from("/abs/orders.csv"),
            ..InputConfig::default()
        };
        inputs.rebase(Path::new("/data"));
        assert_eq!(inputs.orders, PathBuf::from("/abs/orders.csv"));
        assert_eq!(inputs.items, PathBuf::from("/data/order_items_dataset.csv"));
    }

    #[test]
    fn test_load_from_missing_file_is_config_error() {
        let err = Config::load_from(Path::new("/definitely/not/here.toml")).unwrap_err();
        assert!(matches!(err, PipelineError::Config(_)));
    }
}
