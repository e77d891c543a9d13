//! Configuration file support for MediBox.
//!
//! Configuration is loaded from `$XDG_CONFIG_HOME/medibox/config.toml`.

use crate::ledger::DEFAULT_RESET_QUANTITY;
use crate::types::DEFAULT_LOW_STOCK_THRESHOLD;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Application configuration
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub data: DataConfig,

    #[serde(default)]
    pub inventory: InventoryConfig,

    #[serde(default)]
    pub feedback: FeedbackConfig,
}

/// Data storage configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DataConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

/// Box provisioning and restocking parameters
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct InventoryConfig {
    #[serde(default = "default_compartment_count")]
    pub compartment_count: u32,

    #[serde(default = "default_reset_quantity")]
    pub reset_quantity: u32,

    #[serde(default = "default_low_stock_threshold")]
    pub default_low_stock_threshold: u32,
}

impl Default for InventoryConfig {
    fn default() -> Self {
        Self {
            compartment_count: default_compartment_count(),
            reset_quantity: default_reset_quantity(),
            default_low_stock_threshold: default_low_stock_threshold(),
        }
    }
}

/// Sound and haptics toggles
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct FeedbackConfig {
    #[serde(default = "default_true")]
    pub sound_enabled: bool,

    #[serde(default = "default_true")]
    pub haptics_enabled: bool,
}

impl Default for FeedbackConfig {
    fn default() -> Self {
        Self {
            sound_enabled: true,
            haptics_enabled: true,
        }
    }
}

// Default value functions
fn default_data_dir() -> PathBuf {
    let base = dirs::data_local_dir()
        .or_else(|| dirs::home_dir().map(|home| home.join(".local/share")))
        .unwrap_or_else(|| PathBuf::from("."));
    base.join("medibox")
}

fn default_compartment_count() -> u32 {
    4
}

fn default_reset_quantity() -> u32 {
    DEFAULT_RESET_QUANTITY
}

fn default_low_stock_threshold() -> u32 {
    DEFAULT_LOW_STOCK_THRESHOLD
}

fn default_true() -> bool {
    true
}

impl Config {
    /// Load configuration from the standard config path
    pub fn load() -> Result<Self> {
        let config_path = Self::default_config_path();
        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            tracing::info!("No config file found at {:?}, using defaults", config_path);
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        tracing::info!("Loaded config from {:?}", path);
        Ok(config)
    }

    /// Reject settings the box cannot operate with
    pub fn validate(&self) -> Result<()> {
        if self.inventory.compartment_count == 0 {
            return Err(Error::Config(
                "inventory.compartment_count must be at least 1".into(),
            ));
        }
        Ok(())
    }

    /// Get the default config file path
    pub fn default_config_path() -> PathBuf {
        let base = dirs::config_dir()
            .or_else(|| dirs::home_dir().map(|home| home.join(".config")))
            .unwrap_or_else(|| PathBuf::from("."));
        base.join("medibox").join("config.toml")
    }

    /// Save the current configuration to the default path
    pub fn save(&self) -> Result<()> {
        let config_path = Self::default_config_path();
        self.save_to(&config_path)
    }

    /// Save the current configuration to a specific path
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, contents)?;
        tracing::info!("Saved config to {:?}", path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.inventory.compartment_count, 4);
        assert_eq!(config.inventory.reset_quantity, 30);
        assert_eq!(config.inventory.default_low_stock_threshold, 5);
        assert!(config.feedback.sound_enabled);
        assert!(config.feedback.haptics_enabled);
    }

    #[test]
    fn test_config_roundtrip() {
        let config = Config::default();
        let toml_str = toml::to_string(&config).unwrap();
        let parsed: Config = toml::from_str(&toml_str).unwrap();

        assert_eq!(
            config.inventory.reset_quantity,
            parsed.inventory.reset_quantity
        );
        assert_eq!(config.feedback, parsed.feedback);
    }

    #[test]
    fn test_partial_config() {
        let toml_str = r#"
[feedback]
sound_enabled = false
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert!(!config.feedback.sound_enabled);
        assert!(config.feedback.haptics_enabled); // default
        assert_eq!(config.inventory.compartment_count, 4);
    }

    #[test]
    fn test_zero_compartments_rejected() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("config.toml");
        std::fs::write(&path, "[inventory]\ncompartment_count = 0\n").unwrap();

        assert!(matches!(Config::load_from(&path), Err(Error::Config(_))));
    }

    #[test]
    fn test_save_and_load_from() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("nested").join("config.toml");

        let mut config = Config::default();
        config.inventory.reset_quantity = 60;
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.inventory.reset_quantity, 60);
    }
}
