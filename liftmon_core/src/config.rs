//! Configuration file support for Liftmon.
//!
//! Configuration is loaded from `$XDG_CONFIG_HOME/liftmon/config.toml`.

use crate::species::default_species;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Application configuration
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub data: DataConfig,

    #[serde(default)]
    pub companion: CompanionConfig,

    #[serde(default)]
    pub history: HistoryConfig,
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

/// Companion leveling parameters
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CompanionConfig {
    #[serde(default = "default_base_exp_requirement")]
    pub base_exp_requirement: u64,

    #[serde(default = "default_exp_multiplier")]
    pub exp_multiplier: f64,

    /// Species given to users who never picked one
    #[serde(default = "default_default_species")]
    pub default_species: String,
}

impl Default for CompanionConfig {
    fn default() -> Self {
        Self {
            base_exp_requirement: default_base_exp_requirement(),
            exp_multiplier: default_exp_multiplier(),
            default_species: default_default_species(),
        }
    }
}

/// Workout history lookup configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct HistoryConfig {
    /// How many recent workouts to fetch when looking for the previous one
    #[serde(default = "default_recent_limit")]
    pub recent_limit: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            recent_limit: default_recent_limit(),
        }
    }
}

// Default value functions
fn default_data_dir() -> PathBuf {
    let base = dirs::data_local_dir()
        .or_else(|| dirs::home_dir().map(|home| home.join(".local/share")))
        .unwrap_or_else(|| PathBuf::from("."));
    base.join("liftmon")
}

fn default_base_exp_requirement() -> u64 {
    100
}

fn default_exp_multiplier() -> f64 {
    1.2
}

fn default_default_species() -> String {
    "bulbasaur".into()
}

fn default_recent_limit() -> usize {
    2
}

impl Config {
    /// Load configuration from the standard config path
    pub fn load() -> Result<Self> {
        let config_path = Self::default_config_path();
        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            tracing::info!(
                "No config file found at {:?}, using defaults",
                config_path
            );
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

    /// Get the default config file path
    pub fn default_config_path() -> PathBuf {
        let base = dirs::config_dir()
            .or_else(|| dirs::home_dir().map(|home| home.join(".config")))
            .unwrap_or_else(|| PathBuf::from("."));
        base.join("liftmon").join("config.toml")
    }

    /// Check that the values can drive the progression engine
    pub fn validate(&self) -> Result<()> {
        if self.companion.base_exp_requirement == 0 {
            return Err(Error::Config(
                "companion.base_exp_requirement must be positive".into(),
            ));
        }
        if !self.companion.exp_multiplier.is_finite() || self.companion.exp_multiplier < 1.0 {
            return Err(Error::Config(format!(
                "companion.exp_multiplier must be at least 1.0, got {}",
                self.companion.exp_multiplier
            )));
        }
        if !default_species().contains(&self.companion.default_species) {
            return Err(Error::Config(format!(
                "companion.default_species '{}' is not a known species",
                self.companion.default_species
            )));
        }
        if self.history.recent_limit < 2 {
            return Err(Error::Config(
                "history.recent_limit must be at least 2".into(),
            ));
        }
        Ok(())
    }

    /// Save the current configuration to the default path
    pub fn save(&self) -> Result<()> {
        let config_path = Self::default_config_path();
        self.save_to(&config_path)
    }

    /// Save the current configuration to a specific path
    pub fn save_to(&self, path: &Path) -> Result<()> {
        // Ensure parent directory exists
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
