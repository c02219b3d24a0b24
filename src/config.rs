//! Configuration loading and management
//!
//! Handles parsing of `taskdeck.toml` configuration files.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::model::PersonId;

/// File name looked up in the working directory
pub const CONFIG_FILE: &str = "taskdeck.toml";

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Host module the plugin stores its data under
    #[serde(default)]
    pub module: ModuleConfig,

    /// Actor configuration
    #[serde(default)]
    pub actor: ActorConfig,

    /// List bootstrap configuration
    #[serde(default)]
    pub lists: ListsConfig,

    /// Fuzzy search tuning
    #[serde(default)]
    pub search: SearchConfig,

    /// Task relocation journal
    #[serde(default)]
    pub moves: MovesConfig,
}

/// Module-related configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModuleConfig {
    /// Key of the custom module registered by the host
    #[serde(default = "default_module_key")]
    pub key: String,
}

fn default_module_key() -> String {
    "taskdeck".to_string()
}

impl Default for ModuleConfig {
    fn default() -> Self {
        Self {
            key: default_module_key(),
        }
    }
}

/// Actor-related configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ActorConfig {
    /// Person id used when no actor is supplied
    #[serde(default)]
    pub default: Option<PersonId>,
}

/// List-related configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListsConfig {
    /// Name of the auto-created default list
    #[serde(default = "default_list_name")]
    pub default_name: String,
}

fn default_list_name() -> String {
    "Unsortiert".to_string()
}

impl Default for ListsConfig {
    fn default() -> Self {
        Self {
            default_name: default_list_name(),
        }
    }
}

/// Fuzzy search configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Match threshold in [0, 1]; lower is stricter
    #[serde(default = "default_threshold")]
    pub threshold: f64,

    /// Expected match location within a field
    #[serde(default)]
    pub location: usize,

    /// How far from `location` a match may drift before it scores 1.0
    #[serde(default = "default_distance")]
    pub distance: usize,

    /// Shortest run of matched characters that counts
    #[serde(default = "default_min_match_char_length")]
    pub min_match_char_length: usize,

    #[serde(default = "default_name_weight")]
    pub name_weight: f64,

    #[serde(default = "default_description_weight")]
    pub description_weight: f64,

    #[serde(default = "default_url_weight")]
    pub url_weight: f64,
}

fn default_threshold() -> f64 {
    0.4
}

fn default_distance() -> usize {
    100
}

fn default_min_match_char_length() -> usize {
    2
}

fn default_name_weight() -> f64 {
    1.0
}

fn default_description_weight() -> f64 {
    0.5
}

fn default_url_weight() -> f64 {
    0.3
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            threshold: default_threshold(),
            location: 0,
            distance: default_distance(),
            min_match_char_length: default_min_match_char_length(),
            name_weight: default_name_weight(),
            description_weight: default_description_weight(),
            url_weight: default_url_weight(),
        }
    }
}

/// Relocation journal configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MovesConfig {
    /// Directory holding one JSON file per move
    #[serde(default = "default_journal_dir")]
    pub journal_dir: PathBuf,
}

fn default_journal_dir() -> PathBuf {
    PathBuf::from(".taskdeck").join("moves")
}

impl Default for MovesConfig {
    fn default() -> Self {
        Self {
            journal_dir: default_journal_dir(),
        }
    }
}

impl Config {
    /// Load configuration from a `taskdeck.toml` file
    pub fn load(path: &Path) -> crate::error::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a directory, or return defaults
    pub fn load_from_dir(dir: &Path) -> Self {
        let config_path = dir.join(CONFIG_FILE);
        if config_path.exists() {
            match Self::load(&config_path) {
                Ok(config) => config,
                Err(err) => {
                    tracing::warn!(path = %config_path.display(), error = %err, "ignoring invalid config");
                    Self::default()
                }
            }
        } else {
            Self::default()
        }
    }

    fn validate(&self) -> crate::error::Result<()> {
        if self.module.key.trim().is_empty() {
            return Err(crate::error::Error::InvalidConfig(
                "module.key cannot be empty".to_string(),
            ));
        }
        if self.lists.default_name.trim().is_empty() {
            return Err(crate::error::Error::InvalidConfig(
                "lists.default_name cannot be empty".to_string(),
            ));
        }
        self.search.validate()
    }
}

impl SearchConfig {
    fn validate(&self) -> crate::error::Result<()> {
        if !(0.0..=1.0).contains(&self.threshold) {
            return Err(crate::error::Error::InvalidConfig(format!(
                "search.threshold must be within [0, 1], got {}",
                self.threshold
            )));
        }
        if self.min_match_char_length == 0 {
            return Err(crate::error::Error::InvalidConfig(
                "search.min_match_char_length must be at least 1".to_string(),
            ));
        }
        for (field, weight) in [
            ("search.name_weight", self.name_weight),
            ("search.description_weight", self.description_weight),
            ("search.url_weight", self.url_weight),
        ] {
            if !(weight > 0.0) {
                return Err(crate::error::Error::InvalidConfig(format!(
                    "{field} must be positive, got {weight}"
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_host_search_settings() {
        let config = Config::default();
        assert_eq!(config.search.threshold, 0.4);
        assert_eq!(config.search.min_match_char_length, 2);
        assert_eq!(config.search.distance, 100);
        assert_eq!(config.lists.default_name, "Unsortiert");
        assert!(config.actor.default.is_none());
    }

    #[test]
    fn rejects_out_of_range_threshold() {
        let config: Config = toml::from_str("[search]\nthreshold = 1.5\n").expect("parse");
        let err = config.validate().expect_err("invalid");
        assert!(err.to_string().contains("search.threshold"));
    }
}
