use serde::{Deserialize, Serialize};

#[cfg(not(target_arch = "wasm32"))]
use std::{
    fs::{read_to_string, write},
    path::{Path, PathBuf},
};

use crate::{
    error::DeckError,
    query::{SortKey, DEFAULT_SUGGESTION_LIMIT},
    session::ViewMode,
};

/// Environment variable consulted by the CLI for the config file location.
pub const CONFIG_ENV_VAR: &str = "ONTODECK_CONFIG";

/// Initial viewer preferences.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeckConfig {
    pub sort: SortKey,
    pub shuffle: bool,
    pub view_mode: ViewMode,
    pub suggestion_limit: usize,
    pub default_source: Option<String>,
}

impl Default for DeckConfig {
    fn default() -> Self {
        DeckConfig {
            sort: SortKey::default(),
            shuffle: false,
            view_mode: ViewMode::default(),
            suggestion_limit: DEFAULT_SUGGESTION_LIMIT,
            default_source: None,
        }
    }
}

impl DeckConfig {
    pub fn from_toml_str(content: &str) -> Result<DeckConfig, DeckError> {
        Ok(toml::from_str(content)?)
    }

    pub fn to_toml_string(&self) -> Result<String, DeckError> {
        Ok(toml::to_string(self)?)
    }
}

pub trait DeckConfigProvider: Send + Sync {
    fn get_config(&self) -> Result<DeckConfig, DeckError>;
    fn set_config(&self, config: &DeckConfig) -> Result<(), DeckError>;
}

#[cfg(not(target_arch = "wasm32"))]
#[derive(Debug, Serialize, Deserialize)]
pub struct TomlConfigProvider {
    path: PathBuf,
}

#[cfg(not(target_arch = "wasm32"))]
impl TomlConfigProvider {
    pub fn new(path: PathBuf) -> Self {
        TomlConfigProvider { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[cfg(not(target_arch = "wasm32"))]
impl DeckConfigProvider for TomlConfigProvider {
    fn get_config(&self) -> Result<DeckConfig, DeckError> {
        tracing::debug!("Attempting to read deck config from: {:?}", &self.path);
        if !self.path.exists() {
            tracing::debug!("Config file not found, using defaults.");
            return Ok(DeckConfig::default());
        }
        let content = read_to_string(&self.path)?;
        DeckConfig::from_toml_str(&content)
    }

    fn set_config(&self, config: &DeckConfig) -> Result<(), DeckError> {
        tracing::debug!("Attempting to write deck config to: {:?}", &self.path);
        write(&self.path, config.to_toml_string()?)?;
        Ok(())
    }
}
