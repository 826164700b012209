use anyhow::{Context, Result};
use aptkit::AptConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::paths;

/// Settings from `config.toml`. Every field is optional.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Package list location, `~` and `$VARS` expanded
    pub list_file: String,
    /// Packages of one kind applied in parallel
    pub jobs: usize,
    /// Skip the confirmation prompt of `apply`
    pub assume_yes: bool,
    /// apt backend settings
    pub apt: AptConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            list_file: paths::DEFAULT_LIST_FILE.to_string(),
            jobs: 1,
            assume_yes: false,
            apt: AptConfig::default(),
        }
    }
}

impl Config {
    /// Load the config file from the config directory.
    ///
    /// A missing file yields the defaults.
    pub fn load() -> Result<Self> {
        Self::load_from(&paths::config_file()?)
    }

    /// Load a config file, falling back to defaults if it doesn't exist.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            log::debug!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Could not read {}", path.display()))?;
        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Invalid config in {}", path.display()))?;
        log::debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Package list to use, honouring a command line override.
    pub fn list_path(&self, cli_override: Option<&Path>) -> PathBuf {
        match cli_override {
            Some(path) => paths::expand_path(path),
            None => paths::expand(&self.list_file),
        }
    }

    /// Worker count, with the command line taking precedence.
    pub fn jobs(&self, cli_override: Option<usize>) -> usize {
        cli_override.unwrap_or(self.jobs).max(1)
    }

    /// Render as TOML for display.
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize config")
    }
}
