//! Client configuration management.
//!
//! This module handles loading and saving the client configuration: the base
//! network address requests resolve against, and the directory holding the
//! persisted session.
//!
//! Configuration is stored at `~/.config/satchel/config.json`. The base
//! address is deliberately not compiled in anywhere: deployments differ, so
//! the value must come from the environment or the config file.

use std::path::PathBuf;

use anyhow::Result;
use serde::{Deserialize, Serialize};

/// Application name used for config/data directory paths
const APP_NAME: &str = "satchel";

/// Config file name
const CONFIG_FILE: &str = "config.json";

/// Environment variable that overrides the configured base URL
const BASE_URL_ENV: &str = "SATCHEL_BASE_URL";

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    pub base_url: Option<String>,
    pub data_dir: Option<PathBuf>,
}

impl Config {
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        if path.exists() {
            let contents = std::fs::read_to_string(&path)?;
            Ok(serde_json::from_str(&contents)?)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    /// Resolve the base URL for outbound requests.
    ///
    /// `SATCHEL_BASE_URL` takes precedence over the config file, and an empty
    /// value in either source counts as unset. There is no built-in default:
    /// with neither source set this is an error, so the client never guesses
    /// which environment it is talking to.
    pub fn base_url(&self) -> Result<String> {
        if let Ok(url) = std::env::var(BASE_URL_ENV) {
            if !url.is_empty() {
                return Ok(url);
            }
        }
        self.base_url
            .clone()
            .filter(|url| !url.is_empty())
            .ok_or_else(|| {
                anyhow::anyhow!(
                    "No base URL configured (set {} or base_url in the config file)",
                    BASE_URL_ENV
                )
            })
    }

    /// Directory holding the persisted session file.
    pub fn data_dir(&self) -> Result<PathBuf> {
        if let Some(ref dir) = self.data_dir {
            return Ok(dir.clone());
        }
        let data_dir = dirs::data_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find data directory"))?;
        Ok(data_dir.join(APP_NAME))
    }
}
