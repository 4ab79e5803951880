//! Configuration Module
//! Defaults and optional TOML overrides for the command line front end.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Merged gameweek file for the 2023-24 season.
pub const DEFAULT_DATA_URL: &str =
    "https://github.com/vaastav/Fantasy-Premier-League/blob/master/data/2023-24/gws/merged_gw.csv?raw=true";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid config file: {0}")]
    Parse(#[from] toml::de::Error),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// URL or local path of the season CSV
    pub data_url: String,
    /// Window used by the overview when none is given
    pub overview_weeks: u32,
    /// Rows printed per table
    pub display_rows: usize,
    /// Timeout for the initial download
    pub http_timeout_secs: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_url: DEFAULT_DATA_URL.to_string(),
            overview_weeks: 4,
            display_rows: 20,
            http_timeout_secs: 30,
        }
    }
}

impl AppConfig {
    /// Read a TOML file; keys left out keep their defaults.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path)?;
        Self::from_toml(&raw)
    }

    pub fn from_toml(raw: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(raw)?)
    }
}
