/// Configuration for the casebook CLI.
/// Reads config.json from ~/.config/casebook/config.json (or platform equivalent).

use casebook_core::config::ParserConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CliConfig {
    /// Snapshot file holding all pages and test cases.
    #[serde(default)]
    pub store_path: Option<PathBuf>,
    #[serde(default)]
    pub parser: ParserConfig,
}

impl CliConfig {
    pub fn store_path(&self) -> PathBuf {
        self.store_path
            .clone()
            .unwrap_or_else(|| config_dir().join("store.json"))
    }
}

/// ~/.config/casebook
pub fn config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("casebook")
}

/// Default config path: ~/.config/casebook/config.json
pub fn default_config_path() -> PathBuf {
    config_dir().join("config.json")
}

/// Load config from path. Returns default if the file is missing or invalid.
pub fn load_config(path: &Path) -> CliConfig {
    match fs::read_to_string(path) {
        Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
            log::warn!("[casebook.config] Failed to parse config {}: {}", path.display(), e);
            CliConfig::default()
        }),
        Err(_) => {
            log::info!("[casebook.config] No config at {}, using defaults", path.display());
            CliConfig::default()
        }
    }
}
