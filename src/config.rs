//! Distribution configuration
//!
//! Stored as JSON, by default in ~/.config/merkle-distributor/config.json:
//!
//! ```json
//! { "encoding": "account_amount", "pair_hashing": "sorted", "odd_node": "duplicate" }
//! ```

use crate::encoding::EncodingPolicy;
use crate::tree::TreeConfig;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Directory name under the platform config dir
pub const CONFIG_DIR_NAME: &str = "merkle-distributor";

/// Everything that decides the bytes of a distribution's root and proofs
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DistributionConfig {
    #[serde(default)]
    pub encoding: EncodingPolicy,
    #[serde(flatten)]
    pub tree: TreeConfig,
}

impl DistributionConfig {
    /// Config for NFT metadata leaves behind a fixed prefix
    pub fn nft(prefix: Vec<u8>) -> Self {
        DistributionConfig {
            encoding: EncodingPolicy::PrefixedIdMetadata { prefix },
            tree: TreeConfig::default(),
        }
    }

    /// Default config file location
    pub fn default_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| Error::Config("Could not find config directory".into()))?;
        Ok(config_dir.join(CONFIG_DIR_NAME).join("config.json"))
    }

    /// Load a config file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("Failed to read config {}: {}", path.display(), e))
        })?;
        let config: DistributionConfig = serde_json::from_str(&content).map_err(|e| {
            Error::Config(format!("Failed to parse config {}: {}", path.display(), e))
        })?;
        config
            .encoding
            .validate()
            .map_err(|e| Error::Config(format!("Invalid config {}: {}", path.display(), e)))?;
        debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Load `path` if given, else the default file if it exists, else defaults
    pub fn resolve(path: Option<&Path>) -> Result<Self> {
        if let Some(path) = path {
            return Self::load(path);
        }
        match Self::default_path() {
            Ok(default) if default.exists() => Self::load(&default),
            _ => Ok(Self::default()),
        }
    }

    /// Write the config as pretty JSON, creating parent directories
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| Error::Config(format!("Failed to create config dir: {}", e)))?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)
            .map_err(|e| Error::Config(format!("Failed to write config: {}", e)))?;
        Ok(())
    }
}
