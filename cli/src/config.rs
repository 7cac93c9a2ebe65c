//! Operator configuration
//!
//! Read from a TOML file, then overridden by environment variables, then by
//! command-line flags (in `main`).

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use treasury::{CoinMetadata, Genesis};
use warden_core::Member;
use warden_governance::ApprovalPolicy;

/// Config file used when neither `--config` nor `WARDEN_CONFIG` is given
pub const DEFAULT_CONFIG_FILE: &str = "warden.toml";

pub const ENV_CONFIG: &str = "WARDEN_CONFIG";
pub const ENV_DATA_DIR: &str = "WARDEN_DATA_DIR";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Default `env_logger` filter; `RUST_LOG` wins when set
    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub approval_policy: ApprovalPolicy,

    #[serde(default)]
    pub genesis: Option<GenesisConfig>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenesisConfig {
    pub members: Vec<String>,
    pub threshold: u64,
    /// Stakeholder bucket name to initial balance
    #[serde(default)]
    pub allocations: BTreeMap<String, u64>,
    #[serde(default)]
    pub metadata: CoinMetadata,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("warden-data")
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            log_level: default_log_level(),
            approval_policy: ApprovalPolicy::default(),
            genesis: None,
        }
    }
}

impl Config {
    /// Load using the process environment.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        Self::resolve(explicit, |key| std::env::var(key).ok())
    }

    /// Pick the config file (`explicit`, then `WARDEN_CONFIG`, then
    /// `warden.toml` if present), parse it and apply environment overrides.
    pub fn resolve(explicit: Option<&Path>, env: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let path = match explicit {
            Some(path) => Some(path.to_path_buf()),
            None => env(ENV_CONFIG).map(PathBuf::from).or_else(|| {
                let fallback = PathBuf::from(DEFAULT_CONFIG_FILE);
                fallback.exists().then_some(fallback)
            }),
        };

        let mut config = match path {
            Some(path) => Self::from_file(&path)?,
            None => Self::default(),
        };
        if let Some(dir) = env(ENV_DATA_DIR) {
            config.data_dir = PathBuf::from(dir);
        }
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        Self::parse(&contents).with_context(|| format!("Invalid config {}", path.display()))
    }

    pub fn parse(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// Genesis parameters for `init`.
    pub fn genesis(&self) -> Result<Genesis> {
        let genesis = self
            .genesis
            .as_ref()
            .context("Config has no [genesis] section")?;
        Ok(Genesis {
            members: genesis.members.iter().map(|m| Member::from(m.as_str())).collect(),
            threshold: genesis.threshold,
            allocations: genesis.allocations.clone(),
            metadata: genesis.metadata.clone(),
            approval_policy: self.approval_policy,
        })
    }
}
