//! Configuration for the zkLogin CLI

use std::fs;
use std::path::PathBuf;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Default directory for session state and config
const ZKLOGIN_DIR: &str = ".zklogin";
const CONFIG_FILE: &str = "config.json";

/// CLI configuration, merged from defaults, the config file, and flags.
#[derive(Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct CliConfig {
    /// Chain RPC endpoint, queried for the current epoch.
    pub rpc_url: String,
    /// Proving service endpoint.
    pub prover_url: String,
    /// Identity provider authorization endpoint.
    pub authorize_endpoint: String,
    /// OAuth client id registered with the provider.
    pub client_id: String,
    /// Redirect URI registered with the provider.
    pub redirect_uri: String,
    /// Epochs of validity added to the current epoch at login.
    pub epoch_validity: u64,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            rpc_url: "https://fullnode.devnet.sui.io:443".to_string(),
            prover_url: "https://prover-dev.mystenlabs.com/v1".to_string(),
            authorize_endpoint: "https://accounts.google.com/o/oauth2/v2/auth".to_string(),
            client_id: String::new(),
            redirect_uri: "http://localhost:5173/callback".to_string(),
            epoch_validity: 2,
        }
    }
}

/// Get the zklogin config directory path
pub fn zklogin_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(ZKLOGIN_DIR)
}

/// Get the config file path
pub fn config_file() -> PathBuf {
    zklogin_dir().join(CONFIG_FILE)
}

/// Load configuration: file over defaults, flags over file.
pub fn load(rpc_url: Option<&str>, prover_url: Option<&str>) -> Result<CliConfig> {
    let mut cfg = read_file(&config_file())?;

    if let Some(url) = rpc_url {
        cfg.rpc_url = url.to_string();
    }
    if let Some(url) = prover_url {
        cfg.prover_url = url.to_string();
    }

    Ok(cfg)
}

fn read_file(path: &PathBuf) -> Result<CliConfig> {
    if !path.exists() {
        return Ok(CliConfig::default());
    }

    let json = fs::read_to_string(path).context("Failed to read config file")?;
    serde_json::from_str(&json).context("Failed to parse config file")
}

/// Save configuration to disk
pub fn save(cfg: &CliConfig) -> Result<()> {
    let dir = zklogin_dir();
    fs::create_dir_all(&dir).context("Failed to create zklogin directory")?;

    let json = serde_json::to_string_pretty(cfg)?;
    fs::write(config_file(), json)?;
    Ok(())
}

#[cfg(test)]
pub(crate) fn read_file_for_tests(path: &PathBuf) -> Result<CliConfig> {
    read_file(path)
}
