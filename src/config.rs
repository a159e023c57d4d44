use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use tokio::fs;

use crate::crypto::Algorithm;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub default_network: String,
    pub networks: HashMap<String, NetworkConfig>,
    pub crypto: CryptoConfig,
    pub gas: GasConfig,
    pub polling: PollingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkConfig {
    pub rpc_url: String,
    pub ws_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CryptoConfig {
    pub algorithm: Algorithm,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GasConfig {
    pub gas: u64,
    pub gas_price: u64,
}

impl Default for GasConfig {
    fn default() -> Self {
        // fee-less permissioned chains run a zero gas price
        Self {
            gas: 2_000_000,
            gas_price: 0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollingConfig {
    /// Receipt poll interval.
    pub interval_ms: u64,
    /// Overall wait budget for one transaction.
    pub budget_secs: u64,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            interval_ms: 1_000,
            budget_secs: 30,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        let mut networks = HashMap::new();

        networks.insert(
            "local".to_string(),
            NetworkConfig {
                rpc_url: "http://127.0.0.1:6791".to_string(),
                ws_url: Some("ws://127.0.0.1:26791".to_string()),
            },
        );

        Self {
            default_network: "local".to_string(),
            networks,
            crypto: CryptoConfig {
                algorithm: Algorithm::Homestead,
            },
            gas: GasConfig::default(),
            polling: PollingConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub async fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .await
            .map_err(|e| anyhow!("Failed to read config file {:?}: {}", path, e))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| anyhow!("Failed to parse config file {:?}: {}", path, e))?;

        Ok(config)
    }

    /// Save configuration to a TOML file
    pub async fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let content = toml::to_string_pretty(self)
            .map_err(|e| anyhow!("Failed to serialize config: {}", e))?;

        // Create parent directory if it doesn't exist
        if let Some(parent) = path.parent() {
            if !parent.exists() {
                fs::create_dir_all(parent).await.map_err(|e| {
                    anyhow!("Failed to create config directory {:?}: {}", parent, e)
                })?;
            }
        }

        fs::write(path, content)
            .await
            .map_err(|e| anyhow!("Failed to write config file {:?}: {}", path, e))?;

        Ok(())
    }

    /// Load configuration with fallback to default
    pub async fn load_or_default<P: AsRef<Path>>(path: Option<P>) -> Self {
        let mut config = match path {
            Some(path) => match Self::load_from_file(path).await {
                Ok(config) => {
                    tracing::info!("Loaded configuration from file");
                    config
                }
                Err(e) => {
                    tracing::warn!("Failed to load config file, using defaults: {}", e);
                    Self::default()
                }
            },
            None => Self::default(),
        };

        // Apply environment variable substitutions
        config.apply_env_vars();
        config
    }

    /// Add a new network configuration
    pub fn add_network(&mut self, name: String, config: NetworkConfig) {
        self.networks.insert(name, config);
    }

    /// Resolve a network by name, falling back to the configured default.
    pub fn network(&self, name: Option<&str>) -> Result<&NetworkConfig> {
        let name = name.unwrap_or(&self.default_network);
        self.networks
            .get(name)
            .ok_or_else(|| anyhow!("Unknown network {:?}", name))
    }

    /// Apply environment variable substitutions to configuration
    fn apply_env_vars(&mut self) {
        if let Ok(rpc_url) = std::env::var("CONTRACT_SDK_RPC_URL") {
            tracing::info!("Using CONTRACT_SDK_RPC_URL for the default network");
            let default = self.default_network.clone();
            if let Some(network) = self.networks.get_mut(&default) {
                network.rpc_url = rpc_url;
            }
        }

        if let Ok(ws_url) = std::env::var("CONTRACT_SDK_WS_URL") {
            tracing::info!("Using CONTRACT_SDK_WS_URL for the default network");
            let default = self.default_network.clone();
            if let Some(network) = self.networks.get_mut(&default) {
                network.ws_url = Some(ws_url);
            }
        }

        if let Ok(algorithm) = std::env::var("CONTRACT_SDK_ALGORITHM") {
            match algorithm.parse::<Algorithm>() {
                Ok(parsed) => {
                    tracing::info!("Using CONTRACT_SDK_ALGORITHM={}", parsed);
                    self.crypto.algorithm = parsed;
                }
                Err(e) => tracing::warn!("Ignoring CONTRACT_SDK_ALGORITHM: {}", e),
            }
        }
    }

    /// Get default config file path
    pub fn default_config_path() -> Result<std::path::PathBuf> {
        let config_dir =
            dirs::config_dir().ok_or_else(|| anyhow!("Could not determine config directory"))?;
        Ok(config_dir.join("contract-sdk").join("config.toml"))
    }

    /// Generate a sample configuration file
    pub fn generate_sample() -> String {
        let sample_config = r#"# Contract SDK Configuration File
# This file configures chain endpoints, signing, and submission behavior

# Default network to use when none is specified
default_network = "local"

# Network configurations
[networks.local]
rpc_url = "http://127.0.0.1:6791"
ws_url = "ws://127.0.0.1:26791"

[networks.node1]
rpc_url = "http://10.0.0.11:6791"
ws_url = "ws://10.0.0.11:26791"

# Signing algorithm: "homestead" (secp256k1) or "gm" (SM2/SM3)
[crypto]
algorithm = "homestead"

# Transaction defaults
[gas]
gas = 2000000
gas_price = 0

# Receipt polling
[polling]
interval_ms = 1000
budget_secs = 30

# Environment variables that can be used:
# CONTRACT_SDK_RPC_URL   - overrides the default network's RPC endpoint
# CONTRACT_SDK_WS_URL    - overrides the default network's websocket endpoint
# CONTRACT_SDK_ALGORITHM - overrides the signing algorithm
"#;
        sample_config.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_has_local_network() {
        let config = Config::default();
        let network = config.network(None).unwrap();
        assert_eq!(network.rpc_url, "http://127.0.0.1:6791");
        assert!(config.network(Some("nowhere")).is_err());
    }

    #[test]
    fn test_sample_config_parses() {
        let config: Config = toml::from_str(&Config::generate_sample()).unwrap();
        assert_eq!(config.default_network, "local");
        assert_eq!(config.crypto.algorithm, Algorithm::Homestead);
        assert_eq!(config.polling.budget_secs, 30);
        assert!(config.networks.contains_key("node1"));
    }

    #[tokio::test]
    async fn test_save_and_reload_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = Config::default();
        config.gas.gas = 123_456;
        config.crypto.algorithm = Algorithm::Gm;
        config.save_to_file(&path).await.unwrap();

        let reloaded = Config::load_from_file(&path).await.unwrap();
        assert_eq!(reloaded.gas.gas, 123_456);
        assert_eq!(reloaded.crypto.algorithm, Algorithm::Gm);
    }

    #[tokio::test]
    async fn test_load_or_default_falls_back() {
        let config = Config::load_or_default(Some("/definitely/not/here.toml")).await;
        assert_eq!(config.default_network, "local");
    }
}
