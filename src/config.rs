use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use tokio::fs;

use crate::ethereum::chains;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub networks: HashMap<String, NetworkConfig>,
    pub default_network: String,
    pub wallet: WalletConfig,
    pub security: SecurityConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkConfig {
    pub rpc_url: String,
    pub chain_id: u64,
    pub explorer_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalletConfig {
    /// Environment variable holding the signing key for write operations.
    pub private_key_env: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    pub allow_write_operations: bool,
}

impl Default for Config {
    fn default() -> Self {
        // Each bundled chain gets its first public endpoint as the default.
        let mut networks = HashMap::new();
        for preset in chains::CHAIN_PRESETS {
            let Some(endpoint) = preset.endpoints.first() else {
                continue;
            };
            networks.insert(
                preset.slug.to_string(),
                NetworkConfig {
                    rpc_url: endpoint.url.to_string(),
                    chain_id: preset.chain_id,
                    explorer_url: None,
                },
            );
        }

        Self {
            networks,
            default_network: "ethereum".to_string(),
            wallet: WalletConfig {
                private_key_env: "CONTRACT_CONSOLE_PRIVATE_KEY".to_string(),
            },
            security: SecurityConfig {
                allow_write_operations: false,
            },
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

        config.apply_env_vars();
        config
    }

    /// Apply environment variable overrides to configuration
    fn apply_env_vars(&mut self) {
        // CONTRACT_CONSOLE_RPC_URL pins the default network to one endpoint
        if let Ok(rpc_url) = std::env::var("CONTRACT_CONSOLE_RPC_URL") {
            let default_network = self.default_network.clone();
            if let Some(network_config) = self.networks.get_mut(&default_network) {
                tracing::info!(
                    network = %default_network,
                    "using CONTRACT_CONSOLE_RPC_URL for the default network"
                );
                network_config.rpc_url = rpc_url;
            }
        }

        if std::env::var(&self.wallet.private_key_env).is_ok() {
            tracing::debug!(
                var = %self.wallet.private_key_env,
                "wallet key material found, write operations can be signed"
            );
        }
    }

    /// Get default config file path
    pub fn default_config_path() -> Result<std::path::PathBuf> {
        let config_dir =
            dirs::config_dir().ok_or_else(|| anyhow!("Could not determine config directory"))?;
        Ok(config_dir.join("contract-console").join("config.toml"))
    }

    /// Generate a sample configuration file
    pub fn generate_sample() -> String {
        let sample_config = r#"# contract-console configuration file
# Networks map a short name to a JSON-RPC endpoint; the bundled defaults
# cover the major public chains with free endpoints.

# Default network to use when none is specified
default_network = "ethereum"

[networks.ethereum]
rpc_url = "https://cloudflare-eth.com"
chain_id = 1
explorer_url = "https://etherscan.io"

[networks.polygon]
rpc_url = "https://polygon-rpc.com"
chain_id = 137
explorer_url = "https://polygonscan.com"

[networks.bsc]
rpc_url = "https://bsc-dataseed.bnbchain.org"
chain_id = 56

[networks.arbitrum]
rpc_url = "https://arb1.arbitrum.io/rpc"
chain_id = 42161
explorer_url = "https://arbiscan.io"

[networks.base]
rpc_url = "https://mainnet.base.org"
chain_id = 8453

[networks.optimism]
rpc_url = "https://mainnet.optimism.io"
chain_id = 10

[networks.avalanche]
rpc_url = "https://api.avax.network/ext/bc/C/rpc"
chain_id = 43114

[networks.fantom]
rpc_url = "https://rpc.ftm.tools"
chain_id = 250

# Wallet settings
[wallet]
# Environment variable read for the signing key; never stored in this file
private_key_env = "CONTRACT_CONSOLE_PRIVATE_KEY"

# Security settings
[security]
allow_write_operations = false

# Environment variables that can be used:
# CONTRACT_CONSOLE_PRIVATE_KEY - signing key for write operations
# CONTRACT_CONSOLE_RPC_URL - overrides the default network's endpoint
"#;
        sample_config.to_string()
    }
}
