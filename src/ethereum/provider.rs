use crate::config::Config;
use crate::ethereum::{chains, utils};
use alloy::{
    providers::{Provider, ProviderBuilder, RootProvider},
    transports::http::{Client, Http},
};
use anyhow::{anyhow, Result};

/// Build an HTTP provider for an arbitrary endpoint URL.
pub fn http_provider(rpc_url: &str) -> Result<RootProvider<Http<Client>>> {
    let url = rpc_url
        .parse()
        .map_err(|e| anyhow!("Invalid RPC URL '{}': {}", rpc_url, e))?;
    Ok(ProviderBuilder::new().on_http(url))
}

/// Resolves the endpoint a command should talk to: an explicitly entered
/// URL wins, then a named network from the configuration, then the
/// configured default network.
#[derive(Debug, Clone)]
pub struct EndpointResolver {
    config: Config,
}

impl EndpointResolver {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    pub fn available_networks(&self) -> Vec<String> {
        self.config.networks.keys().cloned().collect()
    }

    pub fn resolve(&self, rpc_url: Option<&str>, network: Option<&str>) -> Result<String> {
        if let Some(url) = rpc_url {
            let url = url.trim();
            if url.is_empty() {
                return Err(anyhow!("RPC URL cannot be empty"));
            }
            if !chains::is_preset(url) {
                tracing::debug!(url, "using custom RPC endpoint");
            }
            return Ok(url.to_string());
        }

        let name = network.unwrap_or(&self.config.default_network);
        utils::validate_network(name, &self.available_networks())?;
        let network_config = self
            .config
            .networks
            .get(name)
            .ok_or_else(|| anyhow!("Network '{}' not found", name))?;
        Ok(network_config.rpc_url.clone())
    }

    pub fn provider(
        &self,
        rpc_url: Option<&str>,
        network: Option<&str>,
    ) -> Result<RootProvider<Http<Client>>> {
        http_provider(&self.resolve(rpc_url, network)?)
    }

    pub async fn chain_id(&self, rpc_url: Option<&str>, network: Option<&str>) -> Result<u64> {
        let provider = self.provider(rpc_url, network)?;
        let chain_id = provider.get_chain_id().await.map_err(|e| {
            anyhow!(utils::interpret_rpc_error(&e.to_string()))
        })?;
        Ok(chain_id)
    }
}
