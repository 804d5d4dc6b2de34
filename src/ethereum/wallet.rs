use alloy::{network::EthereumWallet, primitives::Address, signers::local::PrivateKeySigner};
use anyhow::{anyhow, Result};
use std::str::FromStr;
use tracing::debug;

use crate::config::WalletConfig;

/// A connected signing account.
///
/// Key material is read from the environment variable named in the wallet
/// configuration. A missing or empty variable means no wallet is available,
/// which is a normal state (`connect` returns `Ok(None)`), not an error;
/// only malformed key material is an error.
#[derive(Debug, Clone)]
pub struct WalletSession {
    signer: PrivateKeySigner,
}

impl WalletSession {
    pub fn connect(config: &WalletConfig) -> Result<Option<Self>> {
        let Ok(raw) = std::env::var(&config.private_key_env) else {
            debug!(var = %config.private_key_env, "no wallet key material in environment");
            return Ok(None);
        };

        let raw = raw.trim();
        if raw.is_empty() {
            return Ok(None);
        }

        let key = raw.strip_prefix("0x").unwrap_or(raw);
        let signer = PrivateKeySigner::from_str(key).map_err(|e| {
            anyhow!(
                "Invalid private key in {}: {}",
                config.private_key_env,
                e
            )
        })?;

        Ok(Some(Self { signer }))
    }

    pub fn address(&self) -> Address {
        self.signer.address()
    }

    pub fn ethereum_wallet(&self) -> EthereumWallet {
        EthereumWallet::from(self.signer.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Throwaway key, well known from local devnet tooling.
    const DEV_KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

    fn wallet_config(var: &str) -> WalletConfig {
        WalletConfig {
            private_key_env: var.to_string(),
        }
    }

    #[test]
    fn absent_key_material_is_not_an_error() {
        let session = WalletSession::connect(&wallet_config("WALLET_TEST_UNSET_VAR")).unwrap();
        assert!(session.is_none());
    }

    #[test]
    fn valid_key_connects_and_derives_the_account() {
        let var = "WALLET_TEST_VALID_KEY";
        std::env::set_var(var, DEV_KEY);
        let session = WalletSession::connect(&wallet_config(var)).unwrap().unwrap();
        assert_eq!(
            format!("{:#x}", session.address()),
            "0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266"
        );
        std::env::remove_var(var);
    }

    #[test]
    fn malformed_key_is_an_error() {
        let var = "WALLET_TEST_BAD_KEY";
        std::env::set_var(var, "0xnothex");
        assert!(WalletSession::connect(&wallet_config(var)).is_err());
        std::env::remove_var(var);
    }
}
