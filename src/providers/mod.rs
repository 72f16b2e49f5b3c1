//! Wallet Capability Providers
//!
//! Narrow interface the wallet wizards use for everything that leaves the
//! device: email verification, external wallet connection and resolving the
//! embedded wallet's own address.
//!
//! The implementation is picked once from configuration by [`build_provider`]
//! and shared as an `Arc<dyn WalletProvider>`:
//! - [`MockWalletProvider`]: simulated delays, fixed verification code
//! - [`RemoteWalletProvider`]: JSON over HTTPS

pub mod mock;
pub mod remote;

pub use mock::{MockWalletProvider, ProviderOp};
pub use remote::RemoteWalletProvider;

use crate::config::{AppConfig, ProviderKind};
use crate::error::MundoResult;
use crate::wizard::CancelToken;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Wallet reported by an external connection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectedWallet {
    pub address: String,
    pub chain_id: Option<u64>,
}

#[async_trait]
pub trait WalletProvider: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &'static str;

    /// Email a one-time code to `email`
    async fn send_verification_code(&self, email: &str, cancel: &CancelToken) -> MundoResult<()>;

    /// Check the one-time code for `email`
    async fn verify_code(&self, email: &str, code: &str, cancel: &CancelToken) -> MundoResult<()>;

    /// Hand off to an external wallet and wait for it to connect
    async fn connect_external_wallet(&self, cancel: &CancelToken) -> MundoResult<ConnectedWallet>;

    /// Address of the signed-in user's embedded wallet, if the provider knows it
    async fn resolve_own_address(&self, cancel: &CancelToken) -> MundoResult<Option<String>>;
}

/// Build the provider named by `config.provider`
pub fn build_provider(config: &AppConfig) -> MundoResult<Arc<dyn WalletProvider>> {
    let provider: Arc<dyn WalletProvider> = match config.provider {
        ProviderKind::Mock => Arc::new(MockWalletProvider::new(config.latency)),
        ProviderKind::Remote => Arc::new(RemoteWalletProvider::new(
            &config.api_base_url,
            config.project_id.clone(),
        )?),
    };

    crate::log_info!("providers", "Wallet provider selected", provider = provider.name());
    Ok(provider)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_provider_follows_config() {
        let provider = build_provider(&AppConfig::demo()).unwrap();
        assert_eq!(provider.name(), "mock");

        let provider = build_provider(&AppConfig::standard()).unwrap();
        assert_eq!(provider.name(), "remote");
    }

    #[test]
    fn test_build_provider_rejects_plain_http() {
        let mut config = AppConfig::standard();
        config.api_base_url = "http://api.example.com".to_string();
        assert!(build_provider(&config).is_err());
    }
}
