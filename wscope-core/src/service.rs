//! Aggregation: validate a wallet query and dispatch it to the chain adapter.

use crate::adapters::{ChainAdapter, build_adapter};
use crate::config::CoreConfig;
use crate::error::UpstreamError;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, error};
use wscope_sdk::objects::{Chain, ChainFamily, WalletSnapshot};

#[derive(Debug, Error)]
pub enum WalletError {
    #[error("unsupported chain: {0}")]
    UnsupportedChain(String),

    #[error("address is required")]
    MissingAddress,

    #[error("invalid address: {0}")]
    InvalidAddress(String),

    #[error(transparent)]
    Upstream(#[from] UpstreamError),
}

/// Registry of the mounted chain adapters.
#[derive(Default)]
pub struct WalletService {
    adapters: HashMap<Chain, Arc<dyn ChainAdapter>>,
}

impl WalletService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mount one adapter for every enabled chain, sharing `http_client`.
    pub fn from_config(config: &CoreConfig, http_client: reqwest::Client) -> Self {
        let mut service = Self::new();
        for &chain in &config.enabled_chains {
            service.register(build_adapter(
                chain,
                &config.upstream,
                config.limits,
                http_client.clone(),
            ));
        }
        service
    }

    /// Mount `adapter` under its own chain, replacing any previous one.
    pub fn register(&mut self, adapter: Arc<dyn ChainAdapter>) {
        self.adapters.insert(adapter.chain(), adapter);
    }

    /// Mounted chains, in [`Chain::ALL`] order.
    pub fn enabled_chains(&self) -> Vec<Chain> {
        Chain::ALL
            .into_iter()
            .filter(|chain| self.adapters.contains_key(chain))
            .collect()
    }

    /// Fetch the balance and recent transfers of `address` on `chain`.
    ///
    /// Validation failures never reach an upstream.
    pub async fn snapshot(&self, chain: &str, address: &str) -> Result<WalletSnapshot, WalletError> {
        let parsed: Chain = chain
            .parse()
            .map_err(|_| WalletError::UnsupportedChain(chain.trim().to_string()))?;

        let address = address.trim();
        if address.is_empty() {
            return Err(WalletError::MissingAddress);
        }
        if parsed.family() == ChainFamily::Evm && !has_hex_prefix(address) {
            return Err(WalletError::InvalidAddress(format!(
                "{parsed} addresses must start with 0x"
            )));
        }

        let Some(adapter) = self.adapters.get(&parsed) else {
            return Err(WalletError::UnsupportedChain(parsed.to_string()));
        };

        debug!(chain = %parsed, address = address, "Dispatching wallet snapshot");
        adapter.fetch_snapshot(address).await.map_err(|e| {
            error!(chain = %parsed, address = address, error = %e, "Wallet snapshot failed");
            WalletError::Upstream(e)
        })
    }
}

fn has_hex_prefix(address: &str) -> bool {
    address
        .get(..2)
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case("0x"))
}
