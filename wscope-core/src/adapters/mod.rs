//! Chain adapters.
//!
//! Each adapter translates one blockchain explorer API into the common
//! [`WalletSnapshot`] shape:
//!
//! - `EvmAdapter`: EtherScan v2 multichain API, one instance per EVM chain
//! - `TronAdapter`: TronScan account + TRC-20 transfer APIs
//! - `BitcoinAdapter`: blockchain.info balance + BlockCypher transactions
//! - `SolanaAdapter`: Solana JSON-RPC
//!
//! Records that cannot be normalized are dropped; the caller sees a shorter
//! list rather than an error.

pub mod bitcoin;
pub mod evm;
pub mod solana;
pub mod tron;

pub use bitcoin::BitcoinAdapter;
pub use evm::EvmAdapter;
pub use solana::SolanaAdapter;
pub use tron::TronAdapter;

use crate::config::{SnapshotLimits, UpstreamConfig};
use crate::error::UpstreamError;
use async_trait::async_trait;
use std::sync::Arc;
use wscope_sdk::objects::{Chain, ChainFamily, WalletSnapshot};

/// Trait for chain adapter implementations.
///
/// Each chain family implements this trait to handle its specific API and
/// data format.
#[async_trait]
pub trait ChainAdapter: Send + Sync {
    /// Fetch the balance and most recent transfers of `address`.
    async fn fetch_snapshot(&self, address: &str) -> Result<WalletSnapshot, UpstreamError>;

    /// The chain this adapter serves.
    fn chain(&self) -> Chain;
}

/// Build the adapter for `chain` from the shared configuration.
pub fn build_adapter(
    chain: Chain,
    upstream: &UpstreamConfig,
    limits: SnapshotLimits,
    http_client: reqwest::Client,
) -> Arc<dyn ChainAdapter> {
    match chain.family() {
        ChainFamily::Evm => Arc::new(EvmAdapter::new(chain, upstream, limits, http_client)),
        ChainFamily::Tron => Arc::new(TronAdapter::new(upstream, limits, http_client)),
        ChainFamily::Bitcoin => Arc::new(BitcoinAdapter::new(upstream, limits, http_client)),
        ChainFamily::Solana => Arc::new(SolanaAdapter::new(upstream, limits, http_client)),
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use crate::config::UpstreamConfig;
    use url::Url;

    /// Upstream configuration with every service pointed at `base`.
    pub fn upstream_at(base: &str) -> UpstreamConfig {
        let url = |path: &str| Url::parse(&format!("{base}{path}")).unwrap();
        UpstreamConfig {
            etherscan_url: url("/v2/api"),
            etherscan_api_key: Some("test-key".to_string()),
            tronscan_account_url: url("/tron-account"),
            tronscan_api_url: url("/tron-api"),
            tron_api_key: Some("tron-key".to_string()),
            blockchain_info_url: url("/bci"),
            blockcypher_url: url("/v1/btc/main"),
            solana_rpc_url: url("/solana"),
        }
    }
}
