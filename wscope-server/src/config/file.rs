//! TOML file configuration structures.
//!
//! These structs directly map to the `walletscope.toml` file format. Every
//! section and field is optional; a missing file behaves like an empty one.

use serde::{Deserialize, Serialize};
use std::net::{Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use wscope_sdk::objects::Chain;

/// Root configuration structure as read from the TOML file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub server: ServerConfig,
    pub chains: ChainsConfig,
    pub upstreams: UpstreamsConfig,
    pub ai: AiConfig,
}

/// Server configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// The address and port to listen on (e.g., "0.0.0.0:3000").
    #[serde(default = "default_listen_addr")]
    pub listen: SocketAddr,
    /// Built dashboard to serve at `/`, with `index.html` as SPA fallback.
    #[serde(default)]
    pub static_dir: Option<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: default_listen_addr(),
            static_dir: None,
        }
    }
}

fn default_listen_addr() -> SocketAddr {
    SocketAddr::from((Ipv4Addr::UNSPECIFIED, 3000))
}

/// Which chains are mounted and how much each snapshot fetches.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainsConfig {
    /// `None` mounts every supported chain.
    #[serde(default)]
    pub enabled: Option<Vec<Chain>>,
    #[serde(default = "default_transfer_limit")]
    pub transfer_limit: usize,
    #[serde(default = "default_fan_out_limit")]
    pub fan_out_limit: usize,
    #[serde(default = "default_upstream_timeout")]
    pub upstream_timeout_secs: u64,
}

impl Default for ChainsConfig {
    fn default() -> Self {
        Self {
            enabled: None,
            transfer_limit: default_transfer_limit(),
            fan_out_limit: default_fan_out_limit(),
            upstream_timeout_secs: default_upstream_timeout(),
        }
    }
}

fn default_transfer_limit() -> usize {
    5
}

fn default_fan_out_limit() -> usize {
    4
}

fn default_upstream_timeout() -> u64 {
    30
}

/// Explorer endpoints and API keys.
///
/// URLs are kept as strings here and validated by the loader.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpstreamsConfig {
    #[serde(default = "default_etherscan_url")]
    pub etherscan_url: String,
    #[serde(default)]
    pub etherscan_api_key: Option<String>,
    #[serde(default = "default_tronscan_account_url")]
    pub tronscan_account_url: String,
    #[serde(default = "default_tronscan_api_url")]
    pub tronscan_api_url: String,
    #[serde(default)]
    pub tron_api_key: Option<String>,
    #[serde(default = "default_blockchain_info_url")]
    pub blockchain_info_url: String,
    #[serde(default = "default_blockcypher_url")]
    pub blockcypher_url: String,
    #[serde(default = "default_solana_rpc_url")]
    pub solana_rpc_url: String,
}

impl Default for UpstreamsConfig {
    fn default() -> Self {
        Self {
            etherscan_url: default_etherscan_url(),
            etherscan_api_key: None,
            tronscan_account_url: default_tronscan_account_url(),
            tronscan_api_url: default_tronscan_api_url(),
            tron_api_key: None,
            blockchain_info_url: default_blockchain_info_url(),
            blockcypher_url: default_blockcypher_url(),
            solana_rpc_url: default_solana_rpc_url(),
        }
    }
}

fn default_etherscan_url() -> String {
    "https://api.etherscan.io/v2/api".to_string()
}

fn default_tronscan_account_url() -> String {
    "https://apilist.tronscan.org".to_string()
}

fn default_tronscan_api_url() -> String {
    "https://apilist.tronscanapi.com".to_string()
}

fn default_blockchain_info_url() -> String {
    "https://blockchain.info".to_string()
}

fn default_blockcypher_url() -> String {
    "https://api.blockcypher.com/v1/btc/main".to_string()
}

fn default_solana_rpc_url() -> String {
    "https://api.mainnet-beta.solana.com".to_string()
}

/// Text generation service section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AiConfig {
    /// Leaving this out disables the AI endpoints.
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_ai_url")]
    pub base_url: String,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: default_model(),
            base_url: default_ai_url(),
        }
    }
}

fn default_model() -> String {
    "gemini-2.5-flash".to_string()
}

fn default_ai_url() -> String {
    "https://generativelanguage.googleapis.com/v1beta".to_string()
}
