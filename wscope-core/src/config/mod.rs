//! Configuration types for Walletscope.
//!
//! These types represent the validated runtime configuration handed to the
//! adapters and the AI relay at construction time. Loading and parsing is
//! handled by the server crate.

mod ai;
mod upstream;

pub use ai::AiConfig;
pub use upstream::UpstreamConfig;

use std::time::Duration;
use wscope_sdk::objects::Chain;

/// How much each snapshot fetches and how wide it fans out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SnapshotLimits {
    /// Number of most recent transfers per snapshot.
    pub transfer_limit: usize,
    /// Maximum in-flight detail requests per snapshot.
    pub fan_out_limit: usize,
}

impl Default for SnapshotLimits {
    fn default() -> Self {
        Self {
            transfer_limit: 5,
            fan_out_limit: 4,
        }
    }
}

/// Everything the core needs to serve requests.
#[derive(Debug, Clone)]
pub struct CoreConfig {
    pub upstream: UpstreamConfig,
    pub ai: AiConfig,
    pub limits: SnapshotLimits,
    /// Chains the server mounts an adapter for.
    pub enabled_chains: Vec<Chain>,
    /// Per-request timeout applied to every upstream call.
    pub upstream_timeout: Duration,
}

impl CoreConfig {
    /// Build the shared HTTP client used by all adapters and the AI relay.
    pub fn http_client(&self) -> Result<reqwest::Client, reqwest::Error> {
        reqwest::Client::builder()
            .timeout(self.upstream_timeout)
            .user_agent(concat!("walletscope/", env!("CARGO_PKG_VERSION")))
            .build()
    }
}
