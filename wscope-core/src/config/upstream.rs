//! Endpoints and API keys for blockchain explorer services.

use url::Url;

/// Endpoints and API keys for blockchain explorer services.
///
/// Keys are optional: every upstream answers unauthenticated requests at a
/// lower rate limit.
#[derive(Debug, Clone)]
pub struct UpstreamConfig {
    /// EtherScan v2 multichain endpoint (used for all EVM-compatible chains).
    pub etherscan_url: Url,
    pub etherscan_api_key: Option<String>,
    /// TronScan host serving `/api/account`.
    pub tronscan_account_url: Url,
    /// TronScan host serving `/api/token_trc20/transfers`.
    pub tronscan_api_url: Url,
    /// Sent as `TRON-PRO-API-KEY` on the transfer call only.
    pub tron_api_key: Option<String>,
    /// blockchain.info host serving `/q/addressbalance/{address}`.
    pub blockchain_info_url: Url,
    /// BlockCypher base including network, e.g. `https://api.blockcypher.com/v1/btc/main`.
    pub blockcypher_url: Url,
    pub solana_rpc_url: Url,
}
