//! Tron adapter.
//!
//! Balance comes from the TronScan account endpoint, transfers from the
//! TRC-20 transfer endpoint on a different host. Only the transfer call
//! carries the API key.

use super::ChainAdapter;
use crate::config::{SnapshotLimits, UpstreamConfig};
use crate::error::UpstreamError;
use crate::utils::http::{decode_json, decode_records, endpoint};
use crate::utils::units::{scale_integer, scale_u128};
use async_trait::async_trait;
use rust_decimal::Decimal;
use time::OffsetDateTime;
use tracing::{debug, warn};
use url::Url;
use wscope_sdk::objects::{Chain, TransferRecord, WalletSnapshot};

const API_KEY_HEADER: &str = "TRON-PRO-API-KEY";

/// Most TRC-20 tokens (USDT, USDC) use 6 decimals.
const DEFAULT_TOKEN_DECIMALS: u32 = 6;

pub struct TronAdapter {
    account_url: Url,
    api_url: Url,
    api_key: Option<String>,
    transfer_limit: usize,
    http_client: reqwest::Client,
}

#[derive(Debug, serde::Deserialize)]
struct TronAccount {
    /// In sun; absent for accounts that were never activated.
    #[serde(default)]
    balance: u64,
}

#[derive(Debug, serde::Deserialize)]
struct TronScanTransfersResponse {
    token_transfers: Option<Vec<serde_json::Value>>,
}

#[derive(Debug, serde::Deserialize)]
struct Trc20TransferData {
    transaction_id: String,
    block_ts: i64,
    from_address: String,
    to_address: String,
    quant: String,
    #[serde(rename = "tokenInfo", default)]
    token_info: Option<TokenInfo>,
}

#[derive(Debug, serde::Deserialize)]
struct TokenInfo {
    #[serde(rename = "tokenDecimal")]
    token_decimal: Option<u32>,
}

impl TronAdapter {
    pub fn new(
        upstream: &UpstreamConfig,
        limits: SnapshotLimits,
        http_client: reqwest::Client,
    ) -> Self {
        Self {
            account_url: upstream.tronscan_account_url.clone(),
            api_url: upstream.tronscan_api_url.clone(),
            api_key: upstream.tron_api_key.clone(),
            transfer_limit: limits.transfer_limit,
            http_client,
        }
    }

    async fn fetch_balance(&self, address: &str) -> Result<Decimal, UpstreamError> {
        let response = self
            .http_client
            .get(endpoint(&self.account_url, "api/account"))
            .query(&[("address", address)])
            .send()
            .await?;
        let account: TronAccount = decode_json(response).await?;
        scale_u128(u128::from(account.balance), Chain::Tron.native_decimals())
    }

    async fn fetch_transfers(&self, address: &str) -> Result<Vec<TransferRecord>, UpstreamError> {
        let limit = self.transfer_limit.to_string();
        let mut request = self
            .http_client
            .get(endpoint(&self.api_url, "api/token_trc20/transfers"))
            .query(&[
                ("relatedAddress", address),
                ("limit", limit.as_str()),
                ("start", "0"),
                ("sort", "-timestamp"),
            ]);
        if let Some(key) = &self.api_key {
            request = request.header(API_KEY_HEADER, key);
        }

        let response: TronScanTransfersResponse = decode_json(request.send().await?).await?;
        let Some(items) = response.token_transfers else {
            return Err(UpstreamError::shape("no TRC-20 transfer data found"));
        };

        let items: Vec<Trc20TransferData> = decode_records(items, "tronscan");
        Ok(items
            .into_iter()
            .take(self.transfer_limit)
            .filter_map(normalize)
            .collect())
    }
}

fn normalize(transfer: Trc20TransferData) -> Option<TransferRecord> {
    let decimals = transfer
        .token_info
        .and_then(|info| info.token_decimal)
        .unwrap_or(DEFAULT_TOKEN_DECIMALS);
    let amount = match scale_integer(&transfer.quant, decimals) {
        Ok(amount) => amount,
        Err(e) => {
            warn!(txid = %transfer.transaction_id, error = %e, "Dropping TRC-20 transfer with invalid value");
            return None;
        }
    };
    let timestamp = match OffsetDateTime::from_unix_timestamp_nanos(
        i128::from(transfer.block_ts) * 1_000_000,
    ) {
        Ok(ts) => ts,
        Err(e) => {
            warn!(txid = %transfer.transaction_id, error = %e, "Dropping TRC-20 transfer with invalid timestamp");
            return None;
        }
    };
    Some(TransferRecord {
        transaction_id: transfer.transaction_id,
        from: transfer.from_address,
        to: transfer.to_address,
        amount,
        timestamp,
    })
}

#[async_trait]
impl ChainAdapter for TronAdapter {
    async fn fetch_snapshot(&self, address: &str) -> Result<WalletSnapshot, UpstreamError> {
        debug!(address = address, "Fetching TRON balance and TRC-20 transfers");

        let (balance, transfers) =
            tokio::try_join!(self.fetch_balance(address), self.fetch_transfers(address))?;

        debug!(transfers = transfers.len(), "Fetched TRON snapshot");

        Ok(WalletSnapshot {
            chain: Chain::Tron,
            address: address.to_string(),
            balance,
            transfers,
            fetched_at: OffsetDateTime::now_utc(),
        })
    }

    fn chain(&self) -> Chain {
        Chain::Tron
    }
}
