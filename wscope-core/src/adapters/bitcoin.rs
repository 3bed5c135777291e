//! Bitcoin adapter.
//!
//! blockchain.info serves the balance as plain text; BlockCypher serves the
//! transaction reference list and one detail document per transaction.

use super::ChainAdapter;
use crate::config::{SnapshotLimits, UpstreamConfig};
use crate::error::UpstreamError;
use crate::fan_out::FanOut;
use crate::utils::http::{decode_json, decode_text, endpoint};
use crate::utils::units::{scale_integer, scale_u128};
use async_trait::async_trait;
use itertools::Itertools;
use rust_decimal::Decimal;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use tracing::{debug, warn};
use url::Url;
use wscope_sdk::objects::{Chain, TransferRecord, WalletSnapshot};

pub struct BitcoinAdapter {
    balance_url: Url,
    blockcypher_url: Url,
    transfer_limit: usize,
    fan_out: FanOut,
    http_client: reqwest::Client,
}

#[derive(Debug, serde::Deserialize)]
struct AddressRefs {
    #[serde(default)]
    txrefs: Vec<TxRef>,
}

#[derive(Debug, serde::Deserialize)]
struct TxRef {
    tx_hash: String,
}

#[derive(Debug, serde::Deserialize)]
struct TxDetail {
    #[serde(default)]
    inputs: Vec<TxEndpoint>,
    #[serde(default)]
    outputs: Vec<TxEndpoint>,
    /// Absent while the transaction is unconfirmed.
    confirmed: Option<String>,
}

/// An input or output; only the fields used for normalization.
#[derive(Debug, serde::Deserialize)]
struct TxEndpoint {
    #[serde(default)]
    addresses: Option<Vec<String>>,
    /// Satoshis; only meaningful on outputs.
    #[serde(default)]
    value: u64,
}

impl TxEndpoint {
    fn first_address(&self) -> &str {
        self.addresses
            .as_ref()
            .and_then(|addresses| addresses.first())
            .map(String::as_str)
            .unwrap_or("Unknown")
    }
}

impl BitcoinAdapter {
    pub fn new(
        upstream: &UpstreamConfig,
        limits: SnapshotLimits,
        http_client: reqwest::Client,
    ) -> Self {
        Self {
            balance_url: upstream.blockchain_info_url.clone(),
            blockcypher_url: upstream.blockcypher_url.clone(),
            transfer_limit: limits.transfer_limit,
            fan_out: FanOut::new(limits.fan_out_limit),
            http_client,
        }
    }

    async fn fetch_balance(&self, address: &str) -> Result<Decimal, UpstreamError> {
        let url = endpoint(
            &self.balance_url,
            &format!("q/addressbalance/{}", urlencoding::encode(address)),
        );
        let body = decode_text(self.http_client.get(url).send().await?).await?;
        scale_integer(&body, Chain::Bitcoin.native_decimals())
    }

    /// Most recent transaction hashes, deduplicated in upstream order.
    ///
    /// BlockCypher lists one ref per input/output touching the address, so
    /// the same hash can appear more than once.
    async fn fetch_tx_hashes(&self, address: &str) -> Result<Vec<String>, UpstreamError> {
        let url = endpoint(
            &self.blockcypher_url,
            &format!("addrs/{}", urlencoding::encode(address)),
        );
        let response = self
            .http_client
            .get(url)
            .query(&[("limit", self.transfer_limit)])
            .send()
            .await?;
        let refs: AddressRefs = decode_json(response).await?;
        Ok(refs
            .txrefs
            .into_iter()
            .map(|r| r.tx_hash)
            .unique()
            .take(self.transfer_limit)
            .collect())
    }

    async fn fetch_detail(&self, hash: &str) -> Result<TxDetail, UpstreamError> {
        let url = endpoint(
            &self.blockcypher_url,
            &format!("txs/{}", urlencoding::encode(hash)),
        );
        decode_json(self.http_client.get(url).send().await?).await
    }

    async fn fetch_transfers(&self, address: &str) -> Result<Vec<TransferRecord>, UpstreamError> {
        let hashes = self.fetch_tx_hashes(address).await?;
        debug!(count = hashes.len(), "Fetching BTC transaction details");

        let details = self
            .fan_out
            .run(hashes, |hash| async move {
                let detail = self.fetch_detail(&hash).await?;
                Ok::<_, UpstreamError>((hash, detail))
            })
            .await
            .into_all()?;

        Ok(details
            .into_iter()
            .filter_map(|(hash, detail)| normalize(hash, detail))
            .collect())
    }
}

fn normalize(hash: String, detail: TxDetail) -> Option<TransferRecord> {
    let Some(confirmed) = detail.confirmed.as_deref() else {
        warn!(hash = %hash, "Dropping unconfirmed BTC transaction");
        return None;
    };
    let timestamp = match OffsetDateTime::parse(confirmed, &Rfc3339) {
        Ok(ts) => ts,
        Err(e) => {
            warn!(hash = %hash, error = %e, "Dropping BTC transaction with invalid timestamp");
            return None;
        }
    };

    let total: u128 = detail.outputs.iter().map(|o| u128::from(o.value)).sum();
    let amount = match scale_u128(total, Chain::Bitcoin.native_decimals()) {
        Ok(amount) => amount,
        Err(e) => {
            warn!(hash = %hash, error = %e, "Dropping BTC transaction with invalid value");
            return None;
        }
    };

    let from = detail
        .inputs
        .first()
        .map(TxEndpoint::first_address)
        .unwrap_or("Unknown")
        .to_string();
    let to = detail
        .outputs
        .iter()
        .map(TxEndpoint::first_address)
        .join(", ");

    Some(TransferRecord {
        transaction_id: hash,
        from,
        to,
        amount,
        timestamp,
    })
}

#[async_trait]
impl ChainAdapter for BitcoinAdapter {
    async fn fetch_snapshot(&self, address: &str) -> Result<WalletSnapshot, UpstreamError> {
        debug!(address = address, "Fetching BTC balance and transactions");

        let (balance, transfers) =
            tokio::try_join!(self.fetch_balance(address), self.fetch_transfers(address))?;

        debug!(transfers = transfers.len(), "Fetched BTC snapshot");

        Ok(WalletSnapshot {
            chain: Chain::Bitcoin,
            address: address.to_string(),
            balance,
            transfers,
            fetched_at: OffsetDateTime::now_utc(),
        })
    }

    fn chain(&self) -> Chain {
        Chain::Bitcoin
    }
}
