//! EVM chain adapter.
//!
//! Handles EtherScan-compatible v2 multichain APIs; the `chainid` parameter
//! selects the network.

use super::ChainAdapter;
use crate::config::{SnapshotLimits, UpstreamConfig};
use crate::error::UpstreamError;
use crate::utils::http::{decode_json, decode_records};
use crate::utils::units::scale_integer;
use async_trait::async_trait;
use time::OffsetDateTime;
use tracing::{debug, warn};
use url::Url;
use wscope_sdk::objects::{Chain, TransferRecord, WalletSnapshot};

/// EtherScan answers an empty history with status "0" and this message.
const NO_TRANSACTIONS: &str = "No transactions found";

/// EVM adapter, one instance per chain.
pub struct EvmAdapter {
    chain: Chain,
    endpoint: Url,
    api_key: Option<String>,
    transfer_limit: usize,
    http_client: reqwest::Client,
}

#[derive(Debug, serde::Deserialize)]
struct EtherScanResponse {
    status: String,
    #[serde(default)]
    message: String,
    result: serde_json::Value,
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
struct EvmTransactionItem {
    hash: String,
    time_stamp: String,
    from: String,
    #[serde(default)]
    to: String,
    value: String,
}

impl EvmAdapter {
    pub fn new(
        chain: Chain,
        upstream: &UpstreamConfig,
        limits: SnapshotLimits,
        http_client: reqwest::Client,
    ) -> Self {
        Self {
            chain,
            endpoint: upstream.etherscan_url.clone(),
            api_key: upstream.etherscan_api_key.clone(),
            transfer_limit: limits.transfer_limit,
            http_client,
        }
    }

    /// Call one `module=account` action and return its `result` field.
    async fn call(
        &self,
        action: &str,
        address: &str,
        extra: &[(&str, &str)],
    ) -> Result<Option<serde_json::Value>, UpstreamError> {
        let Some(chain_id) = self.chain.evm_chain_id() else {
            return Err(UpstreamError::Api {
                message: format!("{} is not an EtherScan chain", self.chain),
            });
        };
        let chain_id = chain_id.to_string();

        let mut query: Vec<(&str, &str)> = vec![
            ("chainid", chain_id.as_str()),
            ("module", "account"),
            ("action", action),
            ("address", address),
        ];
        query.extend_from_slice(extra);
        if let Some(key) = &self.api_key {
            query.push(("apikey", key.as_str()));
        }

        let response = self
            .http_client
            .get(self.endpoint.clone())
            .query(&query)
            .send()
            .await?;
        let response: EtherScanResponse = decode_json(response).await?;

        if response.status == "1" {
            return Ok(Some(response.result));
        }
        if response.message.starts_with(NO_TRANSACTIONS) {
            return Ok(None);
        }
        // On failure `result` usually carries the human readable reason.
        let message = match response.result.as_str() {
            Some(detail) if !detail.is_empty() => format!("{}: {}", response.message, detail),
            _ => response.message,
        };
        Err(UpstreamError::Api { message })
    }

    async fn fetch_balance(&self, address: &str) -> Result<rust_decimal::Decimal, UpstreamError> {
        let result = self
            .call("balance", address, &[("tag", "latest")])
            .await?
            .ok_or_else(|| UpstreamError::shape("balance missing from response"))?;
        let raw = result
            .as_str()
            .ok_or_else(|| UpstreamError::shape("balance is not a string"))?;
        scale_integer(raw, self.chain.native_decimals())
    }

    async fn fetch_transfers(&self, address: &str) -> Result<Vec<TransferRecord>, UpstreamError> {
        let offset = self.transfer_limit.to_string();
        let result = self
            .call(
                "txlist",
                address,
                &[
                    ("startblock", "0"),
                    ("endblock", "99999999"),
                    ("page", "1"),
                    ("offset", offset.as_str()),
                    ("sort", "desc"),
                ],
            )
            .await?;
        let Some(result) = result else {
            return Ok(Vec::new());
        };
        let serde_json::Value::Array(items) = result else {
            return Err(UpstreamError::shape("txlist result is not a list"));
        };

        let items: Vec<EvmTransactionItem> = decode_records(items, "etherscan");
        Ok(items
            .into_iter()
            .take(self.transfer_limit)
            .filter_map(|item| self.normalize(item))
            .collect())
    }

    fn normalize(&self, item: EvmTransactionItem) -> Option<TransferRecord> {
        let timestamp = item
            .time_stamp
            .parse::<i64>()
            .ok()
            .and_then(|secs| OffsetDateTime::from_unix_timestamp(secs).ok());
        let Some(timestamp) = timestamp else {
            warn!(chain = %self.chain, hash = %item.hash, "Dropping transaction with invalid timestamp");
            return None;
        };
        let amount = match scale_integer(&item.value, self.chain.native_decimals()) {
            Ok(amount) => amount,
            Err(e) => {
                warn!(chain = %self.chain, hash = %item.hash, error = %e, "Dropping transaction with invalid value");
                return None;
            }
        };
        Some(TransferRecord {
            transaction_id: item.hash,
            from: item.from,
            to: item.to,
            amount,
            timestamp,
        })
    }
}

#[async_trait]
impl ChainAdapter for EvmAdapter {
    async fn fetch_snapshot(&self, address: &str) -> Result<WalletSnapshot, UpstreamError> {
        debug!(chain = %self.chain, address = address, "Fetching EVM balance and transactions");

        let (balance, transfers) =
            tokio::try_join!(self.fetch_balance(address), self.fetch_transfers(address))?;

        debug!(
            chain = %self.chain,
            transfers = transfers.len(),
            "Fetched EVM snapshot"
        );

        Ok(WalletSnapshot {
            chain: self.chain,
            address: address.to_string(),
            balance,
            transfers,
            fetched_at: OffsetDateTime::now_utc(),
        })
    }

    fn chain(&self) -> Chain {
        self.chain
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::test_support::upstream_at;
    use mockito::Matcher;
    use rust_decimal::Decimal;

    const ADDRESS: &str = "0xAbC0000000000000000000000000000000000001";

    fn adapter(server: &mockito::Server, chain: Chain) -> EvmAdapter {
        EvmAdapter::new(
            chain,
            &upstream_at(&server.url()),
            SnapshotLimits::default(),
            reqwest::Client::new(),
        )
    }

    fn action(name: &str) -> Matcher {
        Matcher::UrlEncoded("action".into(), name.into())
    }

    fn tx(hash: &str, ts: i64, value: &str) -> serde_json::Value {
        serde_json::json!({
            "blockNumber": "19000000",
            "timeStamp": ts.to_string(),
            "hash": hash,
            "from": ADDRESS,
            "to": "0x0000000000000000000000000000000000000002",
            "value": value,
            "gas": "21000",
            "isError": "0"
        })
    }

    #[tokio::test]
    async fn test_snapshot_normalizes_balance_and_transfers() {
        let mut server = mockito::Server::new_async().await;
        let balance = server
            .mock("GET", "/v2/api")
            .match_query(Matcher::AllOf(vec![
                action("balance"),
                Matcher::UrlEncoded("chainid".into(), "8453".into()),
                Matcher::UrlEncoded("apikey".into(), "test-key".into()),
            ]))
            .with_body(r#"{"status":"1","message":"OK","result":"2500000000000000000"}"#)
            .create_async()
            .await;
        let txs = serde_json::json!({
            "status": "1",
            "message": "OK",
            "result": [
                tx("0x03", 1_700_000_300, "1000000000000000000"),
                tx("0x02", 1_700_000_200, "0"),
                tx("0x01", 1_700_000_100, "500000000000000000"),
            ]
        });
        let list = server
            .mock("GET", "/v2/api")
            .match_query(Matcher::AllOf(vec![
                action("txlist"),
                Matcher::UrlEncoded("sort".into(), "desc".into()),
            ]))
            .with_body(txs.to_string())
            .create_async()
            .await;

        let snapshot = adapter(&server, Chain::Base)
            .fetch_snapshot(ADDRESS)
            .await
            .unwrap();

        balance.assert_async().await;
        list.assert_async().await;
        assert_eq!(snapshot.chain, Chain::Base);
        assert_eq!(snapshot.balance, Decimal::new(25, 1));
        assert_eq!(snapshot.transfers.len(), 3);
        // upstream order is kept, newest first
        let ids: Vec<&str> = snapshot
            .transfers
            .iter()
            .map(|t| t.transaction_id.as_str())
            .collect();
        assert_eq!(ids, vec!["0x03", "0x02", "0x01"]);
        assert_eq!(snapshot.transfers[0].amount, Decimal::ONE);
        assert_eq!(snapshot.transfers[2].amount, Decimal::new(5, 1));
        assert_eq!(
            snapshot.transfers[0].timestamp.unix_timestamp(),
            1_700_000_300
        );
        assert!(snapshot.transfers.iter().all(|t| t.amount >= Decimal::ZERO));
    }

    #[tokio::test]
    async fn test_transfers_truncated_to_limit() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/v2/api")
            .match_query(action("balance"))
            .with_body(r#"{"status":"1","message":"OK","result":"0"}"#)
            .create_async()
            .await;
        let result: Vec<_> = (0..8)
            .map(|i| tx(&format!("0x{i:02}"), 1_700_000_000 - i, "1"))
            .collect();
        server
            .mock("GET", "/v2/api")
            .match_query(action("txlist"))
            .with_body(serde_json::json!({"status": "1", "message": "OK", "result": result}).to_string())
            .create_async()
            .await;

        let snapshot = adapter(&server, Chain::Ethereum)
            .fetch_snapshot(ADDRESS)
            .await
            .unwrap();
        assert_eq!(snapshot.transfers.len(), 5);
        assert_eq!(snapshot.transfers[0].transaction_id, "0x00");
    }

    #[tokio::test]
    async fn test_empty_history_is_not_an_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/v2/api")
            .match_query(action("balance"))
            .with_body(r#"{"status":"1","message":"OK","result":"0"}"#)
            .create_async()
            .await;
        server
            .mock("GET", "/v2/api")
            .match_query(action("txlist"))
            .with_body(r#"{"status":"0","message":"No transactions found","result":[]}"#)
            .create_async()
            .await;

        let snapshot = adapter(&server, Chain::Polygon)
            .fetch_snapshot(ADDRESS)
            .await
            .unwrap();
        assert_eq!(snapshot.balance, Decimal::ZERO);
        assert!(snapshot.transfers.is_empty());
    }

    #[tokio::test]
    async fn test_status_flag_zero_fails() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/v2/api")
            .match_query(action("balance"))
            .with_body(r#"{"status":"0","message":"NOTOK","result":"Invalid API Key"}"#)
            .create_async()
            .await;
        server
            .mock("GET", "/v2/api")
            .match_query(action("txlist"))
            .with_body(r#"{"status":"1","message":"OK","result":[]}"#)
            .create_async()
            .await;

        let err = adapter(&server, Chain::Ethereum)
            .fetch_snapshot(ADDRESS)
            .await
            .unwrap_err();
        assert!(matches!(err, UpstreamError::Api { .. }));
        assert_eq!(err.to_string(), "upstream error: NOTOK: Invalid API Key");
    }

    #[tokio::test]
    async fn test_http_failure_fails() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/v2/api")
            .match_query(Matcher::Any)
            .with_status(502)
            .with_body("bad gateway")
            .create_async()
            .await;

        let err = adapter(&server, Chain::Arbitrum)
            .fetch_snapshot(ADDRESS)
            .await
            .unwrap_err();
        assert!(matches!(err, UpstreamError::Status { .. }));
    }

    #[tokio::test]
    async fn test_malformed_record_is_dropped() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/v2/api")
            .match_query(action("balance"))
            .with_body(r#"{"status":"1","message":"OK","result":"1"}"#)
            .create_async()
            .await;
        let result = serde_json::json!([
            tx("0x02", 1_700_000_200, "1"),
            {"hash": "0x01", "from": ADDRESS},
            tx("0x00", 1_700_000_000, "not-a-number"),
        ]);
        server
            .mock("GET", "/v2/api")
            .match_query(action("txlist"))
            .with_body(serde_json::json!({"status": "1", "message": "OK", "result": result}).to_string())
            .create_async()
            .await;

        let snapshot = adapter(&server, Chain::Ethereum)
            .fetch_snapshot(ADDRESS)
            .await
            .unwrap();
        assert_eq!(snapshot.transfers.len(), 1);
        assert_eq!(snapshot.transfers[0].transaction_id, "0x02");
    }
}
