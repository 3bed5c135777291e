//! Solana adapter, over plain JSON-RPC.
//!
//! Transfers come from `getSignaturesForAddress` followed by one
//! `getTransaction` per signature. A signature whose lookup fails is logged
//! and left out; the rest of the snapshot is still returned.

use super::ChainAdapter;
use crate::config::{SnapshotLimits, UpstreamConfig};
use crate::error::UpstreamError;
use crate::fan_out::FanOut;
use crate::utils::http::decode_json;
use crate::utils::units::scale_u128;
use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use time::OffsetDateTime;
use tracing::{debug, warn};
use url::Url;
use wscope_sdk::objects::{Chain, TransferRecord, WalletSnapshot};

pub struct SolanaAdapter {
    rpc_url: Url,
    transfer_limit: usize,
    fan_out: FanOut,
    http_client: reqwest::Client,
}

#[derive(Debug, Serialize)]
struct JsonRpcRequest<T> {
    jsonrpc: &'static str,
    id: u64,
    method: &'static str,
    params: T,
}

#[derive(Debug, Deserialize)]
struct JsonRpcResponse<T> {
    result: Option<T>,
    error: Option<JsonRpcError>,
}

#[derive(Debug, Deserialize)]
struct JsonRpcError {
    code: i64,
    message: String,
}

#[derive(Debug, Deserialize)]
struct BalanceResult {
    /// Lamports.
    value: u64,
}

#[derive(Debug, Deserialize)]
struct SignatureInfo {
    signature: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ParsedTransaction {
    block_time: Option<i64>,
    transaction: TransactionEnvelope,
}

#[derive(Debug, Deserialize)]
struct TransactionEnvelope {
    message: TransactionMessage,
}

#[derive(Debug, Deserialize)]
struct TransactionMessage {
    /// Kept loose: only `jsonParsed` system and token instructions have a
    /// structured `parsed` field.
    #[serde(default)]
    instructions: Vec<serde_json::Value>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TransferInfo {
    source: Option<String>,
    authority: Option<String>,
    destination: Option<String>,
    lamports: Option<u64>,
    token_amount: Option<TokenAmount>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TokenAmount {
    ui_amount_string: Option<String>,
}

impl SolanaAdapter {
    pub fn new(
        upstream: &UpstreamConfig,
        limits: SnapshotLimits,
        http_client: reqwest::Client,
    ) -> Self {
        Self {
            rpc_url: upstream.solana_rpc_url.clone(),
            transfer_limit: limits.transfer_limit,
            fan_out: FanOut::new(limits.fan_out_limit),
            http_client,
        }
    }

    /// Issue one RPC call. `Ok(None)` means the node answered `result: null`.
    async fn rpc<P: Serialize, T: DeserializeOwned>(
        &self,
        method: &'static str,
        params: P,
    ) -> Result<Option<T>, UpstreamError> {
        let request = JsonRpcRequest {
            jsonrpc: "2.0",
            id: 1,
            method,
            params,
        };
        let response = self
            .http_client
            .post(self.rpc_url.clone())
            .json(&request)
            .send()
            .await?;
        let response: JsonRpcResponse<T> = decode_json(response).await?;
        if let Some(error) = response.error {
            return Err(UpstreamError::Api {
                message: format!("{method} failed ({}): {}", error.code, error.message),
            });
        }
        Ok(response.result)
    }

    async fn fetch_balance(&self, address: &str) -> Result<Decimal, UpstreamError> {
        let balance: BalanceResult = self
            .rpc("getBalance", [address])
            .await?
            .ok_or_else(|| UpstreamError::shape("getBalance returned no result"))?;
        scale_u128(u128::from(balance.value), Chain::Solana.native_decimals())
    }

    async fn fetch_signatures(&self, address: &str) -> Result<Vec<String>, UpstreamError> {
        let params = (address, serde_json::json!({ "limit": self.transfer_limit }));
        let signatures: Vec<SignatureInfo> = self
            .rpc("getSignaturesForAddress", params)
            .await?
            .ok_or_else(|| UpstreamError::shape("getSignaturesForAddress returned no result"))?;
        Ok(signatures
            .into_iter()
            .take(self.transfer_limit)
            .map(|s| s.signature)
            .collect())
    }

    async fn fetch_transaction(
        &self,
        signature: &str,
    ) -> Result<Option<ParsedTransaction>, UpstreamError> {
        let params = (
            signature,
            serde_json::json!({
                "encoding": "jsonParsed",
                "maxSupportedTransactionVersion": 0
            }),
        );
        self.rpc("getTransaction", params).await
    }

    async fn fetch_transfers(&self, address: &str) -> Result<Vec<TransferRecord>, UpstreamError> {
        let signatures = self.fetch_signatures(address).await?;
        debug!(count = signatures.len(), "Fetching SOL transactions");

        let transactions = self
            .fan_out
            .run(signatures, |signature| async move {
                let tx = self.fetch_transaction(&signature).await?;
                Ok::<_, UpstreamError>((signature, tx))
            })
            .await
            .into_successes(|failure| {
                warn!(
                    index = failure.index,
                    error = %failure.error,
                    "Skipping SOL transaction that could not be fetched"
                );
            });

        Ok(transactions
            .into_iter()
            .filter_map(|(signature, tx)| normalize(address, signature, tx?))
            .collect())
    }
}

/// Build a record from the last outer `transfer` instruction.
///
/// A transaction without one is still reported, with zero amount.
fn normalize(address: &str, signature: String, tx: ParsedTransaction) -> Option<TransferRecord> {
    let Some(block_time) = tx.block_time else {
        warn!(signature = %signature, "Dropping SOL transaction without block time");
        return None;
    };
    let timestamp = match OffsetDateTime::from_unix_timestamp(block_time) {
        Ok(ts) => ts,
        Err(e) => {
            warn!(signature = %signature, error = %e, "Dropping SOL transaction with invalid block time");
            return None;
        }
    };

    let info = tx
        .transaction
        .message
        .instructions
        .iter()
        .rev()
        .find_map(transfer_info)
        .unwrap_or_default();

    let amount = match transfer_amount(&info) {
        Ok(amount) => amount,
        Err(e) => {
            warn!(signature = %signature, error = %e, "Dropping SOL transaction with invalid amount");
            return None;
        }
    };

    Some(TransferRecord {
        transaction_id: signature,
        from: info
            .source
            .or(info.authority)
            .unwrap_or_else(|| address.to_string()),
        to: info.destination.unwrap_or_else(|| "Unknown".to_string()),
        amount,
        timestamp,
    })
}

fn transfer_info(instruction: &serde_json::Value) -> Option<TransferInfo> {
    let parsed = instruction.get("parsed")?;
    if parsed.get("type")?.as_str()? != "transfer" {
        return None;
    }
    match serde_json::from_value(parsed.get("info")?.clone()) {
        Ok(info) => Some(info),
        Err(e) => {
            warn!(error = %e, "Ignoring transfer instruction with unexpected info");
            None
        }
    }
}

fn transfer_amount(info: &TransferInfo) -> Result<Decimal, UpstreamError> {
    if let Some(lamports) = info.lamports {
        return scale_u128(u128::from(lamports), Chain::Solana.native_decimals());
    }
    match info
        .token_amount
        .as_ref()
        .and_then(|t| t.ui_amount_string.as_deref())
    {
        Some(ui) => Decimal::from_str(ui)
            .map(|d| d.normalize())
            .map_err(|e| UpstreamError::shape(format!("invalid token amount {ui:?}: {e}"))),
        None => Ok(Decimal::ZERO),
    }
}

#[async_trait]
impl ChainAdapter for SolanaAdapter {
    async fn fetch_snapshot(&self, address: &str) -> Result<WalletSnapshot, UpstreamError> {
        debug!(address = address, "Fetching SOL balance and transactions");

        let (balance, transfers) =
            tokio::try_join!(self.fetch_balance(address), self.fetch_transfers(address))?;

        debug!(transfers = transfers.len(), "Fetched SOL snapshot");

        Ok(WalletSnapshot {
            chain: Chain::Solana,
            address: address.to_string(),
            balance,
            transfers,
            fetched_at: OffsetDateTime::now_utc(),
        })
    }

    fn chain(&self) -> Chain {
        Chain::Solana
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::test_support::upstream_at;
    use mockito::Matcher;
    use serde_json::json;

    const ADDRESS: &str = "9WzDXwBbmkg8ZTbNMqUxvQRAyrZzDsGYdLVL9zYtAWWM";

    fn adapter(server: &mockito::Server) -> SolanaAdapter {
        SolanaAdapter::new(
            &upstream_at(&server.url()),
            SnapshotLimits::default(),
            reqwest::Client::new(),
        )
    }

    fn rpc_ok(result: serde_json::Value) -> String {
        json!({"jsonrpc": "2.0", "id": 1, "result": result}).to_string()
    }

    async fn mock_method(
        server: &mut mockito::Server,
        method: &str,
        body: String,
    ) -> mockito::Mock {
        server
            .mock("POST", "/solana")
            .match_body(Matcher::PartialJson(json!({"method": method})))
            .with_body(body)
            .create_async()
            .await
    }

    async fn mock_transaction(
        server: &mut mockito::Server,
        signature: &str,
        body: String,
    ) -> mockito::Mock {
        server
            .mock("POST", "/solana")
            .match_body(Matcher::AllOf(vec![
                Matcher::PartialJson(json!({"method": "getTransaction"})),
                Matcher::Regex(format!("\"{signature}\"")),
            ]))
            .with_body(body)
            .create_async()
            .await
    }

    fn transaction(block_time: serde_json::Value, instructions: serde_json::Value) -> String {
        rpc_ok(json!({
            "blockTime": block_time,
            "slot": 250_000_000u64,
            "transaction": {"message": {"instructions": instructions}}
        }))
    }

    #[tokio::test]
    async fn test_snapshot_with_system_and_token_transfers() {
        let mut server = mockito::Server::new_async().await;
        let balance = mock_method(
            &mut server,
            "getBalance",
            rpc_ok(json!({"context": {"slot": 1}, "value": 2_500_000_000u64})),
        )
        .await;
        mock_method(
            &mut server,
            "getSignaturesForAddress",
            rpc_ok(json!([{"signature": "sig-1"}, {"signature": "sig-2"}])),
        )
        .await;
        mock_transaction(
            &mut server,
            "sig-1",
            transaction(
                json!(1_714_557_600),
                json!([
                    {"programId": "ComputeBudget111111111111111111111111111111", "data": "3gJ"},
                    {"parsed": {"type": "transfer", "info": {
                        "source": ADDRESS, "destination": "Dest111", "lamports": 1_500_000_000u64
                    }}, "program": "system"},
                    {"parsed": {"type": "transfer", "info": {
                        "source": ADDRESS, "destination": "Second", "lamports": 1u64
                    }}, "program": "system"}
                ]),
            ),
        )
        .await;
        mock_transaction(
            &mut server,
            "sig-2",
            transaction(
                json!(1_714_550_000),
                json!([{"parsed": {"type": "transfer", "info": {
                    "authority": "Owner111", "destination": ADDRESS,
                    "tokenAmount": {"amount": "2500000", "decimals": 6, "uiAmountString": "2.5"}
                }}, "program": "spl-token"}]),
            ),
        )
        .await;

        let snapshot = adapter(&server).fetch_snapshot(ADDRESS).await.unwrap();

        balance.assert_async().await;
        assert_eq!(snapshot.chain, Chain::Solana);
        assert_eq!(snapshot.balance, Decimal::new(25, 1));
        assert_eq!(snapshot.transfers.len(), 2);

        let first = &snapshot.transfers[0];
        assert_eq!(first.transaction_id, "sig-1");
        assert_eq!(first.to, "Second");
        assert_eq!(first.amount, Decimal::new(1, 9));
        assert_eq!(first.timestamp.unix_timestamp(), 1_714_557_600);

        let second = &snapshot.transfers[1];
        assert_eq!(second.from, "Owner111");
        assert_eq!(second.to, ADDRESS);
        assert_eq!(second.amount, Decimal::new(25, 1));
    }

    #[tokio::test]
    async fn test_failed_and_empty_lookups_are_skipped() {
        let mut server = mockito::Server::new_async().await;
        mock_method(&mut server, "getBalance", rpc_ok(json!({"value": 0}))).await;
        mock_method(
            &mut server,
            "getSignaturesForAddress",
            rpc_ok(json!([
                {"signature": "ok"},
                {"signature": "gone"},
                {"signature": "broken"},
                {"signature": "pending"}
            ])),
        )
        .await;
        mock_transaction(
            &mut server,
            "ok",
            transaction(json!(1_714_557_600), json!([])),
        )
        .await;
        mock_transaction(&mut server, "gone", rpc_ok(serde_json::Value::Null)).await;
        server
            .mock("POST", "/solana")
            .match_body(Matcher::Regex("\"broken\"".into()))
            .with_status(429)
            .with_body("Too many requests")
            .create_async()
            .await;
        mock_transaction(
            &mut server,
            "pending",
            transaction(serde_json::Value::Null, json!([])),
        )
        .await;

        let snapshot = adapter(&server).fetch_snapshot(ADDRESS).await.unwrap();

        assert_eq!(snapshot.transfers.len(), 1);
        let record = &snapshot.transfers[0];
        assert_eq!(record.transaction_id, "ok");
        // no transfer instruction: counterparties unknown, zero amount
        assert_eq!(record.from, ADDRESS);
        assert_eq!(record.to, "Unknown");
        assert_eq!(record.amount, Decimal::ZERO);
    }

    #[tokio::test]
    async fn test_rpc_error_fails_snapshot() {
        let mut server = mockito::Server::new_async().await;
        mock_method(
            &mut server,
            "getBalance",
            json!({
                "jsonrpc": "2.0", "id": 1,
                "error": {"code": -32602, "message": "Invalid param: WrongSize"}
            })
            .to_string(),
        )
        .await;
        mock_method(&mut server, "getSignaturesForAddress", rpc_ok(json!([]))).await;

        let err = adapter(&server).fetch_snapshot("not-base58").await.unwrap_err();
        let UpstreamError::Api { message } = err else {
            panic!("expected api error");
        };
        assert!(message.contains("WrongSize"));
    }

    #[test]
    fn test_transfer_info_ignores_other_instruction_types() {
        let instruction = json!({"parsed": {"type": "createAccount", "info": {"lamports": 5}}});
        assert!(transfer_info(&instruction).is_none());
        let unparsed = json!({"programId": "x", "accounts": [], "data": "abc"});
        assert!(transfer_info(&unparsed).is_none());
    }
}
