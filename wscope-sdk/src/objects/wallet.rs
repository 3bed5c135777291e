//! Wallet snapshot types returned by the aggregation endpoint.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use super::chains::Chain;

/// A single transfer, normalized across chains.
///
/// `amount` is always in the chain's native unit (ETH, TRX, BTC, SOL, or the
/// token for TRC-20 transfers), already divided from the smallest
/// denomination.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferRecord {
    pub transaction_id: String,
    pub from: String,
    pub to: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
}

/// Direction of a transfer relative to a queried wallet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Incoming,
    Outgoing,
    #[serde(rename = "self")]
    SelfTransfer,
    Unrelated,
}

impl TransferRecord {
    /// Classify this transfer from the point of view of `address`.
    ///
    /// Hex addresses compare case-insensitively. `to` may hold several
    /// comma-separated outputs (Bitcoin), any of which counts.
    pub fn direction(&self, address: &str) -> Direction {
        let sent = same_address(&self.from, address)
            || self.from.split(", ").any(|a| same_address(a, address));
        let received = self.to.split(", ").any(|a| same_address(a, address));
        match (sent, received) {
            (true, true) => Direction::SelfTransfer,
            (true, false) => Direction::Outgoing,
            (false, true) => Direction::Incoming,
            (false, false) => Direction::Unrelated,
        }
    }
}

fn same_address(a: &str, b: &str) -> bool {
    let (a, b) = (a.trim(), b.trim());
    if a.starts_with("0x") || a.starts_with("0X") {
        a.eq_ignore_ascii_case(b)
    } else {
        a == b
    }
}

/// Balance and most recent transfers of one wallet, fetched fresh per request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletSnapshot {
    pub chain: Chain,
    pub address: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub balance: Decimal,
    /// Newest first, in the order the upstream returned them.
    pub transfers: Vec<TransferRecord>,
    #[serde(with = "time::serde::rfc3339")]
    pub fetched_at: OffsetDateTime,
}

/// Response body of `GET /api/{chain}/{address}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotResponse {
    pub chain: Chain,
    pub address: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub balance: Decimal,
    pub transfer_count: usize,
    pub transfers: Vec<TransferRecord>,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
}

impl From<WalletSnapshot> for SnapshotResponse {
    fn from(snapshot: WalletSnapshot) -> Self {
        Self {
            chain: snapshot.chain,
            address: snapshot.address,
            balance: snapshot.balance,
            transfer_count: snapshot.transfers.len(),
            transfers: snapshot.transfers,
            timestamp: snapshot.fetched_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    fn record(from: &str, to: &str) -> TransferRecord {
        TransferRecord {
            transaction_id: "0xabc".to_string(),
            from: from.to_string(),
            to: to.to_string(),
            amount: Decimal::new(25, 1),
            timestamp: datetime!(2024-03-01 12:00:00 UTC),
        }
    }

    #[test]
    fn test_direction_hex_is_case_insensitive() {
        let tx = record("0xAbCdEf", "0x1234");
        assert_eq!(tx.direction("0xabcdef"), Direction::Outgoing);
        assert_eq!(tx.direction("0X1234"), Direction::Incoming);
        assert_eq!(tx.direction("0x9999"), Direction::Unrelated);
    }

    #[test]
    fn test_direction_base58_is_exact() {
        let tx = record("TXyz", "Tabc");
        assert_eq!(tx.direction("txyz"), Direction::Unrelated);
        assert_eq!(tx.direction("Tabc"), Direction::Incoming);
    }

    #[test]
    fn test_direction_multi_output() {
        let tx = record("bc1qsender", "bc1qother, bc1qsender");
        assert_eq!(tx.direction("bc1qsender"), Direction::SelfTransfer);
    }

    #[test]
    fn test_snapshot_response_wire_shape() {
        let snapshot = WalletSnapshot {
            chain: Chain::Ethereum,
            address: "0xabc".to_string(),
            balance: Decimal::new(25, 1),
            transfers: vec![record("0xabc", "0xdef")],
            fetched_at: datetime!(2024-03-01 12:30:00 UTC),
        };
        let json = serde_json::to_value(SnapshotResponse::from(snapshot)).unwrap();
        assert_eq!(json["chain"], "ethereum");
        assert_eq!(json["balance"], 2.5);
        assert_eq!(json["transfer_count"], 1);
        assert_eq!(json["transfers"][0]["amount"], 2.5);
        assert_eq!(json["transfers"][0]["timestamp"], "2024-03-01T12:00:00Z");
        assert_eq!(json["timestamp"], "2024-03-01T12:30:00Z");
    }
}
