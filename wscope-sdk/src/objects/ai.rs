//! AI relay request and response types.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::wallet::WalletSnapshot;

/// Wallet data forwarded to the AI relay.
///
/// `chain` is kept as free text because it is only ever printed into a
/// prompt. `transfers` accepts `transactions` as well, the name used by the
/// EVM dashboard.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AiContext {
    #[serde(default)]
    pub chain: String,
    #[serde(default)]
    pub address: String,
    #[serde(
        default,
        serialize_with = "rust_decimal::serde::float_option::serialize"
    )]
    pub balance: Option<Decimal>,
    #[serde(default, alias = "transactions")]
    pub transfers: Vec<serde_json::Value>,
}

impl From<&WalletSnapshot> for AiContext {
    fn from(snapshot: &WalletSnapshot) -> Self {
        Self {
            chain: snapshot.chain.to_string(),
            address: snapshot.address.clone(),
            balance: Some(snapshot.balance),
            transfers: snapshot
                .transfers
                .iter()
                .filter_map(|t| serde_json::to_value(t).ok())
                .collect(),
        }
    }
}

/// Request body of `POST /api-ai/chat`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AiChatRequest {
    #[serde(flatten)]
    pub context: AiContext,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub question: Option<String>,
}

/// Response body of `POST /api-ai/summary`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryResponse {
    pub summary: String,
}

/// Response body of `POST /api-ai/chat`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatResponse {
    pub answer: String,
}

/// Response body of `GET /api-ai/health`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AiHealthResponse {
    pub ok: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}
