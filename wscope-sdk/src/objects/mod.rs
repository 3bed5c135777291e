pub mod ai;
pub mod chains;
pub mod wallet;

pub use ai::{AiChatRequest, AiContext, AiHealthResponse, ChatResponse, SummaryResponse};
pub use chains::{Chain, ChainFamily, UnknownChain};
pub use wallet::{Direction, SnapshotResponse, TransferRecord, WalletSnapshot};

use serde::{Deserialize, Serialize};

/// Body of every non-2xx response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}
