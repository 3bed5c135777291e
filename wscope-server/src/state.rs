//! Application state shared across all request handlers.

use std::sync::Arc;
use wscope_core::ai::AiRelay;
use wscope_core::service::WalletService;

/// Application state that is shared across all request handlers.
///
/// This is cloneable and cheap to pass around (everything is behind Arc).
/// Nothing in it changes after startup.
#[derive(Clone)]
pub struct AppState {
    pub wallets: Arc<WalletService>,
    pub ai: Arc<AiRelay>,
}

impl AppState {
    pub fn new(wallets: WalletService, ai: AiRelay) -> Self {
        Self {
            wallets: Arc::new(wallets),
            ai: Arc::new(ai),
        }
    }
}
