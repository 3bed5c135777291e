//! HTTP API handlers.
//!
//! # Endpoints
//!
//! - `GET  /api/{chain}/{address}`      – wallet snapshot
//! - `GET  /api/{chain}?address=..`     – same, address in the query (`wallet=` also accepted)
//! - `POST /api-ai/summary`             – AI summary of wallet data
//! - `POST /api-ai/chat`                – AI answer to a question about wallet data
//! - `GET  /api-ai/health`              – whether the AI relay is configured
//!
//! Every failure is answered with `{"error": "..."}`.

use axum::{
    Json, Router,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use wscope_core::ai::AiError;
use wscope_core::service::WalletError;
use wscope_sdk::objects::ErrorResponse;

use crate::state::AppState;

mod ai;
mod extractors;
mod wallet;

/// Build the API router.
pub fn router() -> Router<AppState> {
    Router::new().merge(wallet::router()).merge(ai::router())
}

/// Errors that can occur in API handlers.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Wallet(#[from] WalletError),

    #[error(transparent)]
    Ai(#[from] AiError),

    /// The request body could not be read as the expected JSON.
    #[error("{0}")]
    BadRequest(String),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::Wallet(WalletError::Upstream(_)) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Wallet(_) => StatusCode::BAD_REQUEST,
            ApiError::Ai(AiError::MissingQuestion) => StatusCode::BAD_REQUEST,
            ApiError::Ai(AiError::Unavailable) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Ai(AiError::Request(_)) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(status = %status, error = %self, "API request failed");
        } else {
            tracing::debug!(status = %status, error = %self, "API request rejected");
        }
        (status, Json(ErrorResponse::new(self.to_string()))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wscope_core::error::UpstreamError;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (
                ApiError::Wallet(WalletError::UnsupportedChain("doge".into())),
                StatusCode::BAD_REQUEST,
            ),
            (
                ApiError::Wallet(WalletError::MissingAddress),
                StatusCode::BAD_REQUEST,
            ),
            (
                ApiError::Wallet(WalletError::InvalidAddress("x".into())),
                StatusCode::BAD_REQUEST,
            ),
            (
                ApiError::Wallet(WalletError::Upstream(UpstreamError::Api {
                    message: "NOTOK".into(),
                })),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (ApiError::Ai(AiError::Unavailable), StatusCode::SERVICE_UNAVAILABLE),
            (ApiError::Ai(AiError::MissingQuestion), StatusCode::BAD_REQUEST),
            (
                ApiError::Ai(AiError::Request("boom".into())),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (error, expected) in cases {
            assert_eq!(error.status(), expected, "{error}");
        }
    }
}
