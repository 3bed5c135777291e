use axum::{Json, Router, extract::State, routing::get};
use serde::Deserialize;
use wscope_sdk::objects::SnapshotResponse;

use super::ApiError;
use super::extractors::{PathParams, QueryParams};
use crate::state::AppState;

pub(super) fn router() -> Router<AppState> {
    Router::new()
        .route("/api/{chain}/{address}", get(get_snapshot))
        .route("/api/{chain}", get(get_snapshot_by_query))
}

#[derive(Debug, Deserialize)]
struct AddressQuery {
    address: Option<String>,
    wallet: Option<String>,
}

impl AddressQuery {
    /// `address` wins over `wallet` unless it is blank.
    fn into_address(self) -> String {
        let address_given = self
            .address
            .as_deref()
            .is_some_and(|v| !v.trim().is_empty());
        if address_given {
            self.address.unwrap_or_default()
        } else {
            self.wallet.unwrap_or_default()
        }
    }
}

/// `GET /api/{chain}/{address}` - balance and most recent transfers.
async fn get_snapshot(
    State(state): State<AppState>,
    PathParams((chain, address)): PathParams<(String, String)>,
) -> Result<Json<SnapshotResponse>, ApiError> {
    let snapshot = state.wallets.snapshot(&chain, &address).await?;
    Ok(Json(snapshot.into()))
}

/// `GET /api/{chain}?address=..` - same as above.
async fn get_snapshot_by_query(
    State(state): State<AppState>,
    PathParams(chain): PathParams<String>,
    QueryParams(query): QueryParams<AddressQuery>,
) -> Result<Json<SnapshotResponse>, ApiError> {
    let snapshot = state.wallets.snapshot(&chain, &query.into_address()).await?;
    Ok(Json(snapshot.into()))
}
