use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::{get, post},
};
use wscope_sdk::objects::{
    AiChatRequest, AiContext, AiHealthResponse, ChatResponse, SummaryResponse,
};

use super::ApiError;
use super::extractors::JsonBody;
use crate::state::AppState;

pub(super) fn router() -> Router<AppState> {
    Router::new()
        .route("/api-ai/summary", post(summary))
        .route("/api-ai/chat", post(chat))
        .route("/api-ai/health", get(health))
}

/// `POST /api-ai/summary`
async fn summary(
    State(state): State<AppState>,
    JsonBody(context): JsonBody<AiContext>,
) -> Result<Json<SummaryResponse>, ApiError> {
    let summary = state.ai.summarize(&context).await?;
    Ok(Json(SummaryResponse { summary }))
}

/// `POST /api-ai/chat`
async fn chat(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<AiChatRequest>,
) -> Result<Json<ChatResponse>, ApiError> {
    let answer = state
        .ai
        .chat(&request.context, request.question.as_deref())
        .await?;
    Ok(Json(ChatResponse { answer }))
}

/// `GET /api-ai/health` - 503 while no credential is configured.
async fn health(State(state): State<AppState>) -> (StatusCode, Json<AiHealthResponse>) {
    let health = state.ai.health();
    let status = if health.ok {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status, Json(health))
}
