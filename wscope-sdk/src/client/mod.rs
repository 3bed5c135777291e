//! HTTP client for the Walletscope API.
//!
//! Gated behind the `client` cargo feature so downstream crates that only
//! need the shared types do not pull in `reqwest`.

use reqwest::{Client, StatusCode};
use url::Url;

use crate::objects::{
    AiChatRequest, AiContext, AiHealthResponse, Chain, ChatResponse, ErrorResponse,
    SnapshotResponse, SummaryResponse,
};

/// Errors produced by the SDK HTTP client.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Transport-level failure (DNS, TLS, connection reset, …).
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// The server returned a non-2xx status code.
    #[error("api error: status {status}: {message}")]
    Api { status: StatusCode, message: String },

    /// Response body could not be deserialized.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// The base URL could not be joined with the endpoint path.
    #[error("invalid url: {0}")]
    Url(#[from] url::ParseError),
}

/// Typed HTTP client for the Walletscope server.
#[derive(Debug, Clone)]
pub struct WalletscopeClient {
    http: Client,
    base_url: Url,
}

impl WalletscopeClient {
    /// Create a new client for the server at `base_url`.
    pub fn new(base_url: Url) -> Self {
        Self {
            http: Client::new(),
            base_url,
        }
    }

    /// Replace the default `reqwest::Client` with a custom one (e.g. to
    /// configure timeouts or a proxy).
    pub fn with_http_client(mut self, client: Client) -> Self {
        self.http = client;
        self
    }

    /// `GET /api/{chain}/{address}` – balance and recent transfers.
    pub async fn snapshot(
        &self,
        chain: Chain,
        address: &str,
    ) -> Result<SnapshotResponse, ClientError> {
        let path = format!("/api/{}/{}", chain, urlencoding::encode(address));
        let url = self.base_url.join(&path)?;
        let resp = self.http.get(url).send().await?;
        parse_response(resp).await
    }

    /// `POST /api-ai/summary` – AI summary of the given wallet data.
    pub async fn summarize(&self, context: &AiContext) -> Result<String, ClientError> {
        let url = self.base_url.join("/api-ai/summary")?;
        let resp = self.http.post(url).json(context).send().await?;
        let body: SummaryResponse = parse_response(resp).await?;
        Ok(body.summary)
    }

    /// `POST /api-ai/chat` – ask a question about the given wallet data.
    ///
    /// The server keeps no conversation state, so the full context goes out
    /// with every question.
    pub async fn chat(
        &self,
        context: &AiContext,
        question: impl Into<String>,
    ) -> Result<String, ClientError> {
        let url = self.base_url.join("/api-ai/chat")?;
        let body = AiChatRequest {
            context: context.clone(),
            question: Some(question.into()),
        };
        let resp = self.http.post(url).json(&body).send().await?;
        let body: ChatResponse = parse_response(resp).await?;
        Ok(body.answer)
    }

    /// `GET /api-ai/health` – whether the AI relay is configured.
    ///
    /// An unconfigured relay answers 503 with a regular health body, which
    /// is returned as `ok: false` rather than an error.
    pub async fn ai_health(&self) -> Result<AiHealthResponse, ClientError> {
        let url = self.base_url.join("/api-ai/health")?;
        let resp = self.http.get(url).send().await?;
        if resp.status() == StatusCode::SERVICE_UNAVAILABLE {
            let bytes = resp.bytes().await?;
            return serde_json::from_slice(&bytes).map_err(ClientError::Json);
        }
        parse_response(resp).await
    }
}

async fn parse_response<T: serde::de::DeserializeOwned>(
    resp: reqwest::Response,
) -> Result<T, ClientError> {
    let status = resp.status();
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorResponse>(&body)
            .map(|e| e.error)
            .unwrap_or(body);
        return Err(ClientError::Api { status, message });
    }
    let bytes = resp.bytes().await?;
    serde_json::from_slice(&bytes).map_err(ClientError::Json)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    fn client_for(server: &mockito::Server) -> WalletscopeClient {
        WalletscopeClient::new(Url::parse(&server.url()).unwrap())
    }

    #[tokio::test]
    async fn test_snapshot_parses_response() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/api/btc/bc1qexample")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"chain":"btc","address":"bc1qexample","balance":0.5,
                    "transfer_count":1,
                    "transfers":[{"transaction_id":"ab12","from":"bc1qa","to":"bc1qexample",
                                  "amount":0.25,"timestamp":"2024-05-01T10:00:00Z"}],
                    "timestamp":"2024-05-02T00:00:00Z"}"#,
            )
            .create_async()
            .await;

        let snapshot = client_for(&server)
            .snapshot(Chain::Bitcoin, "bc1qexample")
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(snapshot.chain, Chain::Bitcoin);
        assert_eq!(snapshot.balance, Decimal::new(5, 1));
        assert_eq!(snapshot.transfers[0].amount, Decimal::new(25, 2));
    }

    #[tokio::test]
    async fn test_error_body_becomes_api_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/api-ai/chat")
            .with_status(400)
            .with_body(r#"{"error":"question is required"}"#)
            .create_async()
            .await;

        let err = client_for(&server)
            .chat(&AiContext::default(), "")
            .await
            .unwrap_err();

        match err {
            ClientError::Api { status, message } => {
                assert_eq!(status, StatusCode::BAD_REQUEST);
                assert_eq!(message, "question is required");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_ai_health_unavailable_is_not_an_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/api-ai/health")
            .with_status(503)
            .with_body(r#"{"ok":false,"reason":"GEMINI_API_KEY not configured"}"#)
            .create_async()
            .await;

        let health = client_for(&server).ai_health().await.unwrap();
        assert!(!health.ok);
        assert_eq!(health.reason.as_deref(), Some("GEMINI_API_KEY not configured"));
    }
}
