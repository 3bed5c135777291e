//! AI summarizer and chat relay.
//!
//! Forwards wallet data, rendered into a fixed prompt, to a Gemini
//! `generateContent` endpoint and hands the generated text back unchanged.
//! There is no conversation state: every chat call resends the full context.

pub mod prompt;

use crate::config::AiConfig;
use crate::utils::http::endpoint;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, error};
use wscope_sdk::objects::{AiContext, AiHealthResponse};

const UNAVAILABLE_REASON: &str = "GEMINI_API_KEY not configured";

#[derive(Debug, Error)]
pub enum AiError {
    /// No credential configured; nothing was sent.
    #[error("GEMINI_API_KEY not configured")]
    Unavailable,

    #[error("question is required")]
    MissingQuestion,

    /// Network failure, non-2xx status, or a response without text
    #[error("AI request failed: {0}")]
    Request(String),
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    text: Option<String>,
}

pub struct AiRelay {
    config: AiConfig,
    http_client: reqwest::Client,
}

impl AiRelay {
    pub fn new(config: AiConfig, http_client: reqwest::Client) -> Self {
        Self {
            config,
            http_client,
        }
    }

    fn api_key(&self) -> Option<&str> {
        self.config
            .api_key
            .as_deref()
            .filter(|key| !key.trim().is_empty())
    }

    pub fn is_available(&self) -> bool {
        self.api_key().is_some()
    }

    pub fn model(&self) -> &str {
        &self.config.model
    }

    pub fn health(&self) -> AiHealthResponse {
        if self.is_available() {
            AiHealthResponse {
                ok: true,
                model: Some(self.config.model.clone()),
                reason: None,
            }
        } else {
            AiHealthResponse {
                ok: false,
                model: None,
                reason: Some(UNAVAILABLE_REASON.to_string()),
            }
        }
    }

    pub async fn summarize(&self, context: &AiContext) -> Result<String, AiError> {
        let key = self.api_key().ok_or(AiError::Unavailable)?;
        self.generate(key, &prompt::summary(context)).await
    }

    /// Answer `question` about the wallet in `context`.
    ///
    /// A blank question is rejected before the credential is even looked at.
    pub async fn chat(&self, context: &AiContext, question: Option<&str>) -> Result<String, AiError> {
        let question = question
            .map(str::trim)
            .filter(|q| !q.is_empty())
            .ok_or(AiError::MissingQuestion)?;
        let key = self.api_key().ok_or(AiError::Unavailable)?;
        self.generate(key, &prompt::chat(context, question)).await
    }

    async fn generate(&self, key: &str, prompt: &str) -> Result<String, AiError> {
        let url = endpoint(
            &self.config.base_url,
            &format!("models/{}:generateContent", self.config.model),
        );
        let body = serde_json::json!({
            "contents": [{"role": "user", "parts": [{"text": prompt}]}]
        });

        debug!(model = %self.config.model, prompt_chars = prompt.len(), "Sending generateContent request");

        // The key travels in the query string; strip the URL from errors so
        // it never reaches a log line or a response body.
        let response = self
            .http_client
            .post(url)
            .query(&[("key", key)])
            .json(&body)
            .send()
            .await
            .map_err(|e| request_failed(e.without_url()))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            error!(status = %status, "generateContent returned an error");
            return Err(AiError::Request(format!(
                "status {status}: {}",
                api_error_message(&text)
            )));
        }

        let response: GenerateResponse = response
            .json()
            .await
            .map_err(|e| request_failed(e.without_url()))?;

        let text: String = response
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|content| content.parts.into_iter().filter_map(|p| p.text).collect())
            .unwrap_or_default();

        if text.is_empty() {
            return Err(AiError::Request("response contained no text".to_string()));
        }
        Ok(text)
    }
}

fn request_failed(e: reqwest::Error) -> AiError {
    error!(error = %e, "generateContent request failed");
    AiError::Request(e.to_string())
}

/// Google wraps failures as `{"error": {"message": ...}}`.
fn api_error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v["error"]["message"].as_str().map(str::to_string))
        .unwrap_or_else(|| body.chars().take(200).collect())
}
