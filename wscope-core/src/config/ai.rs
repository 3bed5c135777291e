//! AI relay configuration.

use url::Url;

/// Credential and model for the text generation service.
#[derive(Debug, Clone)]
pub struct AiConfig {
    /// `None` disables the relay; requests then fail before any network call.
    pub api_key: Option<String>,
    pub model: String,
    /// API root, e.g. `https://generativelanguage.googleapis.com/v1beta`.
    pub base_url: Url,
}
