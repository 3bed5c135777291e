//! Errors raised while talking to upstream explorer APIs.

use thiserror::Error;

/// Longest upstream body kept in an error message.
const MAX_BODY_IN_ERROR: usize = 200;

/// Errors that can occur while fetching from an upstream API.
#[derive(Debug, Error)]
pub enum UpstreamError {
    /// Network failure, timeout, or unreadable body
    #[error("upstream request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The upstream answered with a non-success HTTP status
    #[error("upstream returned status {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },

    /// The upstream answered 2xx but flagged the call as failed
    #[error("upstream error: {message}")]
    Api { message: String },

    /// The payload did not have the expected shape
    #[error("unexpected upstream response: {0}")]
    Shape(String),
}

impl UpstreamError {
    pub(crate) fn status(status: reqwest::StatusCode, body: &str) -> Self {
        let body = match body.char_indices().nth(MAX_BODY_IN_ERROR) {
            Some((cut, _)) => format!("{}…", &body[..cut]),
            None => body.to_string(),
        };
        UpstreamError::Status { status, body }
    }

    pub(crate) fn shape(what: impl std::fmt::Display) -> Self {
        UpstreamError::Shape(what.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_body_is_truncated() {
        let body = "x".repeat(1000);
        let err = UpstreamError::status(reqwest::StatusCode::BAD_GATEWAY, &body);
        let UpstreamError::Status { body, status } = err else {
            panic!("expected status error");
        };
        assert_eq!(status, reqwest::StatusCode::BAD_GATEWAY);
        assert_eq!(body.chars().count(), MAX_BODY_IN_ERROR + 1);
    }
}
