//! Helpers shared by the upstream adapters.

use serde::de::DeserializeOwned;
use url::Url;

use crate::error::UpstreamError;

/// Append `path` to `base`, regardless of whether `base` ends with a slash.
pub fn endpoint(base: &Url, path: &str) -> String {
    format!(
        "{}/{}",
        base.as_str().trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

/// Check the status and decode a JSON body.
pub async fn decode_json<T: DeserializeOwned>(
    response: reqwest::Response,
) -> Result<T, UpstreamError> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(UpstreamError::status(status, &body));
    }
    let bytes = response.bytes().await?;
    serde_json::from_slice(&bytes).map_err(UpstreamError::shape)
}

/// Check the status and return the body as text.
pub async fn decode_text(response: reqwest::Response) -> Result<String, UpstreamError> {
    let status = response.status();
    let body = response.text().await?;
    if !status.is_success() {
        return Err(UpstreamError::status(status, &body));
    }
    Ok(body)
}

/// Decode each element independently, dropping the ones that do not fit.
///
/// Used for per-record parsing so that one odd record shortens the list
/// instead of failing the whole response.
pub fn decode_records<T: DeserializeOwned>(
    values: Vec<serde_json::Value>,
    source: &'static str,
) -> Vec<T> {
    values
        .into_iter()
        .filter_map(|value| match serde_json::from_value(value) {
            Ok(record) => Some(record),
            Err(e) => {
                tracing::warn!(source = source, error = %e, "Dropping malformed record");
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_joins_with_single_slash() {
        let base = Url::parse("http://127.0.0.1:1234").unwrap();
        assert_eq!(endpoint(&base, "/q/x"), "http://127.0.0.1:1234/q/x");
        let base = Url::parse("https://api.blockcypher.com/v1/btc/main/").unwrap();
        assert_eq!(
            endpoint(&base, "txs/abc"),
            "https://api.blockcypher.com/v1/btc/main/txs/abc"
        );
    }

    #[test]
    fn test_decode_records_drops_bad_entries() {
        #[derive(serde::Deserialize)]
        struct Item {
            id: u32,
        }
        let values = vec![
            serde_json::json!({"id": 1}),
            serde_json::json!({"name": "no id"}),
            serde_json::json!({"id": 3}),
        ];
        let items: Vec<Item> = decode_records(values, "test");
        assert_eq!(items.iter().map(|i| i.id).collect::<Vec<_>>(), vec![1, 3]);
    }
}
