//! HTTP plumbing shared by the adapters.

use std::time::Duration;

use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::errors::{classify_status, classify_transport, malformed_body, MarketDataError};

/// Upper bound on a single upstream call.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

pub(crate) fn build_client(timeout: Duration) -> Client {
    Client::builder()
        .timeout(timeout)
        .build()
        .unwrap_or_else(|_| Client::new())
}

/// Send `request` and return the body of a 2xx answer.
///
/// Non-2xx answers are classified by status; `error_field` pulls the
/// provider's documented error message out of the body, if present.
pub(crate) async fn send(
    provider: &str,
    request: RequestBuilder,
    timeout: Duration,
    error_field: fn(&str) -> Option<String>,
) -> Result<String, MarketDataError> {
    let response = request
        .timeout(timeout)
        .send()
        .await
        .map_err(|e| classify_transport(provider, &e))?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        debug!(provider, %status, "upstream returned error status");
        return Err(classify_status(provider, status, error_field(&body)));
    }

    let body = response
        .text()
        .await
        .map_err(|e| classify_transport(provider, &e))?;
    if body.trim().is_empty() {
        return Err(malformed_body(provider, "empty response body"));
    }
    Ok(body)
}

/// Deserialize a response body into its narrow parsing type.
pub(crate) fn parse_json<T: DeserializeOwned>(
    provider: &str,
    body: &str,
    what: &str,
) -> Result<T, MarketDataError> {
    serde_json::from_str(body)
        .map_err(|e| malformed_body(provider, format!("Failed to parse {} response: {}", what, e)))
}

/// Pull `{"error": "..."}` out of a body. Used by Finnhub and CoinGecko.
pub(crate) fn json_error_field(body: &str) -> Option<String> {
    #[derive(serde::Deserialize)]
    struct ErrorBody {
        error: Option<serde_json::Value>,
    }
    let parsed: ErrorBody = serde_json::from_str(body).ok()?;
    match parsed.error? {
        serde_json::Value::String(s) => Some(s),
        other => Some(other.to_string()),
    }
}

/// Parse a numeric string, tolerating a trailing `%` and surrounding spaces.
pub(crate) fn parse_number(raw: &str) -> Option<f64> {
    raw.trim().trim_end_matches('%').trim().parse::<f64>().ok()
}
