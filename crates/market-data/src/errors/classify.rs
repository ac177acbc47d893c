//! Error classifier.
//!
//! Maps raw transport and HTTP outcomes to the [`MarketDataError`] taxonomy.
//! Classification looks at the HTTP status and transport error only; the only
//! body content consulted is a provider's documented error field, which the
//! adapter extracts and passes in as `upstream_message`.

use lazy_static::lazy_static;
use regex::Regex;
use reqwest::StatusCode;

use super::MarketDataError;

lazy_static! {
    static ref CRYPTO_IDS: Regex =
        Regex::new(r"^[a-zA-Z0-9_,\-\s]+$").expect("Invalid regex pattern");
    static ref IDENTIFIER: Regex =
        Regex::new(r"^[a-zA-Z0-9_\-]+$").expect("Invalid regex pattern");
    static ref SYMBOL: Regex =
        Regex::new(r"^[A-Za-z0-9.\-=^:]{1,20}$").expect("Invalid regex pattern");
}

/// Classify a non-success HTTP status.
///
/// | Status | Outcome |
/// |--------|---------|
/// | 404 | `NotFound` |
/// | 429 | `RateLimited` |
/// | 5xx | `UpstreamUnavailable` |
/// | anything else | `UpstreamUnavailable` |
///
/// `InvalidInput` never comes from a status: identifiers are validated
/// before any request is sent.
pub fn classify_status(
    provider: &str,
    status: StatusCode,
    upstream_message: Option<String>,
) -> MarketDataError {
    match status {
        StatusCode::NOT_FOUND => MarketDataError::NotFound(
            upstream_message.unwrap_or_else(|| format!("{} has no such asset", provider)),
        ),
        StatusCode::TOO_MANY_REQUESTS => MarketDataError::RateLimited {
            provider: provider.to_string(),
            message: upstream_message,
        },
        // 5xx, and 400/401/403/422 where the provider refused our request
        // (bad key, quota, unsupported parameter). Another provider may
        // still answer.
        s => MarketDataError::UpstreamUnavailable {
            provider: provider.to_string(),
            message: Some(upstream_message.unwrap_or_else(|| format!("HTTP {}", s))),
        },
    }
}

/// Classify a `reqwest` transport failure.
pub fn classify_transport(provider: &str, error: &reqwest::Error) -> MarketDataError {
    if let Some(status) = error.status() {
        return classify_status(provider, status, None);
    }
    if error.is_decode() || error.is_body() {
        return malformed_body(provider, error.to_string());
    }
    let detail = if error.is_timeout() {
        "request timed out".to_string()
    } else if error.is_connect() {
        format!("connection failed: {}", error)
    } else {
        error.to_string()
    };
    MarketDataError::Network {
        provider: provider.to_string(),
        message: Some(detail),
    }
}

/// A 2xx response whose body is empty or lacks required fields.
pub fn malformed_body(provider: &str, detail: impl Into<String>) -> MarketDataError {
    MarketDataError::UpstreamUnavailable {
        provider: provider.to_string(),
        message: Some(detail.into()),
    }
}

/// Validate a comma-separated list of crypto ids and split it.
///
/// Whitespace around ids is trimmed and empty segments are dropped.
pub fn validate_crypto_ids(raw: &str) -> Result<Vec<String>, MarketDataError> {
    if raw.trim().is_empty() {
        return Err(MarketDataError::InvalidInput(
            "cryptoId is required".to_string(),
        ));
    }
    if !CRYPTO_IDS.is_match(raw) {
        return Err(MarketDataError::InvalidInput(
            "Invalid cryptoId format".to_string(),
        ));
    }
    let ids: Vec<String> = raw
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();
    if ids.is_empty() {
        return Err(MarketDataError::InvalidInput(
            "cryptoId is required".to_string(),
        ));
    }
    Ok(ids)
}

/// Validate a single provider identifier such as a CoinGecko coin id.
pub fn validate_identifier(raw: &str) -> Result<String, MarketDataError> {
    let id = raw.trim();
    if IDENTIFIER.is_match(id) {
        Ok(id.to_string())
    } else {
        Err(MarketDataError::InvalidInput(format!(
            "Invalid identifier: '{}'",
            raw
        )))
    }
}

/// Validate and normalize a stock ticker (upper-cased).
pub fn validate_symbol(raw: &str) -> Result<String, MarketDataError> {
    let symbol = raw.trim();
    if SYMBOL.is_match(symbol) {
        Ok(symbol.to_uppercase())
    } else {
        Err(MarketDataError::InvalidInput(format!(
            "Invalid symbol: '{}'",
            raw
        )))
    }
}
