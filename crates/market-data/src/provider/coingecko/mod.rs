//! CoinGecko crypto data provider.
//!
//! Two adapters share one [`CoinGeckoClient`]:
//! - [`CoinGeckoMarketProvider`]: `/coins/markets`, `/coins/{id}`,
//!   `/coins/{id}/market_chart`, `/search`
//! - [`CoinGeckoPriceProvider`]: `/simple/price`
//!
//! The public API works without a key. A demo key, when configured, is sent
//! in the `x-cg-demo-api-key` header.

mod market;
mod simple_price;

pub use market::CoinGeckoMarketProvider;
pub use simple_price::CoinGeckoPriceProvider;

use std::time::Duration;

use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::debug;

use crate::errors::MarketDataError;
use crate::provider::http::{build_client, parse_json, send, DEFAULT_TIMEOUT};

pub const BASE_URL: &str = "https://api.coingecko.com/api/v3";
const PROVIDER_ID: &str = "COINGECKO";

/// Thin HTTP client for the CoinGecko v3 API.
#[derive(Clone)]
pub struct CoinGeckoClient {
    client: Client,
    api_key: Option<String>,
    base_url: String,
    timeout: Duration,
}

impl CoinGeckoClient {
    pub fn new(api_key: Option<String>) -> Self {
        Self::with_base_url(api_key, BASE_URL, DEFAULT_TIMEOUT)
    }

    pub fn with_base_url(
        api_key: Option<String>,
        base_url: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        Self {
            client: build_client(timeout),
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            timeout,
        }
    }

    /// GET `path` and decode the body into `T`.
    pub(crate) async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, &str)],
    ) -> Result<T, MarketDataError> {
        let url = format!("{}{}", self.base_url, path);
        debug!("CoinGecko request: {} with {} params", path, params.len());

        let mut request = self.client.get(&url).query(params);
        if let Some(key) = &self.api_key {
            request = request.header("x-cg-demo-api-key", key);
        }

        let body = send(PROVIDER_ID, request, self.timeout, error_field).await?;
        parse_json(PROVIDER_ID, &body, path)
    }
}

/// CoinGecko reports errors either as `{"error": "..."}` or as
/// `{"status": {"error_code": 429, "error_message": "..."}}`.
fn error_field(body: &str) -> Option<String> {
    #[derive(Deserialize)]
    struct Status {
        error_message: Option<String>,
    }
    #[derive(Deserialize)]
    struct ErrorBody {
        error: Option<String>,
        status: Option<Status>,
    }
    let parsed: ErrorBody = serde_json::from_str(body).ok()?;
    parsed
        .error
        .or_else(|| parsed.status.and_then(|s| s.error_message))
}
