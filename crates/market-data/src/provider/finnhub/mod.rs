//! Finnhub market data provider implementation.
//!
//! This module provides market data from Finnhub API:
//! - Equity quotes via /quote
//! - Daily closes via /stock/candle
//! - Symbol search via /search
//!
//! Finnhub free tier is limited to 60 API calls per minute.
//! API documentation: https://finnhub.io/docs/api

use std::time::Duration;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::errors::{malformed_body, MarketDataError};
use crate::models::{HistoryPoint, HistoryRange, Quote, SymbolMatch};
use crate::provider::http::{build_client, json_error_field, parse_json, send, DEFAULT_TIMEOUT};
use crate::provider::{HistoryProvider, Provider, QuoteProvider, SymbolSearchProvider};

pub const BASE_URL: &str = "https://finnhub.io/api/v1";
const PROVIDER_ID: &str = "FINNHUB";

// ============================================================================
// API Response Structures
// ============================================================================

/// Response from /quote endpoint
#[derive(Debug, Deserialize)]
struct QuoteResponse {
    /// Current price
    c: Option<f64>,
    /// Change
    d: Option<f64>,
    /// Percent change
    dp: Option<f64>,
    /// High price of the day
    h: Option<f64>,
    /// Low price of the day
    l: Option<f64>,
    /// Open price of the day
    o: Option<f64>,
    /// Timestamp (Unix)
    t: Option<i64>,
}

/// Response from /stock/candle endpoint
#[derive(Debug, Deserialize)]
struct CandleResponse {
    /// Status: "ok" or "no_data"
    s: String,
    /// Close prices
    #[serde(default)]
    c: Vec<f64>,
    /// Timestamps (Unix)
    #[serde(default)]
    t: Vec<i64>,
}

/// Response from /search endpoint
#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    result: Vec<SearchItem>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchItem {
    /// Full description/name
    description: String,
    /// Symbol for API calls
    symbol: String,
    /// Security type (e.g., "Common Stock", "ETF")
    #[serde(rename = "type", default)]
    security_type: String,
}

// ============================================================================
// FinnhubProvider
// ============================================================================

/// Finnhub market data provider.
pub struct FinnhubProvider {
    client: Client,
    api_key: String,
    base_url: String,
    timeout: Duration,
}

impl FinnhubProvider {
    /// Create a new Finnhub provider with the given API key.
    pub fn new(api_key: String) -> Self {
        Self::with_base_url(api_key, BASE_URL, DEFAULT_TIMEOUT)
    }

    /// Create a provider pointed at a different host (proxies, tests).
    pub fn with_base_url(api_key: String, base_url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            client: build_client(timeout),
            api_key,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            timeout,
        }
    }

    /// Make a GET request to the Finnhub API.
    async fn fetch(&self, endpoint: &str, params: &[(&str, &str)]) -> Result<String, MarketDataError> {
        let url = format!("{}{}", self.base_url, endpoint);

        debug!("Finnhub request: {} with {} params", endpoint, params.len());

        // API key goes in a header so it never shows up in logged URLs
        let request = self
            .client
            .get(&url)
            .header("X-Finnhub-Token", &self.api_key)
            .query(params);

        let body = send(PROVIDER_ID, request, self.timeout, json_error_field).await?;

        // Finnhub sometimes answers 200 with {"error": "..."}
        if let Some(message) = json_error_field(&body) {
            return Err(MarketDataError::UpstreamUnavailable {
                provider: PROVIDER_ID.to_string(),
                message: Some(message),
            });
        }
        Ok(body)
    }

    async fn fetch_quote(&self, symbol: &str) -> Result<Quote, MarketDataError> {
        let text = self.fetch("/quote", &[("symbol", symbol)]).await?;
        let response: QuoteResponse = parse_json(PROVIDER_ID, &text, "quote")?;

        let price = response
            .c
            .ok_or_else(|| malformed_body(PROVIDER_ID, "quote response has no current price"))?;

        // Finnhub returns zeros for unknown symbols instead of an error
        if price == 0.0 && response.o.unwrap_or(0.0) == 0.0 {
            return Err(MarketDataError::NotFound(format!(
                "Symbol not found or no trading data: {}",
                symbol
            )));
        }

        let as_of = response
            .t
            .and_then(|ts| Utc.timestamp_opt(ts, 0).single())
            .unwrap_or_else(Utc::now);

        Ok(Quote {
            symbol: symbol.to_string(),
            // /quote carries no company name
            name: symbol.to_string(),
            price,
            open: response.o,
            day_high: response.h,
            day_low: response.l,
            change_abs: response.d,
            change_percent: response.dp,
            // /quote endpoint doesn't provide volume
            volume: None,
            as_of,
        })
    }

    async fn fetch_candles(
        &self,
        symbol: &str,
        range: HistoryRange,
    ) -> Result<Vec<HistoryPoint>, MarketDataError> {
        let to = Utc::now();
        let from = to - chrono::Duration::days(range.lookback_days());
        let from_ts = from.timestamp().to_string();
        let to_ts = to.timestamp().to_string();

        let params = [
            ("symbol", symbol),
            ("resolution", "D"), // Daily candles
            ("from", from_ts.as_str()),
            ("to", to_ts.as_str()),
        ];
        let text = self.fetch("/stock/candle", &params).await?;
        let response: CandleResponse = parse_json(PROVIDER_ID, &text, "candle")?;

        if response.s == "no_data" {
            return Err(MarketDataError::NotFound(format!(
                "No price history for symbol: {}",
                symbol
            )));
        }
        if response.s != "ok" {
            return Err(malformed_body(
                PROVIDER_ID,
                format!("Unexpected candle status: {}", response.s),
            ));
        }
        if response.c.len() != response.t.len() {
            return Err(malformed_body(
                PROVIDER_ID,
                "Mismatched array lengths in candle response",
            ));
        }

        let mut points: Vec<HistoryPoint> = response
            .t
            .iter()
            .zip(response.c.iter())
            .filter_map(|(&ts, &close)| match Utc.timestamp_opt(ts, 0).single() {
                Some(dt) => Some(HistoryPoint::new(dt.date_naive(), close)),
                None => {
                    warn!("Invalid candle timestamp {} for {}", ts, symbol);
                    None
                }
            })
            .collect();
        points.sort_by_key(|p| p.date);

        debug!(
            "Finnhub: fetched {} daily closes for {} ({})",
            points.len(),
            symbol,
            range
        );
        Ok(points)
    }

    async fn search_symbols(&self, query: &str) -> Result<Vec<SymbolMatch>, MarketDataError> {
        let text = self.fetch("/search", &[("q", query)]).await?;
        let response: SearchResponse = parse_json(PROVIDER_ID, &text, "search")?;

        let results: Vec<SymbolMatch> = response
            .result
            .into_iter()
            .map(|item| {
                SymbolMatch::new(
                    item.symbol,
                    item.description,
                    map_security_type(&item.security_type),
                )
            })
            .collect();

        debug!("Finnhub: found {} search results for '{}'", results.len(), query);
        Ok(results)
    }
}

// ============================================================================
// Capability Implementations
// ============================================================================

impl Provider for FinnhubProvider {
    fn id(&self) -> &'static str {
        PROVIDER_ID
    }
}

#[async_trait]
impl QuoteProvider for FinnhubProvider {
    async fn quote(&self, symbol: &str) -> Result<Quote, MarketDataError> {
        debug!("Fetching latest quote for {} from Finnhub", symbol);
        self.fetch_quote(symbol).await
    }
}

#[async_trait]
impl HistoryProvider for FinnhubProvider {
    async fn history(
        &self,
        symbol: &str,
        range: HistoryRange,
    ) -> Result<Vec<HistoryPoint>, MarketDataError> {
        self.fetch_candles(symbol, range).await
    }
}

#[async_trait]
impl SymbolSearchProvider for FinnhubProvider {
    async fn search(&self, query: &str) -> Result<Vec<SymbolMatch>, MarketDataError> {
        debug!("Searching Finnhub for '{}'", query);
        self.search_symbols(query).await
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Map Finnhub security type to our asset type.
fn map_security_type(finnhub_type: &str) -> String {
    match finnhub_type.to_lowercase().as_str() {
        "common stock" | "stock" => "Equity".to_string(),
        "etf" | "etp" => "ETF".to_string(),
        "mutual fund" | "fund" => "Mutual Fund".to_string(),
        "adr" | "american depositary receipt" => "ADR".to_string(),
        "reit" => "REIT".to_string(),
        "preferred stock" | "preferred" => "Preferred Stock".to_string(),
        "" => "Unknown".to_string(),
        _ => finnhub_type.to_string(),
    }
}

// ============================================================================
// Tests
// ============================================================================
