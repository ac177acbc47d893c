//! Alpha Vantage market data provider.
//!
//! Provides:
//! - Equity quotes via GLOBAL_QUOTE
//! - Daily closes via TIME_SERIES_DAILY
//! - Ticker search via SYMBOL_SEARCH
//!
//! Note: Alpha Vantage free tier is limited to 5 API calls per minute.
//!
//! Alpha Vantage answers most failures with HTTP 200 and one of three
//! documented body fields:
//! - `"Error Message"`: unknown symbol or bad call, mapped to `NotFound`
//! - `"Note"` / `"Information"`: throttling or quota, mapped to `RateLimited`

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{NaiveDate, TimeZone, Utc};
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use crate::errors::{malformed_body, MarketDataError};
use crate::models::{HistoryPoint, HistoryRange, Quote, SymbolMatch};
use crate::provider::http::{build_client, parse_json, parse_number, send, DEFAULT_TIMEOUT};
use crate::provider::{HistoryProvider, Provider, QuoteProvider, SymbolSearchProvider};

pub const BASE_URL: &str = "https://www.alphavantage.co/query";
const PROVIDER_ID: &str = "ALPHA_VANTAGE";

/// `compact` returns the latest 100 points; anything longer needs `full`.
const COMPACT_POINTS: usize = 100;

/// Documented error fields, present on any Alpha Vantage body.
#[derive(Debug, Default, Deserialize)]
struct ApiNotice {
    #[serde(rename = "Error Message")]
    error_message: Option<String>,
    #[serde(rename = "Note")]
    note: Option<String>,
    #[serde(rename = "Information")]
    information: Option<String>,
}

impl ApiNotice {
    fn into_error(self, subject: &str) -> Option<MarketDataError> {
        if let Some(msg) = self.error_message {
            return Some(MarketDataError::NotFound(format!("{}: {}", subject, msg)));
        }
        self.note
            .or(self.information)
            .map(|msg| MarketDataError::RateLimited {
                provider: PROVIDER_ID.to_string(),
                message: Some(msg),
            })
    }
}

#[derive(Debug, Deserialize)]
struct GlobalQuoteResponse {
    #[serde(rename = "Global Quote")]
    global_quote: Option<GlobalQuote>,
}

#[derive(Debug, Default, Deserialize)]
struct GlobalQuote {
    #[serde(rename = "01. symbol")]
    symbol: Option<String>,
    #[serde(rename = "02. open")]
    open: Option<String>,
    #[serde(rename = "03. high")]
    high: Option<String>,
    #[serde(rename = "04. low")]
    low: Option<String>,
    #[serde(rename = "05. price")]
    price: Option<String>,
    #[serde(rename = "06. volume")]
    volume: Option<String>,
    #[serde(rename = "07. latest trading day")]
    latest_trading_day: Option<String>,
    #[serde(rename = "09. change")]
    change: Option<String>,
    #[serde(rename = "10. change percent")]
    change_percent: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TimeSeriesResponse {
    #[serde(rename = "Time Series (Daily)")]
    time_series: Option<BTreeMap<String, DailyBar>>,
}

#[derive(Debug, Deserialize)]
struct DailyBar {
    #[serde(rename = "4. close")]
    close: String,
}

#[derive(Debug, Deserialize)]
struct SymbolSearchResponse {
    #[serde(rename = "bestMatches")]
    best_matches: Option<Vec<SearchMatch>>,
}

#[derive(Debug, Deserialize)]
struct SearchMatch {
    #[serde(rename = "1. symbol")]
    symbol: String,
    #[serde(rename = "2. name")]
    name: String,
    #[serde(rename = "3. type")]
    asset_type: String,
    #[serde(rename = "4. region")]
    region: Option<String>,
    #[serde(rename = "8. currency")]
    currency: Option<String>,
}

/// Alpha Vantage market data provider.
pub struct AlphaVantageProvider {
    client: Client,
    api_key: String,
    base_url: String,
    timeout: Duration,
}

impl AlphaVantageProvider {
    /// Create a new Alpha Vantage provider.
    pub fn new(api_key: String) -> Self {
        Self::with_base_url(api_key, BASE_URL, DEFAULT_TIMEOUT)
    }

    /// `base_url` is the full query endpoint, e.g. `https://host/query`.
    pub fn with_base_url(api_key: String, base_url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            client: build_client(timeout),
            api_key,
            base_url: base_url.into(),
            timeout,
        }
    }

    /// Make a request to the Alpha Vantage API and screen the documented
    /// error fields.
    async fn fetch(&self, subject: &str, params: &[(&str, &str)]) -> Result<String, MarketDataError> {
        let mut all_params: Vec<(&str, &str)> = params.to_vec();
        all_params.push(("apikey", &self.api_key));

        let url = reqwest::Url::parse_with_params(&self.base_url, &all_params)
            .map_err(|e| malformed_body(PROVIDER_ID, format!("Failed to build URL: {}", e)))?;

        debug!(
            "Alpha Vantage request: {}",
            url.as_str().replace(&self.api_key, "***")
        );

        let body = send(PROVIDER_ID, self.client.get(url), self.timeout, error_message_field).await?;

        let notice: ApiNotice = serde_json::from_str(&body).unwrap_or_default();
        if let Some(err) = notice.into_error(subject) {
            debug!("Alpha Vantage notice for {}: {}", subject, err);
            return Err(err);
        }
        Ok(body)
    }

    async fn fetch_global_quote(&self, symbol: &str) -> Result<Quote, MarketDataError> {
        let text = self
            .fetch(symbol, &[("function", "GLOBAL_QUOTE"), ("symbol", symbol)])
            .await?;
        let response: GlobalQuoteResponse = parse_json(PROVIDER_ID, &text, "GLOBAL_QUOTE")?;

        // Unknown symbols come back as {"Global Quote": {}}
        let raw = response.global_quote.unwrap_or_default();
        if raw.symbol.is_none() && raw.price.is_none() {
            return Err(MarketDataError::NotFound(format!(
                "No quote data for symbol: {}",
                symbol
            )));
        }

        let price = raw
            .price
            .as_deref()
            .and_then(parse_number)
            .ok_or_else(|| malformed_body(PROVIDER_ID, "GLOBAL_QUOTE has no usable price"))?;

        let as_of = raw
            .latest_trading_day
            .as_deref()
            .and_then(parse_date)
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .and_then(|dt| Utc.from_local_datetime(&dt).single())
            .unwrap_or_else(Utc::now);

        let field = |v: &Option<String>| v.as_deref().and_then(parse_number);

        Ok(Quote {
            symbol: raw.symbol.clone().unwrap_or_else(|| symbol.to_string()),
            name: symbol.to_string(),
            price,
            open: field(&raw.open),
            day_high: field(&raw.high),
            day_low: field(&raw.low),
            change_abs: field(&raw.change),
            change_percent: field(&raw.change_percent),
            volume: field(&raw.volume),
            as_of,
        })
    }

    async fn fetch_daily_series(
        &self,
        symbol: &str,
        range: HistoryRange,
    ) -> Result<Vec<HistoryPoint>, MarketDataError> {
        let output_size = if range.points() > COMPACT_POINTS {
            "full"
        } else {
            "compact"
        };
        let text = self
            .fetch(
                symbol,
                &[
                    ("function", "TIME_SERIES_DAILY"),
                    ("symbol", symbol),
                    ("outputsize", output_size),
                ],
            )
            .await?;
        let response: TimeSeriesResponse = parse_json(PROVIDER_ID, &text, "TIME_SERIES_DAILY")?;

        let series = response
            .time_series
            .ok_or_else(|| malformed_body(PROVIDER_ID, "missing 'Time Series (Daily)'"))?;

        let cutoff = Utc::now().date_naive() - chrono::Duration::days(range.lookback_days());

        // BTreeMap keys are ISO dates, so iteration is already ascending
        let points: Vec<HistoryPoint> = series
            .iter()
            .filter_map(|(date, bar)| {
                let date = parse_date(date)?;
                let close = parse_number(&bar.close)?;
                Some(HistoryPoint::new(date, close))
            })
            .filter(|p| p.date >= cutoff)
            .collect();

        if points.is_empty() {
            return Err(MarketDataError::NotFound(format!(
                "No price history for symbol: {}",
                symbol
            )));
        }

        debug!(
            "Alpha Vantage: fetched {} daily closes for {} ({})",
            points.len(),
            symbol,
            range
        );
        Ok(points)
    }

    async fn fetch_symbol_search(&self, query: &str) -> Result<Vec<SymbolMatch>, MarketDataError> {
        let text = self
            .fetch(query, &[("function", "SYMBOL_SEARCH"), ("keywords", query)])
            .await?;
        let response: SymbolSearchResponse = parse_json(PROVIDER_ID, &text, "SYMBOL_SEARCH")?;

        let results = response
            .best_matches
            .unwrap_or_default()
            .into_iter()
            .map(|m| {
                let mut result = SymbolMatch::new(m.symbol, m.name, m.asset_type);
                if let Some(region) = m.region {
                    result = result.with_region(region);
                }
                if let Some(currency) = m.currency {
                    result = result.with_currency(currency);
                }
                result
            })
            .collect();
        Ok(results)
    }
}

impl Provider for AlphaVantageProvider {
    fn id(&self) -> &'static str {
        PROVIDER_ID
    }
}

#[async_trait]
impl QuoteProvider for AlphaVantageProvider {
    async fn quote(&self, symbol: &str) -> Result<Quote, MarketDataError> {
        self.fetch_global_quote(symbol).await
    }
}

#[async_trait]
impl HistoryProvider for AlphaVantageProvider {
    async fn history(
        &self,
        symbol: &str,
        range: HistoryRange,
    ) -> Result<Vec<HistoryPoint>, MarketDataError> {
        self.fetch_daily_series(symbol, range).await
    }
}

#[async_trait]
impl SymbolSearchProvider for AlphaVantageProvider {
    async fn search(&self, query: &str) -> Result<Vec<SymbolMatch>, MarketDataError> {
        self.fetch_symbol_search(query).await
    }
}

/// Parse a date string in YYYY-MM-DD format.
fn parse_date(date_str: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(date_str, "%Y-%m-%d").ok()
}

/// Documented error text on a non-2xx body.
fn error_message_field(body: &str) -> Option<String> {
    let notice: ApiNotice = serde_json::from_str(body).ok()?;
    notice.error_message.or(notice.note).or(notice.information)
}
