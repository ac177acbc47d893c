use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use serde::Deserialize;
use tracing::{debug, warn};

use super::{CoinGeckoClient, PROVIDER_ID};
use crate::errors::{malformed_body, MarketDataError};
use crate::models::{CoinDetails, CoinMatch, CryptoPrice, HistoryPoint, MarketSnapshot};
use crate::provider::{CryptoMarketProvider, CryptoPriceProvider, Provider};

/// Currency the market endpoints are quoted in.
const DEFAULT_VS_CURRENCY: &str = "usd";

// ============================================================================
// API Response Structures
// ============================================================================

/// One row of /coins/markets
#[derive(Debug, Deserialize)]
struct MarketRow {
    id: String,
    symbol: String,
    name: String,
    image: Option<String>,
    current_price: Option<f64>,
    market_cap: Option<f64>,
    market_cap_rank: Option<u32>,
    total_volume: Option<f64>,
    high_24h: Option<f64>,
    low_24h: Option<f64>,
    price_change_24h: Option<f64>,
    price_change_percentage_24h: Option<f64>,
    last_updated: Option<DateTime<Utc>>,
}

impl MarketRow {
    fn into_snapshot(self) -> Option<MarketSnapshot> {
        let Some(price) = self.current_price else {
            warn!("CoinGecko market row for {} has no price, skipping", self.id);
            return None;
        };
        Some(MarketSnapshot {
            id: self.id,
            symbol: self.symbol,
            name: self.name,
            price,
            change_24h: self.price_change_24h,
            change_percent_24h: self.price_change_percentage_24h,
            high_24h: self.high_24h,
            low_24h: self.low_24h,
            volume_24h: self.total_volume,
            market_cap: self.market_cap,
            rank: self.market_cap_rank,
            image: self.image,
            last_updated: self.last_updated.unwrap_or_else(Utc::now),
        })
    }
}

/// Response from /coins/{id}
#[derive(Debug, Deserialize)]
struct CoinResponse {
    id: String,
    symbol: String,
    name: String,
    #[serde(default)]
    description: BTreeMap<String, Option<String>>,
    links: Option<Links>,
    image: Option<Images>,
    #[serde(default)]
    categories: Vec<Option<String>>,
    market_cap_rank: Option<u32>,
    market_data: Option<CoinMarketData>,
}

#[derive(Debug, Deserialize)]
struct Links {
    #[serde(default)]
    homepage: Vec<Option<String>>,
}

#[derive(Debug, Deserialize)]
struct Images {
    large: Option<String>,
}

/// Per-currency value tables inside `market_data`
type CurrencyTable = BTreeMap<String, Option<f64>>;

#[derive(Debug, Deserialize)]
struct CoinMarketData {
    #[serde(default)]
    current_price: CurrencyTable,
    #[serde(default)]
    high_24h: CurrencyTable,
    #[serde(default)]
    low_24h: CurrencyTable,
    #[serde(default)]
    total_volume: CurrencyTable,
    #[serde(default)]
    market_cap: CurrencyTable,
    #[serde(default)]
    ath: CurrencyTable,
    #[serde(default)]
    atl: CurrencyTable,
    price_change_24h: Option<f64>,
    price_change_percentage_24h: Option<f64>,
    circulating_supply: Option<f64>,
    total_supply: Option<f64>,
    max_supply: Option<f64>,
    last_updated: Option<DateTime<Utc>>,
}

fn usd(table: &CurrencyTable) -> Option<f64> {
    table.get(DEFAULT_VS_CURRENCY).copied().flatten()
}

impl CoinResponse {
    fn into_details(self) -> CoinDetails {
        let CoinResponse {
            id,
            symbol,
            name,
            description,
            links,
            image,
            categories,
            market_cap_rank,
            market_data,
        } = self;

        let image = image.and_then(|i| i.large);
        let market = market_data.as_ref().and_then(|m| {
            usd(&m.current_price).map(|price| MarketSnapshot {
                id: id.clone(),
                symbol: symbol.clone(),
                name: name.clone(),
                price,
                change_24h: m.price_change_24h,
                change_percent_24h: m.price_change_percentage_24h,
                high_24h: usd(&m.high_24h),
                low_24h: usd(&m.low_24h),
                volume_24h: usd(&m.total_volume),
                market_cap: usd(&m.market_cap),
                rank: market_cap_rank,
                image: image.clone(),
                last_updated: m.last_updated.unwrap_or_else(Utc::now),
            })
        });

        CoinDetails {
            description: description
                .get("en")
                .cloned()
                .flatten()
                .filter(|d| !d.trim().is_empty()),
            homepage: links
                .and_then(|l| l.homepage.into_iter().flatten().find(|h| !h.is_empty())),
            image,
            categories: categories.into_iter().flatten().collect(),
            circulating_supply: market_data.as_ref().and_then(|m| m.circulating_supply),
            total_supply: market_data.as_ref().and_then(|m| m.total_supply),
            max_supply: market_data.as_ref().and_then(|m| m.max_supply),
            all_time_high: market_data.as_ref().and_then(|m| usd(&m.ath)),
            all_time_low: market_data.as_ref().and_then(|m| usd(&m.atl)),
            market,
            id,
            symbol,
            name,
        }
    }
}

/// Response from /coins/{id}/market_chart
#[derive(Debug, Deserialize)]
struct MarketChartResponse {
    /// `[unix_millis, price]` pairs
    prices: Option<Vec<(f64, Option<f64>)>>,
}

/// Response from /search
#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    coins: Vec<SearchCoin>,
}

#[derive(Debug, Deserialize)]
struct SearchCoin {
    id: String,
    name: String,
    symbol: String,
    market_cap_rank: Option<u32>,
    thumb: Option<String>,
}

// ============================================================================
// CoinGeckoMarketProvider
// ============================================================================

/// Market-data endpoints: the rich half of the crypto chain.
pub struct CoinGeckoMarketProvider {
    client: CoinGeckoClient,
}

impl CoinGeckoMarketProvider {
    pub fn new(client: CoinGeckoClient) -> Self {
        Self { client }
    }

    async fn fetch_markets(
        &self,
        ids: &[String],
        vs_currency: &str,
        limit: usize,
    ) -> Result<Vec<MarketSnapshot>, MarketDataError> {
        let joined = ids.join(",");
        let per_page = limit.max(1).to_string();
        let mut params = vec![
            ("vs_currency", vs_currency),
            ("order", "market_cap_desc"),
            ("per_page", per_page.as_str()),
            ("page", "1"),
            ("sparkline", "false"),
        ];
        if !ids.is_empty() {
            params.push(("ids", joined.as_str()));
        }

        let rows: Vec<MarketRow> = self.client.get_json("/coins/markets", &params).await?;
        let snapshots: Vec<MarketSnapshot> =
            rows.into_iter().filter_map(MarketRow::into_snapshot).collect();

        debug!(
            "CoinGecko: {} market rows (ids: {})",
            snapshots.len(),
            if ids.is_empty() { "<all>" } else { joined.as_str() }
        );
        Ok(snapshots)
    }

    async fn fetch_details(&self, id: &str) -> Result<CoinDetails, MarketDataError> {
        let path = format!("/coins/{}", id);
        let params = [
            ("localization", "false"),
            ("tickers", "false"),
            ("market_data", "true"),
            ("community_data", "false"),
            ("developer_data", "false"),
            ("sparkline", "false"),
        ];
        let response: CoinResponse = self.client.get_json(&path, &params).await?;
        Ok(response.into_details())
    }

    async fn fetch_market_chart(
        &self,
        id: &str,
        days: u32,
    ) -> Result<Vec<HistoryPoint>, MarketDataError> {
        let path = format!("/coins/{}/market_chart", id);
        let days = days.to_string();
        let params = [
            ("vs_currency", DEFAULT_VS_CURRENCY),
            ("days", days.as_str()),
            ("interval", "daily"),
        ];
        let response: MarketChartResponse = self.client.get_json(&path, &params).await?;
        let prices = response
            .prices
            .ok_or_else(|| malformed_body(PROVIDER_ID, "market_chart has no 'prices' array"))?;

        // Daily series end with an intraday point; keep the last close per day.
        let mut by_date = BTreeMap::new();
        for (millis, price) in prices {
            let (Some(price), Some(at)) = (price, Utc.timestamp_millis_opt(millis as i64).single())
            else {
                continue;
            };
            by_date.insert(at.date_naive(), price);
        }

        Ok(by_date
            .into_iter()
            .map(|(date, close)| HistoryPoint::new(date, close))
            .collect())
    }

    async fn fetch_search(&self, query: &str) -> Result<Vec<CoinMatch>, MarketDataError> {
        let response: SearchResponse = self.client.get_json("/search", &[("query", query)]).await?;
        Ok(response
            .coins
            .into_iter()
            .map(|c| CoinMatch {
                id: c.id,
                symbol: c.symbol,
                name: c.name,
                market_cap_rank: c.market_cap_rank,
                thumb: c.thumb,
            })
            .collect())
    }
}

impl Provider for CoinGeckoMarketProvider {
    fn id(&self) -> &'static str {
        PROVIDER_ID
    }
}

#[async_trait]
impl CryptoMarketProvider for CoinGeckoMarketProvider {
    async fn markets(
        &self,
        ids: &[String],
        vs_currency: &str,
        limit: usize,
    ) -> Result<Vec<MarketSnapshot>, MarketDataError> {
        self.fetch_markets(ids, vs_currency, limit).await
    }

    async fn details(&self, id: &str) -> Result<CoinDetails, MarketDataError> {
        self.fetch_details(id).await
    }

    async fn history(&self, id: &str, days: u32) -> Result<Vec<HistoryPoint>, MarketDataError> {
        self.fetch_market_chart(id, days).await
    }

    async fn search(&self, query: &str) -> Result<Vec<CoinMatch>, MarketDataError> {
        self.fetch_search(query).await
    }
}

/// Prices from /coins/markets.
///
/// Always quoted in USD whatever `currencies` asks for: volume and market cap
/// come from the same row and are published as USD figures.
#[async_trait]
impl CryptoPriceProvider for CoinGeckoMarketProvider {
    async fn prices(
        &self,
        ids: &[String],
        _currencies: &[String],
    ) -> Result<Vec<CryptoPrice>, MarketDataError> {
        let snapshots = self
            .fetch_markets(ids, DEFAULT_VS_CURRENCY, ids.len())
            .await?;
        Ok(snapshots
            .iter()
            .map(|s| s.to_crypto_price(DEFAULT_VS_CURRENCY))
            .collect())
    }

    fn is_market_data(&self) -> bool {
        true
    }
}
