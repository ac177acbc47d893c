//! Crypto market models.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Quote;

/// Market-data endpoint view of one coin.
///
/// Superset of [`Quote`] for crypto; see [`MarketSnapshot::to_quote`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketSnapshot {
    pub id: String,
    pub symbol: String,
    pub name: String,
    pub price: f64,
    pub change_24h: Option<f64>,
    pub change_percent_24h: Option<f64>,
    pub high_24h: Option<f64>,
    pub low_24h: Option<f64>,
    pub volume_24h: Option<f64>,
    pub market_cap: Option<f64>,
    pub rank: Option<u32>,
    pub image: Option<String>,
    pub last_updated: DateTime<Utc>,
}

impl MarketSnapshot {
    /// Downgrade to the canonical quote shape.
    pub fn to_quote(&self) -> Quote {
        Quote {
            symbol: self.symbol.to_uppercase(),
            name: self.name.clone(),
            price: self.price,
            open: None,
            day_high: self.high_24h,
            day_low: self.low_24h,
            change_abs: self.change_24h,
            change_percent: self.change_percent_24h,
            volume: self.volume_24h,
            as_of: self.last_updated,
        }
    }

    /// Price table entry for a crypto price request quoted in `vs_currency`.
    pub fn to_crypto_price(&self, vs_currency: &str) -> CryptoPrice {
        let mut prices = BTreeMap::new();
        prices.insert(vs_currency.to_lowercase(), self.price);
        CryptoPrice {
            id: self.id.clone(),
            symbol: self.symbol.clone(),
            name: self.name.clone(),
            prices,
            change_percent_24h: self.change_percent_24h,
            volume_24h: self.volume_24h,
            market_cap: self.market_cap,
        }
    }
}

/// Price of one coin in one or more fiat currencies.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CryptoPrice {
    pub id: String,
    pub symbol: String,
    pub name: String,
    /// Currency code (lowercase) to price
    pub prices: BTreeMap<String, f64>,
    pub change_percent_24h: Option<f64>,
    /// USD
    pub volume_24h: Option<f64>,
    /// USD
    pub market_cap: Option<f64>,
}

impl CryptoPrice {
    pub fn price_in(&self, currency: &str) -> Option<f64> {
        self.prices.get(&currency.to_lowercase()).copied()
    }
}

/// Which endpoint produced a [`CryptoPriceReport`].
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriceSource {
    /// Market-data endpoint: name, 24h change, volume and market cap present
    Market,
    /// Simple-price endpoint: prices only
    SimplePrice,
    /// Degraded-mode fallback table
    Fallback,
}

/// Answer to a crypto price request.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CryptoPriceReport {
    /// First requested id that the provider answered for
    pub primary: CryptoPrice,
    /// Every coin, keyed by provider id; only set for multi-id requests
    pub prices: Option<BTreeMap<String, CryptoPrice>>,
    pub source: PriceSource,
    pub as_of: DateTime<Utc>,
}

impl CryptoPriceReport {
    /// Assemble a report, picking the primary entry in request order.
    ///
    /// Returns `None` when `entries` is empty.
    pub fn from_entries(
        requested: &[String],
        entries: Vec<CryptoPrice>,
        source: PriceSource,
        as_of: DateTime<Utc>,
    ) -> Option<Self> {
        let primary = requested
            .iter()
            .find_map(|id| entries.iter().find(|e| &e.id == id))
            .or_else(|| entries.first())?
            .clone();
        let prices = (requested.len() > 1 || entries.len() > 1).then(|| {
            entries
                .into_iter()
                .map(|e| (e.id.clone(), e))
                .collect::<BTreeMap<_, _>>()
        });
        Some(Self {
            primary,
            prices,
            source,
            as_of,
        })
    }
}

/// Coin profile from the details endpoint.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoinDetails {
    pub id: String,
    pub symbol: String,
    pub name: String,
    pub description: Option<String>,
    pub homepage: Option<String>,
    pub image: Option<String>,
    pub categories: Vec<String>,
    pub circulating_supply: Option<f64>,
    pub total_supply: Option<f64>,
    pub max_supply: Option<f64>,
    pub all_time_high: Option<f64>,
    pub all_time_low: Option<f64>,
    /// Absent when the provider has no market data for the coin
    pub market: Option<MarketSnapshot>,
}
