//! Search result models for symbol lookup.

use serde::{Deserialize, Serialize};

/// Result from a stock ticker search.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SymbolMatch {
    /// Symbol/ticker (e.g., "AAPL", "SHOP.TO")
    pub symbol: String,

    /// Display name (e.g., "Apple Inc")
    pub name: String,

    /// Security type (e.g., "Equity", "ETF")
    #[serde(rename = "type")]
    pub asset_type: String,

    /// Region or market (e.g., "United States"), when the provider reports one
    pub region: Option<String>,

    /// Trading currency, when the provider reports one
    pub currency: Option<String>,
}

impl SymbolMatch {
    pub fn new(
        symbol: impl Into<String>,
        name: impl Into<String>,
        asset_type: impl Into<String>,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            name: name.into(),
            asset_type: asset_type.into(),
            region: None,
            currency: None,
        }
    }

    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    pub fn with_currency(mut self, currency: impl Into<String>) -> Self {
        self.currency = Some(currency.into());
        self
    }
}

/// Result from a coin search.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoinMatch {
    /// Provider id (e.g., "bitcoin")
    pub id: String,
    pub symbol: String,
    pub name: String,
    pub market_cap_rank: Option<u32>,
    pub thumb: Option<String>,
}
