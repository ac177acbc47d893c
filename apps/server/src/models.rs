use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use marketboard_market_data::{CryptoPrice, CryptoPriceReport};
use serde::Serialize;

/// Response envelope shared by every JSON route.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
        }
    }
}

impl ApiResponse<()> {
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            success: true,
            data: None,
            message: Some(message.into()),
        }
    }
}

/// Per-coin fields of the legacy `/crypto/price` body.
#[derive(Debug, Serialize, PartialEq)]
pub struct LegacyCoinPrice {
    pub symbol: String,
    pub name: String,
    pub usd: Option<f64>,
    pub inr: Option<f64>,
    pub usd_24h_change: Option<f64>,
    pub usd_24h_vol: Option<f64>,
    pub usd_market_cap: Option<f64>,
}

impl From<&CryptoPrice> for LegacyCoinPrice {
    fn from(price: &CryptoPrice) -> Self {
        Self {
            symbol: price.symbol.clone(),
            name: price.name.clone(),
            usd: price.price_in("usd"),
            inr: price.price_in("inr"),
            usd_24h_change: price.change_percent_24h,
            usd_24h_vol: price.volume_24h,
            usd_market_cap: price.market_cap,
        }
    }
}

/// Legacy `/crypto/price` body: the first coin flattened at the top level,
/// plus a `prices` map when several coins were asked for.
#[derive(Debug, Serialize)]
pub struct LegacyCryptoPrice {
    #[serde(flatten)]
    pub primary: LegacyCoinPrice,
    #[serde(rename = "lastUpdated")]
    pub last_updated: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prices: Option<BTreeMap<String, LegacyCoinPrice>>,
}

impl From<&CryptoPriceReport> for LegacyCryptoPrice {
    fn from(report: &CryptoPriceReport) -> Self {
        Self {
            primary: LegacyCoinPrice::from(&report.primary),
            last_updated: report.as_of,
            prices: report.prices.as_ref().map(|prices| {
                prices
                    .iter()
                    .map(|(id, price)| (id.clone(), LegacyCoinPrice::from(price)))
                    .collect()
            }),
        }
    }
}
