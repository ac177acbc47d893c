use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Canonical current-price snapshot for one asset.
///
/// Built fresh for each successful resolution and never mutated afterwards.
/// Optional fields are `None` only when the provider does not report them.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Quote {
    pub symbol: String,
    pub name: String,
    pub price: f64,
    pub open: Option<f64>,
    pub day_high: Option<f64>,
    pub day_low: Option<f64>,
    pub change_abs: Option<f64>,
    /// Plain percentage, e.g. `2.12` for +2.12%
    pub change_percent: Option<f64>,
    pub volume: Option<f64>,
    pub as_of: DateTime<Utc>,
}

impl Quote {
    /// Create a quote carrying only a price.
    pub fn new(symbol: impl Into<String>, price: f64, as_of: DateTime<Utc>) -> Self {
        let symbol = symbol.into();
        Self {
            name: symbol.clone(),
            symbol,
            price,
            open: None,
            day_high: None,
            day_low: None,
            change_abs: None,
            change_percent: None,
            volume: None,
            as_of,
        }
    }
}
