//! Portfolio domain models.

use chrono::{DateTime, Utc};
use marketboard_market_data::AssetClass;
use serde::{Deserialize, Serialize};

use crate::errors::{Result, ValidationError};

/// One holding as stored in the user's portfolio document.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioItem {
    pub symbol: String,
    #[serde(rename = "type")]
    pub asset_type: AssetClass,
    pub quantity: f64,
    pub buy_price: f64,
    pub created_at: DateTime<Utc>,
}

impl PortfolioItem {
    /// Document field the item is stored under: `{symbol}_{type}`.
    pub fn key(&self) -> String {
        item_key(&self.symbol, self.asset_type)
    }

    pub fn cost(&self) -> f64 {
        self.quantity * self.buy_price
    }
}

/// Input model for adding an item
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPortfolioItem {
    pub symbol: String,
    #[serde(rename = "type")]
    pub asset_type: AssetClass,
    pub quantity: f64,
    pub buy_price: f64,
}

impl NewPortfolioItem {
    /// Check the numbers and normalize the symbol: tickers upper-cased,
    /// coin ids lower-cased.
    pub fn validate(mut self) -> Result<Self> {
        let symbol = self.symbol.trim();
        if symbol.is_empty() {
            return Err(ValidationError::MissingField("symbol".to_string()).into());
        }
        self.symbol = normalize_symbol(symbol, self.asset_type);

        if !self.quantity.is_finite() || self.quantity <= 0.0 {
            return Err(ValidationError::InvalidInput(
                "quantity must be a positive number".to_string(),
            )
            .into());
        }
        if !self.buy_price.is_finite() || self.buy_price <= 0.0 {
            return Err(ValidationError::InvalidInput(
                "buyPrice must be a positive number".to_string(),
            )
            .into());
        }
        Ok(self)
    }
}

/// Item with its current price and derived figures.
///
/// The derived fields are `None` when no price could be obtained.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ItemValuation {
    #[serde(flatten)]
    pub item: PortfolioItem,
    pub current_price: Option<f64>,
    pub market_value: Option<f64>,
    pub profit_loss: Option<f64>,
    pub roi_percent: Option<f64>,
}

impl ItemValuation {
    pub fn new(item: PortfolioItem, current_price: Option<f64>) -> Self {
        let market_value = current_price.map(|p| p * item.quantity);
        let profit_loss = current_price.map(|p| (p - item.buy_price) * item.quantity);
        let roi_percent = current_price.map(|p| (p - item.buy_price) / item.buy_price * 100.0);
        Self {
            item,
            current_price,
            market_value,
            profit_loss,
            roi_percent,
        }
    }
}

/// Whole-portfolio valuation. Totals only cover priced items.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioValuation {
    pub items: Vec<ItemValuation>,
    pub total_cost: f64,
    pub total_value: f64,
    pub total_profit_loss: f64,
    /// Cost-weighted return in percent; `None` when nothing is priced
    pub roi_percent: Option<f64>,
}

impl PortfolioValuation {
    pub fn from_items(items: Vec<ItemValuation>) -> Self {
        let (total_cost, total_value) = items
            .iter()
            .filter_map(|v| v.market_value.map(|value| (v.item.cost(), value)))
            .fold((0.0, 0.0), |(cost, value), (c, v)| (cost + c, value + v));
        let total_profit_loss = total_value - total_cost;
        let roi_percent = (total_cost > 0.0).then(|| total_profit_loss / total_cost * 100.0);
        Self {
            items,
            total_cost,
            total_value,
            total_profit_loss,
            roi_percent,
        }
    }
}

pub(crate) fn normalize_symbol(symbol: &str, asset_type: AssetClass) -> String {
    match asset_type {
        AssetClass::Stock => symbol.trim().to_uppercase(),
        AssetClass::Crypto => symbol.trim().to_lowercase(),
    }
}

pub(crate) fn item_key(symbol: &str, asset_type: AssetClass) -> String {
    format!("{}_{}", symbol, asset_type.as_str())
}
