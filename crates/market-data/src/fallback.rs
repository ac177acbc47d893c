//! Degraded-mode fallback tables.
//!
//! Synthetic answers the resolver may serve once every real provider for an
//! asset class has failed with a retryable outcome, and only when degraded
//! mode is switched on for that class.

use std::collections::HashMap;
use std::path::Path;

use chrono::Utc;
use serde::Deserialize;

use crate::errors::MarketDataError;
use crate::models::{AssetClass, HistoryPoint, Quote};

/// Which asset classes may fall back to synthetic data. Both off by default.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct DegradedMode {
    pub stocks: bool,
    pub crypto: bool,
}

impl DegradedMode {
    pub fn enabled_for(&self, class: AssetClass) -> bool {
        match class {
            AssetClass::Stock => self.stocks,
            AssetClass::Crypto => self.crypto,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TableEntry {
    name: String,
    price: f64,
    open: Option<f64>,
    day_high: Option<f64>,
    day_low: Option<f64>,
    change_abs: Option<f64>,
    change_percent: Option<f64>,
    volume: Option<f64>,
    #[serde(default)]
    history: Vec<HistoryPoint>,
}

#[derive(Debug, Default, Deserialize)]
struct TableFile {
    #[serde(default)]
    stocks: HashMap<String, TableEntry>,
    #[serde(default)]
    crypto: HashMap<String, TableEntry>,
}

#[derive(Clone, Debug)]
struct FallbackEntry {
    quote: Quote,
    history: Vec<HistoryPoint>,
}

/// Mock quotes and histories keyed by ticker (stocks) or provider id (crypto).
#[derive(Clone, Debug, Default)]
pub struct FallbackTable {
    stocks: HashMap<String, FallbackEntry>,
    crypto: HashMap<String, FallbackEntry>,
}

impl FallbackTable {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Built-in stock table.
    pub fn builtin() -> Self {
        let rows = [
            ("AAPL", "Apple Inc", 153.25, 150.00, 155.00, 149.00, 3.25, 2.12, 1_000_000.0),
            ("MSFT", "Microsoft Corporation", 302.50, 300.00, 305.00, 299.00, 2.50, 0.83, 800_000.0),
            ("GOOGL", "Alphabet Inc", 2525.75, 2500.00, 2550.00, 2490.00, 25.75, 1.03, 500_000.0),
            ("AMZN", "Amazon.com Inc", 3225.50, 3200.00, 3250.00, 3190.00, 25.50, 0.79, 600_000.0),
            ("TSLA", "Tesla Inc", 810.25, 800.00, 820.00, 795.00, 10.25, 1.28, 1_200_000.0),
            ("NVDA", "NVIDIA Corporation", 505.75, 500.00, 510.00, 495.00, 5.75, 1.15, 900_000.0),
        ];
        let stocks = rows
            .into_iter()
            .map(|(symbol, name, price, open, high, low, change, pct, volume)| {
                let entry = TableEntry {
                    name: name.to_string(),
                    price,
                    open: Some(open),
                    day_high: Some(high),
                    day_low: Some(low),
                    change_abs: Some(change),
                    change_percent: Some(pct),
                    volume: Some(volume),
                    history: Vec::new(),
                };
                (symbol.to_string(), Self::entry(symbol, entry))
            })
            .collect();
        Self {
            stocks,
            crypto: HashMap::new(),
        }
    }

    /// Parse `{"stocks": {"AAPL": {...}}, "crypto": {"bitcoin": {...}}}`.
    pub fn from_json(json: &str) -> Result<Self, MarketDataError> {
        let file: TableFile = serde_json::from_str(json).map_err(|e| {
            MarketDataError::InvalidInput(format!("Invalid fallback table: {}", e))
        })?;
        let stocks = file
            .stocks
            .into_iter()
            .map(|(symbol, e)| {
                let key = symbol.to_uppercase();
                (key.clone(), Self::entry(&key, e))
            })
            .collect();
        let crypto = file
            .crypto
            .into_iter()
            .map(|(id, e)| {
                let key = id.to_lowercase();
                (key.clone(), Self::entry(&key, e))
            })
            .collect();
        Ok(Self { stocks, crypto })
    }

    pub fn load(path: &Path) -> Result<Self, MarketDataError> {
        let json = std::fs::read_to_string(path).map_err(|e| {
            MarketDataError::InvalidInput(format!(
                "Cannot read fallback table {}: {}",
                path.display(),
                e
            ))
        })?;
        Self::from_json(&json)
    }

    fn entry(key: &str, e: TableEntry) -> FallbackEntry {
        let mut history = e.history;
        history.sort_by_key(|p| p.date);
        FallbackEntry {
            quote: Quote {
                symbol: key.to_uppercase(),
                name: e.name,
                price: e.price,
                open: e.open,
                day_high: e.day_high,
                day_low: e.day_low,
                change_abs: e.change_abs,
                change_percent: e.change_percent,
                volume: e.volume,
                as_of: Utc::now(),
            },
            history,
        }
    }

    fn lookup(&self, class: AssetClass, key: &str) -> Option<&FallbackEntry> {
        match class {
            AssetClass::Stock => self.stocks.get(&key.to_uppercase()),
            AssetClass::Crypto => self.crypto.get(&key.to_lowercase()),
        }
    }

    /// Mock quote, re-stamped with the current time.
    pub fn quote(&self, class: AssetClass, key: &str) -> Option<Quote> {
        self.lookup(class, key).map(|e| Quote {
            as_of: Utc::now(),
            ..e.quote.clone()
        })
    }

    /// Mock history; `None` when the entry has no series.
    pub fn history(&self, class: AssetClass, key: &str) -> Option<Vec<HistoryPoint>> {
        self.lookup(class, key)
            .filter(|e| !e.history.is_empty())
            .map(|e| e.history.clone())
    }

    pub fn len(&self) -> usize {
        self.stocks.len() + self.crypto.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_table() {
        let table = FallbackTable::builtin();
        let quote = table.quote(AssetClass::Stock, "aapl").unwrap();
        assert_eq!(quote.symbol, "AAPL");
        assert_eq!(quote.name, "Apple Inc");
        assert_eq!(quote.price, 153.25);
        assert!(table.quote(AssetClass::Stock, "IBM").is_none());
        assert!(table.quote(AssetClass::Crypto, "bitcoin").is_none());
        assert!(table.history(AssetClass::Stock, "AAPL").is_none());
    }

    #[test]
    fn test_from_json() {
        let json = r#"{
            "crypto": {
                "Bitcoin": {
                    "name": "Bitcoin",
                    "price": 42000.0,
                    "history": [
                        {"date": "2024-01-02", "closePrice": 42100.0},
                        {"date": "2024-01-01", "closePrice": 41900.0}
                    ]
                }
            }
        }"#;
        let table = FallbackTable::from_json(json).unwrap();
        let quote = table.quote(AssetClass::Crypto, "bitcoin").unwrap();
        assert_eq!(quote.price, 42000.0);
        assert!(quote.change_percent.is_none());
        let history = table.history(AssetClass::Crypto, "BITCOIN").unwrap();
        assert_eq!(history[0].close_price, 41900.0);
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_degraded_mode_default_off() {
        let mode = DegradedMode::default();
        assert!(!mode.enabled_for(AssetClass::Stock));
        assert!(!mode.enabled_for(AssetClass::Crypto));
    }
}
