use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::errors::{Result, ValidationError};

lazy_static! {
    /// Stock tickers (`BRK.B`, `^GSPC`) and coin ids (`usd-coin`).
    static ref WATCH_SYMBOL_REGEX: Regex =
        Regex::new(r"^[A-Za-z0-9^][A-Za-z0-9.\-_=]{0,31}$").expect("Invalid regex pattern");
}

/// Watchlist document: `{ "symbols": [...] }`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Watchlist {
    #[serde(default)]
    pub symbols: Vec<String>,
}

impl Watchlist {
    /// Append `symbol` unless it is already present.
    pub fn insert(&mut self, symbol: String) -> bool {
        if self.symbols.contains(&symbol) {
            return false;
        }
        self.symbols.push(symbol);
        true
    }

    pub fn remove(&mut self, symbol: &str) -> bool {
        let before = self.symbols.len();
        self.symbols.retain(|s| s != symbol);
        self.symbols.len() != before
    }
}

/// Trimmed symbol, case preserved. Stock tickers and coin ids share one list.
pub fn validate_watch_symbol(symbol: &str) -> Result<String> {
    let symbol = symbol.trim();
    if symbol.is_empty() {
        return Err(ValidationError::MissingField("symbol".to_string()).into());
    }
    if !WATCH_SYMBOL_REGEX.is_match(symbol) {
        return Err(
            ValidationError::InvalidInput(format!("Invalid watchlist symbol: {}", symbol)).into(),
        );
    }
    Ok(symbol.to_string())
}
