//! Shorthand ticker to provider id translation.
//!
//! Best effort only: a lookup that misses returns the input unchanged.

use std::borrow::Cow;
use std::collections::HashMap;
use std::path::Path;

use tracing::debug;

use crate::errors::MarketDataError;

const BUILTIN: &[(&str, &str)] = &[
    ("btc", "bitcoin"),
    ("eth", "ethereum"),
    ("usdt", "tether"),
    ("bnb", "binancecoin"),
    ("sol", "solana"),
    ("xrp", "ripple"),
    ("usdc", "usd-coin"),
    ("ada", "cardano"),
    ("doge", "dogecoin"),
    ("trx", "tron"),
    ("dot", "polkadot"),
    ("matic", "matic-network"),
    ("ltc", "litecoin"),
    ("avax", "avalanche-2"),
    ("link", "chainlink"),
    ("xlm", "stellar"),
    ("bch", "bitcoin-cash"),
    ("shib", "shiba-inu"),
];

/// Read-only map from shorthand (e.g. `btc`) to provider id (e.g. `bitcoin`).
#[derive(Clone, Debug)]
pub struct IdentifierMap {
    entries: HashMap<String, String>,
}

impl IdentifierMap {
    /// Map with no entries: every lookup passes through.
    pub fn empty() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    pub fn builtin() -> Self {
        Self::from_pairs(BUILTIN.iter().map(|(k, v)| (k.to_string(), v.to_string())))
    }

    pub fn from_pairs(pairs: impl IntoIterator<Item = (String, String)>) -> Self {
        Self {
            entries: pairs
                .into_iter()
                .map(|(k, v)| (k.trim().to_lowercase(), v.trim().to_string()))
                .collect(),
        }
    }

    /// Parse a JSON object of `"shorthand": "provider-id"` pairs.
    pub fn from_json(json: &str) -> Result<Self, MarketDataError> {
        let pairs: HashMap<String, String> = serde_json::from_str(json).map_err(|e| {
            MarketDataError::InvalidInput(format!("Invalid identifier map: {}", e))
        })?;
        Ok(Self::from_pairs(pairs))
    }

    /// Built-in entries extended (and overridden) by the JSON file at `path`.
    pub fn load(path: &Path) -> Result<Self, MarketDataError> {
        let json = std::fs::read_to_string(path).map_err(|e| {
            MarketDataError::InvalidInput(format!(
                "Cannot read identifier map {}: {}",
                path.display(),
                e
            ))
        })?;
        let overrides = Self::from_json(&json)?;
        let mut map = Self::builtin();
        map.entries.extend(overrides.entries);
        debug!(
            "Loaded identifier map from {} ({} entries)",
            path.display(),
            map.len()
        );
        Ok(map)
    }

    /// Translate `input`, or hand it back unchanged when unknown.
    pub fn resolve<'a>(&self, input: &'a str) -> Cow<'a, str> {
        match self.entries.get(&input.trim().to_lowercase()) {
            Some(id) => Cow::Owned(id.clone()),
            None => Cow::Borrowed(input.trim()),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for IdentifierMap {
    fn default() -> Self {
        Self::builtin()
    }
}
