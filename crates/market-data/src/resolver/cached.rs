//! Values the resolver keeps in its cache.

use crate::models::{
    CoinDetails, CoinMatch, CryptoPriceReport, HistoryReport, MarketSnapshot, Quote, SymbolMatch,
};

/// One variant per resolver operation result.
#[derive(Clone, Debug, PartialEq)]
pub enum CachedValue {
    Quote(Quote),
    History(HistoryReport),
    SymbolMatches(Vec<SymbolMatch>),
    CryptoPrices(CryptoPriceReport),
    Markets(Vec<MarketSnapshot>),
    CoinDetails(Box<CoinDetails>),
    CoinMatches(Vec<CoinMatch>),
}

/// Conversion between an operation result and its cache variant.
pub(crate) trait Cacheable: Sized + Clone {
    fn into_cached(self) -> CachedValue;
    fn from_cached(value: CachedValue) -> Option<Self>;
}

macro_rules! cacheable {
    ($ty:ty, $variant:ident) => {
        impl Cacheable for $ty {
            fn into_cached(self) -> CachedValue {
                CachedValue::$variant(self)
            }

            fn from_cached(value: CachedValue) -> Option<Self> {
                match value {
                    CachedValue::$variant(v) => Some(v),
                    _ => None,
                }
            }
        }
    };
}

cacheable!(Quote, Quote);
cacheable!(HistoryReport, History);
cacheable!(Vec<SymbolMatch>, SymbolMatches);
cacheable!(CryptoPriceReport, CryptoPrices);
cacheable!(Vec<MarketSnapshot>, Markets);
cacheable!(Box<CoinDetails>, CoinDetails);
cacheable!(Vec<CoinMatch>, CoinMatches);

// Cache keys. Parameters are normalized by the caller before they get here.

pub(crate) fn search_key(query: &str) -> String {
    format!("search_{}", query)
}

pub(crate) fn quote_key(symbol: &str) -> String {
    format!("quote_{}", symbol)
}

pub(crate) fn history_key(symbol: &str, range: &str) -> String {
    format!("history_{}_{}", symbol, range)
}

pub(crate) fn crypto_price_key(ids: &[String], currencies: &[String]) -> String {
    format!("crypto_price_{}_{}", ids.join(","), currencies.join(","))
}

pub(crate) fn top_cryptos_key(limit: usize) -> String {
    format!("top_cryptos_{}", limit)
}

pub(crate) fn crypto_details_key(id: &str) -> String {
    format!("crypto_details_{}", id)
}

pub(crate) fn crypto_history_key(id: &str, days: u32) -> String {
    format!("crypto_history_{}_{}", id, days)
}

pub(crate) fn search_crypto_key(query: &str) -> String {
    format!("search_crypto_{}", query)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_keys() {
        let ids = vec!["bitcoin".to_string(), "ethereum".to_string()];
        let currencies = vec!["usd".to_string(), "inr".to_string()];
        assert_eq!(
            crypto_price_key(&ids, &currencies),
            "crypto_price_bitcoin,ethereum_usd,inr"
        );
        assert_eq!(quote_key("AAPL"), "quote_AAPL");
        assert_eq!(history_key("AAPL", "7d"), "history_AAPL_7d");
        assert_eq!(crypto_history_key("bitcoin", 30), "crypto_history_bitcoin_30");
    }

    #[test]
    fn test_variant_mismatch_is_none() {
        let quote = Quote::new("AAPL", 1.0, Utc::now());
        let cached = quote.clone().into_cached();
        assert_eq!(Quote::from_cached(cached.clone()), Some(quote));
        assert!(<Vec<SymbolMatch>>::from_cached(cached).is_none());
    }
}
