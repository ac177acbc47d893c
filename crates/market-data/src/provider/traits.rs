//! Provider trait definitions.
//!
//! Each capability is its own trait so the resolver can hold an explicit,
//! ordered list of adapters per operation. All of them share [`Provider`] for
//! identification in logs and errors.

use async_trait::async_trait;

use crate::errors::MarketDataError;
use crate::models::{
    CoinDetails, CoinMatch, CryptoPrice, HistoryPoint, HistoryRange, MarketSnapshot, Quote,
    SymbolMatch,
};

/// Common identity of every adapter.
pub trait Provider: Send + Sync {
    /// Constant id such as "FINNHUB", "ALPHA_VANTAGE" or "COINGECKO".
    fn id(&self) -> &'static str;
}

/// Current quote for a stock ticker.
#[async_trait]
pub trait QuoteProvider: Provider {
    /// Fetch the latest quote for an upper-cased ticker.
    async fn quote(&self, symbol: &str) -> Result<Quote, MarketDataError>;
}

/// Daily closes for a stock ticker.
#[async_trait]
pub trait HistoryProvider: Provider {
    /// Fetch daily closes covering at least `range`, ascending by date.
    async fn history(
        &self,
        symbol: &str,
        range: HistoryRange,
    ) -> Result<Vec<HistoryPoint>, MarketDataError>;
}

/// Stock symbol lookup.
#[async_trait]
pub trait SymbolSearchProvider: Provider {
    /// Search tickers and names. Zero matches is `Ok(vec![])`.
    async fn search(&self, query: &str) -> Result<Vec<SymbolMatch>, MarketDataError>;
}

/// Rich crypto market data.
#[async_trait]
pub trait CryptoMarketProvider: Provider {
    /// Market snapshots ordered by market cap.
    ///
    /// An empty `ids` slice lists the whole market, capped at `limit`.
    async fn markets(
        &self,
        ids: &[String],
        vs_currency: &str,
        limit: usize,
    ) -> Result<Vec<MarketSnapshot>, MarketDataError>;

    /// Profile and market data for one coin.
    async fn details(&self, id: &str) -> Result<CoinDetails, MarketDataError>;

    /// Daily USD closes for the last `days` days, ascending.
    async fn history(&self, id: &str, days: u32) -> Result<Vec<HistoryPoint>, MarketDataError>;

    /// Coin lookup by name or symbol. Zero matches is `Ok(vec![])`.
    async fn search(&self, query: &str) -> Result<Vec<CoinMatch>, MarketDataError>;
}

/// Crypto prices in one or more currencies.
///
/// Implemented by both the market-data and the simple-price adapters so the
/// resolver can walk them as one ordered chain.
#[async_trait]
pub trait CryptoPriceProvider: Provider {
    /// Prices for `ids` in `currencies`; ids the provider does not know are
    /// left out of the result.
    async fn prices(
        &self,
        ids: &[String],
        currencies: &[String],
    ) -> Result<Vec<CryptoPrice>, MarketDataError>;

    /// Whether this adapter fills name, 24h change, volume and market cap.
    fn is_market_data(&self) -> bool {
        false
    }
}
