//! Market data provider abstractions and implementations.
//!
//! This module contains:
//! - One trait per upstream capability (quote, history, symbol search,
//!   crypto market data, crypto simple price)
//! - Concrete adapters for Finnhub, Alpha Vantage and CoinGecko
//!
//! # Contract
//!
//! Every adapter method issues exactly one upstream HTTP call, validates that
//! the response carries what the canonical model needs, and reports failures
//! as a classified [`MarketDataError`](crate::errors::MarketDataError).
//! Adapters never read or write the cache and never substitute mock data;
//! both belong to the resolver.

mod http;
mod traits;

pub mod alpha_vantage;
pub mod coingecko;
pub mod finnhub;

pub use http::DEFAULT_TIMEOUT;
pub use traits::{
    CryptoMarketProvider, CryptoPriceProvider, HistoryProvider, Provider, QuoteProvider,
    SymbolSearchProvider,
};
