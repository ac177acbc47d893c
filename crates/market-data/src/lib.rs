//! Marketboard Market Data Crate
//!
//! Multi-provider quote resolution and caching for stocks and
//! cryptocurrencies.
//!
//! # Overview
//!
//! - Provider adapters for Finnhub, Alpha Vantage and CoinGecko, one narrow
//!   parsing type per upstream response
//! - A uniform error taxonomy with retry classification
//! - A process-wide TTL cache
//! - A resolver that walks explicit, ordered provider chains per asset class
//! - Moving averages and ROI over price series
//!
//! # Architecture
//!
//! ```text
//! +------------------+
//! |   HTTP handler   |
//! +------------------+
//!          |
//!          v
//! +------------------+     +------------------+
//! |  QuoteResolver   | <-> |    TtlCache      |
//! +------------------+     +------------------+
//!          |
//!          v  (ordered chain per capability)
//! +------------------+
//! | Provider adapter |  (Finnhub, Alpha Vantage, CoinGecko)
//! +------------------+
//!          |
//!          v
//! +------------------+
//! | Error classifier |  -> InvalidInput | NotFound | RateLimited
//! +------------------+     | UpstreamUnavailable | NetworkError
//! ```
//!
//! # Core Types
//!
//! - [`Quote`] - Canonical current-price snapshot
//! - [`MarketSnapshot`] - Richer crypto market row
//! - [`HistoryReport`] - Sliced price series with [`Analytics`]
//! - [`MarketDataError`] - Outcome taxonomy shared by every adapter
//! - [`QuoteResolver`] - Cache-first resolution over provider chains

pub mod analytics;
pub mod cache;
pub mod errors;
pub mod fallback;
pub mod identifiers;
pub mod models;
pub mod provider;
pub mod resolver;

pub use analytics::Analytics;
pub use cache::TtlCache;
pub use errors::{ErrorKind, MarketDataError, RetryClass};
pub use fallback::{DegradedMode, FallbackTable};
pub use identifiers::IdentifierMap;
pub use models::{
    AssetClass, CoinDetails, CoinMatch, CryptoPrice, CryptoPriceReport, HistoryPoint,
    HistoryRange, HistoryReport, MarketSnapshot, PriceSource, ProviderId, Quote, SymbolMatch,
};
pub use resolver::{CachedValue, QuoteResolver, QuoteResolverBuilder, ResolverTtls};

pub use provider::alpha_vantage::AlphaVantageProvider;
pub use provider::coingecko::{CoinGeckoClient, CoinGeckoMarketProvider, CoinGeckoPriceProvider};
pub use provider::finnhub::FinnhubProvider;
