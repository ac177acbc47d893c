//! Quote resolver.
//!
//! Cache-first resolution over explicit, ordered provider chains:
//!
//! ```text
//! CacheLookup --hit--> return clone
//!      |
//!     miss
//!      v
//! ProviderAttempt(0) --ok--> write-through, return
//!      |  \--NotFound/InvalidInput--> return error
//!      | retryable
//!      v
//! ProviderAttempt(1) ... --> Exhausted
//!                               |-- degraded mode on + fallback row --> return (not cached)
//!                               \-- otherwise --> last error
//! ```

mod cached;
mod chain;
#[cfg(test)]
mod tests;

pub use cached::CachedValue;

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tracing::{debug, warn};

use crate::cache::TtlCache;
use crate::errors::{
    validate_crypto_ids, validate_identifier, validate_symbol, MarketDataError, RetryClass,
};
use crate::fallback::{DegradedMode, FallbackTable};
use crate::identifiers::IdentifierMap;
use crate::models::{
    AssetClass, CoinDetails, CoinMatch, CryptoPrice, CryptoPriceReport, HistoryPoint,
    HistoryRange, HistoryReport, MarketSnapshot, PriceSource, Quote, SymbolMatch,
};
use crate::provider::{
    CryptoMarketProvider, CryptoPriceProvider, HistoryProvider, QuoteProvider,
    SymbolSearchProvider,
};
use cached::Cacheable;
use chain::walk;

/// TTL for prices and quotes.
pub const PRICE_TTL: Duration = Duration::from_secs(60);
/// TTL for market lists, histories, details and searches.
pub const MARKET_TTL: Duration = Duration::from_secs(300);

pub const DEFAULT_TOP_LIMIT: usize = 10;
pub const MAX_TOP_LIMIT: usize = 250;
pub const DEFAULT_HISTORY_DAYS: u32 = 30;
pub const MAX_HISTORY_DAYS: u32 = 365;

const DEFAULT_CURRENCY: &str = "usd";

/// Cache lifetimes per operation family.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ResolverTtls {
    pub price: Duration,
    pub market: Duration,
}

impl Default for ResolverTtls {
    fn default() -> Self {
        Self {
            price: PRICE_TTL,
            market: MARKET_TTL,
        }
    }
}

/// Resolves quotes, histories and searches for stocks and crypto.
///
/// Cheap to share behind an `Arc`; all state is either immutable or the
/// concurrent cache.
pub struct QuoteResolver {
    quote_providers: Vec<Arc<dyn QuoteProvider>>,
    history_providers: Vec<Arc<dyn HistoryProvider>>,
    search_providers: Vec<Arc<dyn SymbolSearchProvider>>,
    crypto_market_providers: Vec<Arc<dyn CryptoMarketProvider>>,
    crypto_price_providers: Vec<Arc<dyn CryptoPriceProvider>>,
    cache: Arc<TtlCache<CachedValue>>,
    identifiers: IdentifierMap,
    fallback: FallbackTable,
    degraded: DegradedMode,
    ttls: ResolverTtls,
}

impl QuoteResolver {
    pub fn builder() -> QuoteResolverBuilder {
        QuoteResolverBuilder::default()
    }

    pub fn cache(&self) -> &Arc<TtlCache<CachedValue>> {
        &self.cache
    }

    pub fn degraded_mode(&self) -> DegradedMode {
        self.degraded
    }

    // ------------------------------------------------------------------
    // Stocks
    // ------------------------------------------------------------------

    /// Search tickers. No matches is an empty list, never `NotFound`.
    pub async fn search_stocks(&self, query: &str) -> Result<Vec<SymbolMatch>, MarketDataError> {
        let query = require_query(query)?;
        let key = cached::search_key(query);
        if let Some(hit) = self.lookup(&key) {
            return Ok(hit);
        }

        let result = walk("search_stocks", query, &self.search_providers, |p| async move {
            p.search(query).await.map(Some)
        })
        .await;

        match result {
            Ok(matches) => {
                self.store(key, &matches, self.ttls.market);
                Ok(matches)
            }
            Err(MarketDataError::NotFound(_)) => Ok(Vec::new()),
            Err(e) => Err(e),
        }
    }

    pub async fn stock_quote(&self, symbol: &str) -> Result<Quote, MarketDataError> {
        let symbol = validate_symbol(symbol)?;
        let key = cached::quote_key(&symbol);
        if let Some(hit) = self.lookup(&key) {
            return Ok(hit);
        }

        let sym = symbol.as_str();
        let result = walk("stock_quote", sym, &self.quote_providers, |p| async move {
            p.quote(sym).await.map(Some)
        })
        .await;

        match result {
            Ok(quote) => {
                self.store(key, &quote, self.ttls.price);
                Ok(quote)
            }
            Err(e) => self.degrade(AssetClass::Stock, "stock_quote", sym, e, || {
                self.fallback.quote(AssetClass::Stock, sym)
            }),
        }
    }

    /// Daily closes for `range`, sliced to the earliest `range.points()`
    /// entries, with analytics over the slice.
    pub async fn stock_history(
        &self,
        symbol: &str,
        range: HistoryRange,
    ) -> Result<HistoryReport, MarketDataError> {
        let symbol = validate_symbol(symbol)?;
        let key = cached::history_key(&symbol, range.as_str());
        if let Some(hit) = self.lookup(&key) {
            return Ok(hit);
        }

        let sym = symbol.as_str();
        let result = walk("stock_history", sym, &self.history_providers, |p| async move {
            p.history(sym, range).await.map(Some)
        })
        .await;

        match result {
            Ok(series) => {
                let report = sliced_report(series, range);
                self.store(key, &report, self.ttls.market);
                Ok(report)
            }
            Err(e) => self.degrade(AssetClass::Stock, "stock_history", sym, e, || {
                self.fallback
                    .history(AssetClass::Stock, sym)
                    .map(|series| sliced_report(series, range))
            }),
        }
    }

    // ------------------------------------------------------------------
    // Crypto
    // ------------------------------------------------------------------

    /// Prices for a comma-separated list of ids (shorthands are mapped).
    ///
    /// `currencies` defaults to `usd` when empty. The market-data provider
    /// comes first in the chain, so its richer answer wins whenever it has
    /// one.
    pub async fn crypto_prices(
        &self,
        raw_ids: &str,
        currencies: &[String],
    ) -> Result<CryptoPriceReport, MarketDataError> {
        let mut ids: Vec<String> = Vec::new();
        for raw in validate_crypto_ids(raw_ids)? {
            let id = self.identifiers.resolve(&raw).to_lowercase();
            if !ids.contains(&id) {
                ids.push(id);
            }
        }
        let currencies = normalize_currencies(currencies)?;

        let key = cached::crypto_price_key(&ids, &currencies);
        if let Some(hit) = self.lookup(&key) {
            return Ok(hit);
        }

        let subject = ids.join(",");
        let (ids_ref, currencies_ref) = (&ids, &currencies);
        let result = walk(
            "crypto_prices",
            &subject,
            &self.crypto_price_providers,
            |p| async move {
                let entries = p.prices(ids_ref, currencies_ref).await?;
                let source = if p.is_market_data() {
                    PriceSource::Market
                } else {
                    PriceSource::SimplePrice
                };
                Ok::<_, MarketDataError>(CryptoPriceReport::from_entries(
                    ids_ref,
                    entries,
                    source,
                    Utc::now(),
                ))
            },
        )
        .await;

        match result {
            Ok(report) => {
                self.store(key, &report, self.ttls.price);
                Ok(report)
            }
            Err(e) => self.degrade(AssetClass::Crypto, "crypto_prices", &subject, e, || {
                let entries: Vec<CryptoPrice> = ids
                    .iter()
                    .filter_map(|id| self.fallback_price(id))
                    .collect();
                CryptoPriceReport::from_entries(&ids, entries, PriceSource::Fallback, Utc::now())
            }),
        }
    }

    /// Top coins by market cap. `limit` defaults to 10 and may not exceed 250.
    pub async fn top_cryptos(
        &self,
        limit: Option<usize>,
    ) -> Result<Vec<MarketSnapshot>, MarketDataError> {
        let limit = limit.unwrap_or(DEFAULT_TOP_LIMIT);
        if limit == 0 || limit > MAX_TOP_LIMIT {
            return Err(MarketDataError::InvalidInput(format!(
                "limit must be between 1 and {}",
                MAX_TOP_LIMIT
            )));
        }
        let key = cached::top_cryptos_key(limit);
        if let Some(hit) = self.lookup(&key) {
            return Ok(hit);
        }

        let mut rows = walk(
            "top_cryptos",
            "market",
            &self.crypto_market_providers,
            |p| async move {
                let rows = p.markets(&[], DEFAULT_CURRENCY, limit).await?;
                Ok::<_, MarketDataError>((!rows.is_empty()).then_some(rows))
            },
        )
        .await?;
        rows.truncate(limit);

        self.store(key, &rows, self.ttls.market);
        Ok(rows)
    }

    pub async fn crypto_details(&self, id: &str) -> Result<CoinDetails, MarketDataError> {
        let id = self.normalize_coin_id(id)?;
        let key = cached::crypto_details_key(&id);
        if let Some(hit) = self.lookup::<Box<CoinDetails>>(&key) {
            return Ok(*hit);
        }

        let coin = id.as_str();
        let details = walk(
            "crypto_details",
            coin,
            &self.crypto_market_providers,
            |p| async move { p.details(coin).await.map(|d| Some(Box::new(d))) },
        )
        .await?;

        self.store(key, &details, self.ttls.market);
        Ok(*details)
    }

    /// Daily USD closes for the last `days` days (default 30, at most 365).
    pub async fn crypto_history(
        &self,
        id: &str,
        days: Option<u32>,
    ) -> Result<HistoryReport, MarketDataError> {
        let id = self.normalize_coin_id(id)?;
        let days = days.unwrap_or(DEFAULT_HISTORY_DAYS);
        if days == 0 || days > MAX_HISTORY_DAYS {
            return Err(MarketDataError::InvalidInput(format!(
                "days must be between 1 and {}",
                MAX_HISTORY_DAYS
            )));
        }
        let key = cached::crypto_history_key(&id, days);
        if let Some(hit) = self.lookup(&key) {
            return Ok(hit);
        }

        let coin = id.as_str();
        let result = walk(
            "crypto_history",
            coin,
            &self.crypto_market_providers,
            |p| async move { p.history(coin, days).await.map(Some) },
        )
        .await;

        match result {
            Ok(mut series) => {
                series.sort_by_key(|p| p.date);
                let report = HistoryReport::from_series(series);
                self.store(key, &report, self.ttls.market);
                Ok(report)
            }
            Err(e) => self.degrade(AssetClass::Crypto, "crypto_history", coin, e, || {
                self.fallback
                    .history(AssetClass::Crypto, coin)
                    .map(HistoryReport::from_series)
            }),
        }
    }

    /// Search coins. No matches is an empty list, never `NotFound`.
    pub async fn search_cryptos(&self, query: &str) -> Result<Vec<CoinMatch>, MarketDataError> {
        let query = require_query(query)?;
        let key = cached::search_crypto_key(query);
        if let Some(hit) = self.lookup(&key) {
            return Ok(hit);
        }

        let result = walk(
            "search_cryptos",
            query,
            &self.crypto_market_providers,
            |p| async move { p.search(query).await.map(Some) },
        )
        .await;

        match result {
            Ok(coins) => {
                self.store(key, &coins, self.ttls.market);
                Ok(coins)
            }
            Err(MarketDataError::NotFound(_)) => Ok(Vec::new()),
            Err(e) => Err(e),
        }
    }

    // ------------------------------------------------------------------
    // Helpers
    // ------------------------------------------------------------------

    fn lookup<T: Cacheable>(&self, key: &str) -> Option<T> {
        let hit = self.cache.get(key).and_then(T::from_cached);
        if hit.is_some() {
            debug!(key, "cache hit");
        }
        hit
    }

    fn store<T: Cacheable>(&self, key: String, value: &T, ttl: Duration) {
        self.cache.set_with_ttl(key, value.clone().into_cached(), ttl);
    }

    /// Serve fallback data after a retryable failure, if degraded mode
    /// allows it for `class`. Fallback answers are never cached.
    fn degrade<T>(
        &self,
        class: AssetClass,
        operation: &str,
        subject: &str,
        error: MarketDataError,
        fallback: impl FnOnce() -> Option<T>,
    ) -> Result<T, MarketDataError> {
        if error.retry_class() == RetryClass::Never || !self.degraded.enabled_for(class) {
            return Err(error);
        }
        match fallback() {
            Some(value) => {
                warn!(
                    degraded = true,
                    asset_class = %class,
                    operation,
                    subject,
                    error = %error,
                    "all providers failed, serving fallback data"
                );
                Ok(value)
            }
            None => Err(error),
        }
    }

    fn fallback_price(&self, id: &str) -> Option<CryptoPrice> {
        let quote = self.fallback.quote(AssetClass::Crypto, id)?;
        Some(CryptoPrice {
            id: id.to_string(),
            symbol: quote.symbol,
            name: quote.name,
            prices: [(DEFAULT_CURRENCY.to_string(), quote.price)].into_iter().collect(),
            change_percent_24h: quote.change_percent,
            volume_24h: quote.volume,
            market_cap: None,
        })
    }

    fn normalize_coin_id(&self, raw: &str) -> Result<String, MarketDataError> {
        let id = validate_identifier(raw)?;
        Ok(self.identifiers.resolve(&id).to_lowercase())
    }
}

fn require_query(query: &str) -> Result<&str, MarketDataError> {
    let query = query.trim();
    if query.is_empty() {
        return Err(MarketDataError::InvalidInput(
            "query parameter is required".to_string(),
        ));
    }
    Ok(query)
}

fn normalize_currencies(currencies: &[String]) -> Result<Vec<String>, MarketDataError> {
    let mut out: Vec<String> = Vec::new();
    for currency in currencies {
        let code = validate_identifier(currency)?.to_lowercase();
        if !out.contains(&code) {
            out.push(code);
        }
    }
    if out.is_empty() {
        out.push(DEFAULT_CURRENCY.to_string());
    }
    Ok(out)
}

fn sliced_report(mut series: Vec<HistoryPoint>, range: HistoryRange) -> HistoryReport {
    series.sort_by_key(|p| p.date);
    series.truncate(range.slice(&series).len());
    HistoryReport::from_series(series)
}

// ============================================================================
// Builder
// ============================================================================

/// Assembles a [`QuoteResolver`]. Providers are tried in the order added.
#[derive(Default)]
pub struct QuoteResolverBuilder {
    quote_providers: Vec<Arc<dyn QuoteProvider>>,
    history_providers: Vec<Arc<dyn HistoryProvider>>,
    search_providers: Vec<Arc<dyn SymbolSearchProvider>>,
    crypto_market_providers: Vec<Arc<dyn CryptoMarketProvider>>,
    crypto_price_providers: Vec<Arc<dyn CryptoPriceProvider>>,
    cache: Option<Arc<TtlCache<CachedValue>>>,
    identifiers: Option<IdentifierMap>,
    fallback: Option<FallbackTable>,
    degraded: DegradedMode,
    ttls: ResolverTtls,
}

impl QuoteResolverBuilder {
    pub fn quote_provider(mut self, provider: Arc<dyn QuoteProvider>) -> Self {
        self.quote_providers.push(provider);
        self
    }

    pub fn history_provider(mut self, provider: Arc<dyn HistoryProvider>) -> Self {
        self.history_providers.push(provider);
        self
    }

    pub fn search_provider(mut self, provider: Arc<dyn SymbolSearchProvider>) -> Self {
        self.search_providers.push(provider);
        self
    }

    /// Add one adapter to the quote, history and search chains at once.
    pub fn stock_provider<P>(self, provider: Arc<P>) -> Self
    where
        P: QuoteProvider + HistoryProvider + SymbolSearchProvider + 'static,
    {
        self.quote_provider(provider.clone())
            .history_provider(provider.clone())
            .search_provider(provider)
    }

    pub fn crypto_market_provider(mut self, provider: Arc<dyn CryptoMarketProvider>) -> Self {
        self.crypto_market_providers.push(provider);
        self
    }

    pub fn crypto_price_provider(mut self, provider: Arc<dyn CryptoPriceProvider>) -> Self {
        self.crypto_price_providers.push(provider);
        self
    }

    pub fn cache(mut self, cache: Arc<TtlCache<CachedValue>>) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn identifiers(mut self, identifiers: IdentifierMap) -> Self {
        self.identifiers = Some(identifiers);
        self
    }

    pub fn fallback(mut self, fallback: FallbackTable) -> Self {
        self.fallback = Some(fallback);
        self
    }

    pub fn degraded(mut self, degraded: DegradedMode) -> Self {
        self.degraded = degraded;
        self
    }

    pub fn ttls(mut self, ttls: ResolverTtls) -> Self {
        self.ttls = ttls;
        self
    }

    pub fn build(self) -> QuoteResolver {
        QuoteResolver {
            quote_providers: self.quote_providers,
            history_providers: self.history_providers,
            search_providers: self.search_providers,
            crypto_market_providers: self.crypto_market_providers,
            crypto_price_providers: self.crypto_price_providers,
            cache: self
                .cache
                .unwrap_or_else(|| Arc::new(TtlCache::with_default_ttl(self.ttls.price))),
            identifiers: self.identifiers.unwrap_or_default(),
            fallback: self.fallback.unwrap_or_default(),
            degraded: self.degraded,
            ttls: self.ttls,
        }
    }
}
