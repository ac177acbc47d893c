use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{NaiveDate, TimeZone, Utc};

use super::*;
use crate::cache::{ManualClock, TtlCache};
use crate::errors::ErrorKind;
use crate::models::{CoinDetails, CoinMatch, CryptoPrice, HistoryPoint, MarketSnapshot};
use crate::provider::Provider;

// ============================================================================
// Mock providers
// ============================================================================

struct MockStock {
    id: &'static str,
    quote: Mutex<Result<Quote, MarketDataError>>,
    history: Result<Vec<HistoryPoint>, MarketDataError>,
    search: Result<Vec<SymbolMatch>, MarketDataError>,
    calls: AtomicUsize,
}

impl MockStock {
    fn new(id: &'static str) -> Self {
        Self {
            id,
            quote: Mutex::new(Ok(quote("AAPL", 150.0))),
            history: Ok(series(400)),
            search: Ok(vec![SymbolMatch::new("AAPL", "Apple Inc", "Equity")]),
            calls: AtomicUsize::new(0),
        }
    }

    fn failing(id: &'static str, error: MarketDataError) -> Self {
        Self {
            quote: Mutex::new(Err(error.clone())),
            history: Err(error.clone()),
            search: Err(error),
            ..Self::new(id)
        }
    }

    fn set_quote(&self, outcome: Result<Quote, MarketDataError>) {
        *self.quote.lock().unwrap() = outcome;
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Provider for MockStock {
    fn id(&self) -> &'static str {
        self.id
    }
}

#[async_trait]
impl QuoteProvider for MockStock {
    async fn quote(&self, _symbol: &str) -> Result<Quote, MarketDataError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.quote.lock().unwrap().clone()
    }
}

#[async_trait]
impl HistoryProvider for MockStock {
    async fn history(
        &self,
        _symbol: &str,
        _range: HistoryRange,
    ) -> Result<Vec<HistoryPoint>, MarketDataError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.history.clone()
    }
}

#[async_trait]
impl SymbolSearchProvider for MockStock {
    async fn search(&self, _query: &str) -> Result<Vec<SymbolMatch>, MarketDataError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.search.clone()
    }
}

struct MockCoins {
    market_data: bool,
    prices: Result<Vec<CryptoPrice>, MarketDataError>,
    currencies: Mutex<Vec<String>>,
    calls: AtomicUsize,
}

impl MockCoins {
    fn new(market_data: bool, prices: Result<Vec<CryptoPrice>, MarketDataError>) -> Self {
        Self {
            market_data,
            prices,
            currencies: Mutex::new(Vec::new()),
            calls: AtomicUsize::new(0),
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn last_currencies(&self) -> Vec<String> {
        self.currencies.lock().unwrap().clone()
    }
}

impl Provider for MockCoins {
    fn id(&self) -> &'static str {
        if self.market_data {
            "MARKET"
        } else {
            "SIMPLE"
        }
    }
}

#[async_trait]
impl CryptoPriceProvider for MockCoins {
    async fn prices(
        &self,
        ids: &[String],
        currencies: &[String],
    ) -> Result<Vec<CryptoPrice>, MarketDataError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.currencies.lock().unwrap() = currencies.to_vec();
        self.prices
            .clone()
            .map(|all| all.into_iter().filter(|p| ids.contains(&p.id)).collect())
    }

    fn is_market_data(&self) -> bool {
        self.market_data
    }
}

#[async_trait]
impl CryptoMarketProvider for MockCoins {
    async fn markets(
        &self,
        _ids: &[String],
        _vs_currency: &str,
        limit: usize,
    ) -> Result<Vec<MarketSnapshot>, MarketDataError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(["bitcoin", "ethereum", "tether"]
            .iter()
            .take(limit)
            .enumerate()
            .map(|(i, id)| snapshot(id, 1000.0 / (i + 1) as f64, i as u32 + 1))
            .collect())
    }

    async fn details(&self, id: &str) -> Result<CoinDetails, MarketDataError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if id != "bitcoin" {
            return Err(MarketDataError::NotFound(id.to_string()));
        }
        Ok(CoinDetails {
            id: id.to_string(),
            symbol: "btc".to_string(),
            name: "Bitcoin".to_string(),
            description: None,
            homepage: None,
            image: None,
            categories: vec![],
            circulating_supply: None,
            total_supply: None,
            max_supply: None,
            all_time_high: None,
            all_time_low: None,
            market: None,
        })
    }

    async fn history(&self, _id: &str, days: u32) -> Result<Vec<HistoryPoint>, MarketDataError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let mut points = series(days as usize);
        points.reverse();
        Ok(points)
    }

    async fn search(&self, _query: &str) -> Result<Vec<CoinMatch>, MarketDataError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(MarketDataError::NotFound("no coins".to_string()))
    }
}

// ============================================================================
// Fixtures
// ============================================================================

fn quote(symbol: &str, price: f64) -> Quote {
    Quote::new(symbol, price, Utc.timestamp_opt(1_704_067_200, 0).unwrap())
}

fn series(len: usize) -> Vec<HistoryPoint> {
    let start = NaiveDate::from_ymd_opt(2023, 1, 1).unwrap();
    (0..len)
        .map(|i| HistoryPoint::new(start + chrono::Duration::days(i as i64), 100.0 + i as f64))
        .collect()
}

fn snapshot(id: &str, price: f64, rank: u32) -> MarketSnapshot {
    MarketSnapshot {
        id: id.to_string(),
        symbol: id[..3].to_string(),
        name: id.to_string(),
        price,
        change_24h: None,
        change_percent_24h: Some(1.5),
        high_24h: None,
        low_24h: None,
        volume_24h: Some(10.0),
        market_cap: Some(price * 1000.0),
        rank: Some(rank),
        image: None,
        last_updated: Utc.timestamp_opt(1_704_067_200, 0).unwrap(),
    }
}

fn price(id: &str, usd: f64, market: bool) -> CryptoPrice {
    CryptoPrice {
        id: id.to_string(),
        symbol: id.to_string(),
        name: id.to_string(),
        prices: [("usd".to_string(), usd)].into_iter().collect(),
        change_percent_24h: market.then_some(2.0),
        volume_24h: market.then_some(5.0),
        market_cap: None,
    }
}

fn rate_limited() -> MarketDataError {
    MarketDataError::RateLimited {
        provider: "MOCK".to_string(),
        message: None,
    }
}

fn clocked_cache() -> (Arc<ManualClock>, Arc<TtlCache<CachedValue>>) {
    let clock = Arc::new(ManualClock::new());
    let cache = Arc::new(TtlCache::with_clock(PRICE_TTL, clock.clone()));
    (clock, cache)
}

fn usd() -> Vec<String> {
    vec!["usd".to_string()]
}

// ============================================================================
// Stock quotes
// ============================================================================

#[tokio::test]
async fn test_cache_hit_skips_providers() {
    let provider = Arc::new(MockStock::new("A"));
    let resolver = QuoteResolver::builder()
        .stock_provider(provider.clone())
        .build();

    let first = resolver.stock_quote("aapl").await.unwrap();
    let second = resolver.stock_quote("AAPL").await.unwrap();

    assert_eq!(provider.calls(), 1);
    assert_eq!(first, second);
    assert_eq!(
        serde_json::to_string(&first).unwrap(),
        serde_json::to_string(&second).unwrap()
    );
}

#[tokio::test]
async fn test_expired_entry_calls_each_provider_once() {
    let (clock, cache) = clocked_cache();
    let a = Arc::new(MockStock::failing("A", rate_limited()));
    let b = Arc::new(MockStock::new("B"));
    let resolver = QuoteResolver::builder()
        .stock_provider(a.clone())
        .stock_provider(b.clone())
        .cache(cache)
        .build();

    resolver.stock_quote("AAPL").await.unwrap();
    assert_eq!((a.calls(), b.calls()), (1, 1));

    clock.advance(Duration::from_secs(30));
    resolver.stock_quote("AAPL").await.unwrap();
    assert_eq!((a.calls(), b.calls()), (1, 1));

    clock.advance(Duration::from_secs(31));
    resolver.stock_quote("AAPL").await.unwrap();
    assert_eq!((a.calls(), b.calls()), (2, 2));
}

#[tokio::test]
async fn test_rate_limited_is_not_cached() {
    let provider = Arc::new(MockStock::failing("A", rate_limited()));
    let resolver = QuoteResolver::builder()
        .stock_provider(provider.clone())
        .build();

    let err = resolver.stock_quote("AAPL").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::RateLimited);
    assert!(resolver.cache().is_empty());

    provider.set_quote(Ok(quote("AAPL", 151.0)));
    let quote = resolver.stock_quote("AAPL").await.unwrap();
    assert_eq!(quote.price, 151.0);
    assert_eq!(provider.calls(), 2);
}

#[tokio::test]
async fn test_not_found_skips_remaining_providers() {
    let a = Arc::new(MockStock::failing(
        "A",
        MarketDataError::NotFound("ZZZZ".to_string()),
    ));
    let b = Arc::new(MockStock::new("B"));
    let resolver = QuoteResolver::builder()
        .stock_provider(a.clone())
        .stock_provider(b.clone())
        .build();

    let err = resolver.stock_quote("ZZZZ").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert_eq!(b.calls(), 0);
}

#[tokio::test]
async fn test_upstream_bad_request_moves_to_next_provider() {
    let rejected = crate::errors::classify_status(
        "A",
        reqwest::StatusCode::BAD_REQUEST,
        Some("unsupported parameter".to_string()),
    );
    let a = Arc::new(MockStock::failing("A", rejected));
    let b = Arc::new(MockStock::new("B"));
    let resolver = QuoteResolver::builder()
        .stock_provider(a.clone())
        .stock_provider(b.clone())
        .build();

    let quote = resolver.stock_quote("AAPL").await.unwrap();
    assert_eq!(quote.price, 150.0);
    assert_eq!((a.calls(), b.calls()), (1, 1));
}

#[tokio::test]
async fn test_upstream_bad_request_alone_is_upstream_unavailable() {
    let rejected =
        crate::errors::classify_status("A", reqwest::StatusCode::UNPROCESSABLE_ENTITY, None);
    let resolver = QuoteResolver::builder()
        .stock_provider(Arc::new(MockStock::failing("A", rejected)))
        .build();

    let err = resolver.stock_quote("AAPL").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UpstreamUnavailable);
}

#[tokio::test]
async fn test_invalid_symbol_never_reaches_providers() {
    let provider = Arc::new(MockStock::new("A"));
    let resolver = QuoteResolver::builder()
        .stock_provider(provider.clone())
        .build();

    let err = resolver.stock_quote("AA PL;").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidInput);
    assert_eq!(provider.calls(), 0);
}

#[tokio::test]
async fn test_degraded_mode_serves_fallback_uncached() {
    let provider = Arc::new(MockStock::failing(
        "A",
        MarketDataError::UpstreamUnavailable {
            provider: "A".to_string(),
            message: None,
        },
    ));
    let resolver = QuoteResolver::builder()
        .stock_provider(provider.clone())
        .fallback(FallbackTable::builtin())
        .degraded(DegradedMode {
            stocks: true,
            crypto: false,
        })
        .build();

    let quote = resolver.stock_quote("TSLA").await.unwrap();
    assert_eq!(quote.name, "Tesla Inc");
    assert!(resolver.cache().is_empty());

    // Unknown to the table: the provider error comes through.
    let err = resolver.stock_quote("IBM").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UpstreamUnavailable);
}

#[tokio::test]
async fn test_degraded_mode_off_by_default() {
    let provider = Arc::new(MockStock::failing("A", rate_limited()));
    let resolver = QuoteResolver::builder()
        .stock_provider(provider)
        .fallback(FallbackTable::builtin())
        .build();

    let err = resolver.stock_quote("TSLA").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::RateLimited);
}

#[tokio::test]
async fn test_degraded_mode_does_not_mask_not_found() {
    let provider = Arc::new(MockStock::failing(
        "A",
        MarketDataError::NotFound("AAPL".to_string()),
    ));
    let resolver = QuoteResolver::builder()
        .stock_provider(provider)
        .fallback(FallbackTable::builtin())
        .degraded(DegradedMode {
            stocks: true,
            crypto: true,
        })
        .build();

    let err = resolver.stock_quote("AAPL").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

// ============================================================================
// Stock history and search
// ============================================================================

#[tokio::test]
async fn test_history_slices_earliest_points() {
    let provider = Arc::new(MockStock::new("A"));
    let resolver = QuoteResolver::builder()
        .stock_provider(provider.clone())
        .build();

    let report = resolver
        .stock_history("AAPL", HistoryRange::ThirtyDays)
        .await
        .unwrap();
    assert_eq!(report.history.len(), 30);
    assert_eq!(report.history[0].close_price, 100.0);
    assert_eq!(report.history[29].close_price, 129.0);
    assert!((report.analytics.roi.unwrap() - 29.0).abs() < 1e-9);
    assert!((report.analytics.sma20.unwrap() - 109.5).abs() < 1e-9);

    let one_day = resolver
        .stock_history("AAPL", HistoryRange::OneDay)
        .await
        .unwrap();
    assert_eq!(one_day.history.len(), 2);
    assert_eq!(provider.calls(), 2);
}

#[tokio::test]
async fn test_short_history_returned_whole() {
    let provider = Arc::new(MockStock {
        history: Ok(series(10)),
        ..MockStock::new("A")
    });
    let resolver = QuoteResolver::builder().stock_provider(provider).build();

    let report = resolver
        .stock_history("MSFT", HistoryRange::ThirtyDays)
        .await
        .unwrap();
    assert_eq!(report.history.len(), 10);
    assert!(report.analytics.sma20.is_some());
}

#[tokio::test]
async fn test_search_not_found_is_empty_list() {
    let provider = Arc::new(MockStock::failing(
        "A",
        MarketDataError::NotFound("no matches".to_string()),
    ));
    let resolver = QuoteResolver::builder().stock_provider(provider).build();

    let results = resolver.search_stocks("qwertyuiop").await.unwrap();
    assert!(results.is_empty());
    assert_eq!(
        resolver.search_stocks("  ").await.unwrap_err().kind(),
        ErrorKind::InvalidInput
    );
}

// ============================================================================
// Crypto
// ============================================================================

#[tokio::test]
async fn test_multi_id_prices_map() {
    let market = Arc::new(MockCoins::new(
        true,
        Ok(vec![price("bitcoin", 42000.0, true), price("ethereum", 2200.0, true)]),
    ));
    let simple = Arc::new(MockCoins::new(false, Ok(vec![])));
    let resolver = QuoteResolver::builder()
        .crypto_price_provider(market.clone())
        .crypto_price_provider(simple.clone())
        .build();

    let report = resolver
        .crypto_prices("bitcoin, ethereum", &usd())
        .await
        .unwrap();
    let prices = report.prices.unwrap();
    assert_eq!(prices.len(), 2);
    assert_eq!(prices["bitcoin"].price_in("usd"), Some(42000.0));
    assert_eq!(prices["ethereum"].change_percent_24h, Some(2.0));
    assert_eq!(report.primary.id, "bitcoin");
    assert_eq!(report.source, PriceSource::Market);
    assert_eq!(simple.calls(), 0);
}

#[tokio::test]
async fn test_prices_fall_back_to_simple_price() {
    let market = Arc::new(MockCoins::new(true, Err(rate_limited())));
    let simple = Arc::new(MockCoins::new(false, Ok(vec![price("bitcoin", 42000.0, false)])));
    let resolver = QuoteResolver::builder()
        .crypto_price_provider(market.clone())
        .crypto_price_provider(simple.clone())
        .build();

    let report = resolver.crypto_prices("btc", &usd()).await.unwrap();
    assert_eq!(report.primary.id, "bitcoin");
    assert_eq!(report.source, PriceSource::SimplePrice);
    assert!(report.prices.is_none());
    assert!(report.primary.change_percent_24h.is_none());
    assert_eq!((market.calls(), simple.calls()), (1, 1));
}

#[tokio::test]
async fn test_prices_pass_requested_currencies_in_order() {
    let simple = Arc::new(MockCoins::new(false, Ok(vec![price("bitcoin", 42000.0, false)])));
    let resolver = QuoteResolver::builder()
        .crypto_price_provider(simple.clone())
        .build();

    let currencies = vec!["INR".to_string(), "usd".to_string(), "inr".to_string()];
    resolver.crypto_prices("bitcoin", &currencies).await.unwrap();
    assert_eq!(simple.last_currencies(), vec!["inr", "usd"]);

    // Currency list is part of the cache key.
    resolver.crypto_prices("bitcoin", &usd()).await.unwrap();
    assert_eq!(simple.calls(), 2);
    resolver.crypto_prices("bitcoin", &currencies).await.unwrap();
    assert_eq!(simple.calls(), 2);
}

#[tokio::test]
async fn test_prices_unknown_everywhere_is_not_found() {
    let market = Arc::new(MockCoins::new(true, Ok(vec![])));
    let simple = Arc::new(MockCoins::new(false, Ok(vec![])));
    let resolver = QuoteResolver::builder()
        .crypto_price_provider(market.clone())
        .crypto_price_provider(simple.clone())
        .build();

    let err = resolver.crypto_prices("notacoin", &usd()).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert_eq!((market.calls(), simple.calls()), (1, 1));
}

#[tokio::test]
async fn test_invalid_crypto_ids() {
    let resolver = QuoteResolver::builder().build();
    let err = resolver
        .crypto_prices("bitcoin;drop", &usd())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidInput);
}

#[tokio::test]
async fn test_top_cryptos_limit() {
    let coins = Arc::new(MockCoins::new(true, Ok(vec![])));
    let resolver = QuoteResolver::builder()
        .crypto_market_provider(coins.clone())
        .build();

    let top = resolver.top_cryptos(Some(2)).await.unwrap();
    assert_eq!(top.len(), 2);
    assert_eq!(top[0].rank, Some(1));
    resolver.top_cryptos(Some(2)).await.unwrap();
    assert_eq!(coins.calls(), 1);

    let err = resolver.top_cryptos(Some(0)).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidInput);
}

#[tokio::test]
async fn test_crypto_details_maps_shorthand() {
    let coins = Arc::new(MockCoins::new(true, Ok(vec![])));
    let resolver = QuoteResolver::builder()
        .crypto_market_provider(coins.clone())
        .build();

    let details = resolver.crypto_details("BTC").await.unwrap();
    assert_eq!(details.name, "Bitcoin");
    resolver.crypto_details("bitcoin").await.unwrap();
    assert_eq!(coins.calls(), 1);

    let err = resolver.crypto_details("dogecoin").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn test_crypto_history_sorted_with_analytics() {
    let coins = Arc::new(MockCoins::new(true, Ok(vec![])));
    let resolver = QuoteResolver::builder()
        .crypto_market_provider(coins)
        .build();

    let report = resolver.crypto_history("bitcoin", Some(7)).await.unwrap();
    assert_eq!(report.history.len(), 7);
    assert!(report.history[0].date < report.history[6].date);
    assert!((report.analytics.roi.unwrap() - 6.0).abs() < 1e-9);

    let err = resolver.crypto_history("bitcoin", Some(0)).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidInput);
}

#[tokio::test]
async fn test_crypto_search_not_found_is_empty() {
    let coins = Arc::new(MockCoins::new(true, Ok(vec![])));
    let resolver = QuoteResolver::builder()
        .crypto_market_provider(coins)
        .build();

    assert!(resolver.search_cryptos("zzz").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_crypto_degraded_prices() {
    let table = FallbackTable::from_json(
        r#"{"crypto": {"bitcoin": {"name": "Bitcoin", "price": 40000.0}}}"#,
    )
    .unwrap();
    let market = Arc::new(MockCoins::new(true, Err(rate_limited())));
    let resolver = QuoteResolver::builder()
        .crypto_price_provider(market)
        .fallback(table)
        .degraded(DegradedMode {
            stocks: false,
            crypto: true,
        })
        .build();

    let report = resolver.crypto_prices("btc", &usd()).await.unwrap();
    assert_eq!(report.source, PriceSource::Fallback);
    assert_eq!(report.primary.price_in("usd"), Some(40000.0));
    assert!(resolver.cache().is_empty());
}
