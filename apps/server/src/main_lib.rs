use std::sync::Arc;

use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

use crate::config::{Config, StockProviderKind};
use marketboard_core::{
    DocumentStore, InMemoryDocumentStore, LeaderboardService, PortfolioService, WatchlistService,
};
use marketboard_market_data::{
    provider::{alpha_vantage, coingecko, finnhub},
    AlphaVantageProvider, CoinGeckoClient, CoinGeckoMarketProvider, CoinGeckoPriceProvider,
    FallbackTable, FinnhubProvider, IdentifierMap, QuoteResolver, ResolverTtls,
};

pub struct AppState {
    pub resolver: Arc<QuoteResolver>,
    pub portfolio_service: Arc<PortfolioService>,
    pub watchlist_service: Arc<WatchlistService>,
    pub leaderboard_service: Arc<LeaderboardService>,
}

impl AppState {
    /// Wire the user-state services around a resolver and a document store.
    pub fn new(resolver: Arc<QuoteResolver>, store: Arc<dyn DocumentStore>) -> Arc<Self> {
        let portfolio_service = Arc::new(PortfolioService::new(store.clone(), resolver.clone()));
        let watchlist_service = Arc::new(WatchlistService::new(store.clone()));
        let leaderboard_service =
            Arc::new(LeaderboardService::new(store, portfolio_service.clone()));
        Arc::new(Self {
            resolver,
            portfolio_service,
            watchlist_service,
            leaderboard_service,
        })
    }
}

pub fn init_tracing() {
    let fmt_layer = fmt::layer().json().with_current_span(false);
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .init();
}

/// Build the provider chains described by `config`.
///
/// Stock providers without an API key are skipped. CoinGecko works without
/// a key, so both crypto chains are always populated.
pub fn build_resolver(config: &Config) -> anyhow::Result<QuoteResolver> {
    let timeout = config.upstream_timeout;
    let mut builder = QuoteResolver::builder();

    for kind in &config.stock_providers {
        match kind {
            StockProviderKind::Finnhub => match &config.finnhub_api_key {
                Some(key) => {
                    builder = builder.stock_provider(Arc::new(FinnhubProvider::with_base_url(
                        key.clone(),
                        finnhub::BASE_URL,
                        timeout,
                    )));
                    tracing::info!("Stock provider enabled: finnhub");
                }
                None => tracing::warn!("FINNHUB_API_KEY not set, skipping finnhub"),
            },
            StockProviderKind::AlphaVantage => match &config.alpha_vantage_api_key {
                Some(key) => {
                    builder = builder.stock_provider(Arc::new(
                        AlphaVantageProvider::with_base_url(
                            key.clone(),
                            alpha_vantage::BASE_URL,
                            timeout,
                        ),
                    ));
                    tracing::info!("Stock provider enabled: alpha_vantage");
                }
                None => tracing::warn!("ALPHA_VANTAGE_API_KEY not set, skipping alpha_vantage"),
            },
        }
    }

    let client = CoinGeckoClient::with_base_url(
        config.coingecko_api_key.clone(),
        coingecko::BASE_URL,
        timeout,
    );
    let market = Arc::new(CoinGeckoMarketProvider::new(client.clone()));
    let simple = Arc::new(CoinGeckoPriceProvider::new(client));
    builder = builder
        .crypto_market_provider(market.clone())
        .crypto_price_provider(market)
        .crypto_price_provider(simple);

    let identifiers = match &config.identifier_map_path {
        Some(path) => IdentifierMap::load(path)?,
        None => IdentifierMap::builtin(),
    };
    let fallback = match &config.fallback_table_path {
        Some(path) => FallbackTable::load(path)?,
        None => FallbackTable::builtin(),
    };
    if config.degraded.stocks || config.degraded.crypto {
        tracing::warn!(
            stocks = config.degraded.stocks,
            crypto = config.degraded.crypto,
            "Degraded mode enabled, synthetic quotes may be served ({} fallback entries)",
            fallback.len()
        );
    }

    Ok(builder
        .identifiers(identifiers)
        .fallback(fallback)
        .degraded(config.degraded)
        .ttls(ResolverTtls {
            price: config.price_ttl,
            market: config.market_ttl,
        })
        .build())
}

pub async fn build_state(config: &Config) -> anyhow::Result<Arc<AppState>> {
    let resolver = Arc::new(build_resolver(config)?);
    let store: Arc<dyn DocumentStore> = Arc::new(InMemoryDocumentStore::new());
    tracing::info!("Using in-memory document store");
    Ok(AppState::new(resolver, store))
}
