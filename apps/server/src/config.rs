use std::{net::SocketAddr, path::PathBuf, time::Duration};

use anyhow::Context;
use marketboard_market_data::DegradedMode;

/// Stock providers the server knows how to build.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StockProviderKind {
    Finnhub,
    AlphaVantage,
}

impl StockProviderKind {
    fn parse(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().replace('-', "_").as_str() {
            "finnhub" => Some(Self::Finnhub),
            "alpha_vantage" | "alphavantage" => Some(Self::AlphaVantage),
            _ => None,
        }
    }
}

pub struct Config {
    pub listen_addr: SocketAddr,
    pub cors_allow: Vec<String>,
    pub request_timeout: Duration,
    pub upstream_timeout: Duration,
    pub finnhub_api_key: Option<String>,
    pub alpha_vantage_api_key: Option<String>,
    pub coingecko_api_key: Option<String>,
    /// Preference order of the stock chain.
    pub stock_providers: Vec<StockProviderKind>,
    pub degraded: DegradedMode,
    pub identifier_map_path: Option<PathBuf>,
    pub fallback_table_path: Option<PathBuf>,
    pub price_ttl: Duration,
    pub market_ttl: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen_addr: SocketAddr::from(([0, 0, 0, 0], 5001)),
            cors_allow: vec!["*".to_string()],
            request_timeout: Duration::from_millis(30_000),
            upstream_timeout: Duration::from_millis(10_000),
            finnhub_api_key: None,
            alpha_vantage_api_key: None,
            coingecko_api_key: None,
            stock_providers: vec![StockProviderKind::Finnhub, StockProviderKind::AlphaVantage],
            degraded: DegradedMode::default(),
            identifier_map_path: None,
            fallback_table_path: None,
            price_ttl: Duration::from_secs(60),
            market_ttl: Duration::from_secs(300),
        }
    }
}

impl Config {
    /// Read configuration from the process environment (and `.env`).
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let var = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let listen_addr = match var("MARKETBOARD_LISTEN_ADDR") {
            Some(raw) => raw
                .parse()
                .with_context(|| format!("Invalid MARKETBOARD_LISTEN_ADDR: {}", raw))?,
            None => defaults.listen_addr,
        };
        let cors_allow = var("MARKETBOARD_CORS_ALLOW_ORIGINS")
            .map(|raw| split_list(&raw))
            .unwrap_or(defaults.cors_allow);
        let millis = |key: &str, default: Duration| {
            var(key)
                .and_then(|v| v.parse::<u64>().ok())
                .map(Duration::from_millis)
                .unwrap_or(default)
        };
        let secs = |key: &str, default: Duration| {
            var(key)
                .and_then(|v| v.parse::<u64>().ok())
                .map(Duration::from_secs)
                .unwrap_or(default)
        };
        let flag = |key: &str| {
            var(key)
                .map(|v| matches!(v.to_lowercase().as_str(), "1" | "true" | "yes" | "on"))
                .unwrap_or(false)
        };

        let stock_providers = match var("MARKETBOARD_STOCK_PROVIDERS") {
            Some(raw) => split_list(&raw)
                .iter()
                .map(|name| {
                    StockProviderKind::parse(name)
                        .with_context(|| format!("Unknown stock provider: {}", name))
                })
                .collect::<anyhow::Result<Vec<_>>>()?,
            None => defaults.stock_providers,
        };

        Ok(Self {
            listen_addr,
            cors_allow,
            request_timeout: millis("MARKETBOARD_REQUEST_TIMEOUT_MS", defaults.request_timeout),
            upstream_timeout: millis("MARKETBOARD_UPSTREAM_TIMEOUT_MS", defaults.upstream_timeout),
            finnhub_api_key: var("FINNHUB_API_KEY"),
            alpha_vantage_api_key: var("ALPHA_VANTAGE_API_KEY"),
            coingecko_api_key: var("COINGECKO_API_KEY"),
            stock_providers,
            degraded: DegradedMode {
                stocks: flag("MARKETBOARD_DEGRADED_STOCKS"),
                crypto: flag("MARKETBOARD_DEGRADED_CRYPTO"),
            },
            identifier_map_path: var("MARKETBOARD_IDENTIFIER_MAP").map(PathBuf::from),
            fallback_table_path: var("MARKETBOARD_FALLBACK_TABLE").map(PathBuf::from),
            price_ttl: secs("MARKETBOARD_PRICE_TTL_SECS", defaults.price_ttl),
            market_ttl: secs("MARKETBOARD_MARKET_TTL_SECS", defaults.market_ttl),
        })
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> anyhow::Result<Config> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let cfg = config(&[]).unwrap();
        assert_eq!(cfg.listen_addr.to_string(), "0.0.0.0:5001");
        assert_eq!(cfg.cors_allow, vec!["*"]);
        assert_eq!(cfg.request_timeout, Duration::from_secs(30));
        assert_eq!(cfg.upstream_timeout, Duration::from_secs(10));
        assert_eq!(
            cfg.stock_providers,
            vec![StockProviderKind::Finnhub, StockProviderKind::AlphaVantage]
        );
        assert_eq!(cfg.degraded, DegradedMode::default());
        assert!(cfg.finnhub_api_key.is_none());
        assert_eq!(cfg.price_ttl, Duration::from_secs(60));
        assert_eq!(cfg.market_ttl, Duration::from_secs(300));
    }

    #[test]
    fn test_overrides() {
        let cfg = config(&[
            ("MARKETBOARD_LISTEN_ADDR", "127.0.0.1:8080"),
            ("MARKETBOARD_CORS_ALLOW_ORIGINS", "http://a.test, http://b.test"),
            ("MARKETBOARD_STOCK_PROVIDERS", "alpha_vantage"),
            ("MARKETBOARD_DEGRADED_CRYPTO", "true"),
            ("MARKETBOARD_PRICE_TTL_SECS", "5"),
            ("FINNHUB_API_KEY", "  "),
            ("COINGECKO_API_KEY", "demo"),
        ])
        .unwrap();
        assert_eq!(cfg.listen_addr.port(), 8080);
        assert_eq!(cfg.cors_allow, vec!["http://a.test", "http://b.test"]);
        assert_eq!(cfg.stock_providers, vec![StockProviderKind::AlphaVantage]);
        assert!(cfg.degraded.crypto);
        assert!(!cfg.degraded.stocks);
        assert_eq!(cfg.price_ttl, Duration::from_secs(5));
        assert!(cfg.finnhub_api_key.is_none());
        assert_eq!(cfg.coingecko_api_key.as_deref(), Some("demo"));
    }

    #[test]
    fn test_invalid_values() {
        assert!(config(&[("MARKETBOARD_LISTEN_ADDR", "nope")]).is_err());
        assert!(config(&[("MARKETBOARD_STOCK_PROVIDERS", "finnhub,yahoo")]).is_err());
        let cfg = config(&[("MARKETBOARD_REQUEST_TIMEOUT_MS", "soon")]).unwrap();
        assert_eq!(cfg.request_timeout, Duration::from_secs(30));
    }
}
