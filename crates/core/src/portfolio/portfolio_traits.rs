use async_trait::async_trait;
use marketboard_market_data::{AssetClass, MarketDataError, QuoteResolver};

use crate::errors::Result;

/// Current price of one asset, in USD.
#[async_trait]
pub trait PriceLookup: Send + Sync {
    async fn current_price(&self, symbol: &str, asset_type: AssetClass) -> Result<f64>;
}

#[async_trait]
impl PriceLookup for QuoteResolver {
    async fn current_price(&self, symbol: &str, asset_type: AssetClass) -> Result<f64> {
        match asset_type {
            AssetClass::Stock => Ok(self.stock_quote(symbol).await?.price),
            AssetClass::Crypto => {
                let report = self.crypto_prices(symbol, &["usd".to_string()]).await?;
                report.primary.price_in("usd").ok_or_else(|| {
                    MarketDataError::NotFound(format!("No USD price for {}", symbol)).into()
                })
            }
        }
    }
}
