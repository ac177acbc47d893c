use std::sync::Arc;

use chrono::Utc;
use futures::future::join_all;
use log::{debug, warn};
use marketboard_market_data::AssetClass;

use super::portfolio_model::{
    item_key, normalize_symbol, ItemValuation, NewPortfolioItem, PortfolioItem,
    PortfolioValuation,
};
use super::portfolio_traits::PriceLookup;
use crate::errors::{Error, Result};
use crate::store::{Document, DocumentStore};
use crate::users::validate_user_id;

pub const PORTFOLIOS_COLLECTION: &str = "portfolios";

/// Portfolio operations over one document per user.
pub struct PortfolioService {
    store: Arc<dyn DocumentStore>,
    prices: Arc<dyn PriceLookup>,
}

impl PortfolioService {
    pub fn new(store: Arc<dyn DocumentStore>, prices: Arc<dyn PriceLookup>) -> Self {
        PortfolioService { store, prices }
    }

    /// Add or overwrite the item stored under `{symbol}_{type}`.
    pub async fn add_item(&self, user_id: &str, new_item: NewPortfolioItem) -> Result<PortfolioItem> {
        validate_user_id(user_id)?;
        let new_item = new_item.validate()?;
        let item = PortfolioItem {
            symbol: new_item.symbol,
            asset_type: new_item.asset_type,
            quantity: new_item.quantity,
            buy_price: new_item.buy_price,
            created_at: Utc::now(),
        };

        let mut fields = Document::new();
        fields.insert(item.key(), serde_json::to_value(&item)?);
        self.store
            .set_merge(PORTFOLIOS_COLLECTION, user_id, fields)
            .await?;

        debug!("Added {} to portfolio of {}", item.key(), user_id);
        Ok(item)
    }

    /// Remove an item. Without `asset_type` both the stock and the crypto
    /// entry for `symbol` are removed.
    pub async fn remove_item(
        &self,
        user_id: &str,
        symbol: &str,
        asset_type: Option<AssetClass>,
    ) -> Result<()> {
        validate_user_id(user_id)?;
        let types = match asset_type {
            Some(t) => vec![t],
            None => vec![AssetClass::Stock, AssetClass::Crypto],
        };

        let mut removed = false;
        for t in types {
            let key = item_key(&normalize_symbol(symbol, t), t);
            removed |= self
                .store
                .delete_field(PORTFOLIOS_COLLECTION, user_id, &key)
                .await?;
        }

        if !removed {
            return Err(Error::NotFound(format!(
                "{} is not in the portfolio",
                symbol.trim()
            )));
        }
        Ok(())
    }

    /// Items ordered by creation time. A missing document is created empty.
    pub async fn list_items(&self, user_id: &str) -> Result<Vec<PortfolioItem>> {
        validate_user_id(user_id)?;
        match self.store.get(PORTFOLIOS_COLLECTION, user_id).await? {
            Some(doc) => Ok(parse_items(user_id, doc)),
            None => {
                self.store
                    .set_merge(PORTFOLIOS_COLLECTION, user_id, Document::new())
                    .await?;
                Ok(Vec::new())
            }
        }
    }

    pub async fn valuate(&self, user_id: &str) -> Result<PortfolioValuation> {
        let items = self.list_items(user_id).await?;
        Ok(self.valuate_items(items).await)
    }

    /// Price every item concurrently. A failed lookup leaves that item
    /// unpriced instead of failing the whole valuation.
    pub(crate) async fn valuate_items(&self, items: Vec<PortfolioItem>) -> PortfolioValuation {
        let lookups = items.iter().map(|item| async move {
            match self
                .prices
                .current_price(&item.symbol, item.asset_type)
                .await
            {
                Ok(price) => Some(price),
                Err(e) => {
                    warn!("No current price for {}: {}", item.key(), e);
                    None
                }
            }
        });
        let prices = join_all(lookups).await;

        let valued = items
            .into_iter()
            .zip(prices)
            .map(|(item, price)| ItemValuation::new(item, price))
            .collect();
        PortfolioValuation::from_items(valued)
    }
}

/// Decode a portfolio document, skipping fields that are not items.
pub(crate) fn parse_items(user_id: &str, doc: Document) -> Vec<PortfolioItem> {
    let mut items: Vec<PortfolioItem> = doc
        .into_iter()
        .filter_map(|(key, value)| match serde_json::from_value(value) {
            Ok(item) => Some(item),
            Err(e) => {
                warn!("Skipping malformed portfolio field {} for {}: {}", key, user_id, e);
                None
            }
        })
        .collect();
    items.sort_by(|a, b| a.created_at.cmp(&b.created_at));
    items
}
