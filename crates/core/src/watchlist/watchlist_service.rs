use std::sync::Arc;

use log::{debug, warn};

use super::watchlist_model::{validate_watch_symbol, Watchlist};
use crate::errors::Result;
use crate::store::{Document, DocumentStore};
use crate::users::validate_user_id;

pub const WATCHLISTS_COLLECTION: &str = "watchlists";

/// Watchlist operations. Every mutation returns the updated symbol list.
///
/// Updates are read-modify-write against the store and are not atomic:
/// two concurrent writes for the same user may lose one of them.
pub struct WatchlistService {
    store: Arc<dyn DocumentStore>,
}

impl WatchlistService {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        WatchlistService { store }
    }

    /// Current symbols; a missing document is created as `{symbols: []}`.
    pub async fn get(&self, user_id: &str) -> Result<Vec<String>> {
        validate_user_id(user_id)?;
        Ok(self.load(user_id).await?.symbols)
    }

    pub async fn add(&self, user_id: &str, symbol: &str) -> Result<Vec<String>> {
        validate_user_id(user_id)?;
        let symbol = validate_watch_symbol(symbol)?;
        let mut list = self.load(user_id).await?;
        if list.insert(symbol) {
            self.save(user_id, &list).await?;
        }
        Ok(list.symbols)
    }

    /// Removing an absent symbol is not an error.
    pub async fn remove(&self, user_id: &str, symbol: &str) -> Result<Vec<String>> {
        validate_user_id(user_id)?;
        let symbol = symbol.trim();
        let mut list = self.load(user_id).await?;
        if list.remove(symbol) {
            self.save(user_id, &list).await?;
        }
        Ok(list.symbols)
    }

    /// Replace the whole list. Duplicates are dropped, first occurrence wins.
    pub async fn replace(&self, user_id: &str, symbols: Vec<String>) -> Result<Vec<String>> {
        validate_user_id(user_id)?;
        let mut list = Watchlist::default();
        for symbol in symbols {
            list.insert(validate_watch_symbol(&symbol)?);
        }
        self.save(user_id, &list).await?;
        Ok(list.symbols)
    }

    async fn load(&self, user_id: &str) -> Result<Watchlist> {
        match self.store.get(WATCHLISTS_COLLECTION, user_id).await? {
            Some(doc) => {
                let value = serde_json::Value::Object(doc);
                Ok(serde_json::from_value(value).unwrap_or_else(|e| {
                    warn!("Malformed watchlist for {}, treating as empty: {}", user_id, e);
                    Watchlist::default()
                }))
            }
            None => {
                let list = Watchlist::default();
                self.save(user_id, &list).await?;
                Ok(list)
            }
        }
    }

    async fn save(&self, user_id: &str, list: &Watchlist) -> Result<()> {
        let mut fields = Document::new();
        fields.insert("symbols".to_string(), serde_json::to_value(&list.symbols)?);
        debug!("Saving {} watchlist symbol(s) for {}", list.symbols.len(), user_id);
        self.store
            .set_merge(WATCHLISTS_COLLECTION, user_id, fields)
            .await
    }
}
