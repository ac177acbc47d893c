//! Market data models
//!
//! Canonical shapes returned by the resolver, independent of which provider
//! answered:
//! - `types` - Small shared aliases and the asset class tag
//! - `quote` - Current-price snapshot for one asset (Quote)
//! - `market` - Crypto market snapshots and price tables
//! - `history` - Price series, range tokens and the history report
//! - `search` - Stock and coin search results

mod history;
mod market;
mod quote;
mod search;
mod types;

pub use history::{HistoryPoint, HistoryRange, HistoryReport};
pub use market::{CoinDetails, CryptoPrice, CryptoPriceReport, MarketSnapshot, PriceSource};
pub use quote::Quote;
pub use search::{CoinMatch, SymbolMatch};
pub use types::{AssetClass, ProviderId};
