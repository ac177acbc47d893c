//! Watchlist module - a flat list of followed symbols per user.

mod watchlist_model;
mod watchlist_service;

pub use watchlist_model::{validate_watch_symbol, Watchlist};
pub use watchlist_service::{WatchlistService, WATCHLISTS_COLLECTION};
