//! Marketboard Core - User state services and traits.
//!
//! This crate holds portfolio, watchlist and leaderboard logic. It is
//! storage-agnostic: everything goes through the [`store::DocumentStore`]
//! trait, and current prices come in through [`portfolio::PriceLookup`].

pub mod errors;
pub mod leaderboard;
pub mod portfolio;
pub mod store;
pub mod users;
pub mod watchlist;

pub use leaderboard::*;
pub use portfolio::*;
pub use store::{Document, DocumentStore, InMemoryDocumentStore};
pub use watchlist::*;

// Re-export error types
pub use errors::Error;
pub use errors::Result;
