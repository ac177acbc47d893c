//! Portfolio module - holdings per user and their live valuation.

mod portfolio_model;
mod portfolio_service;
mod portfolio_traits;


pub use portfolio_model::{ItemValuation, NewPortfolioItem, PortfolioItem, PortfolioValuation};
pub use portfolio_service::{PortfolioService, PORTFOLIOS_COLLECTION};
pub use portfolio_traits::PriceLookup;

pub(crate) use portfolio_service::parse_items;
