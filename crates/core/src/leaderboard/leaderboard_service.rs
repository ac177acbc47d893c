use std::cmp::Ordering;
use std::sync::Arc;

use futures::future::join_all;
use log::debug;

use super::leaderboard_model::LeaderboardEntry;
use crate::errors::{Result, ValidationError};
use crate::portfolio::{parse_items, PortfolioService, PORTFOLIOS_COLLECTION};
use crate::store::DocumentStore;
use crate::users::mask_user_id;

pub const DEFAULT_LEADERBOARD_LIMIT: usize = 10;
pub const MAX_LEADERBOARD_LIMIT: usize = 100;

/// Ranks every stored portfolio by cost-weighted ROI.
pub struct LeaderboardService {
    store: Arc<dyn DocumentStore>,
    portfolios: Arc<PortfolioService>,
}

impl LeaderboardService {
    pub fn new(store: Arc<dyn DocumentStore>, portfolios: Arc<PortfolioService>) -> Self {
        LeaderboardService { store, portfolios }
    }

    /// Best `limit` users, highest ROI first. Portfolios with nothing
    /// priced have no ROI and are left out.
    pub async fn top(&self, limit: Option<usize>) -> Result<Vec<LeaderboardEntry>> {
        let limit = limit.unwrap_or(DEFAULT_LEADERBOARD_LIMIT);
        if limit == 0 || limit > MAX_LEADERBOARD_LIMIT {
            return Err(ValidationError::InvalidInput(format!(
                "limit must be between 1 and {}",
                MAX_LEADERBOARD_LIMIT
            ))
            .into());
        }

        let documents = self.store.list(PORTFOLIOS_COLLECTION).await?;
        debug!("Ranking {} portfolio(s)", documents.len());

        let valuations = join_all(documents.into_iter().map(|(user_id, doc)| async move {
            let items = parse_items(&user_id, doc);
            let valuation = self.portfolios.valuate_items(items).await;
            (user_id, valuation)
        }))
        .await;

        let mut ranked: Vec<(String, f64, f64, f64)> = valuations
            .into_iter()
            .filter_map(|(user_id, v)| {
                v.roi_percent
                    .map(|roi| (user_id, roi, v.total_value, v.total_profit_loss))
            })
            .collect();
        ranked.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(Ordering::Equal)
                .then_with(|| b.2.partial_cmp(&a.2).unwrap_or(Ordering::Equal))
                .then_with(|| a.0.cmp(&b.0))
        });

        Ok(ranked
            .into_iter()
            .take(limit)
            .enumerate()
            .map(|(i, (user_id, roi_percent, portfolio_value, profit_loss))| LeaderboardEntry {
                rank: i + 1,
                user_id: mask_user_id(&user_id),
                roi_percent,
                portfolio_value,
                profit_loss,
            })
            .collect())
    }
}
