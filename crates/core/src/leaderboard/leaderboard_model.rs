use serde::{Deserialize, Serialize};

/// One ranked user. `user_id` is already masked.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardEntry {
    pub rank: usize,
    pub user_id: String,
    pub roi_percent: f64,
    pub portfolio_value: f64,
    pub profit_loss: f64,
}
