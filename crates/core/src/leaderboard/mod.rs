//! Leaderboard module

mod leaderboard_model;
mod leaderboard_service;

pub use leaderboard_model::LeaderboardEntry;
pub use leaderboard_service::{
    LeaderboardService, DEFAULT_LEADERBOARD_LIMIT, MAX_LEADERBOARD_LIMIT,
};
