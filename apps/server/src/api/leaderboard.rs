use std::sync::Arc;

use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use marketboard_core::LeaderboardEntry;
use serde::Deserialize;

use crate::{
    error::{ApiError, ApiResult},
    main_lib::AppState,
    models::ApiResponse,
};

#[derive(Deserialize)]
struct TopQuery {
    limit: Option<String>,
}

async fn get_top(
    State(state): State<Arc<AppState>>,
    Query(params): Query<TopQuery>,
) -> ApiResult<Json<ApiResponse<Vec<LeaderboardEntry>>>> {
    let limit = match params.limit.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        Some(raw) => Some(
            raw.parse::<usize>()
                .map_err(|_| ApiError::BadRequest("limit must be a positive integer".into()))?,
        ),
        None => None,
    };
    let entries = state.leaderboard_service.top(limit).await?;
    Ok(Json(ApiResponse::ok(entries)))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/leaderboard/top", get(get_top))
}
