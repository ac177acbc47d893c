use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    routing::{delete, get, post},
    Json, Router,
};
use serde::Deserialize;

use crate::{api::UserId, error::ApiResult, main_lib::AppState, models::ApiResponse};

#[derive(Deserialize)]
struct AddBody {
    symbol: String,
}

#[derive(Deserialize)]
struct ReplaceBody {
    symbols: Vec<String>,
}

async fn get_watchlist(
    State(state): State<Arc<AppState>>,
    UserId(user_id): UserId,
) -> ApiResult<Json<ApiResponse<Vec<String>>>> {
    let symbols = state.watchlist_service.get(&user_id).await?;
    Ok(Json(ApiResponse::ok(symbols)))
}

async fn replace_watchlist(
    State(state): State<Arc<AppState>>,
    UserId(user_id): UserId,
    payload: Result<Json<ReplaceBody>, JsonRejection>,
) -> ApiResult<Json<ApiResponse<Vec<String>>>> {
    let Json(body) = payload?;
    let symbols = state
        .watchlist_service
        .replace(&user_id, body.symbols)
        .await?;
    Ok(Json(ApiResponse::ok(symbols)))
}

async fn add_symbol(
    State(state): State<Arc<AppState>>,
    UserId(user_id): UserId,
    payload: Result<Json<AddBody>, JsonRejection>,
) -> ApiResult<Json<ApiResponse<Vec<String>>>> {
    let Json(body) = payload?;
    let symbols = state.watchlist_service.add(&user_id, &body.symbol).await?;
    Ok(Json(ApiResponse::ok(symbols)))
}

async fn remove_symbol(
    Path(symbol): Path<String>,
    State(state): State<Arc<AppState>>,
    UserId(user_id): UserId,
) -> ApiResult<Json<ApiResponse<Vec<String>>>> {
    let symbols = state.watchlist_service.remove(&user_id, &symbol).await?;
    Ok(Json(ApiResponse::ok(symbols)))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/watchlist", get(get_watchlist).put(replace_watchlist))
        .route("/watchlist/add", post(add_symbol))
        .route("/watchlist/{symbol}", delete(remove_symbol))
}
