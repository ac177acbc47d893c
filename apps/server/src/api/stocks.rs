use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use marketboard_market_data::{HistoryRange, HistoryReport, Quote, SymbolMatch};
use serde::Deserialize;

use crate::{error::ApiResult, main_lib::AppState, models::ApiResponse};

#[derive(Deserialize)]
struct SearchQuery {
    query: Option<String>,
}

#[derive(Deserialize)]
struct HistoryQuery {
    range: Option<String>,
}

async fn search_stocks(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SearchQuery>,
) -> ApiResult<Json<ApiResponse<Vec<SymbolMatch>>>> {
    let query = params.query.unwrap_or_default();
    let matches = state.resolver.search_stocks(&query).await?;
    Ok(Json(ApiResponse::ok(matches)))
}

async fn get_stock_quote(
    Path(symbol): Path<String>,
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<ApiResponse<Quote>>> {
    let quote = state.resolver.stock_quote(&symbol).await?;
    Ok(Json(ApiResponse::ok(quote)))
}

/// `range` defaults to `30d`.
async fn get_stock_history(
    Path(symbol): Path<String>,
    State(state): State<Arc<AppState>>,
    Query(params): Query<HistoryQuery>,
) -> ApiResult<Json<ApiResponse<HistoryReport>>> {
    let range = HistoryRange::parse_opt(params.range.as_deref())?;
    let report = state.resolver.stock_history(&symbol, range).await?;
    Ok(Json(ApiResponse::ok(report)))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/stocks/search", get(search_stocks))
        .route("/stocks/{symbol}/quote", get(get_stock_quote))
        .route("/stocks/{symbol}/history", get(get_stock_history))
}
