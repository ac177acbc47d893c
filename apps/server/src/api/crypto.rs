use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use marketboard_market_data::{CoinDetails, CoinMatch, HistoryReport, MarketSnapshot};
use serde::Deserialize;

use crate::{
    error::{ApiError, ApiResult},
    main_lib::AppState,
    models::{ApiResponse, LegacyCryptoPrice},
};

/// Currencies quoted by `/crypto/price` unless the caller picks others.
const LEGACY_CURRENCIES: [&str; 2] = ["usd", "inr"];

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PriceQuery {
    crypto_id: Option<String>,
    currencies: Option<String>,
}

#[derive(Deserialize)]
struct TopQuery {
    limit: Option<String>,
}

#[derive(Deserialize)]
struct HistoryQuery {
    days: Option<String>,
}

#[derive(Deserialize)]
struct SearchQuery {
    query: Option<String>,
}

fn parse_number<T: std::str::FromStr>(name: &str, raw: Option<String>) -> ApiResult<Option<T>> {
    match raw.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        Some(value) => value
            .parse()
            .map(Some)
            .map_err(|_| ApiError::BadRequest(format!("{} must be a positive integer", name))),
        None => Ok(None),
    }
}

/// Legacy pass-through body, not wrapped in the response envelope.
async fn get_crypto_price(
    State(state): State<Arc<AppState>>,
    Query(params): Query<PriceQuery>,
) -> ApiResult<Json<LegacyCryptoPrice>> {
    let ids = params
        .crypto_id
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| ApiError::BadRequest("cryptoId query parameter is required".into()))?;
    let currencies: Vec<String> = match params.currencies {
        Some(raw) => raw.split(',').map(|c| c.trim().to_string()).collect(),
        None => LEGACY_CURRENCIES.iter().map(|c| c.to_string()).collect(),
    };
    let report = state.resolver.crypto_prices(&ids, &currencies).await?;
    Ok(Json(LegacyCryptoPrice::from(&report)))
}

async fn get_top_cryptos(
    State(state): State<Arc<AppState>>,
    Query(params): Query<TopQuery>,
) -> ApiResult<Json<ApiResponse<Vec<MarketSnapshot>>>> {
    let limit = parse_number("limit", params.limit)?;
    let top = state.resolver.top_cryptos(limit).await?;
    Ok(Json(ApiResponse::ok(top)))
}

async fn get_crypto_details(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<ApiResponse<CoinDetails>>> {
    let details = state.resolver.crypto_details(&id).await?;
    Ok(Json(ApiResponse::ok(details)))
}

async fn get_crypto_history(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
    Query(params): Query<HistoryQuery>,
) -> ApiResult<Json<ApiResponse<HistoryReport>>> {
    let days = parse_number("days", params.days)?;
    let report = state.resolver.crypto_history(&id, days).await?;
    Ok(Json(ApiResponse::ok(report)))
}

async fn search_cryptos(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SearchQuery>,
) -> ApiResult<Json<ApiResponse<Vec<CoinMatch>>>> {
    let query = params.query.unwrap_or_default();
    let matches = state.resolver.search_cryptos(&query).await?;
    Ok(Json(ApiResponse::ok(matches)))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/crypto/price", get(get_crypto_price))
        .route("/crypto/top", get(get_top_cryptos))
        .route("/crypto/search", get(search_cryptos))
        .route("/crypto/{id}/details", get(get_crypto_details))
        .route("/crypto/{id}/history", get(get_crypto_history))
}
