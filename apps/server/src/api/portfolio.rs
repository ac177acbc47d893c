use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    routing::{delete, get, post},
    Json, Router,
};
use marketboard_core::{NewPortfolioItem, PortfolioItem, PortfolioValuation};
use marketboard_market_data::AssetClass;
use serde::Deserialize;

use crate::{api::UserId, error::ApiResult, main_lib::AppState, models::ApiResponse};

#[derive(Deserialize)]
struct RemoveQuery {
    #[serde(rename = "type")]
    asset_type: Option<String>,
}

async fn list_items(
    State(state): State<Arc<AppState>>,
    UserId(user_id): UserId,
) -> ApiResult<Json<ApiResponse<Vec<PortfolioItem>>>> {
    let items = state.portfolio_service.list_items(&user_id).await?;
    Ok(Json(ApiResponse::ok(items)))
}

async fn get_valuation(
    State(state): State<Arc<AppState>>,
    UserId(user_id): UserId,
) -> ApiResult<Json<ApiResponse<PortfolioValuation>>> {
    let valuation = state.portfolio_service.valuate(&user_id).await?;
    Ok(Json(ApiResponse::ok(valuation)))
}

async fn add_item(
    State(state): State<Arc<AppState>>,
    UserId(user_id): UserId,
    payload: Result<Json<NewPortfolioItem>, JsonRejection>,
) -> ApiResult<Json<ApiResponse<PortfolioItem>>> {
    let Json(item) = payload?;
    let added = state.portfolio_service.add_item(&user_id, item).await?;
    Ok(Json(ApiResponse::ok(added)))
}

async fn remove_item(
    Path(symbol): Path<String>,
    State(state): State<Arc<AppState>>,
    UserId(user_id): UserId,
    Query(params): Query<RemoveQuery>,
) -> ApiResult<Json<ApiResponse<()>>> {
    let asset_type = params
        .asset_type
        .filter(|t| !t.trim().is_empty())
        .map(|t| t.parse::<AssetClass>())
        .transpose()?;
    state
        .portfolio_service
        .remove_item(&user_id, &symbol, asset_type)
        .await?;
    Ok(Json(ApiResponse::message(format!(
        "{} removed from portfolio",
        symbol.trim()
    ))))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/portfolio/list", get(list_items))
        .route("/portfolio/valuation", get(get_valuation))
        .route("/portfolio/add", post(add_item))
        .route("/portfolio/remove/{symbol}", delete(remove_item))
}
