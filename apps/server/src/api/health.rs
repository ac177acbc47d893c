use std::sync::Arc;

use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;

use crate::{main_lib::AppState, models::ApiResponse};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct HealthStatus {
    status: &'static str,
    cache_entries: usize,
    degraded_stocks: bool,
    degraded_crypto: bool,
}

async fn healthz(State(state): State<Arc<AppState>>) -> Json<ApiResponse<HealthStatus>> {
    let degraded = state.resolver.degraded_mode();
    Json(ApiResponse::ok(HealthStatus {
        status: "ok",
        cache_entries: state.resolver.cache().len(),
        degraded_stocks: degraded.stocks,
        degraded_crypto: degraded.crypto,
    }))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/healthz", get(healthz))
}
