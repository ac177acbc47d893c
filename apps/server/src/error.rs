use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use marketboard_core::errors::Error as CoreError;
use marketboard_market_data::{ErrorKind, MarketDataError};
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    MarketData(#[from] MarketDataError),
    #[error("{0}")]
    Core(#[from] CoreError),
    #[error("{0}")]
    BadRequest(String),
}

#[derive(Serialize)]
struct ErrorBody {
    success: bool,
    message: String,
    error: &'static str,
}

impl ApiError {
    /// Status code and stable error code for this error.
    pub fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            ApiError::MarketData(e) => market_data_status(e.kind()),
            ApiError::Core(e) => match e {
                CoreError::Validation(_) => market_data_status(ErrorKind::InvalidInput),
                CoreError::NotFound(_) => market_data_status(ErrorKind::NotFound),
                CoreError::MarketData(inner) => market_data_status(inner.kind()),
                CoreError::Store(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal"),
            },
            ApiError::BadRequest(_) => market_data_status(ErrorKind::InvalidInput),
        }
    }
}

fn market_data_status(kind: ErrorKind) -> (StatusCode, &'static str) {
    let status = match kind {
        ErrorKind::InvalidInput => StatusCode::BAD_REQUEST,
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::RateLimited => StatusCode::TOO_MANY_REQUESTS,
        ErrorKind::UpstreamUnavailable => StatusCode::BAD_GATEWAY,
        ErrorKind::NetworkError => StatusCode::SERVICE_UNAVAILABLE,
    };
    (status, kind.as_str())
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();
        if status.is_server_error() {
            tracing::error!(error = code, "{}", self);
        } else {
            tracing::debug!(error = code, "{}", self);
        }
        let body = Json(ErrorBody {
            success: false,
            message: self.to_string(),
            error: code,
        });
        (status, body).into_response()
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
