//! Error types and retry classification for the market data crate.
//!
//! This module provides:
//! - [`MarketDataError`]: the outcome taxonomy shared by every adapter
//! - [`RetryClass`]: how the resolver reacts to each outcome
//! - [`ErrorKind`]: a stable tag the HTTP layer maps to a status code
//! - the classifier functions in [`classify`] that turn raw transport and
//!   HTTP signals into a [`MarketDataError`]

pub mod classify;
mod retry;

pub use classify::{
    classify_status, classify_transport, malformed_body, validate_crypto_ids,
    validate_identifier, validate_symbol,
};
pub use retry::RetryClass;

use serde::Serialize;
use thiserror::Error;

/// Errors that can occur during market data operations.
///
/// Each variant is classified into a [`RetryClass`] via
/// [`retry_class`](Self::retry_class), which decides whether the resolver
/// moves on to the next provider or gives up.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MarketDataError {
    /// The caller supplied an identifier or parameter that failed validation.
    /// Terminal: no provider will accept it either.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The provider does not know the requested asset.
    /// Terminal: other providers are not consulted.
    #[error("Not found: {0}")]
    NotFound(String),

    /// The provider rate limited the request (HTTP 429 or a documented
    /// rate-limit field in the body).
    #[error("Rate limited: {provider}")]
    RateLimited {
        /// The provider that rate limited the request
        provider: String,
        /// Upstream message, when the provider sent one
        message: Option<String>,
    },

    /// The provider answered with a server error or a body that does not
    /// contain the data the canonical model requires.
    #[error("Upstream unavailable: {provider}{}", fmt_message(.message))]
    UpstreamUnavailable {
        /// The provider that failed
        provider: String,
        /// Upstream or parse message
        message: Option<String>,
    },

    /// A local transport fault: timeout, DNS failure, refused connection.
    #[error("Network error: {provider}{}", fmt_message(.message))]
    Network {
        /// The provider we were talking to
        provider: String,
        /// Transport error description
        message: Option<String>,
    },
}

fn fmt_message(message: &Option<String>) -> String {
    message
        .as_ref()
        .map(|m| format!(" - {}", m))
        .unwrap_or_default()
}

/// Stable, copyable tag for a [`MarketDataError`].
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    InvalidInput,
    NotFound,
    RateLimited,
    UpstreamUnavailable,
    NetworkError,
}

impl ErrorKind {
    /// Machine-readable code used in API error bodies.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InvalidInput => "invalid_input",
            Self::NotFound => "not_found",
            Self::RateLimited => "rate_limited",
            Self::UpstreamUnavailable => "upstream_unavailable",
            Self::NetworkError => "network_error",
        }
    }
}

impl MarketDataError {
    /// Returns the retry classification for this error.
    ///
    /// - [`RetryClass::Never`]: propagate immediately
    /// - [`RetryClass::NextProvider`]: try the next provider in the chain
    ///
    /// # Examples
    ///
    /// ```
    /// use marketboard_market_data::errors::{MarketDataError, RetryClass};
    ///
    /// let error = MarketDataError::RateLimited { provider: "FINNHUB".to_string(), message: None };
    /// assert_eq!(error.retry_class(), RetryClass::NextProvider);
    ///
    /// let error = MarketDataError::NotFound("INVALID".to_string());
    /// assert_eq!(error.retry_class(), RetryClass::Never);
    /// ```
    pub fn retry_class(&self) -> RetryClass {
        match self {
            Self::InvalidInput(_) | Self::NotFound(_) => RetryClass::Never,
            Self::RateLimited { .. } | Self::UpstreamUnavailable { .. } | Self::Network { .. } => {
                RetryClass::NextProvider
            }
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidInput(_) => ErrorKind::InvalidInput,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::RateLimited { .. } => ErrorKind::RateLimited,
            Self::UpstreamUnavailable { .. } => ErrorKind::UpstreamUnavailable,
            Self::Network { .. } => ErrorKind::NetworkError,
        }
    }

    /// Upstream message carried by the error, if any.
    pub fn upstream_message(&self) -> Option<&str> {
        match self {
            Self::InvalidInput(msg) | Self::NotFound(msg) => Some(msg.as_str()),
            Self::RateLimited { message, .. }
            | Self::UpstreamUnavailable { message, .. }
            | Self::Network { message, .. } => message.as_deref(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_errors_never_retry() {
        assert_eq!(
            MarketDataError::NotFound("ZZZZ".to_string()).retry_class(),
            RetryClass::Never
        );
        assert_eq!(
            MarketDataError::InvalidInput("bad id".to_string()).retry_class(),
            RetryClass::Never
        );
    }

    #[test]
    fn test_transient_errors_try_next_provider() {
        let errors = [
            MarketDataError::RateLimited {
                provider: "FINNHUB".to_string(),
                message: None,
            },
            MarketDataError::UpstreamUnavailable {
                provider: "COINGECKO".to_string(),
                message: Some("HTTP 503".to_string()),
            },
            MarketDataError::Network {
                provider: "ALPHA_VANTAGE".to_string(),
                message: None,
            },
        ];
        for error in errors {
            assert_eq!(error.retry_class(), RetryClass::NextProvider);
        }
    }

    #[test]
    fn test_kinds_are_distinct() {
        let kinds = [
            MarketDataError::InvalidInput(String::new()).kind(),
            MarketDataError::NotFound(String::new()).kind(),
            MarketDataError::RateLimited {
                provider: String::new(),
                message: None,
            }
            .kind(),
            MarketDataError::UpstreamUnavailable {
                provider: String::new(),
                message: None,
            }
            .kind(),
            MarketDataError::Network {
                provider: String::new(),
                message: None,
            }
            .kind(),
        ];
        let codes: std::collections::HashSet<_> = kinds.iter().map(|k| k.as_str()).collect();
        assert_eq!(codes.len(), 5);
    }

    #[test]
    fn test_error_display() {
        let error = MarketDataError::NotFound("XYZ".to_string());
        assert_eq!(format!("{}", error), "Not found: XYZ");

        let error = MarketDataError::RateLimited {
            provider: "FINNHUB".to_string(),
            message: None,
        };
        assert_eq!(format!("{}", error), "Rate limited: FINNHUB");

        let error = MarketDataError::UpstreamUnavailable {
            provider: "COINGECKO".to_string(),
            message: Some("HTTP 502".to_string()),
        };
        assert_eq!(format!("{}", error), "Upstream unavailable: COINGECKO - HTTP 502");
    }
}
