//! Ordered provider chain walker.

use std::future::Future;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::errors::{MarketDataError, RetryClass};
use crate::provider::Provider;

/// Walk `providers` in order until one answers.
///
/// `call` returns `Ok(Some(_))` for an answer and `Ok(None)` when the
/// provider responded but had nothing for the request; the walk then moves
/// on and, if no later provider answers, ends in `NotFound`. Errors with
/// [`RetryClass::Never`] end the walk at once. Every provider is called at
/// most once.
pub(crate) async fn walk<P, T, F, Fut>(
    operation: &str,
    subject: &str,
    providers: &[Arc<P>],
    call: F,
) -> Result<T, MarketDataError>
where
    P: Provider + ?Sized,
    F: Fn(Arc<P>) -> Fut,
    Fut: Future<Output = Result<Option<T>, MarketDataError>>,
{
    if providers.is_empty() {
        return Err(MarketDataError::UpstreamUnavailable {
            provider: "none".to_string(),
            message: Some(format!("No provider configured for {}", operation)),
        });
    }

    let mut last_error: Option<MarketDataError> = None;

    for provider in providers {
        let provider_id = provider.id();

        match call(Arc::clone(provider)).await {
            Ok(Some(value)) => {
                debug!(provider = provider_id, operation, subject, "provider answered");
                return Ok(value);
            }
            Ok(None) => {
                debug!(provider = provider_id, operation, subject, "provider had no data");
                last_error = Some(MarketDataError::NotFound(format!(
                    "No data found for {}",
                    subject
                )));
            }
            Err(e) => {
                if e.retry_class() == RetryClass::Never {
                    return Err(e);
                }
                warn!(
                    provider = provider_id,
                    operation,
                    subject,
                    error = %e,
                    "provider failed, trying next"
                );
                last_error = Some(e);
            }
        }
    }

    // A non-empty chain always leaves last_error set.
    Err(last_error.unwrap_or_else(|| MarketDataError::NotFound(subject.to_string())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorKind;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Stub {
        id: &'static str,
        outcome: Result<Option<u32>, MarketDataError>,
        calls: AtomicUsize,
    }

    impl Stub {
        fn new(id: &'static str, outcome: Result<Option<u32>, MarketDataError>) -> Arc<Self> {
            Arc::new(Self {
                id,
                outcome,
                calls: AtomicUsize::new(0),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl Provider for Stub {
        fn id(&self) -> &'static str {
            self.id
        }
    }

    async fn run(chain: &[Arc<Stub>]) -> Result<u32, MarketDataError> {
        walk("test", "AAPL", chain, |p| async move {
            p.calls.fetch_add(1, Ordering::SeqCst);
            p.outcome.clone()
        })
        .await
    }

    fn rate_limited(id: &str) -> MarketDataError {
        MarketDataError::RateLimited {
            provider: id.to_string(),
            message: None,
        }
    }

    #[tokio::test]
    async fn test_falls_through_retryable_errors() {
        let a = Stub::new("A", Err(rate_limited("A")));
        let b = Stub::new("B", Ok(Some(7)));
        let c = Stub::new("C", Ok(Some(9)));
        let result = run(&[a.clone(), b.clone(), c.clone()]).await;
        assert_eq!(result.unwrap(), 7);
        assert_eq!((a.calls(), b.calls(), c.calls()), (1, 1, 0));
    }

    #[tokio::test]
    async fn test_not_found_stops_the_walk() {
        let a = Stub::new("A", Err(MarketDataError::NotFound("AAPL".into())));
        let b = Stub::new("B", Ok(Some(7)));
        let err = run(&[a.clone(), b.clone()]).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert_eq!(b.calls(), 0);
    }

    #[tokio::test]
    async fn test_exhausted_returns_last_error() {
        let a = Stub::new("A", Err(rate_limited("A")));
        let b = Stub::new(
            "B",
            Err(MarketDataError::Network {
                provider: "B".into(),
                message: None,
            }),
        );
        let err = run(&[a.clone(), b.clone()]).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NetworkError);
        assert_eq!((a.calls(), b.calls()), (1, 1));
    }

    #[tokio::test]
    async fn test_empty_answers_end_in_not_found() {
        let a = Stub::new("A", Ok(None));
        let b = Stub::new("B", Ok(None));
        let err = run(&[a, b]).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_empty_chain_is_upstream_unavailable() {
        let err = run(&[]).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UpstreamUnavailable);
    }
}
