//! SummaryProvider trait definition.
//!
//! The HTTP layer depends on this trait rather than on the Google
//! implementation directly, so request handlers can be exercised against
//! mock providers in tests.

use std::future::Future;
use std::pin::Pin;

use crate::error::ProviderResult;
use crate::summary::SummaryEvent;

/// Boxed future type for dyn-compatible async trait methods.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// A source of calendar summaries.
///
/// One call produces the full flattened summary for the trailing time
/// window: owned calendars, calendar-major then event-minor order.
pub trait SummaryProvider: Send + Sync {
    /// Human-readable provider name, used in logs.
    fn name(&self) -> &str;

    /// Fetches the event summary for the trailing window.
    ///
    /// Errors are request-scoped: callers map them to a response and the
    /// provider stays usable for subsequent calls.
    fn fetch_summary(&self) -> BoxFuture<'_, ProviderResult<Vec<SummaryEvent>>>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProviderError;

    struct EmptyProvider;

    impl SummaryProvider for EmptyProvider {
        fn name(&self) -> &str {
            "empty"
        }

        fn fetch_summary(&self) -> BoxFuture<'_, ProviderResult<Vec<SummaryEvent>>> {
            Box::pin(async { Ok(Vec::new()) })
        }
    }

    struct FailingProvider;

    impl SummaryProvider for FailingProvider {
        fn name(&self) -> &str {
            "failing"
        }

        fn fetch_summary(&self) -> BoxFuture<'_, ProviderResult<Vec<SummaryEvent>>> {
            Box::pin(async { Err(ProviderError::network("connection refused")) })
        }
    }

    #[tokio::test]
    async fn trait_is_object_safe() {
        let providers: Vec<Box<dyn SummaryProvider>> =
            vec![Box::new(EmptyProvider), Box::new(FailingProvider)];

        assert_eq!(providers[0].name(), "empty");
        assert!(providers[0].fetch_summary().await.unwrap().is_empty());
        assert!(providers[1].fetch_summary().await.is_err());
    }
}
