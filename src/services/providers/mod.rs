//! External data providers
//!
//! Every collaborator the recommendation pipeline talks to sits behind one of these traits.
use std::future::Future;
use std::time::Duration;

use crate::{
    config::MAX_RETRIES_LIMIT,
    error::{AppResult, LlmError},
    models::{Location, RawVenue, VenueDetails},
};

pub mod chat_completion;
pub mod google_places;

pub use chat_completion::ChatCompletionProvider;
pub use google_places::GooglePlacesProvider;

/// Resolves free-text place names to coordinates
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait GeocodingProvider: Send + Sync {
    /// `Ok(None)` when the provider has no match for the query
    async fn resolve(&self, query: &str) -> AppResult<Option<Location>>;
}

/// Parameters for a nearby venue search
#[derive(Debug, Clone, PartialEq)]
pub struct VenueSearchQuery {
    pub center: Location,
    pub radius_meters: u32,
    pub keyword: Option<String>,
    pub min_price: Option<u8>,
    pub max_price: Option<u8>,
}

/// Place search provider returning candidate restaurants
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait VenueSearchProvider: Send + Sync {
    /// Restaurants near `query.center`. An empty list is a valid answer.
    async fn search_nearby(&self, query: &VenueSearchQuery) -> AppResult<Vec<RawVenue>>;

    /// Phone, website and opening hours for a single place
    async fn get_details(&self, place_id: &str) -> AppResult<VenueDetails>;
}

/// Chat-style language model
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait LanguageModelProvider: Send + Sync {
    async fn complete(&self, system_prompt: &str, user_prompt: &str) -> Result<String, LlmError>;
}

const RETRY_BASE_DELAY_MS: u64 = 250;

/// Runs `op` once plus up to `max_retries` more times while it fails transiently
///
/// `max_retries` is capped at [`MAX_RETRIES_LIMIT`]. Backoff doubles from 250ms.
/// Non-transient errors are returned immediately.
pub(crate) async fn with_retry<T, F, Fut>(operation: &str, max_retries: u32, mut op: F) -> AppResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = AppResult<T>>,
{
    let max_retries = max_retries.min(MAX_RETRIES_LIMIT);
    let mut attempt = 0;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) if e.is_transient() && attempt < max_retries => {
                let delay = backoff_delay(attempt);
                tracing::warn!(
                    operation = operation,
                    attempt = attempt + 1,
                    delay_ms = delay.as_millis() as u64,
                    error = %e,
                    "Transient provider failure, retrying"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

fn backoff_delay(attempt: u32) -> Duration {
    let factor = 1u64.checked_shl(attempt).unwrap_or(u64::MAX);
    Duration::from_millis(RETRY_BASE_DELAY_MS.saturating_mul(factor))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test]
    async fn test_with_retry_returns_first_success() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let result = with_retry("test", 2, move || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok::<_, AppError>(7)
        })
        .await;

        tokio_test::assert_ok!(&result);
        assert_eq!(result.unwrap(), 7);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_with_retry_does_not_repeat_permanent_errors() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let result: AppResult<()> = with_retry("test", 2, move || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(AppError::VenueProvider("REQUEST_DENIED".to_string()))
        })
        .await;

        tokio_test::assert_err!(&result);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_backoff_doubles_without_overflowing() {
        assert_eq!(backoff_delay(0), Duration::from_millis(250));
        assert_eq!(backoff_delay(1), Duration::from_millis(500));
        assert_eq!(backoff_delay(64), Duration::from_millis(u64::MAX));
        assert_eq!(backoff_delay(u32::MAX), Duration::from_millis(u64::MAX));
    }
}
