//! Retry logic and error classification for storefront API calls.

use log::{debug, warn};
use std::time::Duration;

/// Default number of retries after the first attempt.
pub const DEFAULT_RETRIES: u32 = 2;

/// Delay between retry attempts in milliseconds.
pub const RETRY_DELAY_MS: u64 = 1000;

/// What went wrong with a fetch, decided once where the failure happens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchErrorKind {
    /// The attempt did not finish before its timer fired
    Timeout,
    /// Transport-level failure (connect refused, reset, DNS, ...)
    Network,
    /// Server answered with a non-success status
    Http { status: u16 },
    /// Success status but the body is not a JSON object or array
    Format,
    /// The request could not be built (bad URL, bad header)
    Request,
}

impl FetchErrorKind {
    /// Whether a fresh attempt might succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, FetchErrorKind::Timeout | FetchErrorKind::Network)
    }
}

/// A failed fetch carrying its kind and a human-readable message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchError {
    kind: FetchErrorKind,
    message: String,
}

impl FetchError {
    pub fn new(kind: FetchErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn timeout(after: Duration) -> Self {
        Self::new(
            FetchErrorKind::Timeout,
            format!("Request timed out after {}ms", after.as_millis()),
        )
    }

    pub fn network(detail: impl std::fmt::Display) -> Self {
        Self::new(FetchErrorKind::Network, format!("Network error: {}", detail))
    }

    pub fn http(status: u16, message: impl Into<String>) -> Self {
        Self::new(FetchErrorKind::Http { status }, message)
    }

    pub fn format(resource: &str) -> Self {
        Self::new(
            FetchErrorKind::Format,
            format!("Invalid response format from {} API", resource),
        )
    }

    pub fn kind(&self) -> FetchErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn is_transient(&self) -> bool {
        self.kind.is_transient()
    }
}

impl std::fmt::Display for FetchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for FetchError {}

/// Classifies a transport error coming out of reqwest.
pub fn classify_transport_error(error: &reqwest::Error, timeout: Duration) -> FetchError {
    if error.is_timeout() {
        return FetchError::timeout(timeout);
    }
    if error.is_builder() {
        return FetchError::new(
            FetchErrorKind::Request,
            format!("Invalid request: {}", error),
        );
    }
    FetchError::network(error)
}

/// Runs `operation` until it succeeds, fails terminally, or `retries` run out.
///
/// Only transient failures are retried, each after `delay`. On exhaustion the
/// last transient error is returned as-is.
pub async fn with_retry<F, Fut, T>(
    operation_name: &str,
    retries: u32,
    delay: Duration,
    operation: F,
) -> Result<T, FetchError>
where
    F: Fn() -> Fut,
    Fut: std::future::Future<Output = Result<T, FetchError>>,
{
    let mut retries_remaining = retries;
    let mut attempt = 1;

    loop {
        match operation().await {
            Ok(result) => return Ok(result),
            Err(e) if !e.is_transient() => {
                debug!("{}: non-retryable error: {}", operation_name, e);
                return Err(e);
            }
            Err(e) if retries_remaining == 0 => {
                debug!(
                    "{}: giving up after {} attempt(s): {}",
                    operation_name, attempt, e
                );
                return Err(e);
            }
            Err(e) => {
                warn!(
                    "{}: attempt {} failed ({}), retrying in {}ms ({} left)...",
                    operation_name,
                    attempt,
                    e,
                    delay.as_millis(),
                    retries_remaining
                );
                tokio::time::sleep(delay).await;
                retries_remaining -= 1;
                attempt += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Instant;

    const FAST: Duration = Duration::from_millis(10);

    #[test]
    fn test_transient_kinds() {
        assert!(FetchErrorKind::Timeout.is_transient());
        assert!(FetchErrorKind::Network.is_transient());
        assert!(!FetchErrorKind::Http { status: 503 }.is_transient());
        assert!(!FetchErrorKind::Format.is_transient());
        assert!(!FetchErrorKind::Request.is_transient());
    }

    #[test]
    fn test_display_is_message_verbatim() {
        let err = FetchError::http(404, "Products not found");
        assert_eq!(err.to_string(), "Products not found");
        assert_eq!(err.kind(), FetchErrorKind::Http { status: 404 });
    }

    #[test]
    fn test_constructor_messages() {
        assert_eq!(
            FetchError::timeout(Duration::from_millis(10_000)).message(),
            "Request timed out after 10000ms"
        );
        assert_eq!(
            FetchError::network("connection refused").message(),
            "Network error: connection refused"
        );
        assert_eq!(
            FetchError::format("best sellers").message(),
            "Invalid response format from best sellers API"
        );
    }

    #[tokio::test]
    async fn test_classify_builder_error_is_terminal() {
        let err = reqwest::Client::new()
            .get("not a url")
            .send()
            .await
            .unwrap_err();

        let classified = classify_transport_error(&err, FAST);
        assert_eq!(classified.kind(), FetchErrorKind::Request);
        assert!(!classified.is_transient());
    }

    #[tokio::test]
    async fn test_classify_connection_refused_is_network() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let err = reqwest::Client::new()
            .get(format!("http://{}/", addr))
            .send()
            .await
            .unwrap_err();

        let classified = classify_transport_error(&err, FAST);
        assert_eq!(classified.kind(), FetchErrorKind::Network);
        assert!(classified.message().starts_with("Network error: "));
    }

    #[tokio::test]
    async fn test_with_retry_success() {
        let result = with_retry("test", 2, FAST, || async { Ok::<_, FetchError>("success") }).await;
        assert_eq!(result.unwrap(), "success");
    }

    #[tokio::test]
    async fn test_with_retry_immediate_failure_on_terminal() {
        let call_count = Arc::new(AtomicUsize::new(0));
        let call_count_clone = call_count.clone();

        let result = with_retry("test", 2, FAST, || {
            let count = call_count_clone.clone();
            async move {
                count.fetch_add(1, Ordering::SeqCst);
                Err::<(), _>(FetchError::http(404, "Products not found"))
            }
        })
        .await;

        assert_eq!(result.unwrap_err().message(), "Products not found");
        assert_eq!(call_count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_with_retry_recovers_after_two_timeouts() {
        let call_count = Arc::new(AtomicUsize::new(0));
        let call_count_clone = call_count.clone();
        let delay = Duration::from_millis(30);
        let started = Instant::now();

        let result = with_retry("test", 2, delay, || {
            let count = call_count_clone.clone();
            async move {
                let current = count.fetch_add(1, Ordering::SeqCst);
                if current < 2 {
                    Err(FetchError::timeout(FAST))
                } else {
                    Ok("success after retries")
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), "success after retries");
        assert_eq!(call_count.load(Ordering::SeqCst), 3);
        assert!(started.elapsed() >= delay * 2);
    }

    #[tokio::test]
    async fn test_with_retry_exhausts_retries() {
        let call_count = Arc::new(AtomicUsize::new(0));
        let call_count_clone = call_count.clone();

        let result = with_retry("test", 2, FAST, || {
            let count = call_count_clone.clone();
            async move {
                count.fetch_add(1, Ordering::SeqCst);
                Err::<(), _>(FetchError::timeout(FAST))
            }
        })
        .await;

        let err = result.unwrap_err();
        assert_eq!(err.kind(), FetchErrorKind::Timeout);
        assert_eq!(call_count.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_with_retry_zero_retries_single_attempt() {
        let call_count = Arc::new(AtomicUsize::new(0));
        let call_count_clone = call_count.clone();

        let result = with_retry("test", 0, FAST, || {
            let count = call_count_clone.clone();
            async move {
                count.fetch_add(1, Ordering::SeqCst);
                Err::<(), _>(FetchError::network("connection reset"))
            }
        })
        .await;

        assert_eq!(result.unwrap_err().kind(), FetchErrorKind::Network);
        assert_eq!(call_count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_with_retry_returns_last_transient_error() {
        let call_count = Arc::new(AtomicUsize::new(0));
        let call_count_clone = call_count.clone();

        let result = with_retry("test", 1, FAST, || {
            let count = call_count_clone.clone();
            async move {
                let current = count.fetch_add(1, Ordering::SeqCst);
                if current == 0 {
                    Err::<(), _>(FetchError::timeout(FAST))
                } else {
                    Err(FetchError::network("connection reset"))
                }
            }
        })
        .await;

        assert_eq!(
            result.unwrap_err().message(),
            "Network error: connection reset"
        );
    }
}
