//! HTTP client module with timeout, retry logic and error handling.

mod client;
mod retry;

#[cfg(test)]
pub(crate) use client::test_server;
pub use client::{FetchClient, FetchRequest, REQUEST_TIMEOUT_MS};
pub use retry::{
    DEFAULT_RETRIES, FetchError, FetchErrorKind, RETRY_DELAY_MS, classify_transport_error,
    with_retry,
};
