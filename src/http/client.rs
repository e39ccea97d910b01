//! HTTP client with a per-attempt timeout, retry logic and error classification.

use log::debug;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, StatusCode};
use serde_json::Value;
use std::time::Duration;

use super::retry::{FetchError, RETRY_DELAY_MS, classify_transport_error, with_retry};

/// Time allowed for one attempt, request and body included, in milliseconds.
pub const REQUEST_TIMEOUT_MS: u64 = 10_000;

/// One GET against a storefront endpoint.
#[derive(Debug, Clone, Copy)]
pub struct FetchRequest<'a> {
    pub url: &'a str,
    /// Human name of the resource, used in fallback error messages ("best sellers").
    pub resource: &'a str,
    pub bearer_token: Option<&'a str>,
}

impl<'a> FetchRequest<'a> {
    pub fn new(url: &'a str, resource: &'a str) -> Self {
        Self {
            url,
            resource,
            bearer_token: None,
        }
    }

    pub fn with_bearer_token(mut self, token: Option<&'a str>) -> Self {
        self.bearer_token = token;
        self
    }
}

/// HTTP client that bounds every attempt with a timer and retries transient failures.
#[derive(Clone)]
pub struct FetchClient {
    client: Client,
    timeout: Duration,
    retry_delay: Duration,
}

impl FetchClient {
    /// Creates a new fetch client wrapping the given reqwest Client.
    pub fn new(client: Client) -> Self {
        Self {
            client,
            timeout: Duration::from_millis(REQUEST_TIMEOUT_MS),
            retry_delay: Duration::from_millis(RETRY_DELAY_MS),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_retry_delay(mut self, retry_delay: Duration) -> Self {
        self.retry_delay = retry_delay;
        self
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn retry_delay(&self) -> Duration {
        self.retry_delay
    }

    /// Performs a GET request and returns the parsed JSON body unchanged.
    /// Timeouts and network failures are retried up to `retries` times.
    #[tracing::instrument(skip(self, request), fields(url = request.url))]
    pub async fn get_json(&self, request: &FetchRequest<'_>, retries: u32) -> Result<Value, FetchError> {
        debug!("GET JSON from {}...", request.url);

        with_retry(request.resource, retries, self.retry_delay, || {
            self.get_json_once(request)
        })
        .await
    }

    /// Single attempt racing the exchange against the timer.
    async fn get_json_once(&self, request: &FetchRequest<'_>) -> Result<Value, FetchError> {
        match tokio::time::timeout(self.timeout, self.exchange(request)).await {
            Ok(result) => result,
            Err(_) => {
                debug!("GET {} aborted after {:?}", request.url, self.timeout);
                Err(FetchError::timeout(self.timeout))
            }
        }
    }

    async fn exchange(&self, request: &FetchRequest<'_>) -> Result<Value, FetchError> {
        let mut builder = self
            .client
            .get(request.url)
            .header(CONTENT_TYPE, "application/json");
        if let Some(token) = request.bearer_token {
            builder = builder.bearer_auth(token);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| classify_transport_error(&e, self.timeout))?;

        let status = response.status();
        if !status.is_success() {
            // An unreadable error body is treated like an empty one.
            let body = response.bytes().await.unwrap_or_default();
            return Err(http_error(status, &body, request.resource));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| classify_transport_error(&e, self.timeout))?;

        parse_body(&body, request.resource)
    }
}

/// Builds the error for a non-success response, preferring the server's `message`.
fn http_error(status: StatusCode, body: &[u8], resource: &str) -> FetchError {
    let error_data: Value =
        serde_json::from_slice(body).unwrap_or_else(|_| Value::Object(Default::default()));

    let message = error_data
        .get("message")
        .and_then(server_message)
        .unwrap_or_else(|| format!("Failed to fetch {}: {}", resource, status_text(status)));

    FetchError::http(status.as_u16(), message)
}

/// Renders a truthy scalar `message`; empty, zero, false, null and
/// structured values yield nothing.
fn server_message(message: &Value) -> Option<String> {
    match message {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) if n.as_f64() != Some(0.0) => Some(n.to_string()),
        Value::Bool(true) => Some("true".to_string()),
        _ => None,
    }
}

fn status_text(status: StatusCode) -> &'static str {
    status.canonical_reason().unwrap_or("Unknown Status")
}

/// Accepts only JSON objects and arrays.
fn parse_body(body: &[u8], resource: &str) -> Result<Value, FetchError> {
    let data: Value = serde_json::from_slice(body).map_err(|e| {
        debug!("Failed to parse {} response: {}", resource, e);
        FetchError::format(resource)
    })?;

    if data.is_object() || data.is_array() {
        Ok(data)
    } else {
        Err(FetchError::format(resource))
    }
}

#[cfg(test)]
pub(crate) mod test_server {
    //! A raw TCP server for timing scenarios mockito cannot express.

    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::{TcpListener, TcpStream};

    /// Spawns a server that never answers the first `stalls` connections and
    /// serves `body` as a 200 JSON response on the rest.
    /// Returns the base URL and a connection counter.
    pub async fn spawn_stalling_server(
        stalls: usize,
        body: &'static str,
    ) -> (String, Arc<AtomicUsize>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let connections = Arc::new(AtomicUsize::new(0));
        let counter = connections.clone();

        tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                let seen = counter.fetch_add(1, Ordering::SeqCst);
                if seen < stalls {
                    held.push(socket);
                    continue;
                }
                tokio::spawn(respond(socket, body));
            }
        });

        (format!("http://{}", addr), connections)
    }

    async fn respond(mut socket: TcpStream, body: &'static str) {
        let mut head = Vec::new();
        let mut buf = [0u8; 1024];
        while !head.windows(4).any(|w| w == b"\r\n\r\n") {
            match socket.read(&mut buf).await {
                Ok(0) | Err(_) => return,
                Ok(n) => head.extend_from_slice(&buf[..n]),
            }
        }

        let response = format!(
            "HTTP/1.1 200 OK\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
            body.len(),
            body
        );
        let _ = socket.write_all(response.as_bytes()).await;
        let _ = socket.shutdown().await;
    }
}
