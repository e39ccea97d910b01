//! Runtime configuration and construction of the API clients.

use anyhow::{Context, Result};
use log::debug;
use reqwest::Client;
use std::time::Duration;

use crate::api::{BestSellersApi, UsersApi};
use crate::http::{DEFAULT_RETRIES, FetchClient, REQUEST_TIMEOUT_MS, RETRY_DELAY_MS};

/// Backend used when no API URL is given.
pub const DEFAULT_API_URL: &str = "http://localhost:8080";

pub struct Config {
    pub api_url: String,
    /// Bearer token for authenticated endpoints (users).
    pub token: Option<String>,
    pub timeout: Duration,
    pub retry_delay: Duration,
    pub retries: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            token: None,
            timeout: Duration::from_millis(REQUEST_TIMEOUT_MS),
            retry_delay: Duration::from_millis(RETRY_DELAY_MS),
            retries: DEFAULT_RETRIES,
        }
    }
}

impl Config {
    pub fn new(api_url: Option<String>, token: Option<String>) -> Self {
        if let Some(token) = token.as_deref() {
            debug!("Using token for authentication: {}", mask_token(token));
        }

        Self {
            api_url: api_url.unwrap_or_else(|| DEFAULT_API_URL.to_string()),
            token,
            ..Self::default()
        }
    }

    pub fn fetch_client(&self) -> Result<FetchClient> {
        Ok(FetchClient::new(build_http_client()?)
            .with_timeout(self.timeout)
            .with_retry_delay(self.retry_delay))
    }

    pub fn best_sellers_api(&self) -> Result<BestSellersApi> {
        Ok(BestSellersApi::new(self.fetch_client()?, &self.api_url))
    }

    pub fn users_api(&self) -> Result<UsersApi> {
        Ok(UsersApi::new(
            self.fetch_client()?,
            &self.api_url,
            self.token.clone(),
        ))
    }
}

/// Build the shared reqwest client.
pub fn build_http_client() -> Result<Client> {
    Client::builder()
        .user_agent("shopfetch-cli")
        .build()
        .context("Failed to build HTTP client")
}

fn mask_token(token: &str) -> String {
    let visible: String = token.chars().take(4).collect();
    if token.chars().count() > 8 {
        format!("{}*********", visible)
    } else {
        "*********".to_string()
    }
}
