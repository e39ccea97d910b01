//! Users adapter for the seller dashboard: `GET /api/v1/users[/{id}]`.

use reqwest::Url;
use serde_json::Value;

use crate::http::{FetchClient, FetchError, FetchErrorKind, FetchRequest};

pub const USERS_PATH: &str = "/api/v1/users";

#[derive(Clone)]
pub struct UsersApi {
    client: FetchClient,
    endpoint: String,
    token: Option<String>,
}

impl UsersApi {
    /// `token` is sent as a bearer token on every request when present.
    pub fn new(client: FetchClient, base_url: &str, token: Option<String>) -> Self {
        Self {
            client,
            endpoint: format!("{}{}", base_url.trim_end_matches('/'), USERS_PATH),
            token,
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Lists all users.
    #[tracing::instrument(skip(self))]
    pub async fn get_all_users(&self, retries: u32) -> Result<Value, FetchError> {
        let request =
            FetchRequest::new(&self.endpoint, "users").with_bearer_token(self.token.as_deref());
        self.client.get_json(&request, retries).await
    }

    /// Fetches one user. The id is percent-encoded as a single path segment.
    #[tracing::instrument(skip(self))]
    pub async fn get_user_by_id(&self, user_id: &str, retries: u32) -> Result<Value, FetchError> {
        let url = self.user_url(user_id)?;
        let request = FetchRequest::new(&url, "user").with_bearer_token(self.token.as_deref());
        self.client.get_json(&request, retries).await
    }

    fn user_url(&self, user_id: &str) -> Result<String, FetchError> {
        let invalid = |detail: String| {
            FetchError::new(FetchErrorKind::Request, format!("Invalid request: {}", detail))
        };

        let mut url = Url::parse(&self.endpoint).map_err(|e| invalid(e.to_string()))?;
        url.path_segments_mut()
            .map_err(|_| invalid(format!("{} cannot take a path", self.endpoint)))?
            .push(user_id);

        Ok(url.into())
    }
}
