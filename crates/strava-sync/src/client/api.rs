//! Strava API client
//!
//! Covers the two calls the sync needs: the OAuth token exchange and the
//! athlete activity listing.

use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::client::tokens::Credentials;
use crate::config::{DEFAULT_API_URL, DEFAULT_OAUTH_URL};
use crate::error::{Result, StravaError};

/// Page size used for full pagination
pub const PAGE_SIZE: u32 = 200;

/// Strava API client
#[derive(Clone)]
pub struct StravaClient {
    client: Client,
    api_url: String,
    oauth_url: String,
    client_id: String,
    client_secret: String,
}

impl StravaClient {
    /// Create a client against the public Strava endpoints
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Result<Self> {
        Self::with_base_urls(client_id, client_secret, DEFAULT_API_URL, DEFAULT_OAUTH_URL)
    }

    /// Create a client with custom endpoints (used by tests and `--api-url`)
    pub fn with_base_urls(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        api_url: &str,
        oauth_url: &str,
    ) -> Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .map_err(StravaError::Http)?;

        Ok(Self {
            client,
            api_url: api_url.trim_end_matches('/').to_string(),
            oauth_url: oauth_url.to_string(),
            client_id: client_id.into(),
            client_secret: client_secret.into(),
        })
    }

    /// Build the full URL for a given path
    fn build_url(&self, path: &str) -> String {
        format!("{}{}", self.api_url, path)
    }

    /// Exchange a refresh token for a new access/refresh token pair
    pub async fn refresh_token(&self, refresh_token: &str) -> Result<Credentials> {
        let response = self
            .client
            .post(&self.oauth_url)
            .form(&[
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
                ("grant_type", "refresh_token"),
                ("refresh_token", refresh_token),
            ])
            .send()
            .await
            .map_err(|e| StravaError::auth(format!("Token refresh request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StravaError::auth(format!(
                "Token refresh rejected ({}): {}",
                status, body
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| StravaError::auth(format!("Failed to read token response: {}", e)))?;

        serde_json::from_str(&body)
            .map_err(|e| StravaError::auth(format!("Undecodable token response: {}", e)))
    }

    /// Fetch one page of the athlete's activities, newest first
    pub async fn list_activities(
        &self,
        token: &Credentials,
        page: u32,
        per_page: u32,
    ) -> Result<Vec<serde_json::Value>> {
        debug!(page, per_page, "Requesting activity page");
        self.get_json(
            token,
            "/activities",
            &[("per_page", per_page.to_string()), ("page", page.to_string())],
        )
        .await
    }

    /// Fetch the most recent activities with the server's default page size
    pub async fn latest_activities(&self, token: &Credentials) -> Result<Vec<serde_json::Value>> {
        debug!("Requesting latest activities");
        self.get_json(token, "/activities", &[]).await
    }

    /// Make an authenticated GET request and deserialize the JSON response
    async fn get_json<T: DeserializeOwned>(
        &self,
        token: &Credentials,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T> {
        let response = self
            .client
            .get(self.build_url(path))
            .query(&[("access_token", token.access_token.as_str())])
            .query(query)
            .send()
            .await
            .map_err(StravaError::Http)?;

        let response = self.handle_response_status(response).await?;
        response.json().await.map_err(|e| {
            StravaError::data(format!("Failed to parse JSON response: {}", e))
        })
    }

    /// Handle response status codes and convert to errors
    async fn handle_response_status(&self, response: Response) -> Result<Response> {
        let status = response.status();

        match status {
            StatusCode::OK => Ok(response),
            _ => {
                let body = response.text().await.unwrap_or_default();
                Err(StravaError::Api {
                    status: status.as_u16(),
                    message: body,
                })
            }
        }
    }
}
