use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::client::StravaClient;
use crate::config::TokenStore;
use crate::error::Result;

/// OAuth2 credential record for the Strava API.
///
/// Any extra fields returned by the authorization endpoint (`token_type`,
/// `expires_in`, ...) are carried along so the persisted record matches the
/// response body.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Credentials {
    pub access_token: String,
    pub refresh_token: String,
    /// Unix timestamp (seconds)
    pub expires_at: i64,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Credentials {
    pub fn new(
        access_token: impl Into<String>,
        refresh_token: impl Into<String>,
        expires_at: i64,
    ) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token: refresh_token.into(),
            expires_at,
            extra: serde_json::Map::new(),
        }
    }

    /// Check if the access token has expired (expiry at or before now).
    pub fn is_expired(&self) -> bool {
        self.expires_at <= Utc::now().timestamp()
    }

    /// Seconds until expiry, negative once expired
    pub fn expires_in(&self) -> i64 {
        self.expires_at - Utc::now().timestamp()
    }
}

/// Hands out a usable access token, refreshing it through the authorization
/// endpoint when the stored one has expired.
pub struct TokenProvider<S: TokenStore> {
    store: S,
    client: StravaClient,
}

impl<S: TokenStore> TokenProvider<S> {
    pub fn new(store: S, client: StravaClient) -> Self {
        Self { store, client }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Load the stored record, exchanging the refresh token first if expired.
    ///
    /// The new record fully replaces the old one in the store.
    pub async fn get_token(&self) -> Result<Credentials> {
        let credentials = self.store.load()?;

        if !credentials.is_expired() {
            return Ok(credentials);
        }

        info!(expires_at = credentials.expires_at, "Refreshing access token");
        let refreshed = self.client.refresh_token(&credentials.refresh_token).await?;
        self.store.save(&refreshed)?;
        info!(expires_at = refreshed.expires_at, "Stored refreshed access token");

        Ok(refreshed)
    }
}
