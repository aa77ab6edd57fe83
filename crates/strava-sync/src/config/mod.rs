mod credentials;

pub use credentials::{FileTokenStore, TokenStore};

use crate::client::StravaClient;
use crate::error::{Result, StravaError};
use std::path::{Path, PathBuf};

/// Default data directory name
const DATA_DIR_NAME: &str = "strava-sync";

/// Default credential file name
const TOKEN_FILENAME: &str = "strava_tokens.json";

/// Default SQLite database file name
const DB_FILENAME: &str = "activities.db";

pub const DEFAULT_API_URL: &str = "https://www.strava.com/api/v3";
pub const DEFAULT_OAUTH_URL: &str = "https://www.strava.com/oauth/token";

/// Get the data directory path for tokens and the activity database
/// Returns ~/.local/share/strava-sync on Unix, ~/Library/Application Support/strava-sync on macOS
pub fn data_dir() -> Result<PathBuf> {
    dirs::data_dir()
        .map(|p| p.join(DATA_DIR_NAME))
        .ok_or_else(|| StravaError::config("Could not determine data directory"))
}

/// Ensure a directory exists, creating it if necessary
pub fn ensure_dir(path: &Path) -> Result<()> {
    if !path.exists() {
        std::fs::create_dir_all(path)?;
    }
    Ok(())
}

/// Resolved runtime configuration, assembled from flags, env vars and defaults
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub token_path: PathBuf,
    pub db_path: PathBuf,
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub api_url: String,
    pub oauth_url: String,
}

impl AppConfig {
    /// Fill in unset paths and URLs with the defaults
    pub fn resolve(
        token_path: Option<PathBuf>,
        db_path: Option<PathBuf>,
        client_id: Option<String>,
        client_secret: Option<String>,
        api_url: Option<String>,
        oauth_url: Option<String>,
    ) -> Result<Self> {
        let token_path = match token_path {
            Some(p) => p,
            None => data_dir()?.join(TOKEN_FILENAME),
        };
        let db_path = match db_path {
            Some(p) => p,
            None => data_dir()?.join(DB_FILENAME),
        };

        Ok(Self {
            token_path,
            db_path,
            client_id,
            client_secret,
            api_url: api_url.unwrap_or_else(|| DEFAULT_API_URL.to_string()),
            oauth_url: oauth_url.unwrap_or_else(|| DEFAULT_OAUTH_URL.to_string()),
        })
    }

    /// Build an API client; the OAuth application credentials must be set
    pub fn client(&self) -> Result<StravaClient> {
        let client_id = self
            .client_id
            .clone()
            .ok_or_else(|| StravaError::config("STRAVA_CLIENT_ID is not set"))?;
        let client_secret = self
            .client_secret
            .clone()
            .ok_or_else(|| StravaError::config("STRAVA_CLIENT_SECRET is not set"))?;

        StravaClient::with_base_urls(client_id, client_secret, &self.api_url, &self.oauth_url)
    }

    /// Credential store backed by the configured token file
    pub fn token_store(&self) -> FileTokenStore {
        FileTokenStore::new(self.token_path.clone())
    }
}
