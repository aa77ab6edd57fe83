//! Authentication commands for strava-sync

use crate::client::{Credentials, StravaClient, TokenProvider};
use crate::config::{AppConfig, TokenStore};
use crate::error::Result;

/// Show whether the stored access token is still valid
pub async fn status(config: &AppConfig) -> Result<()> {
    let store = config.token_store();

    if !store.exists() {
        println!("Status: No credentials");
        println!("Expected token file at: {}", store.path().display());
        return Ok(());
    }

    let credentials = store.load()?;
    println!("Status: Credentials found");
    println!("Token file: {}", store.path().display());

    if credentials.is_expired() {
        println!("Access Token: Expired (will refresh on next request)");
    } else {
        let expires_in = credentials.expires_in();
        if expires_in > 3600 {
            println!("Access Token: Valid (expires in {} hours)", expires_in / 3600);
        } else if expires_in > 60 {
            println!("Access Token: Valid (expires in {} minutes)", expires_in / 60);
        } else {
            println!("Access Token: Valid (expires in {} seconds)", expires_in);
        }
    }

    Ok(())
}

/// Refresh the access token now if it has expired
pub async fn refresh(config: &AppConfig) -> Result<()> {
    let (_, credentials) = authorize(config).await?;
    println!(
        "Access Token: Valid (expires in {} minutes)",
        credentials.expires_in() / 60
    );
    Ok(())
}

/// Build the API client and obtain a valid access token
pub async fn authorize(config: &AppConfig) -> Result<(StravaClient, Credentials)> {
    let client = config.client()?;
    let provider = TokenProvider::new(config.token_store(), client.clone());
    let credentials = provider.get_token().await?;
    Ok((client, credentials))
}
