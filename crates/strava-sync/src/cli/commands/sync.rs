//! Sync commands for strava-sync

use crate::config::AppConfig;
use crate::error::Result;
use crate::storage::{ActivitySink, SqliteSink, WriteMode};
use crate::sync::ActivitySync;

use super::auth::authorize;

/// Fetch the full activity history
pub async fn all(config: &AppConfig, mode: WriteMode) -> Result<()> {
    let (client, credentials) = authorize(config).await?;

    let sink = SqliteSink::open(&config.db_path)?;
    println!("Using database: {}", config.db_path.display());

    let mut sync = ActivitySync::new(client, sink);
    let table = sync.fetch_all_activities(&credentials, mode).await?;

    println!("Synced {} activities ({})", table.len(), mode);
    Ok(())
}

/// Fetch activities newer than the latest stored one
pub async fn new(config: &AppConfig, depth: usize) -> Result<()> {
    let (client, credentials) = authorize(config).await?;

    let sink = SqliteSink::open(&config.db_path)?;
    println!("Using database: {}", config.db_path.display());

    let mut sync = ActivitySync::new(client, sink);
    let table = sync.fetch_new_activities(&credentials, depth).await?;

    if table.is_empty() {
        println!("No new activities.");
    } else {
        println!("Added {} new activities:", table.len());
        for row in table.rows() {
            println!(
                "  {:<12} {}",
                row.id(),
                row.summary.name.as_deref().unwrap_or("Unnamed Activity")
            );
        }
    }

    Ok(())
}

/// Show what the database currently holds
pub async fn status(config: &AppConfig) -> Result<()> {
    if !config.db_path.exists() {
        println!("No database found at: {}", config.db_path.display());
        println!("Run 'strava sync all' to create one.");
        return Ok(());
    }

    let sink = SqliteSink::open(&config.db_path)?;
    let count = sink.count()?;

    println!("Database: {}", config.db_path.display());
    println!("Activities stored: {}", count);
    if count > 0 {
        println!("Latest activity id: {}", sink.latest_id()?);
    }

    Ok(())
}
