use std::path::PathBuf;

use clap::{Parser, Subcommand};
use strava_sync::cli::commands;
use strava_sync::config::AppConfig;
use strava_sync::prepare::{DEFAULT_CACHE_PATH, DEFAULT_RAW_PATH};
use strava_sync::storage::WriteMode;
use strava_sync::sync::DEFAULT_DEPTH;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "strava")]
#[command(author, version, about = "Sync Strava activities into a local database", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[command(flatten)]
    global: GlobalOptions,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(clap::Args)]
struct GlobalOptions {
    /// Token file (defaults to the data directory)
    #[arg(long, global = true, env = "STRAVA_TOKENS")]
    tokens: Option<PathBuf>,

    /// SQLite database file (defaults to the data directory)
    #[arg(long, global = true, env = "STRAVA_DB")]
    db: Option<PathBuf>,

    /// Strava application client id
    #[arg(long, global = true, env = "STRAVA_CLIENT_ID", hide_env_values = true)]
    client_id: Option<String>,

    /// Strava application client secret
    #[arg(long, global = true, env = "STRAVA_CLIENT_SECRET", hide_env_values = true)]
    client_secret: Option<String>,

    /// Override the API base URL
    #[arg(long, global = true, env = "STRAVA_API_URL")]
    api_url: Option<String>,

    /// Override the token refresh endpoint
    #[arg(long, global = true, env = "STRAVA_OAUTH_URL")]
    oauth_url: Option<String>,
}

impl GlobalOptions {
    fn config(self) -> strava_sync::Result<AppConfig> {
        AppConfig::resolve(
            self.tokens,
            self.db,
            self.client_id,
            self.client_secret,
            self.api_url,
            self.oauth_url,
        )
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Authentication commands
    Auth {
        #[command(subcommand)]
        command: AuthCommands,
    },
    /// Sync activities to the local database
    Sync {
        #[command(subcommand)]
        command: SyncCommands,
    },
    /// Clean an offline activity export into a runs table
    Prepare {
        /// Cached copy of the raw export
        #[arg(long, default_value = DEFAULT_CACHE_PATH)]
        cache: PathBuf,

        /// Raw Strava bulk export CSV
        #[arg(long, default_value = DEFAULT_RAW_PATH)]
        raw: PathBuf,

        /// Write the cleaned CSV here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
enum AuthCommands {
    /// Show token status without contacting Strava
    Status,
    /// Refresh the access token if it has expired
    Refresh,
}

#[derive(Subcommand)]
enum SyncCommands {
    /// Fetch the whole activity history
    All {
        /// How to treat an existing activities table
        #[arg(long, value_enum, default_value_t = WriteMode::Replace)]
        mode: WriteMode,
    },
    /// Fetch activities newer than the latest stored one
    New {
        /// Number of latest activities to examine
        #[arg(long, default_value_t = DEFAULT_DEPTH)]
        depth: usize,
    },
    /// Show database status
    Status,
}

fn init_tracing(verbose: bool) {
    let default = if verbose {
        "strava_sync=debug"
    } else {
        "strava_sync=info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli) -> strava_sync::Result<()> {
    match cli.command {
        Commands::Auth { command } => {
            let config = cli.global.config()?;
            match command {
                AuthCommands::Status => commands::auth_status(&config).await,
                AuthCommands::Refresh => commands::auth_refresh(&config).await,
            }
        }
        Commands::Sync { command } => {
            let config = cli.global.config()?;
            match command {
                SyncCommands::All { mode } => commands::sync_all(&config, mode).await,
                SyncCommands::New { depth } => commands::sync_new(&config, depth).await,
                SyncCommands::Status => commands::sync_status(&config).await,
            }
        }
        Commands::Prepare { cache, raw, output } => {
            commands::prepare_run(&cache, &raw, output.as_deref())
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> strava_sync::Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(e) = run(cli).await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    Ok(())
}
