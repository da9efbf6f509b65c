mod commands;
mod render;
mod utils;

use std::path::PathBuf;

use anyhow::Result;
use calday_core::engine::Engine;
use calday_core::store::EventStore;
use chrono::{Duration, Local, NaiveDate};
use clap::{Parser, Subcommand};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[derive(Parser)]
#[command(name = "calday")]
#[command(about = "Show what is on your ICS calendar feed, day by day")]
struct Cli {
    /// State file holding settings and cached events
    #[arg(long, global = true)]
    state: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch the feed now and replace the cached events
    Refresh,
    /// Show the events on a day
    Day {
        /// YYYY-MM-DD, "today", "tomorrow" or "yesterday" (default: today)
        date: Option<String>,

        /// Refresh before showing the day
        #[arg(short, long)]
        refresh: bool,
    },
    /// Show every field of one event
    Show {
        uid: String,

        /// Print the event as JSON
        #[arg(long)]
        json: bool,
    },
    /// Refresh on startup and every 12 hours until interrupted
    Watch,
    /// Show or change settings
    Config {
        #[command(subcommand)]
        action: Option<ConfigAction>,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Set one setting, e.g. `calday config set ics_url https://...`
    Set { key: String, value: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logging()?;

    let cli = Cli::parse();
    let store = match cli.state {
        Some(path) => EventStore::new(path),
        None => EventStore::new(EventStore::default_path()?),
    };

    match cli.command {
        Commands::Config { action: None } => commands::config::run(&store).await,
        Commands::Config {
            action: Some(ConfigAction::Set { key, value }),
        } => commands::config::set(&store, &key, &value).await,
        Commands::Refresh => commands::refresh::run(&Engine::open(store).await?).await,
        Commands::Day { date, refresh } => {
            let date = parse_day(date.as_deref())?;
            commands::day::run(&Engine::open(store).await?, date, refresh).await
        }
        Commands::Show { uid, json } => {
            commands::show::run(&Engine::open(store).await?, &uid, json).await
        }
        Commands::Watch => commands::watch::run(&Engine::open(store).await?).await,
    }
}

/// Log to stderr; `RUST_LOG` overrides the default filter.
fn init_logging() -> Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("warn,calday=info,calday_core=info")),
        )
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| anyhow::anyhow!("Failed to set up logging: {}", e))
}

fn parse_day(arg: Option<&str>) -> Result<NaiveDate> {
    let today = Local::now().date_naive();

    match arg.map(str::trim) {
        None | Some("today") => Ok(today),
        Some("tomorrow") => Ok(today + Duration::days(1)),
        Some("yesterday") => Ok(today - Duration::days(1)),
        Some(s) => NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .map_err(|_| anyhow::anyhow!("Invalid date '{}'. Expected YYYY-MM-DD", s)),
    }
}
