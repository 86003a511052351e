//! assetsync CLI tool

use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod commands;
mod config;

use commands::fetch::OutputFormat;
use commands::sync::SyncArgs;
use config::{require_database_url, FetchSettings};

#[derive(Parser)]
#[command(name = "assetsync")]
#[command(
    author,
    version,
    about = "Mirror Jira Assets customers into PostgreSQL and local backups",
    long_about = None
)]
#[command(args_conflicts_with_subcommands = true)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Arguments for `sync` when no subcommand is given
    #[command(flatten)]
    sync: SyncArgs,

    /// Settings file loaded into the environment (default: .env if present)
    #[arg(long, global = true)]
    env_file: Option<PathBuf>,

    /// Database URL
    #[arg(long, global = true, env = "DATABASE_URL", hide_env_values = true)]
    database_url: Option<String>,

    /// Write Prometheus metrics to this file after a sync
    #[arg(long, global = true, env = "ASSETSYNC_METRICS_FILE")]
    metrics_file: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    json_logs: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch customers, replace the customers table and write backups (default)
    Sync(SyncArgs),

    /// Fetch customers and print them without storing anything
    Fetch {
        #[command(flatten)]
        settings: FetchSettings,

        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,
    },

    /// Upsert every entry of a customerMap.json backup into the database
    Restore {
        /// Mapping file to load (default: <output-dir>/customerMap.json)
        #[arg(long)]
        map_file: Option<PathBuf>,

        /// Directory holding the backups
        #[arg(long, env = "ASSETSYNC_OUTPUT_DIR", default_value = "data")]
        output_dir: PathBuf,
    },

    /// Show how many customers the database holds
    Count {
        /// Also list the first N customers
        #[arg(long, value_name = "N")]
        list: Option<i64>,
    },

    /// Look up a single object in Jira Assets
    Inspect {
        /// Object id to look up
        object_id: String,

        #[command(flatten)]
        settings: FetchSettings,
    },
}

fn init_tracing(verbose: bool, json: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let registry = tracing_subscriber::registry().with(env_filter);
    if json {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let env_file = config::load_env_file(cli.env_file.as_deref())?;

    // Parse again so `env` defaults see values from the settings file
    let cli = if env_file.is_some() { Cli::parse() } else { cli };

    init_tracing(cli.verbose, cli.json_logs);
    if let Some(path) = &env_file {
        tracing::debug!(path = %path.display(), "Loaded settings file");
    }

    let command = cli.command.unwrap_or(Commands::Sync(cli.sync));

    // Execute command
    match command {
        Commands::Sync(args) => {
            commands::sync::execute(
                &args,
                cli.database_url.as_deref(),
                cli.metrics_file.as_deref(),
            )
            .await?;
        }
        Commands::Fetch { settings, format } => {
            commands::fetch::execute(&settings, format).await?;
        }
        Commands::Restore {
            map_file,
            output_dir,
        } => {
            let database_url = require_database_url(cli.database_url.as_deref())?;
            let map_file = map_file.unwrap_or_else(|| output_dir.join("customerMap.json"));
            commands::restore::execute(&map_file, database_url).await?;
        }
        Commands::Count { list } => {
            let database_url = require_database_url(cli.database_url.as_deref())?;
            commands::count::execute(database_url, list)
                .await
                .context("Failed to check customers table")?;
        }
        Commands::Inspect {
            object_id,
            settings,
        } => {
            commands::inspect::execute(&settings, &object_id).await?;
        }
    }

    Ok(())
}
