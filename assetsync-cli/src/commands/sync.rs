//! Sync command

use crate::config::{require_database_url, FetchSettings};
use anyhow::{Context, Result};
use assetsync_jira::AssetsClient;
use assetsync_runtime::{metrics, BackupWriter, DatabaseSink, SyncPipeline};
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

/// Prefix of the log line for a run that did not complete
pub const FAILURE_PREFIX: &str = "Failed to fetch customer data";

/// Arguments for a sync run
#[derive(Debug, Clone, clap::Args)]
pub struct SyncArgs {
    #[command(flatten)]
    pub fetch: FetchSettings,

    /// Directory for customers.csv and customerMap.json
    #[arg(long, env = "ASSETSYNC_OUTPUT_DIR", default_value = "data")]
    pub output_dir: PathBuf,

    /// Write the backup files only, leaving the database alone
    #[arg(long)]
    pub skip_db: bool,
}

/// Run one sync.
///
/// Configuration problems are returned as errors. Once the pipeline starts,
/// a failed run is logged and still returns `Ok`.
pub async fn execute(
    args: &SyncArgs,
    database_url: Option<&str>,
    metrics_file: Option<&Path>,
) -> Result<()> {
    let jira_config = args
        .fetch
        .jira_config()
        .context("Invalid Jira configuration")?;
    let database_url = sink_url(args, database_url)?;

    let client = AssetsClient::new(jira_config)?;
    let mut pipeline = SyncPipeline::new(client, BackupWriter::new(&args.output_dir));
    if let Some(url) = database_url {
        pipeline = pipeline.with_sink(DatabaseSink::new(url));
    }

    metrics::init();
    info!("Fetching customers from Jira Assets");

    match pipeline.run().await {
        Ok(report) => {
            info!(
                fetched = report.fetched,
                dropped = report.dropped,
                pages = report.pages,
                db_stored = ?report.db_stored,
                csv = %report.backups.csv.display(),
                map = %report.backups.map.display(),
                duration_ms = report.duration.as_millis() as u64,
                "Customer sync complete"
            );
        }
        Err(e) => {
            error!("{}: {}", FAILURE_PREFIX, e);
        }
    }

    if let Some(path) = metrics_file {
        if let Err(e) = metrics::write_metrics_file(path) {
            warn!(path = %path.display(), error = %e, "Failed to write metrics file");
        }
    }

    Ok(())
}

/// Database URL for the sink, or `None` with `--skip-db`
fn sink_url(args: &SyncArgs, database_url: Option<&str>) -> Result<Option<String>> {
    if args.skip_db {
        return Ok(None);
    }
    let url = require_database_url(database_url).context("Set DATABASE_URL or pass --skip-db")?;
    Ok(Some(url.to_string()))
}
