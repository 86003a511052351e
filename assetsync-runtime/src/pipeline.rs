//! Sync pipeline
//!
//! One run moves through fetch, database and file backup stages in order:
//!
//! 1. Fetch every configured page from the [`AssetSource`]. A failure aborts
//!    the run before any backup is touched.
//! 2. Replace the customers table through the [`CustomerSink`]. Failures are
//!    logged and recorded in the report; they never abort the run. An empty
//!    fetch skips this stage so the table is never wiped by an empty result.
//! 3. Write the CSV and JSON backups.

use crate::backup::{BackupPaths, BackupWriter};
use crate::metrics::{
    DB_SYNC_TOTAL, RECORDS_DROPPED_TOTAL, RECORDS_FETCHED_TOTAL, RUNS_TOTAL,
    STAGE_DURATION_SECONDS,
};
use crate::state_machine::{SyncState, SyncStateMachine};
use crate::{Error, Result};
use assetsync_jira::{AssetsClient, FetchOutcome, RemoteAssetRecord};
use assetsync_storage::{
    CustomerRecord, CustomerStorage, DatabaseUrl, PoolConfig, ReplaceSummary,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::time::{Duration, Instant};
use tracing::{error, info, instrument, warn};

/// Source of customer records
#[async_trait]
pub trait AssetSource: Send + Sync {
    async fn fetch_records(&self) -> assetsync_jira::Result<FetchOutcome>;
}

#[async_trait]
impl AssetSource for AssetsClient {
    async fn fetch_records(&self) -> assetsync_jira::Result<FetchOutcome> {
        self.fetch().await
    }
}

/// Destination that holds exactly the last synced record set
#[async_trait]
pub trait CustomerSink: Send + Sync {
    async fn replace_all(
        &self,
        records: &[RemoteAssetRecord],
    ) -> assetsync_storage::Result<ReplaceSummary>;
}

/// Sink backed by the `customers` table
///
/// The URL is parsed on use, so a malformed `DATABASE_URL` fails only the
/// database stage.
pub struct DatabaseSink {
    database_url: String,
    pool_config: PoolConfig,
}

impl DatabaseSink {
    pub fn new(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            pool_config: PoolConfig::default(),
        }
    }

    pub fn with_pool_config(mut self, pool_config: PoolConfig) -> Self {
        self.pool_config = pool_config;
        self
    }
}

#[async_trait]
impl CustomerSink for DatabaseSink {
    async fn replace_all(
        &self,
        records: &[RemoteAssetRecord],
    ) -> assetsync_storage::Result<ReplaceSummary> {
        let url = DatabaseUrl::parse(&self.database_url)?;
        let storage = CustomerStorage::connect_with(&url, self.pool_config.clone()).await?;

        let result = storage
            .replace_customers(&to_customer_records(records))
            .await;
        storage.close().await;

        result
    }
}

/// Map fetched records to table rows; the label becomes the name
pub fn to_customer_records(records: &[RemoteAssetRecord]) -> Vec<CustomerRecord> {
    records
        .iter()
        .map(|r| CustomerRecord::new(r.object_id.clone(), r.label.clone()))
        .collect()
}

/// Replace the sink's contents with `records`
///
/// Never fails: every error is logged and reported as `false`.
pub async fn store_in_database(sink: &dyn CustomerSink, records: &[RemoteAssetRecord]) -> bool {
    match sink.replace_all(records).await {
        Ok(summary) => {
            info!(
                deleted = summary.deleted,
                upserted = summary.upserted,
                "Stored customers in database"
            );
            true
        }
        Err(e) => {
            error!(error = %e, "Failed to store customers in database");
            false
        }
    }
}

/// What a completed run did
#[derive(Debug, Clone)]
pub struct SyncReport {
    /// Records kept after extraction
    pub fetched: usize,
    /// Entries dropped during extraction
    pub dropped: usize,
    /// Pages requested
    pub pages: u32,
    /// `None` when the database stage was skipped
    pub db_stored: Option<bool>,
    pub backups: BackupPaths,
    pub duration: Duration,
    pub history: Vec<(SyncState, DateTime<Utc>)>,
}

/// Fetch, database and backup stages wired together
pub struct SyncPipeline {
    source: Box<dyn AssetSource>,
    sink: Option<Box<dyn CustomerSink>>,
    backups: BackupWriter,
}

impl SyncPipeline {
    /// Pipeline without a database stage
    pub fn new(source: impl AssetSource + 'static, backups: BackupWriter) -> Self {
        Self {
            source: Box::new(source),
            sink: None,
            backups,
        }
    }

    pub fn with_sink(mut self, sink: impl CustomerSink + 'static) -> Self {
        self.sink = Some(Box::new(sink));
        self
    }

    /// Execute one run
    #[instrument(skip(self), fields(output_dir = %self.backups.dir().display()))]
    pub async fn run(&self) -> Result<SyncReport> {
        let started = Instant::now();
        let mut state = SyncStateMachine::new();

        // ========== Fetch ==========
        state.transition(SyncState::Fetching)?;
        let timer = STAGE_DURATION_SECONDS
            .with_label_values(&["fetch"])
            .start_timer();
        let outcome = match self.source.fetch_records().await {
            Ok(outcome) => outcome,
            Err(e) => {
                timer.observe_duration();
                state.transition(SyncState::Failed)?;
                RUNS_TOTAL.with_label_values(&["failed"]).inc();
                return Err(Error::Fetch(e));
            }
        };
        timer.observe_duration();

        RECORDS_FETCHED_TOTAL.inc_by(outcome.records.len() as u64);
        RECORDS_DROPPED_TOTAL.inc_by(outcome.dropped as u64);
        info!(
            records = outcome.records.len(),
            dropped = outcome.dropped,
            "Found customers"
        );

        // ========== Database ==========
        state.transition(SyncState::PersistingDb)?;
        let db_stored = match &self.sink {
            Some(sink) if !outcome.records.is_empty() => {
                let timer = STAGE_DURATION_SECONDS
                    .with_label_values(&["database"])
                    .start_timer();
                let stored = store_in_database(sink.as_ref(), &outcome.records).await;
                timer.observe_duration();

                if !stored {
                    warn!("Failed to store in database, falling back to file backups");
                }
                Some(stored)
            }
            Some(_) => {
                info!("No customers fetched; leaving the customers table untouched");
                None
            }
            None => {
                info!("Database sync disabled");
                None
            }
        };
        let db_result = match db_stored {
            Some(true) => "stored",
            Some(false) => "failed",
            None => "skipped",
        };
        DB_SYNC_TOTAL.with_label_values(&[db_result]).inc();

        // ========== Files ==========
        state.transition(SyncState::PersistingFiles)?;
        let timer = STAGE_DURATION_SECONDS
            .with_label_values(&["backup"])
            .start_timer();
        let backups = match self.backups.write_backups(&outcome.records) {
            Ok(paths) => paths,
            Err(e) => {
                timer.observe_duration();
                state.transition(SyncState::Failed)?;
                RUNS_TOTAL.with_label_values(&["failed"]).inc();
                return Err(e);
            }
        };
        timer.observe_duration();

        state.transition(SyncState::Done)?;
        RUNS_TOTAL.with_label_values(&["succeeded"]).inc();

        Ok(SyncReport {
            fetched: outcome.records.len(),
            dropped: outcome.dropped,
            pages: outcome.pages,
            db_stored,
            backups,
            duration: started.elapsed(),
            history: state.history().to_vec(),
        })
    }
}
