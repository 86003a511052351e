//! Restore command
//!
//! Loads a `customerMap.json` backup back into the customers table. Entries are
//! upserted one at a time, so rows missing from the backup are kept and a bad
//! entry is skipped without losing the others.

use anyhow::{Context, Result};
use assetsync_jira::RemoteAssetRecord;
use assetsync_runtime::read_customer_map;
use assetsync_storage::{CustomerRecord, CustomerStorage, DatabaseUrl};
use std::path::Path;
use tracing::{info, warn};

/// Prefix of the `objectKey` given to restored rows
const OBJECT_KEY_PREFIX: &str = "CD-";

/// Counts reported once a restore finishes
#[derive(Debug, Default, PartialEq, Eq)]
pub struct RestoreSummary {
    pub migrated: usize,
    pub skipped: usize,
}

pub async fn execute(map_file: &Path, database_url: &str) -> Result<()> {
    let map = read_customer_map(map_file)
        .with_context(|| format!("Failed to read {}", map_file.display()))?;

    info!(
        path = %map_file.display(),
        entries = map.records.len() + map.skipped,
        "Loaded customer map"
    );

    let mut summary = RestoreSummary {
        migrated: 0,
        skipped: map.skipped,
    };

    if map.records.is_empty() {
        print_summary(&summary, None);
        return Ok(());
    }

    let url = DatabaseUrl::parse(database_url)?;
    let storage = CustomerStorage::connect(&url).await?;

    let result = restore_all(&storage, &map.records, &mut summary).await;
    let total = match &result {
        Ok(()) => storage.count_customers().await.ok(),
        Err(_) => None,
    };
    storage.close().await;
    result.context("Failed to restore customers")?;

    print_summary(&summary, total);
    Ok(())
}

async fn restore_all(
    storage: &CustomerStorage,
    records: &[RemoteAssetRecord],
    summary: &mut RestoreSummary,
) -> assetsync_storage::Result<()> {
    for record in records {
        match storage.upsert_customer(&restored_record(record)).await {
            Ok(()) => summary.migrated += 1,
            Err(e) if aborts_restore(&e) => return Err(e),
            Err(e) => {
                warn!(object_id = %record.object_id, error = %e, "Skipping customer");
                summary.skipped += 1;
            }
        }
    }
    Ok(())
}

/// Whether an error leaves no point in trying the remaining entries
fn aborts_restore(error: &assetsync_storage::Error) -> bool {
    matches!(
        error,
        assetsync_storage::Error::MissingTable(_)
            | assetsync_storage::Error::ConnectionFailed(_)
            | assetsync_storage::Error::PoolExhausted(_)
    )
}

/// Row written for one map entry
pub fn restored_record(record: &RemoteAssetRecord) -> CustomerRecord {
    CustomerRecord::new(&record.object_id, &record.label)
        .with_object_key(format!("{}{}", OBJECT_KEY_PREFIX, record.object_id))
}

fn print_summary(summary: &RestoreSummary, total: Option<i64>) {
    println!("Migration completed");
    println!("  Migrated: {}", summary.migrated);
    println!("  Skipped:  {}", summary.skipped);
    if let Some(total) = total {
        println!("  Total in DB: {}", total);
    }
}
