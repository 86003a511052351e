//! Prometheus metrics for sync runs
//!
//! A sync is a one-shot batch job, so nothing is served over HTTP. The
//! registry is written once at the end of a run with [`write_metrics_file`],
//! in Prometheus text format, for a node-exporter textfile collector to pick
//! up.
//!
//! # Example Queries
//!
//! ```promql
//! # Runs that failed to fetch in the last day
//! increase(assetsync_runs_total{outcome="failed"}[1d])
//!
//! # Database syncs that fell back to files only
//! increase(assetsync_db_sync_total{result="failed"}[1d])
//! ```

use crate::{Error, Result};
use prometheus::{
    register_histogram_vec, register_int_counter, register_int_counter_vec, Encoder,
    HistogramVec, IntCounter, IntCounterVec, TextEncoder,
};
use std::path::Path;
use std::sync::LazyLock;

/// Records extracted from the Assets API.
pub static RECORDS_FETCHED_TOTAL: LazyLock<IntCounter> = LazyLock::new(|| {
    register_int_counter!(
        "assetsync_records_fetched_total",
        "Customer records extracted from the Assets API"
    )
    .expect("Failed to register assetsync_records_fetched_total metric")
});

/// Entries dropped for a missing id or label, or a repeated id.
pub static RECORDS_DROPPED_TOTAL: LazyLock<IntCounter> = LazyLock::new(|| {
    register_int_counter!(
        "assetsync_records_dropped_total",
        "Assets API entries dropped during extraction"
    )
    .expect("Failed to register assetsync_records_dropped_total metric")
});

/// Duration of each pipeline stage in seconds.
///
/// Labels:
/// - `stage`: fetch | database | backup
pub static STAGE_DURATION_SECONDS: LazyLock<HistogramVec> = LazyLock::new(|| {
    register_histogram_vec!(
        "assetsync_stage_duration_seconds",
        "Duration of sync pipeline stages in seconds",
        &["stage"],
        vec![0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0]
    )
    .expect("Failed to register assetsync_stage_duration_seconds metric")
});

/// Completed runs.
///
/// Labels:
/// - `outcome`: succeeded | failed
pub static RUNS_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    register_int_counter_vec!(
        "assetsync_runs_total",
        "Sync runs by outcome",
        &["outcome"]
    )
    .expect("Failed to register assetsync_runs_total metric")
});

/// Database stage results.
///
/// Labels:
/// - `result`: stored | failed | skipped
pub static DB_SYNC_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    register_int_counter_vec!(
        "assetsync_db_sync_total",
        "Database sync attempts by result",
        &["result"]
    )
    .expect("Failed to register assetsync_db_sync_total metric")
});

/// Force registration so every metric shows up even when never touched
pub fn init() {
    LazyLock::force(&RECORDS_FETCHED_TOTAL);
    LazyLock::force(&RECORDS_DROPPED_TOTAL);
    LazyLock::force(&STAGE_DURATION_SECONDS);
    LazyLock::force(&RUNS_TOTAL);
    LazyLock::force(&DB_SYNC_TOTAL);
}

/// Encode the default registry in Prometheus text format
pub fn render() -> Result<String> {
    let encoder = TextEncoder::new();
    let mut buffer = Vec::new();
    encoder
        .encode(&prometheus::gather(), &mut buffer)
        .map_err(|e| Error::Metrics(format!("cannot encode metrics: {}", e)))?;

    String::from_utf8(buffer).map_err(|e| Error::Metrics(format!("metrics are not UTF-8: {}", e)))
}

/// Write the registry to `path`, replacing it atomically
pub fn write_metrics_file(path: &Path) -> Result<()> {
    let body = render()?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    let mut temp = path.as_os_str().to_os_string();
    temp.push(".tmp");
    std::fs::write(&temp, body)?;
    std::fs::rename(&temp, path)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_metrics_registration() {
        init();
        let _ = STAGE_DURATION_SECONDS.with_label_values(&["fetch"]);
        let _ = RUNS_TOTAL.with_label_values(&["succeeded"]);
        let _ = DB_SYNC_TOTAL.with_label_values(&["skipped"]);
    }

    #[test]
    fn test_write_metrics_file() {
        init();
        RUNS_TOTAL.with_label_values(&["succeeded"]).inc();

        let dir = TempDir::new().unwrap();
        let path = dir.path().join("textfile").join("assetsync.prom");
        write_metrics_file(&path).unwrap();

        let body = std::fs::read_to_string(&path).unwrap();
        assert!(body.contains("# TYPE assetsync_runs_total counter"));
        assert!(body.contains("assetsync_runs_total{outcome=\"succeeded\"}"));
        assert!(body.contains("assetsync_records_fetched_total"));
    }

    #[test]
    fn test_render_failures_are_metrics_errors() {
        init();
        STAGE_DURATION_SECONDS
            .with_label_values(&["fetch"])
            .observe(0.25);
        let body = render().unwrap();
        assert!(body.contains("assetsync_stage_duration_seconds"));

        let err = Error::Metrics("cannot encode metrics: bad label".to_string());
        assert_eq!(
            err.to_string(),
            "Metrics error: cannot encode metrics: bad label"
        );
    }
}
