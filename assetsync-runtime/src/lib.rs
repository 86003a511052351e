//! # assetsync Runtime
//!
//! Runs one customer sync: fetch from the Assets API, replace the
//! `customers` table, then write the file backups. Also tracks the run
//! state and exports run metrics.

pub mod backup;
pub mod metrics;
pub mod pipeline;
pub mod state_machine;

// Re-export commonly used types
pub use backup::{read_customer_map, BackupPaths, BackupWriter, CustomerMap};
pub use pipeline::{
    store_in_database, AssetSource, CustomerSink, DatabaseSink, SyncPipeline, SyncReport,
};
pub use state_machine::{SyncState, SyncStateMachine};

/// Result type for runtime operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for runtime operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Fetch failed: {0}")]
    Fetch(#[from] assetsync_jira::Error),

    #[error("Backup error: {0}")]
    Backup(String),

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Metrics error: {0}")]
    Metrics(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
