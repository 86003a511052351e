//! # assetsync Storage
//!
//! PostgreSQL access for the `customers` table that mirrors the Assets
//! catalog. Every write runs inside a single transaction.

pub mod connection;
pub mod models;
pub mod postgres;

// Re-export commonly used types
pub use connection::DatabaseUrl;
pub use models::{CustomerModel, CustomerRecord, ReplaceSummary};
pub use postgres::{CustomerStorage, PoolConfig};

/// Result type for storage operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for storage operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Failed to parse DATABASE_URL: {0}")]
    DatabaseUrlParse(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Missing table: {0}")]
    MissingTable(String),

    #[error("Connection pool exhausted: {0}")]
    PoolExhausted(String),

    #[error("Connection failed: {0}")]
    ConnectionFailed(String),
}
