//! # assetsync Jira
//!
//! Client for the Jira Service Management Assets API. Covers configuration
//! loading, Basic authentication and the AQL navlist query used to pull
//! customer objects out of an Assets object schema.

pub mod client;
pub mod config;
pub mod types;

// Re-export commonly used types
pub use client::{AssetsClient, FetchOutcome};
pub use config::{Credentials, JiraConfig};
pub use types::{extract_records, ExtractedPage, RemoteAssetRecord};

/// Result type for Assets API operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for Assets API operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Assets API returned {status}: {body}")]
    RemoteRequest { status: u16, body: String },

    #[error("Failed to parse Assets API response: {0}")]
    ResponseParse(String),
}

impl Error {
    /// HTTP status of a rejected request, if the server answered at all
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::RemoteRequest { status, .. } => Some(*status),
            Error::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}
