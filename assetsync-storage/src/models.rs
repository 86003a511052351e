//! Database models for the customers table

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row of the `customers` table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct CustomerModel {
    #[sqlx(rename = "objectId")]
    #[serde(rename = "objectId")]
    pub object_id: String,
    pub name: String,
    #[sqlx(rename = "objectKey")]
    #[serde(rename = "objectKey")]
    pub object_key: Option<String>,
    #[sqlx(rename = "createdAt")]
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
    #[sqlx(rename = "updatedAt")]
    #[serde(rename = "updatedAt")]
    pub updated_at: DateTime<Utc>,
}

/// Values written for one customer; timestamps are assigned by the database
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomerRecord {
    pub object_id: String,
    pub name: String,
    pub object_key: Option<String>,
}

impl CustomerRecord {
    pub fn new(object_id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            object_id: object_id.into(),
            name: name.into(),
            object_key: None,
        }
    }

    pub fn with_object_key(mut self, object_key: impl Into<String>) -> Self {
        self.object_key = Some(object_key.into());
        self
    }
}

/// Outcome of a full table replacement
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReplaceSummary {
    /// Rows removed by the initial delete
    pub deleted: u64,
    /// Upserts executed
    pub upserted: u64,
}
