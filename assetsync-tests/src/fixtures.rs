//! Test data factories
//!
//! Provides navlist response bodies and environment maps with sensible defaults.

use serde_json::{json, Value};

/// Navlist response fixtures
pub mod navlist {
    use super::*;

    /// A well-formed object entry with a numeric id
    pub fn entry(id: u64, label: &str) -> Value {
        json!({
            "id": id,
            "label": label,
            "objectKey": format!("CD-{}", id),
            "objectType": {"id": "101", "name": "Customer"},
        })
    }

    /// An entry without a label
    pub fn unlabeled(id: u64) -> Value {
        json!({"id": id, "objectKey": format!("CD-{}", id)})
    }

    /// Response carrying entries under `objectEntries`
    pub fn object_entries(entries: &[Value]) -> Value {
        json!({
            "objectEntries": entries,
            "totalFilterCount": entries.len(),
            "pageNumber": 1,
        })
    }

    /// Response carrying entries under `values`
    pub fn values(entries: &[Value]) -> Value {
        json!({"values": entries, "isLast": true})
    }

    /// `count` entries labelled `Customer {n}`, ids starting at `first_id`
    pub fn batch(first_id: u64, count: u64) -> Vec<Value> {
        (first_id..first_id + count)
            .map(|id| entry(id, &format!("Customer {}", id)))
            .collect()
    }
}

/// Configuration fixtures
pub mod config {
    use std::collections::HashMap;

    /// Workspace id the mock server answers for
    pub const WORKSPACE_ID: &str = "test-workspace";

    /// Environment map pointing the client at `base_url`
    pub fn env(base_url: &str) -> HashMap<String, String> {
        [
            ("JIRA_BASE_URL", base_url),
            ("JIRA_WORKSPACE_ID", WORKSPACE_ID),
            ("JIRA_OBJECT_SCHEMA_ID", "8"),
            ("JIRA_OBJECT_TYPE_ID", "101"),
            ("JIRA_EMAIL", "ops@example.com"),
            ("JIRA_API_TOKEN", "test-token"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
    }

    /// Key lookup over [`env`], for `JiraConfig::from_lookup`
    pub fn lookup(base_url: &str) -> impl Fn(&str) -> Option<String> {
        let vars = env(base_url);
        move |key| vars.get(key).cloned()
    }

    /// Expected `Authorization` header for [`env`] credentials
    pub fn expected_authorization() -> &'static str {
        // base64("ops@example.com:test-token")
        "Basic b3BzQGV4YW1wbGUuY29tOnRlc3QtdG9rZW4="
    }
}
