//! Inspect command

use crate::config::FetchSettings;
use anyhow::{bail, Context, Result};
use assetsync_jira::AssetsClient;

/// Look up one object by id and print its label
pub async fn execute(settings: &FetchSettings, object_id: &str) -> Result<()> {
    let object_id = object_id.trim();
    if object_id.is_empty() {
        bail!("Object id cannot be empty");
    }

    let config = settings
        .jira_config()
        .context("Invalid Jira configuration")?;
    let client = AssetsClient::new(config)?;

    match client.fetch_object(object_id).await? {
        Some(record) => {
            println!("{}: {}", record.object_id, record.label);
            Ok(())
        }
        None => bail!("Object {} not found", object_id),
    }
}
