//! Fetch command
//!
//! Pulls the customer list and prints it without touching the database or
//! the backup files.

use crate::config::FetchSettings;
use anyhow::{Context, Result};
use assetsync_jira::{AssetsClient, RemoteAssetRecord};
use tracing::info;

/// Output format for fetched records
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Table,
    Json,
    Csv,
}

pub async fn execute(settings: &FetchSettings, format: OutputFormat) -> Result<()> {
    let config = settings
        .jira_config()
        .context("Invalid Jira configuration")?;
    let outcome = AssetsClient::new(config)?.fetch().await?;

    info!(
        records = outcome.records.len(),
        dropped = outcome.dropped,
        pages = outcome.pages,
        "Fetched customers"
    );

    print!("{}", render(&outcome.records, format)?);
    Ok(())
}

/// Render records in the requested format
pub fn render(records: &[RemoteAssetRecord], format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Table => Ok(render_table(records)),
        OutputFormat::Json => {
            let mut json = serde_json::to_string_pretty(records)?;
            json.push('\n');
            Ok(json)
        }
        OutputFormat::Csv => {
            let mut writer = csv::Writer::from_writer(Vec::new());
            writer.write_record(["objectId", "label"])?;
            for record in records {
                writer.write_record([record.object_id.as_str(), record.label.as_str()])?;
            }
            let bytes = writer
                .into_inner()
                .map_err(|e| anyhow::anyhow!("Failed to flush CSV output: {}", e.error()))?;
            Ok(String::from_utf8(bytes)?)
        }
    }
}

fn render_table(records: &[RemoteAssetRecord]) -> String {
    const ID_HEADER: &str = "OBJECT ID";

    let width = records
        .iter()
        .map(|r| r.object_id.chars().count())
        .chain(std::iter::once(ID_HEADER.len()))
        .max()
        .unwrap_or(ID_HEADER.len());

    let mut out = format!("{:<width$}  LABEL\n", ID_HEADER, width = width);
    for record in records {
        out.push_str(&format!(
            "{:<width$}  {}\n",
            record.object_id,
            record.label,
            width = width
        ));
    }
    out.push_str(&format!("\n{} customers\n", records.len()));
    out
}
