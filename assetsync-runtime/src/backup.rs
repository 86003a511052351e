//! File backups of a fetched record set
//!
//! Two files are written to the output directory:
//! - `customers.csv`: header `objectId,label`, one row per record in fetch order
//! - `customerMap.json`: object mapping `objectId` to `label`, pretty-printed
//!
//! Each file is written to a `.tmp` sibling first and renamed into place.

use crate::{Error, Result};
use assetsync_jira::RemoteAssetRecord;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

pub const CSV_FILE_NAME: &str = "customers.csv";
pub const MAP_FILE_NAME: &str = "customerMap.json";

/// Locations of the written backup files
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupPaths {
    pub csv: PathBuf,
    pub map: PathBuf,
}

/// Writes backup files into one directory
#[derive(Debug, Clone)]
pub struct BackupWriter {
    dir: PathBuf,
}

impl BackupWriter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn paths(&self) -> BackupPaths {
        BackupPaths {
            csv: self.dir.join(CSV_FILE_NAME),
            map: self.dir.join(MAP_FILE_NAME),
        }
    }

    /// Write both backups, creating the directory if needed
    pub fn write_backups(&self, records: &[RemoteAssetRecord]) -> Result<BackupPaths> {
        std::fs::create_dir_all(&self.dir).map_err(|e| {
            Error::Backup(format!("cannot create {}: {}", self.dir.display(), e))
        })?;

        let paths = self.paths();
        write_csv(&paths.csv, records)?;
        info!(path = %paths.csv.display(), records = records.len(), "Saved CSV backup");

        write_map(&paths.map, records)?;
        info!(path = %paths.map.display(), records = records.len(), "Saved customer map");

        Ok(paths)
    }
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}

/// Rename `temp` over `path`, removing `temp` if that fails
fn replace_file(temp: &Path, path: &Path) -> Result<()> {
    std::fs::rename(temp, path).map_err(|e| {
        if let Err(cleanup) = std::fs::remove_file(temp) {
            warn!(path = %temp.display(), error = %cleanup, "Failed to remove temp file");
        }
        Error::Backup(format!("cannot replace {}: {}", path.display(), e))
    })
}

fn write_csv(path: &Path, records: &[RemoteAssetRecord]) -> Result<()> {
    let temp = temp_path(path);
    let csv_error = |e: csv::Error| Error::Backup(format!("cannot write {}: {}", path.display(), e));

    let mut writer = csv::Writer::from_path(&temp).map_err(csv_error)?;
    writer.write_record(["objectId", "label"]).map_err(csv_error)?;
    for record in records {
        writer
            .write_record([record.object_id.as_str(), record.label.as_str()])
            .map_err(csv_error)?;
    }
    writer
        .flush()
        .map_err(|e| Error::Backup(format!("cannot write {}: {}", path.display(), e)))?;
    drop(writer);

    replace_file(&temp, path)
}

/// Build the id to label map; a repeated id keeps its first position and its last label
fn build_map(records: &[RemoteAssetRecord]) -> Map<String, Value> {
    let mut map = Map::new();
    for record in records {
        map.insert(record.object_id.clone(), Value::String(record.label.clone()));
    }
    map
}

fn write_map(path: &Path, records: &[RemoteAssetRecord]) -> Result<()> {
    let temp = temp_path(path);
    let json = serde_json::to_string_pretty(&Value::Object(build_map(records)))
        .map_err(|e| Error::Backup(format!("cannot serialize customer map: {}", e)))?;

    std::fs::write(&temp, json)
        .map_err(|e| Error::Backup(format!("cannot write {}: {}", path.display(), e)))?;

    replace_file(&temp, path)
}

/// Records loaded back from a `customerMap.json`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CustomerMap {
    pub records: Vec<RemoteAssetRecord>,
    /// Entries whose label is not a non-empty string
    pub skipped: usize,
}

/// Load a mapping backup
pub fn read_customer_map(path: &Path) -> Result<CustomerMap> {
    let data = std::fs::read_to_string(path)?;

    let map = match serde_json::from_str::<Value>(&data) {
        Ok(Value::Object(map)) => map,
        Ok(_) => {
            return Err(Error::Backup(format!(
                "{} does not contain a JSON object",
                path.display()
            )))
        }
        Err(e) => {
            return Err(Error::Backup(format!(
                "{} is not valid JSON: {}",
                path.display(),
                e
            )))
        }
    };

    let mut customer_map = CustomerMap::default();
    for (object_id, label) in map {
        match label {
            Value::String(label) if !label.is_empty() && !object_id.trim().is_empty() => {
                customer_map
                    .records
                    .push(RemoteAssetRecord::new(object_id, label));
            }
            other => {
                debug!(object_id = %object_id, value = %other, "Skipping map entry");
                customer_map.skipped += 1;
            }
        }
    }

    Ok(customer_map)
}
