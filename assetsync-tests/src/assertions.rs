//! Readers and assertions for backup files

use serde_json::{Map, Value};
use std::path::Path;

/// Read a `customers.csv` backup as its header plus `(objectId, label)` rows
pub fn read_backup_csv(path: &Path) -> (Vec<String>, Vec<(String, String)>) {
    let mut reader = csv::Reader::from_path(path)
        .unwrap_or_else(|e| panic!("Failed to open {}: {}", path.display(), e));

    let header = reader
        .headers()
        .expect("CSV backup has no header")
        .iter()
        .map(str::to_string)
        .collect();

    let rows = reader
        .records()
        .map(|r| {
            let r = r.expect("Malformed CSV row");
            (r[0].to_string(), r[1].to_string())
        })
        .collect();

    (header, rows)
}

/// Read a `customerMap.json` backup
pub fn read_backup_map(path: &Path) -> Map<String, Value> {
    let data = std::fs::read_to_string(path)
        .unwrap_or_else(|e| panic!("Failed to read {}: {}", path.display(), e));
    match serde_json::from_str(&data).expect("Mapping backup is not JSON") {
        Value::Object(map) => map,
        other => panic!("Mapping backup is not a JSON object: {}", other),
    }
}

/// Assert both backups hold exactly `expected`, in order for the CSV
pub fn assert_backups_contain(dir: &Path, expected: &[(&str, &str)]) {
    let (header, rows) = read_backup_csv(&dir.join("customers.csv"));
    assert_eq!(header, vec!["objectId", "label"], "unexpected CSV header");

    let expected_rows: Vec<(String, String)> = expected
        .iter()
        .map(|(id, label)| (id.to_string(), label.to_string()))
        .collect();
    assert_eq!(rows, expected_rows, "CSV rows differ");

    let map = read_backup_map(&dir.join("customerMap.json"));
    assert_eq!(map.len(), expected.len(), "mapping size differs");
    for (id, label) in expected {
        assert_eq!(
            map.get(*id).and_then(Value::as_str),
            Some(*label),
            "mapping entry for {} differs",
            id
        );
    }
}
