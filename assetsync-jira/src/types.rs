//! Wire types for the AQL navlist endpoint

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One customer object as returned by the Assets API
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RemoteAssetRecord {
    #[serde(rename = "objectId")]
    pub object_id: String,
    pub label: String,
}

impl RemoteAssetRecord {
    pub fn new(object_id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            object_id: object_id.into(),
            label: label.into(),
        }
    }
}

/// Request body for `POST .../object/navlist/aql`
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NavlistRequest<'a> {
    pub object_type_id: &'a str,
    pub object_schema_id: &'a str,
    pub include_attributes: bool,
    pub page: u32,
    pub results_per_page: u32,
}

/// Records pulled out of one navlist response page
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtractedPage {
    pub records: Vec<RemoteAssetRecord>,
    /// Entries present in the response, including dropped ones
    pub entry_count: usize,
    /// Entries without a usable `id` or `label`
    pub dropped: usize,
    /// Server-side `isLast` flag, when provided
    pub is_last: Option<bool>,
}

/// Extract `(id, label)` records from a navlist response body.
///
/// `objectEntries` takes precedence over `values`; when neither key is present
/// the page is empty. Numeric ids are rendered as strings. Entries missing an
/// id or a label are dropped.
pub fn extract_records(body: &Value) -> Result<ExtractedPage> {
    let object = body.as_object().ok_or_else(|| {
        Error::ResponseParse(format!("expected a JSON object, got {}", json_kind(body)))
    })?;

    let entries = object
        .get("objectEntries")
        .or_else(|| object.get("values"))
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default();

    let mut page = ExtractedPage {
        entry_count: entries.len(),
        is_last: object.get("isLast").and_then(Value::as_bool),
        ..Default::default()
    };

    for entry in entries {
        match record_from_entry(entry) {
            Some(record) => page.records.push(record),
            None => page.dropped += 1,
        }
    }

    Ok(page)
}

/// Build a record from a single object entry
pub(crate) fn record_from_entry(entry: &Value) -> Option<RemoteAssetRecord> {
    let object_id = match entry.get("id")? {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        _ => return None,
    };
    let label = entry.get("label")?.as_str()?;

    if object_id.is_empty() || label.is_empty() {
        return None;
    }

    Some(RemoteAssetRecord::new(object_id, label))
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_entries_missing_fields_are_dropped() {
        let body = json!({"objectEntries": [{"id": 1, "label": "A"}, {"id": 2}]});
        let page = extract_records(&body).unwrap();

        assert_eq!(page.records, vec![RemoteAssetRecord::new("1", "A")]);
        assert_eq!(page.entry_count, 2);
        assert_eq!(page.dropped, 1);
    }

    #[test]
    fn test_values_used_when_object_entries_absent() {
        let body = json!({"values": [{"id": "77", "label": "Acme"}]});
        let page = extract_records(&body).unwrap();
        assert_eq!(page.records, vec![RemoteAssetRecord::new("77", "Acme")]);
    }

    #[test]
    fn test_object_entries_wins_over_values() {
        let body = json!({
            "objectEntries": [{"id": 1, "label": "From entries"}],
            "values": [{"id": 2, "label": "From values"}]
        });
        let page = extract_records(&body).unwrap();
        assert_eq!(page.records.len(), 1);
        assert_eq!(page.records[0].label, "From entries");
    }

    #[test]
    fn test_neither_key_yields_empty_page() {
        let page = extract_records(&json!({"totalFilterCount": 0})).unwrap();
        assert!(page.records.is_empty());
        assert_eq!(page.entry_count, 0);
        assert_eq!(page.is_last, None);
    }

    #[test]
    fn test_non_object_body_is_a_parse_error() {
        let err = extract_records(&json!([1, 2, 3])).unwrap_err();
        assert!(matches!(err, Error::ResponseParse(_)));
    }

    #[test]
    fn test_empty_and_null_fields_are_dropped() {
        let body = json!({"objectEntries": [
            {"id": null, "label": "No id"},
            {"id": 5, "label": ""},
            {"id": "", "label": "Blank id"},
            {"id": 6, "label": null},
            {"id": true, "label": "Bool id"},
            "not-an-object"
        ]});
        let page = extract_records(&body).unwrap();
        assert!(page.records.is_empty());
        assert_eq!(page.dropped, 6);
    }

    #[test]
    fn test_non_ascii_labels_are_preserved() {
        let body = json!({"objectEntries": [{"id": 9, "label": "บริษัท ทดสอบ จำกัด"}]});
        let page = extract_records(&body).unwrap();
        assert_eq!(page.records[0].label, "บริษัท ทดสอบ จำกัด");
    }

    #[test]
    fn test_is_last_is_read() {
        let page = extract_records(&json!({"values": [], "isLast": true})).unwrap();
        assert_eq!(page.is_last, Some(true));
    }

    #[test]
    fn test_request_serializes_camel_case() {
        let request = NavlistRequest {
            object_type_id: "101",
            object_schema_id: "8",
            include_attributes: true,
            page: 1,
            results_per_page: 2000,
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(
            value,
            json!({
                "objectTypeId": "101",
                "objectSchemaId": "8",
                "includeAttributes": true,
                "page": 1,
                "resultsPerPage": 2000
            })
        );
    }
}
