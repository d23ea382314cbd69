// ============================================================================
// Response Serialization
// ============================================================================
//
// JSON output always wraps the data in a schema.org Dataset envelope. CSV is
// produced only for non-empty collections; everything else silently degrades
// to the JSON envelope (see DESIGN.md).
//
// ============================================================================

use chrono::Utc;
use serde::Serialize;
use serde_json::{json, Value};

use crate::resources::ResourceDescriptor;

const SCHEMA_CONTEXT: &str = "https://schema.org";
const DATASET_TYPE: &str = "Dataset";
const LICENSE_URL: &str = "https://creativecommons.org/licenses/by/4.0/";
const PUBLISHER_NAME: &str = "AI Act Explorer";
const PART_OF: &str = "Regulation (EU) 2024/1689 (EU AI Act)";

/// schema.org Dataset envelope wrapping every JSON response.
#[derive(Debug, Serialize)]
pub struct ResponseEnvelope {
    #[serde(rename = "@context")]
    pub context: &'static str,
    #[serde(rename = "@type")]
    pub dataset_type: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub license: &'static str,
    pub identifier: String,
    /// RFC 3339 timestamp of response construction.
    #[serde(rename = "dateModified")]
    pub date_modified: String,
    pub publisher: Value,
    #[serde(rename = "isPartOf")]
    pub is_part_of: &'static str,
    pub data: Value,
    #[serde(rename = "recordCount")]
    pub record_count: u64,
}

/// Wraps resolved data in the Dataset envelope.
///
/// `recordCount` equals the array length for collections, 1 for a singleton
/// or the metadata document, and 0 for a missing singleton (`data: null`).
pub fn envelope(resource: &ResourceDescriptor, data: Value) -> ResponseEnvelope {
    let record_count = match &data {
        Value::Array(items) => items.len() as u64,
        Value::Null => 0,
        _ => 1,
    };

    ResponseEnvelope {
        context: SCHEMA_CONTEXT,
        dataset_type: DATASET_TYPE,
        name: resource.dataset_name,
        description: resource.dataset_description,
        license: LICENSE_URL,
        identifier: format!("eu-ai-act-{}", resource.name),
        date_modified: Utc::now().to_rfc3339(),
        publisher: json!({ "@type": "Organization", "name": PUBLISHER_NAME }),
        is_part_of: PART_OF,
        data,
        record_count,
    }
}

/// Renders a non-empty array of objects as CSV.
///
/// The header row is derived from the key set of the first element, which
/// preserves the declared projection order. Returns `None` when there is no
/// first object to derive a header from; callers fall back to the JSON
/// envelope in that case.
///
/// Field rules:
/// - null: empty field
/// - array: elements joined with "; ", field quoted
/// - string: quotes doubled, newlines flattened to spaces, field quoted
/// - other scalar: stringified as-is, unquoted
pub fn to_csv(rows: &[Value]) -> Option<String> {
    let first = rows.first()?.as_object()?;
    let headers: Vec<String> = first.keys().cloned().collect();

    let mut out = headers.join(",");
    for row in rows {
        out.push('\n');
        let object = row.as_object();
        let record: Vec<String> = headers
            .iter()
            .map(|key| {
                let value = object.and_then(|o| o.get(key)).unwrap_or(&Value::Null);
                csv_field(value)
            })
            .collect();
        out.push_str(&record.join(","));
    }

    Some(out)
}

fn csv_field(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => format!("\"{}\"", escape_text(s)),
        Value::Array(items) => {
            let joined = items
                .iter()
                .map(scalar_text)
                .collect::<Vec<_>>()
                .join("; ");
            format!("\"{}\"", escape_text(&joined))
        }
        other => other.to_string(),
    }
}

/// Doubles embedded quotes and flattens newlines to spaces.
fn escape_text(text: &str) -> String {
    text.replace('"', "\"\"").replace(['\n', '\r'], " ")
}

fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}
