use std::collections::HashMap;

use crate::error::ApiError;
use crate::resources::{self, ResourceDescriptor};

/// Inclusive bounds for the `id` parameter.
pub const MIN_ID: i64 = 1;
pub const MAX_ID: i64 = 10_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Json,
    Csv,
}

/// A validated gateway query.
#[derive(Debug)]
pub struct ApiQuery {
    pub resource: &'static ResourceDescriptor,
    pub format: OutputFormat,
    pub id: Option<i64>,
}

/// Validates raw query parameters against the resource whitelist and format
/// set.
///
/// Validation is deliberately asymmetric: `resource` and `format` are strict
/// (a bad value is a 400), while `id` is permissive (a non-numeric or
/// out-of-range id is treated as absent and the full collection is served).
pub fn validate(params: &HashMap<String, String>) -> Result<ApiQuery, ApiError> {
    let requested = params.get("resource").map(String::as_str).unwrap_or("");
    let resource = resources::find(requested).ok_or_else(|| ApiError::InvalidResource {
        requested: requested.to_string(),
        allowed: resources::allowed_names(),
    })?;

    let format = match params.get("format").map(String::as_str) {
        None | Some("json") => OutputFormat::Json,
        Some("csv") => OutputFormat::Csv,
        Some(other) => return Err(ApiError::InvalidFormat(other.to_string())),
    };

    // The id is a filter, not an address: an unusable filter falls back to
    // the full collection instead of erroring.
    let id = params
        .get("id")
        .and_then(|raw| raw.trim().parse::<i64>().ok())
        .filter(|id| (MIN_ID..=MAX_ID).contains(id));

    Ok(ApiQuery {
        resource,
        format,
        id,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_unknown_resource_rejected_with_whitelist() {
        let err = validate(&params(&[("resource", "bogus")])).unwrap_err();
        match err {
            ApiError::InvalidResource { requested, allowed } => {
                assert_eq!(requested, "bogus");
                assert!(allowed.contains(&"articles"));
                assert!(allowed.contains(&"metadata"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_missing_resource_rejected() {
        assert!(validate(&params(&[])).is_err());
    }

    #[test]
    fn test_format_defaults_to_json() {
        let query = validate(&params(&[("resource", "articles")])).unwrap();
        assert_eq!(query.format, OutputFormat::Json);
    }

    #[test]
    fn test_csv_format_accepted() {
        let query = validate(&params(&[("resource", "articles"), ("format", "csv")])).unwrap();
        assert_eq!(query.format, OutputFormat::Csv);
    }

    #[test]
    fn test_unknown_format_rejected() {
        let err = validate(&params(&[("resource", "articles"), ("format", "xml")])).unwrap_err();
        assert!(matches!(err, ApiError::InvalidFormat(f) if f == "xml"));
    }

    #[test]
    fn test_valid_id_parsed() {
        let query = validate(&params(&[("resource", "articles"), ("id", "5")])).unwrap();
        assert_eq!(query.id, Some(5));

        let query = validate(&params(&[("resource", "articles"), ("id", "10000")])).unwrap();
        assert_eq!(query.id, Some(10_000));
    }

    #[test]
    fn test_unusable_id_treated_as_absent() {
        for bad in ["abc", "0", "-3", "10001", "4.5", ""] {
            let query = validate(&params(&[("resource", "articles"), ("id", bad)])).unwrap();
            assert_eq!(query.id, None, "id={:?} should be ignored", bad);
        }
    }

    #[test]
    fn test_query_renders_in_assertion_failures() {
        let query = validate(&params(&[("resource", "articles"), ("id", "5")])).unwrap();
        let rendered = format!("{:?}", query);
        assert!(rendered.contains("articles"));
        assert!(rendered.contains("5"));
    }

    #[test]
    fn test_id_never_rejects() {
        // Strict resource/format, permissive id: even garbage ids validate.
        assert!(validate(&params(&[("resource", "recitals"), ("id", "not-a-number")])).is_ok());
    }
}
