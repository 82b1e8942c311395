//! Loading search responses and pulling out their aggregation section.

use serde_json::Value;
use std::fs;
use std::path::Path;
use tracing::debug;

use crate::error::{Error, Result};

/// Name of the section search engines put aggregation results under.
pub const DEFAULT_SECTION: &str = "aggregations";

/// Parse a response body and return the value stored under `section`.
pub fn parse_aggregations(body: &str, section: &str) -> Result<Value> {
    let mut response: Value = serde_json::from_str(body)?;

    response
        .get_mut(section)
        .map(Value::take)
        .ok_or_else(|| Error::MissingSection(section.to_string()))
}

/// Read a response body from disk and return the value under `section`.
pub fn load_aggregations(path: impl AsRef<Path>, section: &str) -> Result<Value> {
    let path = path.as_ref();
    let body = fs::read_to_string(path).map_err(|source| Error::Io {
        path: path.to_path_buf(),
        source,
    })?;
    debug!(path = %path.display(), bytes = body.len(), "read response body");

    parse_aggregations(&body, section)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn extracts_named_section() {
        let body = r#"{"took": 3, "hits": {"total": 0}, "aggregations": {"m": {"value": 1}}}"#;
        let aggs = parse_aggregations(body, DEFAULT_SECTION).unwrap();
        assert_eq!(aggs, json!({"m": {"value": 1}}));
    }

    #[test]
    fn missing_section_is_an_error() {
        let err = parse_aggregations(r#"{"hits": {}}"#, "aggs").unwrap_err();
        assert!(matches!(err, Error::MissingSection(ref s) if s == "aggs"));
        assert_eq!(err.to_string(), "response has no `aggs` section");
    }

    #[test]
    fn broken_body_is_a_json_error() {
        let err = parse_aggregations("{not json", DEFAULT_SECTION).unwrap_err();
        assert!(matches!(err, Error::Json(_)));
    }

    #[test]
    fn section_keeps_document_order() {
        let body = r#"{"aggregations": {"z": {"value": 1}, "a": {"value": 2}, "m": {"value": 3}}}"#;
        let aggs = parse_aggregations(body, DEFAULT_SECTION).unwrap();
        let names: Vec<&String> = aggs.as_object().unwrap().keys().collect();
        assert_eq!(names, ["z", "a", "m"]);
    }
}
