//! Typed custom metadata for documents and chunks.
//!
//! Metadata is a map from string key to string value. Each pair becomes one
//! string-valued [`CustomMetadata`] entry on the wire. Values arriving as
//! loosely typed JSON or `key=value` text are checked here, at the boundary,
//! and anything that is not a string is rejected rather than coerced.

use std::collections::BTreeMap;

use anyhow::{bail, Result};
use serde_json::Value;

use crate::models::CustomMetadata;

/// String key to string value. Ordered so requests are deterministic.
pub type Metadata = BTreeMap<String, String>;

/// One string-valued entry per pair, keys unchanged.
pub fn to_custom_metadata(metadata: &Metadata) -> Vec<CustomMetadata> {
    metadata
        .iter()
        .map(|(key, value)| CustomMetadata::string(key.clone(), value.clone()))
        .collect()
}

/// Accept a JSON object whose values are all strings.
pub fn metadata_from_json(value: &Value) -> Result<Metadata> {
    let Some(object) = value.as_object() else {
        bail!("metadata must be a JSON object, got {}", json_kind(value));
    };

    let mut metadata = Metadata::new();
    for (key, value) in object {
        match value {
            Value::String(s) => {
                metadata.insert(key.clone(), s.clone());
            }
            other => bail!(
                "metadata value for '{}' must be a string, got {}",
                key,
                json_kind(other)
            ),
        }
    }
    Ok(metadata)
}

/// Parse a `key=value` pair as given on the command line.
pub fn parse_pair(pair: &str) -> Result<(String, String)> {
    match pair.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_string(), value.to_string()))
        }
        _ => bail!("expected key=value, got '{}'", pair),
    }
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
    use crate::models::MetadataValue;
    use serde_json::json;

    #[test]
    fn test_one_entry_per_pair() {
        let mut metadata = Metadata::new();
        metadata.insert("author".to_string(), "Ada".to_string());
        metadata.insert("year".to_string(), "1843".to_string());
        metadata.insert("topic".to_string(), "engines".to_string());

        let entries = to_custom_metadata(&metadata);
        assert_eq!(entries.len(), 3);
        for entry in &entries {
            let MetadataValue::StringValue(value) = &entry.value else {
                panic!("expected a string value for {}", entry.key);
            };
            assert_eq!(metadata.get(&entry.key), Some(value));
        }
    }

    #[test]
    fn test_from_json_accepts_strings() {
        let metadata = metadata_from_json(&json!({ "a": "1", "b": "two" })).unwrap();
        assert_eq!(metadata.len(), 2);
        assert_eq!(metadata["b"], "two");
    }

    #[test]
    fn test_from_json_rejects_non_strings() {
        let err = metadata_from_json(&json!({ "year": 1843 })).unwrap_err();
        assert!(err.to_string().contains("'year' must be a string, got a number"));

        assert!(metadata_from_json(&json!({ "tags": ["x"] })).is_err());
        assert!(metadata_from_json(&json!(["not", "an", "object"])).is_err());
    }

    #[test]
    fn test_parse_pair() {
        assert_eq!(
            parse_pair("source=wiki=en").unwrap(),
            ("source".to_string(), "wiki=en".to_string())
        );
        assert_eq!(parse_pair("k=").unwrap(), ("k".to_string(), String::new()));
        assert!(parse_pair("novalue").is_err());
        assert!(parse_pair("=x").is_err());
    }
}
