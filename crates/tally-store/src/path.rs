//! Path parsing and validation.
//!
//! A path is a `/`-separated list of non-empty segments. Segments may not
//! contain `.`, `#`, `$`, `[` or `]`. Leading and trailing slashes are
//! ignored.

use serde_json::Value;

use crate::error::{StoreError, StoreResult};

const FORBIDDEN: [char; 5] = ['.', '#', '$', '[', ']'];

/// Splits and validates a path.
pub fn segments(path: &str) -> StoreResult<Vec<&str>> {
    let trimmed = path.trim_matches('/');
    if trimmed.is_empty() {
        return Err(invalid(path, "path is empty"));
    }

    let parts: Vec<&str> = trimmed.split('/').collect();
    for part in &parts {
        validate_segment(part).map_err(|reason| invalid(path, reason))?;
    }
    Ok(parts)
}

/// Normalized form of a path: validated, no outer slashes.
pub fn normalize(path: &str) -> StoreResult<String> {
    Ok(segments(path)?.join("/"))
}

/// Joins a parent path and a child key.
pub fn join(parent: &str, child: &str) -> String {
    format!("{}/{}", parent.trim_end_matches('/'), child)
}

/// Checks that every object key inside `value` is a valid segment.
pub fn validate_value_keys(path: &str, value: &Value) -> StoreResult<()> {
    match value {
        Value::Object(map) => {
            for (key, child) in map {
                validate_segment(key).map_err(|reason| invalid(&join(path, key), reason))?;
                validate_value_keys(&join(path, key), child)?;
            }
            Ok(())
        }
        Value::Array(items) => {
            for (i, child) in items.iter().enumerate() {
                validate_value_keys(&join(path, &i.to_string()), child)?;
            }
            Ok(())
        }
        _ => Ok(()),
    }
}

fn validate_segment(segment: &str) -> Result<(), &'static str> {
    if segment.is_empty() {
        return Err("empty segment");
    }
    if segment.contains(FORBIDDEN) {
        return Err("segment contains a forbidden character");
    }
    if segment.contains('/') {
        return Err("key contains '/'");
    }
    Ok(())
}

fn invalid(path: &str, reason: &str) -> StoreError {
    StoreError::InvalidPath {
        path: path.to_string(),
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_segments() {
        assert_eq!(segments("products/b1/p1").unwrap(), vec!["products", "b1", "p1"]);
        assert_eq!(segments("/settings/").unwrap(), vec!["settings"]);
        assert!(segments("").is_err());
        assert!(segments("/").is_err());
        assert!(segments("a//b").is_err());
        assert!(segments("a/b.c").is_err());
        assert!(segments("a/$b").is_err());
        assert!(segments("a/[0]").is_err());
    }

    #[test]
    fn test_normalize_and_join() {
        assert_eq!(normalize("/a/b/").unwrap(), "a/b");
        assert_eq!(join("a/b/", "c"), "a/b/c");
    }

    #[test]
    fn test_value_keys() {
        assert!(validate_value_keys("x", &json!({"a": {"b": 1}, "c": [ {"d": 2} ]})).is_ok());
        assert!(validate_value_keys("x", &json!({"a.b": 1})).is_err());
        assert!(validate_value_keys("x", &json!({"a": {"b/c": 1}})).is_err());
        assert!(validate_value_keys("x", &json!([{"#": 1}])).is_err());
    }
}
