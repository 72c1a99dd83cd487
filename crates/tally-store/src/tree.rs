//! # JSON Tree Operations
//!
//! Reading and writing nested values addressed by path segments. Shared by
//! both store backends so that they agree on semantics.
//!
//! ## Write Rules
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  write(a/b/c, 5)     creates a and a/b as objects when missing         │
//! │                      replaces a scalar sitting at a or a/b             │
//! │  write(a/b/c, null)  deletes a/b/c, then prunes a/b and a if empty     │
//! │  write(a, {})        same as null: empty objects do not exist          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde_json::{Map, Value};

/// Looks up a nested value. Numeric segments index into arrays.
pub fn get<'a>(root: &'a Value, segments: &[&str]) -> Option<&'a Value> {
    let mut current = root;
    for segment in segments {
        current = match current {
            Value::Object(map) => map.get(*segment)?,
            Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }
    if current.is_null() {
        None
    } else {
        Some(current)
    }
}

/// Writes `value` at `segments`. A null or empty value deletes.
///
/// `segments` must not be empty.
pub fn write(root: &mut Value, segments: &[&str], value: Value) {
    let value = prune(value);
    match segments.split_first() {
        None => *root = value,
        Some((head, rest)) => {
            if value.is_null() {
                delete(root, segments);
                return;
            }
            if !root.is_object() {
                *root = Value::Object(Map::new());
            }
            if let Value::Object(map) = root {
                if rest.is_empty() {
                    map.insert((*head).to_string(), value);
                } else {
                    let child = map
                        .entry((*head).to_string())
                        .or_insert_with(|| Value::Object(Map::new()));
                    write(child, rest, value);
                }
            }
        }
    }
}

/// Removes nulls and empty objects, recursively. Returns `Null` when
/// nothing is left.
pub fn prune(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let kept: Map<String, Value> = map
                .into_iter()
                .map(|(k, v)| (k, prune(v)))
                .filter(|(_, v)| !v.is_null())
                .collect();
            if kept.is_empty() {
                Value::Null
            } else {
                Value::Object(kept)
            }
        }
        other => other,
    }
}

/// Whether a subtree is present at `segments`.
pub fn exists(root: &Value, segments: &[&str]) -> bool {
    get(root, segments).is_some()
}

/// Children of an object value, as `(key, value)` pairs in key order.
pub fn children(value: &Value) -> Vec<(String, Value)> {
    match value {
        Value::Object(map) => map.iter().map(|(k, v)| (k.clone(), v.clone())).collect(),
        _ => Vec::new(),
    }
}

/// Children of `collection` whose value at `field` (itself a `/` path)
/// equals `equals`.
pub fn filter_children(collection: &Value, field: &str, equals: &Value) -> Vec<(String, Value)> {
    let field_segments: Vec<&str> = field.split('/').filter(|s| !s.is_empty()).collect();
    children(collection)
        .into_iter()
        .filter(|(_, child)| get(child, &field_segments) == Some(equals))
        .collect()
}

fn delete(root: &mut Value, segments: &[&str]) {
    let Some((head, rest)) = segments.split_first() else {
        return;
    };
    let Value::Object(map) = root else {
        return;
    };

    if rest.is_empty() {
        map.remove(*head);
        return;
    }

    let now_empty = match map.get_mut(*head) {
        Some(child) => {
            delete(child, rest);
            matches!(child, Value::Object(m) if m.is_empty())
        }
        None => false,
    };
    if now_empty {
        map.remove(*head);
    }
}
