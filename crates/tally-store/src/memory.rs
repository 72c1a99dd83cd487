//! In-memory [`DataStore`]: one JSON tree behind a `tokio` `RwLock`.
//!
//! Used for tests, demos and the `memory` backend. Writes under a prefix can
//! be made to fail with [`MemoryStore::fail_writes_under`] to exercise error
//! paths.

use async_trait::async_trait;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use crate::error::{StoreError, StoreResult};
use crate::path;
use crate::store::DataStore;
use crate::tree;

#[derive(Debug)]
struct Inner {
    root: Value,
    denied: Vec<String>,
}

impl Inner {
    fn check_writable(&self, path: &str) -> StoreResult<()> {
        let denied = self
            .denied
            .iter()
            .any(|prefix| path == prefix || path.starts_with(&format!("{}/", prefix)));
        if denied {
            return Err(StoreError::PermissionDenied {
                path: path.to_string(),
            });
        }
        Ok(())
    }
}

#[derive(Debug)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        MemoryStore::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        MemoryStore::with_root(Value::Object(Map::new()))
    }

    /// Starts from an existing tree.
    pub fn with_root(root: Value) -> Self {
        MemoryStore {
            inner: RwLock::new(Inner {
                root: tree::prune(root),
                denied: Vec::new(),
            }),
        }
    }

    /// Makes every later write at or below `prefix` fail with
    /// `PermissionDenied`.
    pub async fn fail_writes_under(&self, prefix: &str) -> StoreResult<()> {
        let prefix = path::normalize(prefix)?;
        self.inner.write().await.denied.push(prefix);
        Ok(())
    }

    /// Clears all injected failures.
    pub async fn allow_all_writes(&self) {
        self.inner.write().await.denied.clear();
    }

    /// Copy of the whole tree.
    pub async fn snapshot(&self) -> Value {
        self.inner.read().await.root.clone()
    }
}

#[async_trait]
impl DataStore for MemoryStore {
    async fn get(&self, path: &str) -> StoreResult<Option<Value>> {
        let segments = path::segments(path)?;
        let inner = self.inner.read().await;
        Ok(tree::get(&inner.root, &segments).cloned())
    }

    async fn query(
        &self,
        collection: &str,
        field: &str,
        equals: &Value,
    ) -> StoreResult<Vec<(String, Value)>> {
        let segments = path::segments(collection)?;
        let inner = self.inner.read().await;
        Ok(match tree::get(&inner.root, &segments) {
            Some(value) => tree::filter_children(value, field, equals),
            None => Vec::new(),
        })
    }

    async fn push(&self, path: &str, value: Value) -> StoreResult<String> {
        let id = Uuid::new_v4().to_string();
        self.set(&path::join(path, &id), value).await?;
        Ok(id)
    }

    async fn set(&self, path: &str, value: Value) -> StoreResult<()> {
        let normalized = path::normalize(path)?;
        path::validate_value_keys(&normalized, &value)?;
        let segments: Vec<&str> = normalized.split('/').collect();

        let mut inner = self.inner.write().await;
        inner.check_writable(&normalized)?;
        tree::write(&mut inner.root, &segments, value);
        debug!(path = %normalized, "Memory store write");
        Ok(())
    }

    async fn update(&self, writes: BTreeMap<String, Value>) -> StoreResult<()> {
        let mut prepared = Vec::with_capacity(writes.len());
        for (path, value) in writes {
            let normalized = path::normalize(&path)?;
            path::validate_value_keys(&normalized, &value)?;
            prepared.push((normalized, value));
        }

        let mut inner = self.inner.write().await;
        for (path, _) in &prepared {
            inner.check_writable(path)?;
        }

        let count = prepared.len();
        for (path, value) in prepared {
            let segments: Vec<&str> = path.split('/').collect();
            tree::write(&mut inner.root, &segments, value);
        }
        debug!(writes = count, "Memory store multi-path update");
        Ok(())
    }

    async fn increment(&self, path: &str, delta: i64) -> StoreResult<i64> {
        let normalized = path::normalize(path)?;
        let segments: Vec<&str> = normalized.split('/').collect();

        let mut inner = self.inner.write().await;
        inner.check_writable(&normalized)?;

        let current = match tree::get(&inner.root, &segments) {
            None => 0,
            Some(value) => value.as_i64().ok_or_else(|| StoreError::TypeMismatch {
                path: normalized.clone(),
                expected: "an integer".to_string(),
            })?,
        };
        let next = current
            .checked_add(delta)
            .ok_or_else(|| StoreError::TypeMismatch {
                path: normalized.clone(),
                expected: "within the integer range".to_string(),
            })?;

        tree::write(&mut inner.root, &segments, Value::from(next));
        Ok(next)
    }

    async fn remove(&self, path: &str) -> StoreResult<()> {
        self.set(path, Value::Null).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_set_get_remove() {
        let store = MemoryStore::new();
        store.set("products/b1/p1", json!({"name": "Tea", "stock": 4})).await.unwrap();

        assert_eq!(store.get("products/b1/p1/stock").await.unwrap(), Some(json!(4)));
        assert_eq!(
            store.get("products/b1").await.unwrap(),
            Some(json!({"p1": {"name": "Tea", "stock": 4}}))
        );

        store.remove("products/b1/p1").await.unwrap();
        assert_eq!(store.get("products").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_invalid_paths_rejected() {
        let store = MemoryStore::new();
        assert!(matches!(
            store.set("a/b.c", json!(1)).await,
            Err(StoreError::InvalidPath { .. })
        ));
        assert!(store.get("").await.is_err());
        assert!(store.set("a", json!({"x$": 1})).await.is_err());
    }

    #[tokio::test]
    async fn test_push_generates_distinct_ids() {
        let store = MemoryStore::new();
        let a = store.push("logs", json!({"n": 1})).await.unwrap();
        let b = store.push("logs", json!({"n": 2})).await.unwrap();
        assert_ne!(a, b);
        assert_eq!(store.get(&format!("logs/{}/n", b)).await.unwrap(), Some(json!(2)));
    }

    #[tokio::test]
    async fn test_update_is_all_or_nothing() {
        let store = MemoryStore::new();
        store.set("products/b1/p1/stock", json!(5)).await.unwrap();
        store.fail_writes_under("products/b1/p2").await.unwrap();

        let mut writes = BTreeMap::new();
        writes.insert("products/b1/p1/stock".to_string(), json!(3));
        writes.insert("products/b1/p2/stock".to_string(), json!(1));
        assert!(matches!(
            store.update(writes).await,
            Err(StoreError::PermissionDenied { .. })
        ));
        assert_eq!(store.get("products/b1/p1/stock").await.unwrap(), Some(json!(5)));

        store.allow_all_writes().await;
        let mut writes = BTreeMap::new();
        writes.insert("products/b1/p1/stock".to_string(), json!(3));
        writes.insert("products/b1/p2/stock".to_string(), json!(1));
        store.update(writes).await.unwrap();
        assert_eq!(store.get("products/b1/p2/stock").await.unwrap(), Some(json!(1)));
    }

    #[tokio::test]
    async fn test_increment() {
        let store = MemoryStore::new();
        assert_eq!(store.increment("counters/invoices/b1", 1).await.unwrap(), 1);
        assert_eq!(store.increment("counters/invoices/b1", 1).await.unwrap(), 2);
        assert_eq!(store.increment("customers/c1/points", -5).await.unwrap(), -5);

        store.set("text", json!("abc")).await.unwrap();
        assert!(matches!(
            store.increment("text", 1).await,
            Err(StoreError::TypeMismatch { .. })
        ));
    }

    #[tokio::test]
    async fn test_concurrent_increments_are_unique() {
        let store = Arc::new(MemoryStore::new());
        let mut handles = Vec::new();
        for _ in 0..20 {
            let store = Arc::clone(&store);
            handles.push(tokio::spawn(async move {
                store.increment("counters/invoices/b1", 1).await.unwrap()
            }));
        }
        let mut seen = Vec::new();
        for handle in handles {
            seen.push(handle.await.unwrap());
        }
        seen.sort_unstable();
        assert_eq!(seen, (1..=20).collect::<Vec<i64>>());
    }

    #[tokio::test]
    async fn test_query() {
        let store = MemoryStore::with_root(json!({
            "invoices": {
                "b1": {
                    "i1": {"cashier": {"id": "u1"}},
                    "i2": {"cashier": {"id": "u2"}}
                }
            }
        }));
        let hits = store.query("invoices/b1", "cashier/id", &json!("u2")).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].0, "i2");
        assert!(store.query("invoices/b9", "cashier/id", &json!("u2")).await.unwrap().is_empty());
    }
}
