//! # The Data Store Seam
//!
//! Everything the terminal persists goes through [`DataStore`]: a tree of
//! JSON documents addressed by `/`-separated paths.
//!
//! ## Operations
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  get(path)                      → Option<Value>                        │
//! │  query(collection, field, eq)   → children where child[field] == eq    │
//! │  push(path, value)              → new child under a generated id       │
//! │  set(path, value)               → replace (null deletes)               │
//! │  update({path: value, ...})     → several writes, all or nothing       │
//! │  increment(path, delta)         → atomic counter, returns new value    │
//! │  remove(path)                   → delete subtree                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The typed helpers below convert through serde so callers work with
//! domain structs rather than raw values.

use async_trait::async_trait;
use mockall::automock;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;

use crate::error::{StoreError, StoreResult};
use crate::tree;

#[automock]
#[async_trait]
pub trait DataStore: Send + Sync {
    /// Reads the subtree at `path`.
    async fn get(&self, path: &str) -> StoreResult<Option<Value>>;

    /// Children of `collection` whose nested `field` (e.g. `cashier/id`)
    /// equals `equals`, in key order.
    async fn query(
        &self,
        collection: &str,
        field: &str,
        equals: &Value,
    ) -> StoreResult<Vec<(String, Value)>>;

    /// Stores `value` under a freshly generated child key of `path` and
    /// returns the key.
    async fn push(&self, path: &str, value: Value) -> StoreResult<String>;

    /// Replaces the subtree at `path`. `null` deletes.
    async fn set(&self, path: &str, value: Value) -> StoreResult<()>;

    /// Applies several writes atomically.
    async fn update(&self, writes: BTreeMap<String, Value>) -> StoreResult<()>;

    /// Adds `delta` to the integer at `path` (missing counts as 0) and
    /// returns the new value.
    async fn increment(&self, path: &str, delta: i64) -> StoreResult<i64>;

    /// Deletes the subtree at `path`.
    async fn remove(&self, path: &str) -> StoreResult<()>;
}

// =============================================================================
// Typed Helpers
// =============================================================================

/// Reads and deserializes the document at `path`.
pub async fn get_typed<T: DeserializeOwned>(
    store: &dyn DataStore,
    path: &str,
) -> StoreResult<Option<T>> {
    match store.get(path).await? {
        Some(value) => Ok(Some(decode(path, value)?)),
        None => Ok(None),
    }
}

/// Like [`get_typed`], but a missing document is an error.
pub async fn require_typed<T: DeserializeOwned>(store: &dyn DataStore, path: &str) -> StoreResult<T> {
    get_typed(store, path)
        .await?
        .ok_or_else(|| StoreError::not_found(path))
}

pub async fn set_typed<T: Serialize + ?Sized>(
    store: &dyn DataStore,
    path: &str,
    value: &T,
) -> StoreResult<()> {
    store.set(path, serde_json::to_value(value)?).await
}

pub async fn push_typed<T: Serialize + ?Sized>(
    store: &dyn DataStore,
    path: &str,
    value: &T,
) -> StoreResult<String> {
    store.push(path, serde_json::to_value(value)?).await
}

/// All children of `path`, deserialized, in key order.
pub async fn list_typed<T: DeserializeOwned>(
    store: &dyn DataStore,
    path: &str,
) -> StoreResult<Vec<(String, T)>> {
    let Some(collection) = store.get(path).await? else {
        return Ok(Vec::new());
    };
    tree::children(&collection)
        .into_iter()
        .map(|(key, value)| {
            let item = decode(&format!("{}/{}", path, key), value)?;
            Ok((key, item))
        })
        .collect()
}

pub async fn query_typed<T: DeserializeOwned>(
    store: &dyn DataStore,
    collection: &str,
    field: &str,
    equals: &Value,
) -> StoreResult<Vec<(String, T)>> {
    store
        .query(collection, field, equals)
        .await?
        .into_iter()
        .map(|(key, value)| {
            let item = decode(&format!("{}/{}", collection, key), value)?;
            Ok((key, item))
        })
        .collect()
}

fn decode<T: DeserializeOwned>(path: &str, value: Value) -> StoreResult<T> {
    serde_json::from_value(value)
        .map_err(|e| StoreError::Serialization(format!("{}: {}", path, e)))
}
