//! # SQLite Document Store
//!
//! A [`DataStore`] persisted in one `documents` table.
//!
//! ## Row Layout
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  set("products/b1/p1", {"name": "Tea", "stock": 4, "tags": ["a"]})     │
//! │                                                                         │
//! │   path                        value                                     │
//! │   ─────────────────────────   ──────                                    │
//! │   products/b1/p1/name         "Tea"                                     │
//! │   products/b1/p1/stock        4                                         │
//! │   products/b1/p1/tags         ["a"]      (arrays stay whole)            │
//! │                                                                         │
//! │  get("products/b1")  → rows in [products/b1/, products/b10) rebuilt     │
//! │  get(".../tags/0")   → ancestor row ".../tags", then index into it      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! `/` sorts just before `0`, so the descendants of `p` are exactly the
//! primary-key range `[p/, p0)`.
//!
//! Writes are serialized through a process-local mutex and each runs in a
//! transaction, which makes `update` all-or-nothing and `increment` atomic.

use async_trait::async_trait;
use chrono::Utc;
use serde_json::{Map, Value};
use sqlx::{SqliteConnection, SqlitePool};
use std::collections::BTreeMap;
use tokio::sync::Mutex;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{StoreError, StoreResult};
use crate::path;
use crate::pool::{self, DbConfig};
use crate::store::DataStore;
use crate::tree;

#[derive(Debug)]
pub struct SqliteStore {
    pool: SqlitePool,
    write_lock: Mutex<()>,
}

impl SqliteStore {
    /// Connects and migrates.
    pub async fn open(config: &DbConfig) -> StoreResult<Self> {
        let pool = pool::connect(config).await?;
        Ok(SqliteStore::from_pool(pool))
    }

    /// Wraps an existing, already migrated pool.
    pub fn from_pool(pool: SqlitePool) -> Self {
        SqliteStore {
            pool,
            write_lock: Mutex::new(()),
        }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn health_check(&self) -> bool {
        sqlx::query("SELECT 1").execute(&self.pool).await.is_ok()
    }

    pub async fn close(&self) {
        info!("Closing document database");
        self.pool.close().await;
    }

    async fn write_all(&self, writes: Vec<(String, Value)>) -> StoreResult<()> {
        let _guard = self.write_lock.lock().await;
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| StoreError::TransactionFailed(e.to_string()))?;

        for (path, value) in &writes {
            write_at(&mut tx, path, value.clone()).await?;
        }

        tx.commit()
            .await
            .map_err(|e| StoreError::TransactionFailed(e.to_string()))?;
        Ok(())
    }
}

#[async_trait]
impl DataStore for SqliteStore {
    async fn get(&self, path: &str) -> StoreResult<Option<Value>> {
        let normalized = path::normalize(path)?;
        let mut conn = self.pool.acquire().await?;
        read_at(&mut conn, &normalized).await
    }

    async fn query(
        &self,
        collection: &str,
        field: &str,
        equals: &Value,
    ) -> StoreResult<Vec<(String, Value)>> {
        Ok(match self.get(collection).await? {
            Some(value) => tree::filter_children(&value, field, equals),
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
        self.write_all(vec![(normalized, value)]).await
    }

    async fn update(&self, writes: BTreeMap<String, Value>) -> StoreResult<()> {
        let mut prepared = Vec::with_capacity(writes.len());
        for (path, value) in writes {
            let normalized = path::normalize(&path)?;
            path::validate_value_keys(&normalized, &value)?;
            prepared.push((normalized, value));
        }
        debug!(writes = prepared.len(), "Document multi-path update");
        self.write_all(prepared).await
    }

    async fn increment(&self, path: &str, delta: i64) -> StoreResult<i64> {
        let normalized = path::normalize(path)?;

        let _guard = self.write_lock.lock().await;
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| StoreError::TransactionFailed(e.to_string()))?;

        let current = match read_at(&mut tx, &normalized).await? {
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

        write_at(&mut tx, &normalized, Value::from(next)).await?;
        tx.commit()
            .await
            .map_err(|e| StoreError::TransactionFailed(e.to_string()))?;

        debug!(path = %normalized, value = next, "Counter incremented");
        Ok(next)
    }

    async fn remove(&self, path: &str) -> StoreResult<()> {
        self.set(path, Value::Null).await
    }
}

// =============================================================================
// Row Helpers
// =============================================================================

/// Upper bound of the descendant range of `path`.
fn range_end(path: &str) -> String {
    format!("{}0", path)
}

fn range_start(path: &str) -> String {
    format!("{}/", path)
}

/// Every proper ancestor of `path`, shortest first.
fn ancestors(path: &str) -> Vec<String> {
    let segments: Vec<&str> = path.split('/').collect();
    (1..segments.len()).map(|n| segments[..n].join("/")).collect()
}

async fn read_at(conn: &mut SqliteConnection, path: &str) -> StoreResult<Option<Value>> {
    // A leaf stored at the path itself or above it.
    let mut candidates = ancestors(path);
    candidates.push(path.to_string());
    for candidate in candidates {
        let row: Option<(String,)> = sqlx::query_as("SELECT value FROM documents WHERE path = ?1")
            .bind(candidate.as_str())
            .fetch_optional(&mut *conn)
            .await?;
        if let Some((raw,)) = row {
            let value: Value = serde_json::from_str(&raw)?;
            let rest: Vec<&str> = path[candidate.len()..]
                .split('/')
                .filter(|s| !s.is_empty())
                .collect();
            return Ok(tree::get(&value, &rest).cloned());
        }
    }

    // Otherwise rebuild the object from the rows below.
    let rows: Vec<(String, String)> = sqlx::query_as(
        "SELECT path, value FROM documents WHERE path >= ?1 AND path < ?2 ORDER BY path",
    )
    .bind(range_start(path))
    .bind(range_end(path))
    .fetch_all(&mut *conn)
    .await?;

    if rows.is_empty() {
        return Ok(None);
    }

    let mut root = Value::Object(Map::new());
    let offset = path.len() + 1;
    for (row_path, raw) in rows {
        let value: Value = serde_json::from_str(&raw)?;
        let relative: Vec<&str> = row_path[offset..].split('/').collect();
        tree::write(&mut root, &relative, value);
    }
    Ok(Some(root))
}

async fn write_at(conn: &mut SqliteConnection, path: &str, value: Value) -> StoreResult<()> {
    let value = tree::prune(value);

    sqlx::query("DELETE FROM documents WHERE path = ?1 OR (path >= ?2 AND path < ?3)")
        .bind(path)
        .bind(range_start(path))
        .bind(range_end(path))
        .execute(&mut *conn)
        .await?;

    if value.is_null() {
        return Ok(());
    }

    // A leaf above us would shadow the new subtree.
    for ancestor in ancestors(path) {
        sqlx::query("DELETE FROM documents WHERE path = ?1")
            .bind(ancestor)
            .execute(&mut *conn)
            .await?;
    }

    let now = Utc::now().to_rfc3339();
    let mut leaves = Vec::new();
    flatten(path.to_string(), value, &mut leaves);
    for (leaf_path, leaf) in leaves {
        sqlx::query("INSERT INTO documents (path, value, updated_at) VALUES (?1, ?2, ?3)")
            .bind(leaf_path)
            .bind(serde_json::to_string(&leaf)?)
            .bind(now.as_str())
            .execute(&mut *conn)
            .await?;
    }
    Ok(())
}

fn flatten(prefix: String, value: Value, out: &mut Vec<(String, Value)>) {
    match value {
        Value::Object(map) => {
            for (key, child) in map {
                flatten(format!("{}/{}", prefix, key), child, out);
            }
        }
        Value::Null => {}
        leaf => out.push((prefix, leaf)),
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    async fn store() -> SqliteStore {
        SqliteStore::open(&DbConfig::in_memory()).await.unwrap()
    }

    #[test]
    fn test_ancestors_and_range() {
        assert_eq!(ancestors("a/b/c"), vec!["a".to_string(), "a/b".to_string()]);
        assert!(ancestors("a").is_empty());
        assert_eq!(range_start("a/b"), "a/b/");
        assert_eq!(range_end("a/b"), "a/b0");
    }

    #[test]
    fn test_flatten_keeps_arrays_whole() {
        let mut out = Vec::new();
        flatten(
            "x".to_string(),
            json!({"a": 1, "b": {"c": [1, 2]}, "n": null}),
            &mut out,
        );
        assert_eq!(
            out,
            vec![
                ("x/a".to_string(), json!(1)),
                ("x/b/c".to_string(), json!([1, 2])),
            ]
        );
    }

    #[tokio::test]
    async fn test_set_and_get_subtrees() {
        let store = store().await;
        assert!(store.health_check().await);

        store
            .set("products/b1/p1", json!({"name": "Tea", "stock": 4, "tags": ["hot"]}))
            .await
            .unwrap();
        store.set("products/b10/p1", json!({"name": "Other"})).await.unwrap();

        assert_eq!(store.get("products/b1/p1/stock").await.unwrap(), Some(json!(4)));
        assert_eq!(store.get("products/b1/p1/tags/0").await.unwrap(), Some(json!("hot")));
        assert_eq!(
            store.get("products/b1").await.unwrap(),
            Some(json!({"p1": {"name": "Tea", "stock": 4, "tags": ["hot"]}}))
        );
        assert_eq!(store.get("products/b2").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_overwrite_and_remove() {
        let store = store().await;
        store.set("a", json!({"b": {"c": 1, "d": 2}})).await.unwrap();
        store.set("a/b", json!({"e": 3})).await.unwrap();
        assert_eq!(store.get("a").await.unwrap(), Some(json!({"b": {"e": 3}})));

        store.set("a/b/e/f", json!(true)).await.unwrap();
        assert_eq!(store.get("a/b").await.unwrap(), Some(json!({"e": {"f": true}})));

        store.remove("a/b").await.unwrap();
        assert_eq!(store.get("a").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_update_and_increment() {
        let store = store().await;
        let mut writes = BTreeMap::new();
        writes.insert("products/b1/p1/stock".to_string(), json!(3));
        writes.insert("products/b1/p2/stock".to_string(), json!(0));
        store.update(writes).await.unwrap();
        assert_eq!(
            store.get("products/b1").await.unwrap(),
            Some(json!({"p1": {"stock": 3}, "p2": {"stock": 0}}))
        );

        assert_eq!(store.increment("counters/invoices/b1", 1).await.unwrap(), 1);
        assert_eq!(store.increment("counters/invoices/b1", 1).await.unwrap(), 2);

        store.set("label", json!("x")).await.unwrap();
        assert!(matches!(
            store.increment("label", 1).await,
            Err(StoreError::TypeMismatch { .. })
        ));
    }

    #[tokio::test]
    async fn test_update_rejects_invalid_path_before_writing() {
        let store = store().await;
        let mut writes = BTreeMap::new();
        writes.insert("ok/path".to_string(), json!(1));
        writes.insert("bad/pa.th".to_string(), json!(2));
        assert!(store.update(writes).await.is_err());
        assert_eq!(store.get("ok/path").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_push_and_query() {
        let store = store().await;
        store
            .push("invoices/b1", json!({"cashier": {"id": "u1"}, "total": 100}))
            .await
            .unwrap();
        let id = store
            .push("invoices/b1", json!({"cashier": {"id": "u2"}, "total": 200}))
            .await
            .unwrap();

        let hits = store.query("invoices/b1", "cashier/id", &json!("u2")).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].0, id);
        assert_eq!(hits[0].1["total"], json!(200));
    }
}
