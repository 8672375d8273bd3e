//! Document store abstraction
//!
//! A store is addressed by collection name + document id and supports
//! upsert-with-replace `set`, `delete`, and limited enumeration.

use crate::error::{Error, Result};
use crate::models::snapshot::SERVER_TIMESTAMP_FIELD;
use crate::models::StoredDocument;
use async_trait::async_trait;
use chrono::Utc;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::Mutex;

#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Ids of up to `limit` documents currently in the collection
    async fn list_ids(&self, collection: &str, limit: usize) -> Result<Vec<String>>;

    async fn delete(&self, collection: &str, id: &str) -> Result<()>;

    /// Replace (or create) a document; `id == None` lets the store pick one.
    /// The store stamps `timestamp` with its own write time. Returns the id.
    async fn set(&self, collection: &str, id: Option<&str>, fields: Map<String, Value>) -> Result<String>;

    /// Every document in the collection
    async fn list_documents(&self, collection: &str) -> Result<Vec<StoredDocument>>;
}

/// In-process store for exercising the replacer and the jobs without Firestore
///
/// Offline runs hold no store at all. In tests, `fail_deletes_after(n)` makes
/// every delete after the first `n` fail, simulating an outage mid-clear.
#[derive(Default)]
pub struct InMemoryStore {
    collections: Mutex<BTreeMap<String, BTreeMap<String, Map<String, Value>>>>,
    list_calls: AtomicUsize,
    deletes: AtomicUsize,
    delete_budget: Option<usize>,
    fail_writes_for: Vec<String>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub fn fail_deletes_after(mut self, n: usize) -> Self {
        self.delete_budget = Some(n);
        self
    }

    /// Reject `set` for documents whose id is in `ids`
    #[cfg(test)]
    pub fn fail_writes_for(mut self, ids: &[&str]) -> Self {
        self.fail_writes_for = ids.iter().map(|s| s.to_string()).collect();
        self
    }

    /// Seed `count` documents named `seed-{i}` into a collection
    #[cfg(test)]
    pub async fn seed(&self, collection: &str, count: usize) {
        let mut collections = self.collections.lock().await;
        let docs = collections.entry(collection.to_string()).or_default();
        for i in 0..count {
            let mut fields = Map::new();
            fields.insert("seed".to_string(), Value::from(i as u64));
            docs.insert(format!("seed-{:06}", i), fields);
        }
    }

    pub async fn count(&self, collection: &str) -> usize {
        self.collections
            .lock()
            .await
            .get(collection)
            .map_or(0, |docs| docs.len())
    }

    pub async fn get(&self, collection: &str, id: &str) -> Option<Map<String, Value>> {
        self.collections
            .lock()
            .await
            .get(collection)
            .and_then(|docs| docs.get(id).cloned())
    }

    /// Number of `list_ids` calls made so far
    #[cfg(test)]
    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DocumentStore for InMemoryStore {
    async fn list_ids(&self, collection: &str, limit: usize) -> Result<Vec<String>> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        let collections = self.collections.lock().await;
        Ok(collections
            .get(collection)
            .map(|docs| docs.keys().take(limit).cloned().collect())
            .unwrap_or_default())
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<()> {
        if let Some(budget) = self.delete_budget {
            if self.deletes.load(Ordering::SeqCst) >= budget {
                return Err(Error::Store(format!("delete of {}/{} rejected", collection, id)));
            }
        }
        let mut collections = self.collections.lock().await;
        if let Some(docs) = collections.get_mut(collection) {
            docs.remove(id);
        }
        self.deletes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn set(&self, collection: &str, id: Option<&str>, mut fields: Map<String, Value>) -> Result<String> {
        let id = id
            .map(str::to_string)
            .unwrap_or_else(|| uuid::Uuid::new_v4().simple().to_string());

        if self.fail_writes_for.contains(&id) {
            return Err(Error::Store(format!("write of {}/{} rejected", collection, id)));
        }

        fields.insert(
            SERVER_TIMESTAMP_FIELD.to_string(),
            Value::String(Utc::now().to_rfc3339()),
        );

        let mut collections = self.collections.lock().await;
        collections
            .entry(collection.to_string())
            .or_default()
            .insert(id.clone(), fields);
        Ok(id)
    }

    async fn list_documents(&self, collection: &str) -> Result<Vec<StoredDocument>> {
        let collections = self.collections.lock().await;
        Ok(collections
            .get(collection)
            .map(|docs| {
                docs.iter()
                    .map(|(id, fields)| StoredDocument {
                        id: id.clone(),
                        fields: fields.clone(),
                    })
                    .collect()
            })
            .unwrap_or_default())
    }
}
