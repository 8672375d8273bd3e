//! Full-refresh replacement of one collection
//!
//! Phase 1 clears the collection in rounds of `batch_size` (enumerate, delete
//! each) until a round comes back empty. A short round is not proof of
//! exhaustion since stores may page below the limit. Phase 2 writes every snapshot
//! document with a client `last_updated` stamp; the store adds `timestamp`.
//!
//! The two phases are not transactional: a crash between them leaves the
//! collection empty. A clear that fails midway is reported through
//! `ReplaceOutcome::cleared_completely` rather than hidden.

use crate::error::{Error, Result};
use crate::models::snapshot::CLIENT_TIMESTAMP_FIELD;
use crate::models::{CollectionSnapshot, ReplaceOutcome};
use crate::services::document_store::DocumentStore;
use chrono::Utc;
use serde_json::Value;
use std::collections::HashSet;
use tracing::{error, info, instrument, warn};

/// Counts from the clear phase
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ClearStats {
    pub deleted: usize,
    /// Rounds that deleted at least one document
    pub batches: usize,
}

pub struct CollectionReplacer<'a> {
    store: &'a dyn DocumentStore,
    batch_size: usize,
}

impl<'a> CollectionReplacer<'a> {
    pub fn new(store: &'a dyn DocumentStore, batch_size: usize) -> Self {
        Self {
            store,
            batch_size: batch_size.max(1),
        }
    }

    /// Delete every document in `collection`
    ///
    /// On error the documents deleted so far stay deleted; the error is returned.
    #[instrument(skip(self))]
    pub async fn clear(&self, collection: &str) -> Result<ClearStats> {
        let mut stats = ClearStats::default();
        let mut deleted: HashSet<String> = HashSet::new();

        loop {
            let ids = self.store.list_ids(collection, self.batch_size).await?;
            if ids.is_empty() {
                break;
            }
            if ids.iter().all(|id| deleted.contains(id)) {
                return Err(Error::Store(format!(
                    "{}: deleted documents are still listed, collection is not shrinking",
                    collection
                )));
            }

            for id in ids {
                self.store.delete(collection, &id).await?;
                stats.deleted += 1;
                deleted.insert(id);
            }
            stats.batches += 1;
        }

        info!(collection, deleted = stats.deleted, batches = stats.batches, "Cleared collection");
        Ok(stats)
    }

    /// Clear the collection, then write the snapshot
    ///
    /// Individual write failures are counted, not fatal. A failed clear still
    /// proceeds to the write phase and is flagged as inconsistent.
    #[instrument(skip(self, snapshot), fields(collection = %snapshot.collection, documents = snapshot.len()))]
    pub async fn replace(&self, snapshot: &CollectionSnapshot) -> ReplaceOutcome {
        let mut outcome = ReplaceOutcome {
            collection: snapshot.collection.clone(),
            ..Default::default()
        };

        match self.clear(&snapshot.collection).await {
            Ok(stats) => {
                outcome.deleted = stats.deleted;
                outcome.delete_batches = stats.batches;
                outcome.cleared_completely = true;
            }
            Err(e) => {
                error!(collection = %snapshot.collection, error = %e, "Clear phase failed, collection may hold stale documents");
                outcome.cleared_completely = false;
            }
        }

        for document in &snapshot.documents {
            let mut fields = document.fields.clone();
            fields.insert(
                CLIENT_TIMESTAMP_FIELD.to_string(),
                Value::String(Utc::now().to_rfc3339()),
            );

            match self
                .store
                .set(&snapshot.collection, document.id.as_deref(), fields)
                .await
            {
                Ok(_) => outcome.written += 1,
                Err(e) => {
                    warn!(collection = %snapshot.collection, id = ?document.id, error = %e, "Failed to write document");
                    outcome.failed_writes += 1;
                }
            }
        }

        info!(
            collection = %snapshot.collection,
            written = outcome.written,
            failed = outcome.failed_writes,
            consistent = outcome.is_consistent(),
            "Replaced collection"
        );
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Document, StoredDocument};
    use crate::services::document_store::InMemoryStore;
    use async_trait::async_trait;
    use serde_json::{json, Map};

    fn doc(id: Option<&str>, title: &str) -> Document {
        let mut fields = Map::new();
        fields.insert("title".into(), json!(title));
        Document {
            id: id.map(str::to_string),
            fields,
        }
    }

    #[tokio::test]
    async fn test_clear_batches() {
        for (n, b, expected_batches) in [(0, 500, 0), (1, 500, 1), (500, 500, 1), (1000, 500, 2), (1001, 500, 3), (7, 3, 3)] {
            let store = InMemoryStore::new();
            store.seed("c", n).await;

            let stats = CollectionReplacer::new(&store, b).clear("c").await.unwrap();
            assert_eq!(stats.deleted, n, "n={} b={}", n, b);
            assert_eq!(stats.batches, expected_batches, "n={} b={}", n, b);
            assert_eq!(store.count("c").await, 0);
        }
    }

    #[tokio::test]
    async fn test_clear_stops_on_empty_round() {
        let store = InMemoryStore::new();
        store.seed("c", 1000).await;
        CollectionReplacer::new(&store, 500).clear("c").await.unwrap();
        // two full rounds, then one empty round confirms exhaustion
        assert_eq!(store.list_calls(), 3);
    }

    /// Returns one id fewer than asked for on every page
    struct ShortPages(InMemoryStore);

    #[async_trait]
    impl DocumentStore for ShortPages {
        async fn list_ids(&self, collection: &str, limit: usize) -> Result<Vec<String>> {
            self.0.list_ids(collection, limit.saturating_sub(1).max(1)).await
        }

        async fn delete(&self, collection: &str, id: &str) -> Result<()> {
            self.0.delete(collection, id).await
        }

        async fn set(&self, collection: &str, id: Option<&str>, fields: Map<String, Value>) -> Result<String> {
            self.0.set(collection, id, fields).await
        }

        async fn list_documents(&self, collection: &str) -> Result<Vec<StoredDocument>> {
            self.0.list_documents(collection).await
        }
    }

    #[tokio::test]
    async fn test_short_pages_still_clear_everything() {
        let inner = InMemoryStore::new();
        inner.seed("c", 1200).await;
        let store = ShortPages(inner);

        let snapshot = CollectionSnapshot::new("c", vec![doc(Some("new"), "n")]);
        let outcome = CollectionReplacer::new(&store, 500).replace(&snapshot).await;

        assert_eq!(outcome.deleted, 1200);
        assert!(outcome.cleared_completely);
        assert_eq!(store.0.count("c").await, 1);
    }

    /// Acknowledges deletes without removing anything
    struct StuckStore(InMemoryStore);

    #[async_trait]
    impl DocumentStore for StuckStore {
        async fn list_ids(&self, collection: &str, limit: usize) -> Result<Vec<String>> {
            self.0.list_ids(collection, limit).await
        }

        async fn delete(&self, _collection: &str, _id: &str) -> Result<()> {
            Ok(())
        }

        async fn set(&self, collection: &str, id: Option<&str>, fields: Map<String, Value>) -> Result<String> {
            self.0.set(collection, id, fields).await
        }

        async fn list_documents(&self, collection: &str) -> Result<Vec<StoredDocument>> {
            self.0.list_documents(collection).await
        }
    }

    #[tokio::test]
    async fn test_clear_fails_when_collection_does_not_shrink() {
        let inner = InMemoryStore::new();
        inner.seed("c", 3).await;
        let store = StuckStore(inner);

        let result = CollectionReplacer::new(&store, 10).clear("c").await;
        assert!(matches!(result, Err(Error::Store(_))));
    }

    #[tokio::test]
    async fn test_replace_yields_exactly_snapshot() {
        let store = InMemoryStore::new();
        store.seed("c", 42).await;

        let snapshot = CollectionSnapshot::new(
            "c",
            vec![doc(Some("exchange_rates"), "a"), doc(Some("market_overview"), "b")],
        );
        let outcome = CollectionReplacer::new(&store, 10).replace(&snapshot).await;

        assert_eq!(outcome.deleted, 42);
        assert_eq!(outcome.delete_batches, 5);
        assert_eq!(outcome.written, 2);
        assert!(outcome.is_consistent());

        let ids: Vec<String> = store.list_documents("c").await.unwrap().into_iter().map(|d| d.id).collect();
        assert_eq!(ids, vec!["exchange_rates", "market_overview"]);

        let written = store.get("c", "market_overview").await.unwrap();
        assert!(written.contains_key("timestamp"));
        assert!(written.contains_key("last_updated"));
    }

    #[tokio::test]
    async fn test_replace_is_independent_of_prior_contents() {
        let snapshot = CollectionSnapshot::new("c", vec![doc(None, "x"), doc(None, "y"), doc(None, "z")]);

        for prior in [0, 3, 700] {
            let store = InMemoryStore::new();
            store.seed("c", prior).await;
            let outcome = CollectionReplacer::new(&store, 500).replace(&snapshot).await;
            assert_eq!(outcome.written, 3);
            assert_eq!(store.count("c").await, 3);

            let mut titles: Vec<String> = store
                .list_documents("c")
                .await
                .unwrap()
                .into_iter()
                .map(|d| d.fields["title"].as_str().unwrap().to_string())
                .collect();
            titles.sort();
            assert_eq!(titles, vec!["x", "y", "z"]);
        }
    }

    #[tokio::test]
    async fn test_partial_clear_is_flagged() {
        let store = InMemoryStore::new().fail_deletes_after(3);
        store.seed("c", 10).await;

        let snapshot = CollectionSnapshot::new("c", vec![doc(Some("new"), "n")]);
        let outcome = CollectionReplacer::new(&store, 5).replace(&snapshot).await;

        assert!(!outcome.cleared_completely);
        assert!(!outcome.is_consistent());
        assert_eq!(outcome.written, 1);
        // 7 stale + 1 new
        assert_eq!(store.count("c").await, 8);
    }

    #[tokio::test]
    async fn test_failed_writes_are_counted() {
        let store = InMemoryStore::new().fail_writes_for(&["bad"]);
        let snapshot = CollectionSnapshot::new("c", vec![doc(Some("good"), "g"), doc(Some("bad"), "b")]);
        let outcome = CollectionReplacer::new(&store, 500).replace(&snapshot).await;

        assert_eq!(outcome.written, 1);
        assert_eq!(outcome.failed_writes, 1);
        assert!(outcome.cleared_completely);
        assert!(!outcome.is_consistent());
    }
}
