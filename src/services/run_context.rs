use crate::models::CollectionSnapshot;
use crate::models::ReplaceOutcome;
use crate::services::document_store::DocumentStore;
use crate::services::firestore::FirestoreStore;
use crate::services::replacer::CollectionReplacer;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{info, warn};

/// State scoped to a single run: created at run start, dropped at run end
pub struct RunContext {
    store: Option<Arc<dyn DocumentStore>>,
    pub started_at: DateTime<Utc>,
    pub run_id: String,
}

impl RunContext {
    pub fn new(store: Option<Arc<dyn DocumentStore>>) -> Self {
        Self {
            store,
            started_at: Utc::now(),
            run_id: uuid::Uuid::new_v4().simple().to_string(),
        }
    }

    /// Compute-only context; nothing is persisted
    pub fn offline() -> Self {
        Self::new(None)
    }

    /// Connect to Firestore when a key is configured
    ///
    /// A missing or rejected key disables persistence for this run instead
    /// of aborting it.
    pub async fn connect(client: reqwest::Client, service_account_json: Option<&str>) -> Self {
        let Some(json) = service_account_json else {
            warn!("SERVICE_ACCOUNT_KEY not set, persistence disabled for this run");
            return Self::offline();
        };

        match FirestoreStore::connect(json, client).await {
            Ok(store) => Self::new(Some(Arc::new(store))),
            Err(e) => {
                warn!(error = %e, "Store unavailable, persistence disabled for this run");
                Self::offline()
            }
        }
    }

    pub fn has_store(&self) -> bool {
        self.store.is_some()
    }

    pub fn store(&self) -> Option<&dyn DocumentStore> {
        self.store.as_deref()
    }

    /// Replace a collection with `snapshot`; `None` when persistence is disabled
    pub async fn replace(&self, snapshot: &CollectionSnapshot, batch_size: usize) -> Option<ReplaceOutcome> {
        let store = self.store()?;
        info!(run_id = %self.run_id, collection = %snapshot.collection, documents = snapshot.len(), "Replacing collection");
        Some(CollectionReplacer::new(store, batch_size).replace(snapshot).await)
    }
}
