use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

/// Field name carrying the store-side write time
pub const SERVER_TIMESTAMP_FIELD: &str = "timestamp";

/// Field name carrying the client-side write time (ISO-8601)
pub const CLIENT_TIMESTAMP_FIELD: &str = "last_updated";

/// One document of a snapshot. `id == None` lets the store generate one.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: Option<String>,
    pub fields: Map<String, Value>,
}

impl Document {
    pub fn with_id(id: impl Into<String>, fields: Map<String, Value>) -> Self {
        Self {
            id: Some(id.into()),
            fields,
        }
    }

    /// Build from any value that serializes to a JSON object
    pub fn from_serializable<T: serde::Serialize>(
        id: Option<String>,
        value: &T,
    ) -> crate::error::Result<Self> {
        match serde_json::to_value(value)? {
            Value::Object(fields) => Ok(Self { id, fields }),
            other => Err(crate::error::Error::InvalidInput(format!(
                "document body must be a JSON object, got {}",
                other
            ))),
        }
    }
}

/// The full intended contents of one collection after a replace
#[derive(Debug, Clone)]
pub struct CollectionSnapshot {
    pub collection: String,
    pub documents: Vec<Document>,
    pub produced_at: DateTime<Utc>,
}

impl CollectionSnapshot {
    pub fn new(collection: impl Into<String>, documents: Vec<Document>) -> Self {
        Self {
            collection: collection.into(),
            documents,
            produced_at: Utc::now(),
        }
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

/// A document as read back from the store
#[derive(Debug, Clone, PartialEq)]
pub struct StoredDocument {
    pub id: String,
    pub fields: Map<String, Value>,
}
