//! Firestore REST client
//!
//! Authenticates with a service-account key through `gcp_auth` and talks to
//! the `v1` REST surface:
//!
//! - enumerate: `GET {documents}/{collection}?pageSize=N`, following
//!   `nextPageToken`
//! - delete: `DELETE https://firestore.googleapis.com/v1/{name}`
//! - set: `POST {database}/documents:commit` with a `REQUEST_TIME` transform on
//!   `timestamp`, so every write carries the server's own write time

use crate::error::{Error, Result};
use crate::models::snapshot::SERVER_TIMESTAMP_FIELD;
use crate::models::StoredDocument;
use crate::services::document_store::DocumentStore;
use async_trait::async_trait;
use gcp_auth::{CustomServiceAccount, TokenProvider};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use tracing::{debug, info};

const FIRESTORE_API: &str = "https://firestore.googleapis.com/v1";
const DATASTORE_SCOPE: &str = "https://www.googleapis.com/auth/datastore";
const LIST_PAGE_SIZE: usize = 300;

#[derive(Deserialize)]
struct ServiceAccountKey {
    project_id: String,
}

pub struct FirestoreStore {
    project_id: String,
    auth: CustomServiceAccount,
    client: reqwest::Client,
}

impl FirestoreStore {
    /// Build a store from a service-account JSON blob and check it can authenticate
    ///
    /// Any failure is `StoreUnavailable`; callers degrade to compute-only.
    pub async fn connect(service_account_json: &str, client: reqwest::Client) -> Result<Self> {
        let key: ServiceAccountKey = serde_json::from_str(service_account_json)
            .map_err(|e| Error::StoreUnavailable(format!("invalid service account key: {}", e)))?;

        let auth = CustomServiceAccount::from_json(service_account_json)
            .map_err(|e| Error::StoreUnavailable(format!("invalid service account key: {}", e)))?;

        let store = Self {
            project_id: key.project_id,
            auth,
            client,
        };

        // fail fast when the credentials are rejected
        store.bearer().await?;
        info!(project = %store.project_id, "Connected to Firestore");

        Ok(store)
    }

    async fn bearer(&self) -> Result<String> {
        let token = self
            .auth
            .token(&[DATASTORE_SCOPE])
            .await
            .map_err(|e| Error::StoreUnavailable(format!("failed to obtain access token: {}", e)))?;
        Ok(token.as_str().to_string())
    }

    fn database_path(&self) -> String {
        format!("projects/{}/databases/(default)", self.project_id)
    }

    /// Resource name of a document, as used inside request bodies
    fn document_name(&self, collection: &str, id: &str) -> String {
        format!("{}/documents/{}/{}", self.database_path(), collection, id)
    }

    /// URL for a resource name, with each segment percent-encoded
    fn resource_url(&self, name: &str) -> Result<reqwest::Url> {
        let mut url = reqwest::Url::parse(FIRESTORE_API)
            .map_err(|e| Error::Config(format!("invalid Firestore URL: {}", e)))?;
        url.path_segments_mut()
            .map_err(|_| Error::Config("Firestore URL cannot be a base".to_string()))?
            .extend(name.split('/'));
        Ok(url)
    }

    fn collection_url(&self, collection: &str) -> Result<reqwest::Url> {
        self.resource_url(&format!("{}/documents/{}", self.database_path(), collection))
    }

    async fn send(&self, request: reqwest::RequestBuilder, what: &str) -> Result<Value> {
        let token = self.bearer().await?;
        let response = request
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| Error::Store(format!("{}: request failed: {}", what, e)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| Error::Store(format!("{}: failed to read body: {}", what, e)))?;

        if !status.is_success() {
            return Err(Error::Store(format!("{}: status {}: {}", what, status, body)));
        }

        if body.trim().is_empty() {
            return Ok(Value::Object(Map::new()));
        }
        serde_json::from_str(&body).map_err(|e| Error::Store(format!("{}: invalid JSON: {}", what, e)))
    }

    async fn list_page(
        &self,
        collection: &str,
        page_size: usize,
        page_token: Option<&str>,
        ids_only: bool,
    ) -> Result<(Vec<StoredDocument>, Option<String>)> {
        let url = self.collection_url(collection)?;
        let mut query: Vec<(&str, String)> = vec![("pageSize", page_size.to_string())];
        if ids_only {
            query.push(("mask.fieldPaths", "__name__".to_string()));
        }
        if let Some(token) = page_token {
            query.push(("pageToken", token.to_string()));
        }

        let json = self
            .send(self.client.get(url).query(&query), "list documents")
            .await?;

        let documents = json
            .get("documents")
            .and_then(Value::as_array)
            .map(|docs| docs.iter().filter_map(decode_document).collect())
            .unwrap_or_default();

        let next = json
            .get("nextPageToken")
            .and_then(Value::as_str)
            .filter(|t| !t.is_empty())
            .map(str::to_string);

        Ok((documents, next))
    }
}

#[async_trait]
impl DocumentStore for FirestoreStore {
    async fn list_ids(&self, collection: &str, limit: usize) -> Result<Vec<String>> {
        // pageSize is only an upper bound, pages may come back short
        let mut ids = Vec::with_capacity(limit);
        let mut page_token: Option<String> = None;
        while ids.len() < limit {
            let (documents, next) = self
                .list_page(collection, limit - ids.len(), page_token.as_deref(), true)
                .await?;
            ids.extend(documents.into_iter().map(|d| d.id));
            match next {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }
        ids.truncate(limit);
        Ok(ids)
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<()> {
        let url = self.resource_url(&self.document_name(collection, id))?;
        self.send(self.client.delete(url), "delete document").await?;
        debug!(collection, id, "Deleted document");
        Ok(())
    }

    async fn set(&self, collection: &str, id: Option<&str>, fields: Map<String, Value>) -> Result<String> {
        let id = id
            .map(str::to_string)
            .unwrap_or_else(|| uuid::Uuid::new_v4().simple().to_string());

        let body = json!({
            "writes": [{
                "update": {
                    "name": self.document_name(collection, &id),
                    "fields": encode_fields(&fields),
                },
                "updateTransforms": [{
                    "fieldPath": SERVER_TIMESTAMP_FIELD,
                    "setToServerValue": "REQUEST_TIME",
                }],
            }]
        });

        let url = self.resource_url(&format!("{}/documents:commit", self.database_path()))?;
        self.send(self.client.post(url).json(&body), "commit document").await?;
        debug!(collection, id = %id, "Wrote document");
        Ok(id)
    }

    async fn list_documents(&self, collection: &str) -> Result<Vec<StoredDocument>> {
        let mut all = Vec::new();
        let mut page_token: Option<String> = None;
        loop {
            let (documents, next) = self
                .list_page(collection, LIST_PAGE_SIZE, page_token.as_deref(), false)
                .await?;
            all.extend(documents);
            match next {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }
        Ok(all)
    }
}

fn decode_document(doc: &Value) -> Option<StoredDocument> {
    let name = doc.get("name")?.as_str()?;
    let id = name.rsplit('/').next()?.to_string();
    let fields = doc
        .get("fields")
        .and_then(Value::as_object)
        .map(decode_fields)
        .unwrap_or_default();
    Some(StoredDocument { id, fields })
}

/// Encode a JSON object as Firestore typed `fields`
pub fn encode_fields(fields: &Map<String, Value>) -> Value {
    Value::Object(
        fields
            .iter()
            .map(|(k, v)| (k.clone(), encode_value(v)))
            .collect(),
    )
}

/// Encode one JSON value as a Firestore typed value
pub fn encode_value(value: &Value) -> Value {
    match value {
        Value::Null => json!({ "nullValue": null }),
        Value::Bool(b) => json!({ "booleanValue": b }),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                json!({ "integerValue": i.to_string() })
            } else if let Some(u) = n.as_u64() {
                json!({ "integerValue": u.to_string() })
            } else {
                json!({ "doubleValue": n.as_f64().unwrap_or(0.0) })
            }
        }
        Value::String(s) => json!({ "stringValue": s }),
        Value::Array(items) => json!({
            "arrayValue": { "values": items.iter().map(encode_value).collect::<Vec<_>>() }
        }),
        Value::Object(map) => json!({ "mapValue": { "fields": encode_fields(map) } }),
    }
}

pub fn decode_fields(fields: &Map<String, Value>) -> Map<String, Value> {
    fields
        .iter()
        .map(|(k, v)| (k.clone(), decode_value(v)))
        .collect()
}

/// Decode a Firestore typed value back into plain JSON
pub fn decode_value(value: &Value) -> Value {
    let Some(obj) = value.as_object() else {
        return Value::Null;
    };
    let Some((kind, inner)) = obj.iter().next() else {
        return Value::Null;
    };

    match kind.as_str() {
        "booleanValue" => inner.clone(),
        "integerValue" => inner
            .as_str()
            .and_then(|s| s.parse::<i64>().ok())
            .map(Value::from)
            .unwrap_or_else(|| inner.clone()),
        "doubleValue" => inner.clone(),
        "stringValue" | "timestampValue" | "referenceValue" | "bytesValue" => inner.clone(),
        "arrayValue" => Value::Array(
            inner
                .get("values")
                .and_then(Value::as_array)
                .map(|values| values.iter().map(decode_value).collect())
                .unwrap_or_default(),
        ),
        "mapValue" => Value::Object(
            inner
                .get("fields")
                .and_then(Value::as_object)
                .map(decode_fields)
                .unwrap_or_default(),
        ),
        _ => Value::Null,
    }
}
