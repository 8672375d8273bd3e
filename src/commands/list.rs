use crate::error::{Error, Result};
use crate::models::snapshot::{CLIENT_TIMESTAMP_FIELD, SERVER_TIMESTAMP_FIELD};
use crate::models::StoredDocument;
use crate::services::document_store::DocumentStore;
use crate::services::http::build_client;
use crate::services::FirestoreStore;
use crate::utils::get_service_account_key;
use serde_json::Value;

pub fn run(collection: String) {
    println!("📂 Documents in '{}'\n", collection);

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(r) => r,
        Err(e) => {
            eprintln!("❌ Failed to create async runtime: {}", e);
            std::process::exit(1);
        }
    };

    match runtime.block_on(fetch_documents(&collection)) {
        Ok(documents) if documents.is_empty() => {
            println!("⚠️  Collection is empty");
        }
        Ok(documents) => {
            for document in &documents {
                println!("{}", describe(document));
            }
            println!("\n📊 Total: {} document(s)", documents.len());
        }
        Err(e) => {
            eprintln!("❌ {}", e);
            std::process::exit(1);
        }
    }
}

async fn fetch_documents(collection: &str) -> Result<Vec<StoredDocument>> {
    let key = get_service_account_key()
        .ok_or_else(|| Error::StoreUnavailable("SERVICE_ACCOUNT_KEY is not set".to_string()))?;
    let store = FirestoreStore::connect(&key, build_client()?).await?;
    store.list_documents(collection).await
}

/// One line per document: id, write times, field count
fn describe(document: &StoredDocument) -> String {
    let stamp = |field: &str| {
        document
            .fields
            .get(field)
            .and_then(Value::as_str)
            .unwrap_or("-")
            .to_string()
    };

    format!(
        "🔹 {:<34} timestamp={:<28} last_updated={:<34} fields={}",
        document.id,
        stamp(SERVER_TIMESTAMP_FIELD),
        stamp(CLIENT_TIMESTAMP_FIELD),
        document.fields.len()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Map};

    #[test]
    fn test_describe_document() {
        let mut fields = Map::new();
        fields.insert("timestamp".into(), json!("2024-03-07T01:02:03Z"));
        fields.insert("title".into(), json!("Raycast"));
        let line = describe(&StoredDocument {
            id: "abc".into(),
            fields,
        });

        assert!(line.contains("abc"));
        assert!(line.contains("timestamp=2024-03-07T01:02:03Z"));
        assert!(line.contains("last_updated=-"));
        assert!(line.ends_with("fields=2"));
    }
}
