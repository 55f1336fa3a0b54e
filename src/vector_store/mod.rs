//! Vector storage backends
//!
//! Every brand lives in its own collection. Ingestion opens collections with
//! get-or-create semantics; query paths require the collection to exist so a
//! typo or a skipped ingestion fails loudly instead of answering from nothing.

pub mod memory;
pub mod qdrant;

pub use memory::InMemoryStore;
pub use qdrant::QdrantStore;

use async_trait::async_trait;
use serde_json::Value as JsonValue;

use crate::errors::{RagError, Result};
use crate::types::{Metadata, Node};

/// Payload keys reserved for node fields
pub const TEXT_KEY: &str = "text";
pub const DOCUMENT_ID_KEY: &str = "document_id";
pub const CHUNK_INDEX_KEY: &str = "chunk_index";

/// A node with its embedding, ready to upsert
#[derive(Debug, Clone)]
pub struct VectorRecord {
    pub node: Node,
    pub vector: Vec<f32>,
}

/// Hit returned by [`VectorStore::search`]
#[derive(Debug, Clone)]
pub struct SearchHit {
    pub node: Node,
    pub score: f32,
}

/// Storage and similarity search over named collections
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Create a collection with cosine distance
    async fn create_collection(&self, name: &str, dimension: usize) -> Result<()>;

    /// Check whether a collection exists
    async fn collection_exists(&self, name: &str) -> Result<bool>;

    /// Insert or overwrite records (matched by node id)
    async fn upsert(&self, collection: &str, records: Vec<VectorRecord>) -> Result<()>;

    /// Top-k most similar nodes, best first
    async fn search(&self, collection: &str, vector: &[f32], top_k: usize)
        -> Result<Vec<SearchHit>>;

    /// Number of stored points
    async fn count(&self, collection: &str) -> Result<u64>;

    /// Drop a collection and its points
    async fn delete_collection(&self, collection: &str) -> Result<()>;

    /// Check if the backend is reachable
    async fn health_check(&self) -> Result<bool>;

    /// Backend name for logging
    fn name(&self) -> &str;
}

/// Open a collection for writing, creating it if missing
pub async fn open_or_create(store: &dyn VectorStore, name: &str, dimension: usize) -> Result<()> {
    if !store.collection_exists(name).await? {
        tracing::info!(collection = name, backend = store.name(), "creating collection");
        store.create_collection(name, dimension).await?;
    }
    Ok(())
}

/// Open a collection for querying; a missing collection is an error
pub async fn open_existing(store: &dyn VectorStore, name: &str) -> Result<()> {
    if store.collection_exists(name).await? {
        Ok(())
    } else {
        Err(RagError::CollectionNotFound(name.to_string()))
    }
}

/// Flatten a node into a JSON payload
pub fn node_to_payload(node: &Node) -> Metadata {
    let mut payload = node.metadata.clone();
    payload.insert(TEXT_KEY.to_string(), JsonValue::String(node.text.clone()));
    payload.insert(
        DOCUMENT_ID_KEY.to_string(),
        JsonValue::String(node.document_id.clone()),
    );
    payload.insert(CHUNK_INDEX_KEY.to_string(), JsonValue::from(node.chunk_index as u64));
    payload
}

/// Rebuild a node from a stored payload
pub fn node_from_payload(id: String, mut payload: Metadata) -> Node {
    let text = take_string(&mut payload, TEXT_KEY);
    let document_id = take_string(&mut payload, DOCUMENT_ID_KEY);
    let chunk_index = payload
        .remove(CHUNK_INDEX_KEY)
        .and_then(|v| v.as_u64())
        .unwrap_or(0) as usize;

    Node {
        id,
        document_id,
        text,
        metadata: payload,
        chunk_index,
    }
}

fn take_string(payload: &mut Metadata, key: &str) -> String {
    match payload.remove(key) {
        Some(JsonValue::String(s)) => s,
        Some(other) => other.to_string(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Document;

    #[test]
    fn test_payload_roundtrip() {
        let doc = Document::from_source("manual.pdf", 0, "body")
            .with_metadata("brand", "siemens")
            .with_metadata("file_name", "manual.pdf");
        let node = Node::from_document(&doc, 7, "Terminal X10 carries 24V.");

        let payload = node_to_payload(&node);
        assert_eq!(payload.get(TEXT_KEY).unwrap(), "Terminal X10 carries 24V.");

        let restored = node_from_payload(node.id.clone(), payload);
        assert_eq!(restored, node);
    }

    #[tokio::test]
    async fn test_open_existing_missing_collection() {
        let store = InMemoryStore::new();
        let err = open_existing(&store, "rockwell_knowledge_base").await.unwrap_err();
        assert!(matches!(err, RagError::CollectionNotFound(name) if name == "rockwell_knowledge_base"));
    }

    #[tokio::test]
    async fn test_open_or_create_is_idempotent() {
        let store = InMemoryStore::new();
        open_or_create(&store, "siemens_knowledge_base", 4).await.unwrap();
        open_or_create(&store, "siemens_knowledge_base", 4).await.unwrap();
        assert!(store.collection_exists("siemens_knowledge_base").await.unwrap());
        assert!(open_existing(&store, "siemens_knowledge_base").await.is_ok());
    }
}
