//! Vector index over one collection
//!
//! Ties a [`VectorStore`] collection to the shared [`Embedder`]: documents go
//! in as chunked, embedded nodes; questions come out as scored nodes.

use std::sync::Arc;
use tracing::{debug, info};

use crate::embedding::Embedder;
use crate::errors::{RagError, Result};
use crate::ingestion::chunker::TextChunker;
use crate::types::{Document, Node, ScoredNode};
use crate::vector_store::{self, VectorRecord, VectorStore};

/// Default number of nodes embedded per batch
pub const DEFAULT_BATCH_SIZE: usize = 10;

pub struct VectorIndex {
    store: Arc<dyn VectorStore>,
    embedder: Arc<dyn Embedder>,
    collection: String,
    chunker: TextChunker,
    batch_size: usize,
}

impl VectorIndex {
    /// Index over a collection, creating it if missing (ingestion path)
    pub async fn open_or_create(
        store: Arc<dyn VectorStore>,
        embedder: Arc<dyn Embedder>,
        collection: &str,
    ) -> Result<Self> {
        vector_store::open_or_create(store.as_ref(), collection, embedder.dimension()).await?;
        Ok(Self::new(store, embedder, collection))
    }

    /// Index over an existing collection (query path)
    pub async fn open_existing(
        store: Arc<dyn VectorStore>,
        embedder: Arc<dyn Embedder>,
        collection: &str,
    ) -> Result<Self> {
        vector_store::open_existing(store.as_ref(), collection).await?;
        Ok(Self::new(store, embedder, collection))
    }

    fn new(store: Arc<dyn VectorStore>, embedder: Arc<dyn Embedder>, collection: &str) -> Self {
        Self {
            store,
            embedder,
            collection: collection.to_string(),
            chunker: TextChunker::default(),
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }

    pub fn with_chunker(mut self, chunker: TextChunker) -> Self {
        self.chunker = chunker;
        self
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// Chunk, embed and store documents; returns the number of nodes written
    pub async fn insert_documents(&self, documents: &[Document]) -> Result<usize> {
        let nodes: Vec<Node> = documents
            .iter()
            .flat_map(|doc| self.chunker.chunk_document(doc))
            .collect();

        if nodes.is_empty() {
            debug!(collection = %self.collection, "no nodes to insert");
            return Ok(0);
        }

        for batch in nodes.chunks(self.batch_size) {
            let contents: Vec<String> = batch.iter().map(Node::content).collect();
            let texts: Vec<&str> = contents.iter().map(String::as_str).collect();
            let vectors = self.embedder.embed_documents(&texts)?;

            if vectors.len() != batch.len() {
                return Err(RagError::Generic(format!(
                    "Embedder returned {} vectors for {} nodes",
                    vectors.len(),
                    batch.len()
                )));
            }

            let records = batch
                .iter()
                .cloned()
                .zip(vectors)
                .map(|(node, vector)| VectorRecord { node, vector })
                .collect();

            self.store.upsert(&self.collection, records).await?;
        }

        info!(
            collection = %self.collection,
            documents = documents.len(),
            nodes = nodes.len(),
            "indexed documents"
        );
        Ok(nodes.len())
    }

    /// Top-k nodes for a question, best first
    pub async fn retrieve(&self, query: &str, top_k: usize) -> Result<Vec<ScoredNode>> {
        let vector = self.embedder.embed_query(query)?;
        let hits = self.store.search(&self.collection, &vector, top_k).await?;

        debug!(collection = %self.collection, hits = hits.len(), "retrieved nodes");
        Ok(hits
            .into_iter()
            .map(|hit| ScoredNode {
                node: hit.node,
                score: hit.score,
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::HashEmbedder;
    use crate::vector_store::InMemoryStore;
    use std::sync::atomic::Ordering;

    #[tokio::test]
    async fn test_insert_and_retrieve() {
        let store: Arc<dyn VectorStore> = Arc::new(InMemoryStore::new());
        let embedder = Arc::new(HashEmbedder::new());
        let index = VectorIndex::open_or_create(store.clone(), embedder, "siemens_knowledge_base")
            .await
            .unwrap();

        let docs = vec![
            Document::from_source("a.md", 0, "The S7-1200 power supply terminal accepts 24V DC."),
            Document::from_source("b.md", 0, "Ethernet port configuration uses PROFINET."),
        ];
        assert_eq!(index.insert_documents(&docs).await.unwrap(), 2);
        assert_eq!(store.count("siemens_knowledge_base").await.unwrap(), 2);

        let nodes = index.retrieve("PROFINET Ethernet port", 1).await.unwrap();
        assert_eq!(nodes.len(), 1);
        assert!(nodes[0].node.text.contains("PROFINET"));
    }

    #[tokio::test]
    async fn test_insert_batches_embeddings() {
        let store: Arc<dyn VectorStore> = Arc::new(InMemoryStore::new());
        let embedder = Arc::new(HashEmbedder::new());
        let index = VectorIndex::open_or_create(store, embedder.clone(), "c")
            .await
            .unwrap()
            .with_batch_size(2);

        let docs: Vec<Document> = (0..5)
            .map(|i| Document::from_source("p.md", i, format!("page {}", i)))
            .collect();
        assert_eq!(index.insert_documents(&docs).await.unwrap(), 5);
        assert_eq!(embedder.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_insert_empty_is_noop() {
        let store: Arc<dyn VectorStore> = Arc::new(InMemoryStore::new());
        let embedder = Arc::new(HashEmbedder::new());
        let index = VectorIndex::open_or_create(store, embedder.clone(), "c")
            .await
            .unwrap();
        assert_eq!(index.insert_documents(&[]).await.unwrap(), 0);
        assert_eq!(embedder.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_reingest_overwrites() {
        let store: Arc<dyn VectorStore> = Arc::new(InMemoryStore::new());
        let embedder = Arc::new(HashEmbedder::new());
        let index = VectorIndex::open_or_create(store.clone(), embedder, "c")
            .await
            .unwrap();
        let docs = vec![Document::from_source("a.md", 0, "same content")];
        index.insert_documents(&docs).await.unwrap();
        index.insert_documents(&docs).await.unwrap();
        assert_eq!(store.count("c").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_open_existing_requires_collection() {
        let store: Arc<dyn VectorStore> = Arc::new(InMemoryStore::new());
        let embedder = Arc::new(HashEmbedder::new());
        let result = VectorIndex::open_existing(store, embedder, "rockwell_knowledge_base").await;
        assert!(matches!(result, Err(RagError::CollectionNotFound(_))));
    }
}
