//! Text embeddings
//!
//! The same embedder must be used for ingestion and querying of every
//! collection, otherwise scores across brands are meaningless.

pub mod engine;

pub use engine::BertEmbedder;

use anyhow::Result;

/// Turns text into dense vectors
pub trait Embedder: Send + Sync {
    /// Embed passages for storage
    fn embed_documents(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>>;

    /// Embed a user question for search
    fn embed_query(&self, text: &str) -> Result<Vec<f32>>;

    /// Output vector length
    fn dimension(&self) -> usize;
}
