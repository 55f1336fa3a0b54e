//! In-process fakes shared by unit tests

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::embedding::Embedder;
use crate::errors::{RagError, Result};
use crate::index::VectorIndex;
use crate::llm::LlmClient;
use crate::types::Document;
use crate::vector_store::{InMemoryStore, VectorStore};

pub const HASH_DIMENSION: usize = 32;

/// Bag-of-words hashing embedder
pub struct HashEmbedder {
    pub calls: AtomicUsize,
}

impl HashEmbedder {
    pub fn new() -> Self {
        Self {
            calls: AtomicUsize::new(0),
        }
    }

    pub fn vectorize(text: &str) -> Vec<f32> {
        let mut v = vec![0.0f32; HASH_DIMENSION];
        for word in text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
        {
            let bucket = word
                .to_lowercase()
                .bytes()
                .fold(7usize, |h, b| h.wrapping_mul(31).wrapping_add(b as usize))
                % HASH_DIMENSION;
            v[bucket] += 1.0;
        }
        v
    }
}

impl Embedder for HashEmbedder {
    fn embed_documents(&self, texts: &[&str]) -> anyhow::Result<Vec<Vec<f32>>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(texts.iter().map(|t| Self::vectorize(t)).collect())
    }

    fn embed_query(&self, text: &str) -> anyhow::Result<Vec<f32>> {
        Ok(Self::vectorize(text))
    }

    fn dimension(&self) -> usize {
        HASH_DIMENSION
    }
}

/// LLM that replays canned replies and records every prompt
pub struct ScriptedLlm {
    replies: Mutex<VecDeque<String>>,
    pub prompts: Mutex<Vec<String>>,
}

impl ScriptedLlm {
    pub fn new(replies: &[&str]) -> Self {
        Self {
            replies: Mutex::new(replies.iter().map(|r| r.to_string()).collect()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl LlmClient for ScriptedLlm {
    async fn complete(&self, prompt: &str) -> Result<String> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| RagError::LlmApi("script exhausted".to_string()))
    }

    fn model(&self) -> &str {
        "scripted"
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(true)
    }
}

/// Index over a fresh in-memory collection filled with `texts`
pub async fn index_with(collection: &str, brand: &str, texts: &[&str]) -> Arc<VectorIndex> {
    let store: Arc<dyn VectorStore> = Arc::new(InMemoryStore::new());
    let index = VectorIndex::open_or_create(store, Arc::new(HashEmbedder::new()), collection)
        .await
        .unwrap();
    let docs: Vec<Document> = texts
        .iter()
        .enumerate()
        .map(|(i, t)| Document::from_source(brand, i, *t).with_metadata("brand", brand))
        .collect();
    index.insert_documents(&docs).await.unwrap();
    Arc::new(index)
}
