//! In-process vector store with brute-force cosine search

use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::sync::RwLock;

use super::{SearchHit, VectorRecord, VectorStore};
use crate::errors::{RagError, Result};

struct Collection {
    dimension: usize,
    records: BTreeMap<String, VectorRecord>,
}

/// Vector store kept entirely in memory
///
/// Used for dry-run ingestion and tests; nothing survives the process.
#[derive(Default)]
pub struct InMemoryStore {
    collections: RwLock<HashMap<String, Collection>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Names of all collections, sorted
    pub fn collection_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .collections
            .read()
            .map(|c| c.keys().cloned().collect())
            .unwrap_or_default();
        names.sort();
        names
    }
}

fn lock_poisoned() -> RagError {
    RagError::VectorStore("in-memory store lock poisoned".to_string())
}

/// Cosine similarity; zero vectors score 0
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        dot / (norm_a * norm_b)
    }
}

#[async_trait]
impl VectorStore for InMemoryStore {
    async fn create_collection(&self, name: &str, dimension: usize) -> Result<()> {
        let mut collections = self.collections.write().map_err(|_| lock_poisoned())?;
        collections.entry(name.to_string()).or_insert_with(|| Collection {
            dimension,
            records: BTreeMap::new(),
        });
        Ok(())
    }

    async fn collection_exists(&self, name: &str) -> Result<bool> {
        let collections = self.collections.read().map_err(|_| lock_poisoned())?;
        Ok(collections.contains_key(name))
    }

    async fn upsert(&self, collection: &str, records: Vec<VectorRecord>) -> Result<()> {
        let mut collections = self.collections.write().map_err(|_| lock_poisoned())?;
        let target = collections
            .get_mut(collection)
            .ok_or_else(|| RagError::CollectionNotFound(collection.to_string()))?;

        for record in records {
            if record.vector.len() != target.dimension {
                return Err(RagError::DimensionMismatch {
                    expected: target.dimension,
                    actual: record.vector.len(),
                });
            }
            target.records.insert(record.node.id.clone(), record);
        }
        Ok(())
    }

    async fn search(
        &self,
        collection: &str,
        vector: &[f32],
        top_k: usize,
    ) -> Result<Vec<SearchHit>> {
        let collections = self.collections.read().map_err(|_| lock_poisoned())?;
        let target = collections
            .get(collection)
            .ok_or_else(|| RagError::CollectionNotFound(collection.to_string()))?;

        if vector.len() != target.dimension {
            return Err(RagError::DimensionMismatch {
                expected: target.dimension,
                actual: vector.len(),
            });
        }

        let mut hits: Vec<SearchHit> = target
            .records
            .values()
            .map(|record| SearchHit {
                node: record.node.clone(),
                score: cosine_similarity(vector, &record.vector),
            })
            .collect();

        hits.sort_by(|a, b| b.score.total_cmp(&a.score));
        hits.truncate(top_k);
        Ok(hits)
    }

    async fn count(&self, collection: &str) -> Result<u64> {
        let collections = self.collections.read().map_err(|_| lock_poisoned())?;
        collections
            .get(collection)
            .map(|c| c.records.len() as u64)
            .ok_or_else(|| RagError::CollectionNotFound(collection.to_string()))
    }

    async fn delete_collection(&self, collection: &str) -> Result<()> {
        let mut collections = self.collections.write().map_err(|_| lock_poisoned())?;
        collections.remove(collection);
        Ok(())
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(true)
    }

    fn name(&self) -> &str {
        "memory"
    }
}
