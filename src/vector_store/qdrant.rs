// Qdrant-backed vector store
use async_trait::async_trait;
use qdrant_client::{
    qdrant::{
        point_id::PointIdOptions, value::Kind, CreateCollectionBuilder, Distance, PointId,
        PointStruct, SearchPointsBuilder, UpsertPointsBuilder, Value as QdrantValue,
        VectorParamsBuilder,
    },
    Payload, Qdrant, QdrantError,
};
use serde_json::Value as JsonValue;
use std::collections::HashMap;
use tracing::debug;

use super::{node_from_payload, node_to_payload, SearchHit, VectorRecord, VectorStore};
use crate::errors::{RagError, Result};
use crate::types::Metadata;

/// Vector store backed by a Qdrant server
pub struct QdrantStore {
    client: Qdrant,
}

impl QdrantStore {
    /// Connect to Qdrant (the connection is established lazily)
    pub fn new(url: &str, api_key: Option<String>) -> Result<Self> {
        let client = Qdrant::from_url(url)
            .api_key(api_key)
            .build()
            .map_err(store_err)?;

        Ok(Self { client })
    }
}

fn store_err(err: QdrantError) -> RagError {
    RagError::VectorStore(err.to_string())
}

#[async_trait]
impl VectorStore for QdrantStore {
    async fn create_collection(&self, name: &str, dimension: usize) -> Result<()> {
        self.client
            .create_collection(
                CreateCollectionBuilder::new(name)
                    .vectors_config(VectorParamsBuilder::new(dimension as u64, Distance::Cosine)),
            )
            .await
            .map_err(|e| RagError::VectorStore(format!("Failed to create collection {}: {}", name, e)))?;
        Ok(())
    }

    async fn collection_exists(&self, name: &str) -> Result<bool> {
        self.client.collection_exists(name).await.map_err(store_err)
    }

    async fn upsert(&self, collection: &str, records: Vec<VectorRecord>) -> Result<()> {
        if records.is_empty() {
            return Ok(());
        }

        let count = records.len();
        let points = records
            .into_iter()
            .map(|record| {
                let payload = Payload::try_from(JsonValue::Object(node_to_payload(&record.node)))
                    .map_err(|e| RagError::VectorStore(format!("Invalid payload: {}", e)))?;
                Ok(PointStruct::new(record.node.id, record.vector, payload))
            })
            .collect::<Result<Vec<_>>>()?;

        self.client
            .upsert_points(UpsertPointsBuilder::new(collection, points).wait(true))
            .await
            .map_err(|e| RagError::VectorStore(format!("Failed to upsert points: {}", e)))?;

        debug!(collection, count, "upserted points");
        Ok(())
    }

    async fn search(
        &self,
        collection: &str,
        vector: &[f32],
        top_k: usize,
    ) -> Result<Vec<SearchHit>> {
        let response = self
            .client
            .search_points(
                SearchPointsBuilder::new(collection, vector.to_vec(), top_k as u64)
                    .with_payload(true),
            )
            .await
            .map_err(|e| RagError::VectorStore(format!("Failed to search points: {}", e)))?;

        let hits = response
            .result
            .into_iter()
            .map(|point| SearchHit {
                node: node_from_payload(point_id_to_string(&point.id), payload_to_json(point.payload)),
                score: point.score,
            })
            .collect();

        Ok(hits)
    }

    async fn count(&self, collection: &str) -> Result<u64> {
        let info = self
            .client
            .collection_info(collection)
            .await
            .map_err(store_err)?;

        Ok(info.result.and_then(|r| r.points_count).unwrap_or(0))
    }

    async fn delete_collection(&self, collection: &str) -> Result<()> {
        self.client
            .delete_collection(collection)
            .await
            .map_err(store_err)?;
        Ok(())
    }

    async fn health_check(&self) -> Result<bool> {
        match self.client.health_check().await {
            Ok(_) => Ok(true),
            Err(e) => {
                debug!(error = %e, "qdrant health check failed");
                Ok(false)
            }
        }
    }

    fn name(&self) -> &str {
        "qdrant"
    }
}

fn payload_to_json(payload: HashMap<String, QdrantValue>) -> Metadata {
    payload
        .into_iter()
        .filter_map(|(key, value)| qdrant_to_json_value(&value).map(|v| (key, v)))
        .collect()
}

fn qdrant_to_json_value(value: &QdrantValue) -> Option<JsonValue> {
    value.kind.as_ref().and_then(|kind| match kind {
        Kind::StringValue(s) => Some(JsonValue::String(s.clone())),
        Kind::IntegerValue(i) => Some(JsonValue::Number((*i).into())),
        Kind::DoubleValue(f) => serde_json::Number::from_f64(*f).map(JsonValue::Number),
        Kind::BoolValue(b) => Some(JsonValue::Bool(*b)),
        _ => None,
    })
}

fn point_id_to_string(point_id: &Option<PointId>) -> String {
    point_id
        .as_ref()
        .and_then(|id| match &id.point_id_options {
            Some(PointIdOptions::Num(n)) => Some(n.to_string()),
            Some(PointIdOptions::Uuid(u)) => Some(u.clone()),
            None => None,
        })
        .unwrap_or_else(|| "unknown".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Document, Node};

    #[test]
    fn test_qdrant_value_conversion() {
        assert_eq!(
            qdrant_to_json_value(&QdrantValue::from("siemens".to_string())),
            Some(JsonValue::String("siemens".to_string()))
        );
        assert_eq!(
            qdrant_to_json_value(&QdrantValue::from(42i64)),
            Some(JsonValue::from(42))
        );
        assert_eq!(
            qdrant_to_json_value(&QdrantValue::from(true)),
            Some(JsonValue::Bool(true))
        );
    }

    #[test]
    fn test_point_id_to_string() {
        let uuid = PointId::from("5f7e3a1c-0000-4000-8000-000000000000".to_string());
        assert_eq!(
            point_id_to_string(&Some(uuid)),
            "5f7e3a1c-0000-4000-8000-000000000000"
        );
        assert_eq!(point_id_to_string(&Some(PointId::from(7u64))), "7");
        assert_eq!(point_id_to_string(&None), "unknown");
    }

    async fn connect() -> QdrantStore {
        QdrantStore::new("http://localhost:6334", None).unwrap()
    }

    #[tokio::test]
    #[ignore] // Integration test - requires Qdrant
    async fn test_upsert_and_search() {
        let store = connect().await;
        let collection = "manualbuddy_test_upsert";
        let _ = store.delete_collection(collection).await;
        store.create_collection(collection, 4).await.unwrap();

        let doc = Document::from_source("t.txt", 0, "body").with_metadata("brand", "rockwell");
        let node = Node::from_document(&doc, 0, "CompactLogix 5380 controller");
        store
            .upsert(
                collection,
                vec![VectorRecord {
                    node: node.clone(),
                    vector: vec![0.1, 0.2, 0.3, 0.4],
                }],
            )
            .await
            .unwrap();

        let hits = store.search(collection, &[0.1, 0.2, 0.3, 0.4], 5).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].node, node);
        assert_eq!(store.count(collection).await.unwrap(), 1);

        store.delete_collection(collection).await.unwrap();
    }
}
