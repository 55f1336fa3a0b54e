//! Wiring of store, embedder, LLM and engines for the question-answering commands

use anyhow::Context;
use std::sync::Arc;
use std::time::Instant;

use crate::config::Config;
use crate::embedding::{BertEmbedder, Embedder};
use crate::errors::Result;
use crate::index::VectorIndex;
use crate::llm::{GroqClient, LlmClient};
use crate::query::QueryEngine;
use crate::router::{LlmMultiSelector, QueryEngineTool, RouterQueryEngine, ToolMetadata};
use crate::telemetry::{TelemetryCollector, TelemetryEvent};
use crate::types::Response;
use crate::vector_store::{QdrantStore, VectorStore};

enum Target {
    Routed(RouterQueryEngine),
    Direct(QueryEngine),
}

/// Answers questions either through the router or from one collection
pub struct Assistant {
    target: Target,
    telemetry: TelemetryCollector,
}

/// Qdrant store from configuration
pub fn connect_store(config: &Config) -> Result<Arc<dyn VectorStore>> {
    Ok(Arc::new(QdrantStore::new(
        &config.vector_store.url,
        Config::qdrant_api_key(),
    )?))
}

impl Assistant {
    /// Connect to the live services named in `config`
    pub async fn connect(
        config: &Config,
        collection: Option<&str>,
        telemetry: TelemetryCollector,
    ) -> anyhow::Result<Self> {
        let store = connect_store(config).context("Failed to connect to Qdrant")?;
        let llm: Arc<dyn LlmClient> =
            Arc::new(GroqClient::from_env(&config.llm).context("Failed to create Groq client")?);
        let embedder: Arc<dyn Embedder> = Arc::new(
            BertEmbedder::new(&config.embedding).context("Failed to load embedding model")?,
        );

        Ok(Self::build(config, store, embedder, llm, collection, telemetry).await?)
    }

    /// Assemble engines over existing collections
    pub async fn build(
        config: &Config,
        store: Arc<dyn VectorStore>,
        embedder: Arc<dyn Embedder>,
        llm: Arc<dyn LlmClient>,
        collection: Option<&str>,
        telemetry: TelemetryCollector,
    ) -> Result<Self> {
        let top_k = config.router.similarity_top_k;

        let target = match collection {
            Some(name) => {
                let index = VectorIndex::open_existing(store, embedder, name).await?;
                Target::Direct(
                    QueryEngine::new(Arc::new(index), llm)
                        .with_top_k(top_k)
                        .with_telemetry(telemetry.clone()),
                )
            }
            None => {
                let mut tools = Vec::with_capacity(config.router.tools.len());
                for tool_spec in &config.router.tools {
                    let index =
                        VectorIndex::open_existing(store.clone(), embedder.clone(), &tool_spec.collection)
                            .await?;
                    let engine = QueryEngine::new(Arc::new(index), llm.clone())
                        .with_top_k(top_k)
                        .with_telemetry(telemetry.clone());
                    tools.push(QueryEngineTool::new(
                        Arc::new(engine),
                        ToolMetadata::new(tool_spec.name.clone(), tool_spec.description.clone()),
                    ));
                }

                let selector = LlmMultiSelector::new(llm.clone())
                    .with_max_outputs(config.router.max_outputs);
                Target::Routed(
                    RouterQueryEngine::new(selector, tools, llm)
                        .with_telemetry(telemetry.clone()),
                )
            }
        };

        Ok(Self { target, telemetry })
    }

    pub async fn ask(&self, question: &str) -> Result<Response> {
        let started = Instant::now();
        let result = match &self.target {
            Target::Routed(router) => router.query(question).await,
            Target::Direct(engine) => engine.query(question).await,
        };

        match &result {
            Ok(response) => self.telemetry.record(TelemetryEvent::QueryCompleted {
                tools: response.selections.len().max(1),
                duration_ms: started.elapsed().as_millis() as u64,
                timestamp: Instant::now(),
            }),
            Err(e) => self.telemetry.record(TelemetryEvent::QueryFailed {
                error: e.to_string(),
                timestamp: Instant::now(),
            }),
        }
        result
    }

    /// Tools as (name, description, collection); one pseudo-tool in direct mode
    pub fn tools(&self) -> Vec<(String, String, String)> {
        match &self.target {
            Target::Routed(router) => router
                .tools()
                .iter()
                .map(|t| {
                    (
                        t.name().to_string(),
                        t.description().to_string(),
                        t.collection().to_string(),
                    )
                })
                .collect(),
            Target::Direct(engine) => vec![(
                "direct".to_string(),
                "Single collection, no routing".to_string(),
                engine.collection().to_string(),
            )],
        }
    }

    /// Tool name for a selection index (routed mode only)
    pub fn tool_name(&self, index: usize) -> Option<&str> {
        match &self.target {
            Target::Routed(router) => router.tools().get(index).map(|t| t.name()),
            Target::Direct(_) => None,
        }
    }

    pub fn is_routed(&self) -> bool {
        matches!(self.target, Target::Routed(_))
    }

    pub fn telemetry(&self) -> &TelemetryCollector {
        &self.telemetry
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::RagError;
    use crate::test_support::{HashEmbedder, ScriptedLlm};
    use crate::types::Document;
    use crate::vector_store::InMemoryStore;

    async fn seeded_store(embedder: Arc<dyn Embedder>) -> Arc<dyn VectorStore> {
        let store: Arc<dyn VectorStore> = Arc::new(InMemoryStore::new());
        for (collection, text) in [
            ("siemens_knowledge_base", "S7-1200 terminal X10 wiring"),
            ("rockwell_knowledge_base", "CompactLogix 5380 power supply"),
        ] {
            let index = VectorIndex::open_or_create(store.clone(), embedder.clone(), collection)
                .await
                .unwrap();
            index
                .insert_documents(&[Document::from_source(collection, 0, text)])
                .await
                .unwrap();
        }
        store
    }

    fn quiet_config() -> Config {
        let mut config = Config::default();
        config.router.verbose = false;
        config
    }

    #[tokio::test]
    async fn test_routed_ask_records_telemetry() {
        let embedder: Arc<dyn Embedder> = Arc::new(HashEmbedder::new());
        let store = seeded_store(embedder.clone()).await;
        let llm = Arc::new(ScriptedLlm::new(&[
            r#"[{"choice": 1, "reason": "Siemens wiring"}]"#,
            "Terminal X10 is the power input.",
        ]));
        let telemetry = TelemetryCollector::new();

        let assistant = Assistant::build(&quiet_config(), store, embedder, llm, None, telemetry.clone())
            .await
            .unwrap();
        assert!(assistant.is_routed());
        assert_eq!(assistant.tools().len(), 2);

        let response = assistant.ask("What is X10?").await.unwrap();
        assert_eq!(response.text, "Terminal X10 is the power input.");
        assert_eq!(assistant.tool_name(response.selections[0].index), Some("siemens_manual_tool"));

        let stats = telemetry.get_stats();
        assert_eq!(stats.queries, 1);
        assert_eq!(stats.tool_selections, 1);
    }

    #[tokio::test]
    async fn test_direct_mode_skips_selector() {
        let embedder: Arc<dyn Embedder> = Arc::new(HashEmbedder::new());
        let store = seeded_store(embedder.clone()).await;
        let llm = Arc::new(ScriptedLlm::new(&["5380 takes 24V."]));

        let assistant = Assistant::build(
            &quiet_config(),
            store,
            embedder,
            llm.clone(),
            Some("rockwell_knowledge_base"),
            TelemetryCollector::new(),
        )
        .await
        .unwrap();
        assert!(!assistant.is_routed());

        let response = assistant.ask("CompactLogix supply?").await.unwrap();
        assert_eq!(response.text, "5380 takes 24V.");
        assert_eq!(llm.prompts().len(), 1);
        assert!(llm.prompts()[0].starts_with("Context information is below."));
    }

    #[tokio::test]
    async fn test_missing_collection_fails_build() {
        let embedder: Arc<dyn Embedder> = Arc::new(HashEmbedder::new());
        let store: Arc<dyn VectorStore> = Arc::new(InMemoryStore::new());
        let result = Assistant::build(
            &quiet_config(),
            store,
            embedder,
            Arc::new(ScriptedLlm::new(&[])),
            None,
            TelemetryCollector::new(),
        )
        .await;
        assert!(matches!(result, Err(RagError::CollectionNotFound(_))));
    }

    #[tokio::test]
    async fn test_failed_query_is_counted() {
        let embedder: Arc<dyn Embedder> = Arc::new(HashEmbedder::new());
        let store = seeded_store(embedder.clone()).await;
        let llm = Arc::new(ScriptedLlm::new(&["no json here"]));
        let telemetry = TelemetryCollector::new();
        let assistant = Assistant::build(&quiet_config(), store, embedder, llm, None, telemetry.clone())
            .await
            .unwrap();

        assert!(assistant.ask("?").await.is_err());
        assert_eq!(telemetry.get_stats().queries_failed, 1);
    }
}
