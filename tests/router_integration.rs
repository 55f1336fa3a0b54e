//! Integration tests for routed question answering
//!
//! Builds the assistant over an in-memory store with two brand collections
//! and a scripted LLM standing in for Groq.

mod common;

use std::sync::Arc;

use common::{HashingEmbedder, ScriptedLlm};
use manualbuddy::assistant::Assistant;
use manualbuddy::config::Config;
use manualbuddy::errors::{RagError, Result};
use manualbuddy::index::VectorIndex;
use manualbuddy::telemetry::TelemetryCollector;
use manualbuddy::types::{Document, EMPTY_RESPONSE};
use manualbuddy::vector_store::{InMemoryStore, VectorStore};

async fn seeded_store() -> Arc<dyn VectorStore> {
    let store: Arc<dyn VectorStore> = Arc::new(InMemoryStore::new());
    let corpus = [
        (
            "siemens_knowledge_base",
            "siemens",
            "S7-1200 CPU 1214C terminal X10 carries the 24V DC supply.",
        ),
        (
            "rockwell_knowledge_base",
            "rockwell",
            "CompactLogix 5380 controllers take 24V DC on the MOD power terminals.",
        ),
    ];
    for (collection, brand, text) in corpus {
        let index = VectorIndex::open_or_create(store.clone(), Arc::new(HashingEmbedder), collection)
            .await
            .unwrap();
        let doc = Document::from_source(brand, 0, text).with_metadata("brand", brand);
        index.insert_documents(&[doc]).await.unwrap();
    }
    store
}

fn config() -> Config {
    let mut config = Config::default();
    config.router.verbose = false;
    config
}

async fn assistant(config: &Config, llm: Arc<ScriptedLlm>, collection: Option<&str>) -> Result<Assistant> {
    Assistant::build(
        config,
        seeded_store().await,
        Arc::new(HashingEmbedder),
        llm,
        collection,
        TelemetryCollector::new(),
    )
    .await
}

#[tokio::test]
async fn test_single_selection_answers_from_one_manual() {
    let llm = ScriptedLlm::new(&[
        r#"[{"choice": 1, "reason": "The question is about the S7-1200."}]"#,
        "Terminal X10 is the 24V DC supply.",
    ]);
    let assistant = assistant(&config(), llm.clone(), None).await.unwrap();

    let response = assistant.ask("What is terminal X10 on the 1214C?").await.unwrap();

    assert_eq!(response.text, "Terminal X10 is the 24V DC supply.");
    assert_eq!(response.selections.len(), 1);
    assert_eq!(assistant.tool_name(response.selections[0].index), Some("siemens_manual_tool"));
    assert!(response
        .source_nodes
        .iter()
        .all(|n| n.node.metadata_value("brand") == Some("siemens")));

    let prompts = llm.prompts();
    assert_eq!(prompts.len(), 2);
    assert!(prompts[0].contains("(1) Useful for questions about Siemens S7-1200 hardware/wiring."));
    assert!(prompts[0].contains("What is terminal X10 on the 1214C?"));
}

#[tokio::test]
async fn test_comparison_queries_both_manuals_and_combines() {
    let llm = ScriptedLlm::new(&[
        r#"[{"choice": 1, "reason": "Siemens side"}, {"choice": 2, "reason": "Rockwell side"}]"#,
        "First partial answer.",
        "Second partial answer.",
        "Both controllers use 24V DC.",
    ]);
    let assistant = assistant(&config(), llm.clone(), None).await.unwrap();

    let response = assistant
        .ask("Compare the power supply of the 1214C and the CompactLogix 5380")
        .await
        .unwrap();

    assert_eq!(response.text, "Both controllers use 24V DC.");
    assert_eq!(response.selections.len(), 2);

    let brands: Vec<&str> = response
        .source_nodes
        .iter()
        .filter_map(|n| n.node.metadata_value("brand"))
        .collect();
    assert!(brands.contains(&"siemens"));
    assert!(brands.contains(&"rockwell"));

    let prompts = llm.prompts();
    assert_eq!(prompts.len(), 4);
    let summary_prompt = &prompts[3];
    assert!(summary_prompt.contains("First partial answer."));
    assert!(summary_prompt.contains("Second partial answer."));
}

#[tokio::test]
async fn test_max_outputs_caps_selection() {
    let mut config = config();
    config.router.max_outputs = Some(1);
    let llm = ScriptedLlm::new(&[
        r#"[{"choice": 2, "reason": "Rockwell"}, {"choice": 1, "reason": "Siemens"}]"#,
        "5380 answer.",
    ]);
    let assistant = assistant(&config, llm.clone(), None).await.unwrap();

    let response = assistant.ask("CompactLogix power?").await.unwrap();

    assert_eq!(response.text, "5380 answer.");
    assert_eq!(response.selections.len(), 1);
    assert_eq!(assistant.tool_name(response.selections[0].index), Some("rockwell_manual_tool"));
    assert_eq!(llm.prompts().len(), 2);
}

#[tokio::test]
async fn test_out_of_range_choice_is_a_selection_error() {
    let llm = ScriptedLlm::new(&[r#"[{"choice": 3, "reason": "??"}]"#]);
    let assistant = assistant(&config(), llm, None).await.unwrap();

    let result = assistant.ask("Anything").await;
    assert!(matches!(result, Err(RagError::Selection(_))));
}

#[tokio::test]
async fn test_direct_collection_bypasses_router() {
    let llm = ScriptedLlm::new(&["Answer from the Rockwell manual."]);
    let assistant = assistant(&config(), llm.clone(), Some("rockwell_knowledge_base"))
        .await
        .unwrap();

    let response = assistant.ask("MOD power terminals?").await.unwrap();
    assert_eq!(response.text, "Answer from the Rockwell manual.");
    assert!(response.selections.is_empty());
    assert_eq!(llm.prompts().len(), 1);
}

#[tokio::test]
async fn test_nonexistent_collection_is_reported() {
    let llm = ScriptedLlm::new(&[]);
    let result = assistant(&config(), llm, Some("beckhoff_knowledge_base")).await;
    assert!(matches!(result, Err(RagError::CollectionNotFound(name)) if name == "beckhoff_knowledge_base"));
}

#[tokio::test]
async fn test_empty_collection_gives_empty_response() {
    let store = seeded_store().await;
    VectorIndex::open_or_create(store.clone(), Arc::new(HashingEmbedder), "general_knowledge_base")
        .await
        .unwrap();
    let llm = ScriptedLlm::new(&[]);

    let assistant = Assistant::build(
        &config(),
        store,
        Arc::new(HashingEmbedder),
        llm.clone(),
        Some("general_knowledge_base"),
        TelemetryCollector::new(),
    )
    .await
    .unwrap();

    let response = assistant.ask("Anything at all?").await.unwrap();
    assert_eq!(response.text, EMPTY_RESPONSE);
    assert!(llm.prompts().is_empty());
}
