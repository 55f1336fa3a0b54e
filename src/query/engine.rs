//! Retrieve-then-generate over one collection

use std::sync::Arc;
use std::time::Instant;
use tracing::debug;

use super::prompts::{format_context, text_qa_prompt};
use crate::errors::Result;
use crate::index::VectorIndex;
use crate::llm::LlmClient;
use crate::telemetry::{TelemetryCollector, TelemetryEvent};
use crate::types::Response;

/// Default number of passages retrieved per question
pub const DEFAULT_SIMILARITY_TOP_K: usize = 5;

pub struct QueryEngine {
    index: Arc<VectorIndex>,
    llm: Arc<dyn LlmClient>,
    similarity_top_k: usize,
    telemetry: Option<TelemetryCollector>,
}

impl QueryEngine {
    pub fn new(index: Arc<VectorIndex>, llm: Arc<dyn LlmClient>) -> Self {
        Self {
            index,
            llm,
            similarity_top_k: DEFAULT_SIMILARITY_TOP_K,
            telemetry: None,
        }
    }

    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.similarity_top_k = top_k;
        self
    }

    pub fn with_telemetry(mut self, telemetry: TelemetryCollector) -> Self {
        self.telemetry = Some(telemetry);
        self
    }

    pub fn collection(&self) -> &str {
        self.index.collection()
    }

    pub fn similarity_top_k(&self) -> usize {
        self.similarity_top_k
    }

    fn record(&self, event: TelemetryEvent) {
        if let Some(telemetry) = &self.telemetry {
            telemetry.record(event);
        }
    }

    /// Answer a question from this collection only.
    ///
    /// Nothing retrieved means "Empty Response" and no LLM call.
    pub async fn query(&self, question: &str) -> Result<Response> {
        let started = Instant::now();
        let nodes = self.index.retrieve(question, self.similarity_top_k).await?;
        self.record(TelemetryEvent::RetrievalCompleted {
            collection: self.collection().to_string(),
            nodes: nodes.len(),
            duration_ms: started.elapsed().as_millis() as u64,
            timestamp: Instant::now(),
        });

        if nodes.is_empty() {
            debug!(collection = self.collection(), "nothing retrieved");
            return Ok(Response::empty());
        }

        let prompt = text_qa_prompt(&format_context(&nodes), question);
        let llm_started = Instant::now();
        let answer = self.llm.complete(&prompt).await?;
        self.record(TelemetryEvent::LlmCompleted {
            model: self.llm.model().to_string(),
            prompt_chars: prompt.len(),
            duration_ms: llm_started.elapsed().as_millis() as u64,
            timestamp: Instant::now(),
        });

        Ok(Response::new(answer.trim(), nodes))
    }
}
