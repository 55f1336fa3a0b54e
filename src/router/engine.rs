//! Routes a question to one or more tools and merges their answers

use futures_util::future::try_join_all;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

use super::selector::LlmMultiSelector;
use super::tool::{QueryEngineTool, ToolMetadata};
use crate::errors::{RagError, Result};
use crate::llm::LlmClient;
use crate::query::prompts::multi_source_prompt;
use crate::telemetry::{TelemetryCollector, TelemetryEvent};
use crate::types::Response;

pub struct RouterQueryEngine {
    selector: LlmMultiSelector,
    tools: Vec<QueryEngineTool>,
    summarizer: Arc<dyn LlmClient>,
    telemetry: Option<TelemetryCollector>,
}

impl RouterQueryEngine {
    pub fn new(
        selector: LlmMultiSelector,
        tools: Vec<QueryEngineTool>,
        summarizer: Arc<dyn LlmClient>,
    ) -> Self {
        Self {
            selector,
            tools,
            summarizer,
            telemetry: None,
        }
    }

    pub fn with_telemetry(mut self, telemetry: TelemetryCollector) -> Self {
        self.telemetry = Some(telemetry);
        self
    }

    pub fn tools(&self) -> &[QueryEngineTool] {
        &self.tools
    }

    fn record(&self, event: TelemetryEvent) {
        if let Some(telemetry) = &self.telemetry {
            telemetry.record(event);
        }
    }

    pub async fn query(&self, question: &str) -> Result<Response> {
        if self.tools.is_empty() {
            return Err(RagError::Config("Router has no tools".to_string()));
        }

        let metadata: Vec<ToolMetadata> = self.tools.iter().map(|t| t.metadata.clone()).collect();
        let selections = self.selector.select(&metadata, question).await?;
        if selections.is_empty() {
            return Err(RagError::Selection("no tool selected".to_string()));
        }

        for selection in &selections {
            let tool = &self.tools[selection.index];
            info!(tool = tool.name(), reason = %selection.reason, "tool selected");
            self.record(TelemetryEvent::ToolSelected {
                tool: tool.name().to_string(),
                reason: selection.reason.clone(),
                timestamp: Instant::now(),
            });
        }

        let mut response = if selections.len() == 1 {
            self.tools[selections[0].index].engine.query(question).await?
        } else {
            let responses = try_join_all(
                selections
                    .iter()
                    .map(|s| self.tools[s.index].engine.query(question)),
            )
            .await?;
            debug!(count = responses.len(), "combining responses");
            self.summarize(question, responses).await?
        };

        response.selections = selections;
        Ok(response)
    }

    async fn summarize(&self, question: &str, responses: Vec<Response>) -> Result<Response> {
        let context = responses
            .iter()
            .map(|r| r.text.as_str())
            .collect::<Vec<_>>()
            .join("\n\n");
        let prompt = multi_source_prompt(&context, question);

        let started = Instant::now();
        let answer = self.summarizer.complete(&prompt).await?;
        self.record(TelemetryEvent::LlmCompleted {
            model: self.summarizer.model().to_string(),
            prompt_chars: prompt.len(),
            duration_ms: started.elapsed().as_millis() as u64,
            timestamp: Instant::now(),
        });

        let source_nodes = responses.into_iter().flat_map(|r| r.source_nodes).collect();
        Ok(Response::new(answer.trim(), source_nodes))
    }
}
