//! LLM-driven multi-choice tool selection

use serde::Deserialize;
use serde_json::Value as JsonValue;
use std::sync::Arc;
use tracing::debug;

use super::tool::ToolMetadata;
use crate::errors::{RagError, Result};
use crate::llm::LlmClient;
use crate::types::Selection;

const MULTI_SELECT_TEMPLATE: &str = "Some choices are given below. It is provided in a numbered \
list (1 to {num_choices}), where each item in the list corresponds to a summary.\n\
---------------------\n\
{context_list}\n\
---------------------\n\
Using only the choices above and not prior knowledge, return the top choices \
(no more than {max_outputs}, but only select what is needed) that are most relevant \
to the question: '{query_str}'\n";

const OUTPUT_FORMAT: &str = "\n\nThe output should be ONLY JSON formatted as a JSON instance.\n\n\
Here is an example:\n\
[\n\
    {\n\
        \"choice\": 1,\n\
        \"reason\": \"<insert reason for choice>\"\n\
    },\n\
    ...\n\
]\n";

#[derive(Debug, Deserialize)]
struct RawAnswer {
    #[serde(alias = "Choice")]
    choice: JsonValue,
    #[serde(default, alias = "Reason")]
    reason: String,
}

/// Asks the LLM which tools fit a question
pub struct LlmMultiSelector {
    llm: Arc<dyn LlmClient>,
    max_outputs: Option<usize>,
}

impl LlmMultiSelector {
    pub fn new(llm: Arc<dyn LlmClient>) -> Self {
        Self {
            llm,
            max_outputs: None,
        }
    }

    /// Cap on selections (defaults to the number of choices)
    pub fn with_max_outputs(mut self, max_outputs: Option<usize>) -> Self {
        self.max_outputs = max_outputs;
        self
    }

    fn limit(&self, num_choices: usize) -> usize {
        self.max_outputs.unwrap_or(num_choices)
    }

    /// Selection prompt for these choices
    pub fn build_prompt(&self, choices: &[ToolMetadata], query: &str) -> String {
        let context_list = choices
            .iter()
            .enumerate()
            .map(|(i, c)| format!("({}) {}", i + 1, c.description))
            .collect::<Vec<_>>()
            .join("\n\n");

        let prompt = MULTI_SELECT_TEMPLATE
            .replace("{num_choices}", &choices.len().to_string())
            .replace("{max_outputs}", &self.limit(choices.len()).to_string())
            .replace("{context_list}", &context_list);
        // Query last so its text is never treated as a placeholder
        let prompt = prompt.replace("{query_str}", query);

        format!("{}{}", prompt, OUTPUT_FORMAT)
    }

    /// Pick tools for a question; indices in the result are 0-based
    pub async fn select(&self, choices: &[ToolMetadata], query: &str) -> Result<Vec<Selection>> {
        let prompt = self.build_prompt(choices, query);
        let output = self.llm.complete(&prompt).await?;
        debug!(output = %output, "selector output");
        parse_selections(&output, choices.len(), self.limit(choices.len()))
    }
}

/// Parse selector output into validated, de-duplicated 0-based selections
pub fn parse_selections(
    output: &str,
    num_choices: usize,
    max_outputs: usize,
) -> Result<Vec<Selection>> {
    let answers = parse_answers(output)?;

    let mut selections: Vec<Selection> = Vec::new();
    for answer in answers {
        let choice = choice_number(&answer.choice).ok_or_else(|| {
            RagError::Selection(format!("Invalid choice value: {}", answer.choice))
        })?;
        if choice < 1 || choice > num_choices as i64 {
            return Err(RagError::Selection(format!(
                "Choice {} is out of range (1 to {})",
                choice, num_choices
            )));
        }

        let index = (choice - 1) as usize;
        if selections.iter().all(|s| s.index != index) {
            selections.push(Selection {
                index,
                reason: answer.reason,
            });
        }
    }

    selections.truncate(max_outputs);
    Ok(selections)
}

fn parse_answers(output: &str) -> Result<Vec<RawAnswer>> {
    let unparseable = || RagError::Selection(format!("Could not parse selector output: {}", output));

    let span = match (output.find('['), output.rfind(']')) {
        (Some(start), Some(end)) if start < end => &output[start..=end],
        _ => match (output.find('{'), output.rfind('}')) {
            (Some(start), Some(end)) if start < end => &output[start..=end],
            _ => return Err(unparseable()),
        },
    };

    let parse = |text: &str| -> Option<Vec<RawAnswer>> {
        if text.trim_start().starts_with('[') {
            serde_json::from_str(text).ok()
        } else {
            serde_json::from_str::<RawAnswer>(text).ok().map(|a| vec![a])
        }
    };

    parse(span)
        .or_else(|| {
            // Models sometimes copy unquoted keys from the example
            let quoted = span
                .replace("choice:", "\"choice\":")
                .replace("reason:", "\"reason\":");
            parse(&quoted)
        })
        .ok_or_else(unparseable)
}

fn choice_number(value: &JsonValue) -> Option<i64> {
    match value {
        JsonValue::Number(n) => n.as_i64(),
        JsonValue::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
