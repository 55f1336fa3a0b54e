//! Prompt templates for answering and summarising

use crate::types::ScoredNode;

/// Answer from retrieved passages of one collection
pub const TEXT_QA_TEMPLATE: &str = "Context information is below.\n\
---------------------\n\
{context_str}\n\
---------------------\n\
Given the context information and not prior knowledge, answer the query.\n\
Query: {query_str}\n\
Answer: ";

/// Combine answers from several collections
pub const MULTI_SOURCE_TEMPLATE: &str = "Context information from multiple sources is below.\n\
---------------------\n\
{context_str}\n\
---------------------\n\
Given the information from multiple sources and not prior knowledge, answer the query.\n\
Query: {query_str}\n\
Answer: ";

// Substitutes into the template text only, never into inserted values
fn fill(template: &str, context: &str, query: &str) -> String {
    template
        .split("{context_str}")
        .map(|part| part.replace("{query_str}", query))
        .collect::<Vec<_>>()
        .join(context)
}

pub fn text_qa_prompt(context: &str, query: &str) -> String {
    fill(TEXT_QA_TEMPLATE, context, query)
}

pub fn multi_source_prompt(context: &str, query: &str) -> String {
    fill(MULTI_SOURCE_TEMPLATE, context, query)
}

/// Node contents (metadata header and text) separated by blank lines
pub fn format_context(nodes: &[ScoredNode]) -> String {
    nodes
        .iter()
        .map(|n| n.node.content())
        .collect::<Vec<_>>()
        .join("\n\n")
}
