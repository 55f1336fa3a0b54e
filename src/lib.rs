//! ManualBuddy - Routed retrieval-augmented Q&A over industrial hardware manuals
//!
//! Manuals are ingested per brand into Qdrant collections. Each collection is
//! exposed to an LLM selector as a tool; questions are routed to the relevant
//! tools and their answers merged.
//!
//! # Architecture
//!
//! - **Ingestion**: directory reader, cloud PDF parser, sentence chunker
//! - **Index**: embedding + vector store behind one handle per collection
//! - **Query**: retrieve-then-answer engine, LLM multi-selector and router
//! - **Interface**: CLI, chat loop, doctor and telemetry

pub mod errors;
pub mod types;
pub mod config;

// Storage and models
pub mod embedding;
pub mod vector_store;
pub mod index;
pub mod llm;

// Ingestion
pub mod ingestion;

// Query and routing
pub mod query;
pub mod router;
pub mod assistant;

// Interface
pub mod cli;
pub mod doctor;
pub mod repl;
pub mod telemetry;

#[cfg(test)]
mod test_support;

// Re-export commonly used types
pub use assistant::Assistant;
pub use config::Config;
pub use errors::{RagError, Result};
pub use types::{Document, Node, Response, ScoredNode, Selection};
