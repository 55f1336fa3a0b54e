//! Type definitions module
//!
//! Documents, chunk nodes and responses shared by ingestion and querying.

pub mod document;

// Re-export commonly used types
pub use document::{Document, Metadata, Node, Response, ScoredNode, Selection, EMPTY_RESPONSE};
