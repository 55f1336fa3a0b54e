//! Routing questions across per-brand collections
//!
//! Each collection is exposed as a [`QueryEngineTool`]. The
//! [`LlmMultiSelector`] reads the tool descriptions and picks the relevant
//! ones; [`RouterQueryEngine`] queries them and merges the answers.

pub mod engine;
pub mod selector;
pub mod tool;

pub use engine::RouterQueryEngine;
pub use selector::LlmMultiSelector;
pub use tool::{QueryEngineTool, ToolMetadata};
