//! Query engines wrapped as selectable tools

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::query::QueryEngine;

/// What the selector reads about a tool
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolMetadata {
    pub name: String,
    pub description: String,
}

impl ToolMetadata {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
        }
    }
}

#[derive(Clone)]
pub struct QueryEngineTool {
    pub engine: Arc<QueryEngine>,
    pub metadata: ToolMetadata,
}

impl QueryEngineTool {
    pub fn new(engine: Arc<QueryEngine>, metadata: ToolMetadata) -> Self {
        Self { engine, metadata }
    }

    pub fn name(&self) -> &str {
        &self.metadata.name
    }

    pub fn description(&self) -> &str {
        &self.metadata.description
    }

    pub fn collection(&self) -> &str {
        self.engine.collection()
    }
}

impl std::fmt::Debug for QueryEngineTool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryEngineTool")
            .field("metadata", &self.metadata)
            .field("collection", &self.collection())
            .finish()
    }
}
