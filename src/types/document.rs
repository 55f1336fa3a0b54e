//! Documents, chunk nodes and query responses

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use uuid::Uuid;

/// Metadata attached to documents and nodes (ordered by key)
pub type Metadata = serde_json::Map<String, JsonValue>;

/// File-stat keys kept in the payload but left out of embedded and LLM text
pub const EXCLUDED_CONTENT_KEYS: &[&str] = &[
    "file_path",
    "file_type",
    "file_size",
    "creation_date",
    "last_modified_date",
    "last_accessed_date",
];

/// A parsed source document before chunking
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub text: String,
    pub metadata: Metadata,
}

impl Document {
    /// Create a document whose id is derived from its source and page index.
    ///
    /// Re-ingesting the same source yields the same ids, so vector points are
    /// overwritten rather than duplicated.
    pub fn from_source(source: &str, page: usize, text: impl Into<String>) -> Self {
        let id = Uuid::new_v5(&Uuid::NAMESPACE_OID, format!("{}#{}", source, page).as_bytes());
        Self {
            id: id.to_string(),
            text: text.into(),
            metadata: Metadata::new(),
        }
    }

    /// Set a metadata entry, replacing any previous value
    pub fn set_metadata(&mut self, key: &str, value: impl Into<JsonValue>) {
        self.metadata.insert(key.to_string(), value.into());
    }

    /// Builder-style metadata setter
    pub fn with_metadata(mut self, key: &str, value: impl Into<JsonValue>) -> Self {
        self.set_metadata(key, value);
        self
    }

    /// Metadata value as string, if present and a string
    pub fn metadata_str_value(&self, key: &str) -> Option<&str> {
        self.metadata.get(key).and_then(|v| v.as_str())
    }
}

/// A chunk of a document, the unit stored in the vector store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: String,
    pub document_id: String,
    pub text: String,
    pub metadata: Metadata,
    pub chunk_index: usize,
}

impl Node {
    /// Create the `chunk_index`-th node of a document
    pub fn from_document(doc: &Document, chunk_index: usize, text: impl Into<String>) -> Self {
        let id = Uuid::new_v5(
            &Uuid::NAMESPACE_OID,
            format!("{}:{}", doc.id, chunk_index).as_bytes(),
        );
        Self {
            id: id.to_string(),
            document_id: doc.id.clone(),
            text: text.into(),
            metadata: doc.metadata.clone(),
            chunk_index,
        }
    }

    /// Metadata rendered as `key: value` lines, file-stat keys excluded
    pub fn metadata_str(&self) -> String {
        self.metadata
            .iter()
            .filter(|(k, _)| !EXCLUDED_CONTENT_KEYS.contains(&k.as_str()))
            .map(|(k, v)| match v {
                JsonValue::String(s) => format!("{}: {}", k, s),
                other => format!("{}: {}", k, other),
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Text as embedded and as shown to the LLM: metadata header, blank line, body
    pub fn content(&self) -> String {
        let header = self.metadata_str();
        if header.is_empty() {
            self.text.clone()
        } else {
            format!("{}\n\n{}", header, self.text)
        }
    }

    /// Metadata value as string, if present and a string
    pub fn metadata_value(&self, key: &str) -> Option<&str> {
        self.metadata.get(key).and_then(|v| v.as_str())
    }
}

/// Node returned by similarity search
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredNode {
    pub node: Node,
    pub score: f32,
}

/// A tool chosen by the selector (0-based index into the tool list)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    pub index: usize,
    pub reason: String,
}

/// Final answer with the nodes it was grounded on
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Response {
    pub text: String,
    pub source_nodes: Vec<ScoredNode>,
    pub selections: Vec<Selection>,
}

/// Answer returned when retrieval finds nothing
pub const EMPTY_RESPONSE: &str = "Empty Response";

impl Response {
    pub fn new(text: impl Into<String>, source_nodes: Vec<ScoredNode>) -> Self {
        Self {
            text: text.into(),
            source_nodes,
            selections: Vec::new(),
        }
    }

    /// Response for an empty retrieval
    pub fn empty() -> Self {
        Self::new(EMPTY_RESPONSE, Vec::new())
    }

    pub fn is_empty(&self) -> bool {
        self.source_nodes.is_empty() && self.text == EMPTY_RESPONSE
    }
}

impl std::fmt::Display for Response {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_id_is_deterministic() {
        let a = Document::from_source("data/raw/siemens/s71200.pdf", 0, "a");
        let b = Document::from_source("data/raw/siemens/s71200.pdf", 0, "b");
        let c = Document::from_source("data/raw/siemens/s71200.pdf", 1, "a");
        assert_eq!(a.id, b.id);
        assert_ne!(a.id, c.id);
    }

    #[test]
    fn test_node_inherits_metadata() {
        let doc = Document::from_source("x.txt", 0, "body")
            .with_metadata("brand", "rockwell")
            .with_metadata("file_size", 12);
        let node = Node::from_document(&doc, 3, "chunk");
        assert_eq!(node.document_id, doc.id);
        assert_eq!(node.chunk_index, 3);
        assert_eq!(node.metadata_value("brand"), Some("rockwell"));
    }

    #[test]
    fn test_node_content_includes_metadata_header() {
        let doc = Document::from_source("x.txt", 0, "body")
            .with_metadata("brand", "siemens")
            .with_metadata("file_name", "manual.pdf");
        let node = Node::from_document(&doc, 0, "Wire L+ to 24V DC.");
        assert_eq!(
            node.content(),
            "brand: siemens\nfile_name: manual.pdf\n\nWire L+ to 24V DC."
        );
    }

    #[test]
    fn test_node_content_skips_file_stats() {
        let doc = Document::from_source("data/raw/competitors/5380.txt", 0, "body")
            .with_metadata("file_path", "data/raw/competitors/5380.txt")
            .with_metadata("file_name", "5380.txt")
            .with_metadata("file_type", "txt")
            .with_metadata("file_size", 2048)
            .with_metadata("last_modified_date", "2024-05-01")
            .with_metadata("brand", "rockwell");
        let node = Node::from_document(&doc, 0, "MOD power is 24V DC.");

        assert_eq!(
            node.content(),
            "brand: rockwell\nfile_name: 5380.txt\n\nMOD power is 24V DC."
        );
        // Still stored for display and filtering
        assert_eq!(node.metadata_value("file_path"), Some("data/raw/competitors/5380.txt"));
    }

    #[test]
    fn test_node_content_without_metadata() {
        let doc = Document::from_source("x.txt", 0, "body");
        let node = Node::from_document(&doc, 0, "plain");
        assert_eq!(node.content(), "plain");
    }

    #[test]
    fn test_node_ids_differ_per_chunk() {
        let doc = Document::from_source("x.txt", 0, "body");
        let first = Node::from_document(&doc, 0, "a");
        let second = Node::from_document(&doc, 1, "b");
        assert_ne!(first.id, second.id);
        assert!(Uuid::parse_str(&first.id).is_ok());
    }

    #[test]
    fn test_empty_response() {
        let response = Response::empty();
        assert!(response.is_empty());
        assert_eq!(response.to_string(), EMPTY_RESPONSE);
    }
}
