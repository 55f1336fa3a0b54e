//! Turning raw manuals into indexed nodes

pub mod chunker;
pub mod llama_parse;
pub mod pipeline;
pub mod reader;

pub use chunker::TextChunker;
pub use llama_parse::{parse_to_markdown, CloudParser, LlamaParseClient};
pub use pipeline::{CategoryReport, IngestionPipeline, IngestionReport};
pub use reader::DirectoryReader;
