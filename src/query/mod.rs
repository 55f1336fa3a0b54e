//! Question answering over a single collection

pub mod engine;
pub mod prompts;

pub use engine::{QueryEngine, DEFAULT_SIMILARITY_TOP_K};
