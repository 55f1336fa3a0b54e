//! Hosted LLM access

pub mod groq;

pub use groq::GroqClient;

use async_trait::async_trait;

use crate::errors::Result;

/// Single-turn text completion
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Send one prompt as a user message and return the reply text
    async fn complete(&self, prompt: &str) -> Result<String>;

    /// Model identifier
    fn model(&self) -> &str;

    /// Check if the provider is reachable and accepts our credentials
    async fn health_check(&self) -> Result<bool>;
}
