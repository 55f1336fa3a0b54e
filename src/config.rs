//! Configuration management for manualbuddy
//!
//! TOML-based configuration with defaults and validation.
//! Location: ~/.manualbuddy/config.toml
//!
//! Secrets never live in the file: `GROQ_API_KEY`, `LLAMA_CLOUD_API_KEY`
//! and `QDRANT_API_KEY` come from the environment (or a `.env` file).
//! `QDRANT_URL` overrides `vector_store.url` when set.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::errors::{RagError, Result};

pub const GROQ_API_KEY_ENV: &str = "GROQ_API_KEY";
pub const LLAMA_CLOUD_API_KEY_ENV: &str = "LLAMA_CLOUD_API_KEY";
pub const QDRANT_URL_ENV: &str = "QDRANT_URL";
pub const QDRANT_API_KEY_ENV: &str = "QDRANT_API_KEY";

/// Complete configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub embedding: EmbeddingConfig,
    #[serde(default)]
    pub vector_store: VectorStoreConfig,
    #[serde(default)]
    pub ingestion: IngestionConfig,
    #[serde(default)]
    pub parser: ParserConfig,
    #[serde(default)]
    pub router: RouterConfig,
}

/// Hosted LLM (Groq, OpenAI-compatible) settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    pub base_url: String,
    pub model: String,
    pub temperature: f32,
    pub timeout_secs: u64,
}

/// Local embedding model settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    pub model_id: String,
    pub query_instruction: String,
    pub max_length: usize,
    pub batch_size: usize,
}

/// Qdrant connection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorStoreConfig {
    pub url: String,
}

/// How a category's raw files become documents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    /// High-fidelity cloud parsing of PDFs (complex tables)
    Cloud,
    /// Fast local read of plain text files
    Local,
    /// Collection is created but nothing is ingested
    Skip,
}

impl Strategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Strategy::Cloud => "cloud",
            Strategy::Local => "local",
            Strategy::Skip => "skip",
        }
    }
}

/// One raw-data category and where it goes
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Directory name under the raw data path
    pub category: String,
    /// Target collection
    pub collection: String,
    pub strategy: Strategy,
    /// `brand` metadata tag; defaults to the category name
    #[serde(default)]
    pub brand: Option<String>,
    /// Optional `category` metadata tag
    #[serde(default)]
    pub category_tag: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestionConfig {
    pub raw_dir: PathBuf,
    pub default_collection: String,
    /// Chunk size in (estimated) tokens
    pub chunk_size: usize,
    /// Overlap between consecutive chunks in (estimated) tokens
    pub chunk_overlap: usize,
    /// Read category directories recursively for the local strategy
    #[serde(default)]
    pub recursive: bool,
    pub sources: Vec<SourceConfig>,
}

/// LlamaCloud parsing API settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParserConfig {
    pub base_url: String,
    pub language: String,
    pub check_interval_secs: u64,
    pub max_timeout_secs: u64,
}

/// One routable retrieval tool
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolSpec {
    pub name: String,
    pub description: String,
    pub collection: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouterConfig {
    pub similarity_top_k: usize,
    /// Maximum tools the selector may pick (None = number of tools)
    #[serde(default)]
    pub max_outputs: Option<usize>,
    #[serde(default = "default_true")]
    pub verbose: bool,
    pub tools: Vec<ToolSpec>,
}

fn default_true() -> bool {
    true
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.groq.com/openai/v1".to_string(),
            model: "llama-3.3-70b-versatile".to_string(),
            temperature: 0.1,
            timeout_secs: 60,
        }
    }
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            model_id: "BAAI/bge-small-en-v1.5".to_string(),
            query_instruction: "Represent this sentence for searching relevant passages: "
                .to_string(),
            max_length: 512,
            batch_size: 10,
        }
    }
}

impl Default for VectorStoreConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:6334".to_string(),
        }
    }
}

impl Default for IngestionConfig {
    fn default() -> Self {
        Self {
            raw_dir: PathBuf::from("data/raw"),
            default_collection: "general_knowledge_base".to_string(),
            chunk_size: 1024,
            chunk_overlap: 200,
            recursive: false,
            sources: vec![
                SourceConfig {
                    category: "siemens".to_string(),
                    collection: "siemens_knowledge_base".to_string(),
                    strategy: Strategy::Cloud,
                    brand: None,
                    category_tag: None,
                },
                SourceConfig {
                    category: "competitors".to_string(),
                    collection: "rockwell_knowledge_base".to_string(),
                    strategy: Strategy::Local,
                    brand: Some("rockwell".to_string()),
                    category_tag: Some("competitor_specs".to_string()),
                },
            ],
        }
    }
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.cloud.llamaindex.ai".to_string(),
            language: "en".to_string(),
            check_interval_secs: 1,
            max_timeout_secs: 2000,
        }
    }
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            similarity_top_k: 5,
            max_outputs: None,
            verbose: true,
            tools: vec![
                ToolSpec {
                    name: "siemens_manual_tool".to_string(),
                    description: "Useful for questions about Siemens S7-1200 hardware/wiring."
                        .to_string(),
                    collection: "siemens_knowledge_base".to_string(),
                },
                ToolSpec {
                    name: "rockwell_manual_tool".to_string(),
                    description: "Useful for questions about Rockwell, Allen-Bradley, and CompactLogix hardware."
                        .to_string(),
                    collection: "rockwell_knowledge_base".to_string(),
                },
            ],
        }
    }
}

impl IngestionConfig {
    /// Source configuration for a raw-data category, if one is mapped
    pub fn source_for(&self, category: &str) -> Option<&SourceConfig> {
        self.sources.iter().find(|s| s.category == category)
    }

    /// Collection a category routes to (unmapped categories go to the default)
    pub fn collection_for(&self, category: &str) -> &str {
        self.source_for(category)
            .map(|s| s.collection.as_str())
            .unwrap_or(&self.default_collection)
    }
}

impl Config {
    /// Load configuration from file or use defaults
    pub fn load(path: Option<PathBuf>) -> Result<Self> {
        let mut config = if let Some(config_path) = path {
            Self::load_from_file(&config_path)?
        } else {
            Self::load_default()?
        };
        config.apply_env();
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from specific file
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| RagError::Config(format!("Failed to read config {:?}: {}", path, e)))?;

        toml::from_str(&contents)
            .map_err(|e| RagError::Config(format!("Failed to parse config: {}", e)))
    }

    /// Load from the standard location or fall back to built-in defaults
    pub fn load_default() -> Result<Self> {
        match Self::default_path() {
            Some(config_path) if config_path.exists() => Self::load_from_file(&config_path),
            _ => Ok(Config::default()),
        }
    }

    /// Standard config path
    pub fn default_path() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(".manualbuddy").join("config.toml"))
    }

    /// Environment overrides for non-secret settings
    pub fn apply_env(&mut self) {
        if let Ok(url) = std::env::var(QDRANT_URL_ENV) {
            if !url.trim().is_empty() {
                self.vector_store.url = url;
            }
        }
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.router.similarity_top_k == 0 {
            return Err(RagError::Config(
                "router.similarity_top_k must be greater than 0".to_string(),
            ));
        }

        if self.router.max_outputs == Some(0) {
            return Err(RagError::Config(
                "router.max_outputs must be greater than 0".to_string(),
            ));
        }

        if self.ingestion.chunk_size == 0 {
            return Err(RagError::Config(
                "ingestion.chunk_size must be greater than 0".to_string(),
            ));
        }

        if self.ingestion.chunk_overlap >= self.ingestion.chunk_size {
            return Err(RagError::Config(
                "ingestion.chunk_overlap must be less than ingestion.chunk_size".to_string(),
            ));
        }

        if self.embedding.batch_size == 0 {
            return Err(RagError::Config(
                "embedding.batch_size must be greater than 0".to_string(),
            ));
        }

        if self.ingestion.default_collection.trim().is_empty() {
            return Err(RagError::Config(
                "ingestion.default_collection must not be empty".to_string(),
            ));
        }

        for source in &self.ingestion.sources {
            if source.collection.trim().is_empty() {
                return Err(RagError::Config(format!(
                    "Source '{}' has an empty collection name",
                    source.category
                )));
            }
        }

        let mut names = HashSet::new();
        for tool in &self.router.tools {
            if tool.name.trim().is_empty() {
                return Err(RagError::Config("Router tool name must not be empty".to_string()));
            }
            if tool.collection.trim().is_empty() {
                return Err(RagError::Config(format!(
                    "Router tool '{}' has an empty collection name",
                    tool.name
                )));
            }
            if !names.insert(tool.name.as_str()) {
                return Err(RagError::Config(format!(
                    "Duplicate router tool name: {}",
                    tool.name
                )));
            }
        }

        Ok(())
    }

    /// Save configuration to file
    pub fn save(&self, path: &Path) -> Result<()> {
        let contents = toml::to_string_pretty(self)
            .map_err(|e| RagError::Config(format!("Failed to serialize config: {}", e)))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| RagError::Config(format!("Failed to create config dir: {}", e)))?;
        }

        std::fs::write(path, contents)
            .map_err(|e| RagError::Config(format!("Failed to write config: {}", e)))?;

        Ok(())
    }

    /// Groq API key from the environment
    pub fn groq_api_key() -> Option<String> {
        non_empty_env(GROQ_API_KEY_ENV)
    }

    /// LlamaCloud API key from the environment
    pub fn llama_cloud_api_key() -> Option<String> {
        non_empty_env(LLAMA_CLOUD_API_KEY_ENV)
    }

    /// Qdrant API key from the environment
    pub fn qdrant_api_key() -> Option<String> {
        non_empty_env(QDRANT_API_KEY_ENV)
    }
}

fn non_empty_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}
