//! Category-to-collection ingestion
//!
//! Each directory under the raw data path is a category. The category decides
//! the target collection and how its files become documents.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

use super::chunker::TextChunker;
use super::llama_parse::CloudParser;
use super::reader::DirectoryReader;
use crate::config::{IngestionConfig, Strategy};
use crate::embedding::Embedder;
use crate::index::{VectorIndex, DEFAULT_BATCH_SIZE};
use crate::types::Document;
use crate::vector_store::VectorStore;

/// Outcome of ingesting one category directory
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryReport {
    pub category: String,
    pub collection: String,
    pub strategy: Strategy,
    pub documents: usize,
    pub nodes: usize,
    /// Why nothing was ingested, if so
    pub skipped: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct IngestionReport {
    pub categories: Vec<CategoryReport>,
}

impl IngestionReport {
    pub fn total_nodes(&self) -> usize {
        self.categories.iter().map(|c| c.nodes).sum()
    }

    pub fn total_documents(&self) -> usize {
        self.categories.iter().map(|c| c.documents).sum()
    }

    pub fn category(&self, name: &str) -> Option<&CategoryReport> {
        self.categories.iter().find(|c| c.category == name)
    }
}

pub struct IngestionPipeline {
    config: IngestionConfig,
    store: Arc<dyn VectorStore>,
    embedder: Arc<dyn Embedder>,
    parser: Option<Arc<dyn CloudParser>>,
    batch_size: usize,
}

impl IngestionPipeline {
    pub fn new(
        config: IngestionConfig,
        store: Arc<dyn VectorStore>,
        embedder: Arc<dyn Embedder>,
    ) -> Self {
        Self {
            config,
            store,
            embedder,
            parser: None,
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }

    /// Parser for cloud-strategy categories; without one they are skipped
    pub fn with_parser(mut self, parser: Arc<dyn CloudParser>) -> Self {
        self.parser = Some(parser);
        self
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    /// Category directories under `base`, sorted, hidden entries excluded
    pub fn categories(base: &Path) -> Result<Vec<(String, PathBuf)>> {
        let entries = std::fs::read_dir(base)
            .with_context(|| format!("Failed to list raw data directory {}", base.display()))?;

        let mut categories = Vec::new();
        for entry in entries {
            let entry = entry?;
            let name = entry.file_name().to_string_lossy().to_string();
            if name.starts_with('.') || !entry.file_type()?.is_dir() {
                continue;
            }
            categories.push((name, entry.path()));
        }
        categories.sort();
        Ok(categories)
    }

    /// Ingest every category under `base`
    pub async fn run(&self, base: &Path) -> Result<IngestionReport> {
        let mut report = IngestionReport::default();

        for (category, path) in Self::categories(base)? {
            let collection = self.config.collection_for(&category).to_string();
            let strategy = self
                .config
                .source_for(&category)
                .map(|s| s.strategy)
                .unwrap_or(Strategy::Skip);

            info!(%category, %collection, strategy = strategy.as_str(), "routing category");

            let index = VectorIndex::open_or_create(
                self.store.clone(),
                self.embedder.clone(),
                &collection,
            )
            .await
            .with_context(|| format!("Failed to open collection {}", collection))?
            .with_chunker(TextChunker::new(
                self.config.chunk_size,
                self.config.chunk_overlap,
            ))
            .with_batch_size(self.batch_size);

            let mut entry = CategoryReport {
                category: category.clone(),
                collection: collection.clone(),
                strategy,
                documents: 0,
                nodes: 0,
                skipped: None,
            };

            match strategy {
                Strategy::Cloud => {
                    if let Err(e) = self.ingest_cloud(&category, &path, &index, &mut entry).await {
                        warn!(%category, error = %format!("{:#}", e), "skipping cloud parse (likely already done or API limit)");
                        entry.skipped = Some(format!("{:#}", e));
                    }
                }
                Strategy::Local => {
                    let (documents, nodes) = self
                        .ingest_local(&category, &path, &index)
                        .await
                        .with_context(|| format!("Failed to ingest category {}", category))?;
                    entry.documents = documents;
                    entry.nodes = nodes;
                }
                Strategy::Skip => {
                    info!(%category, "no ingestion strategy for category");
                    entry.skipped = Some("no ingestion strategy for this category".to_string());
                }
            }

            report.categories.push(entry);
        }

        info!(
            documents = report.total_documents(),
            nodes = report.total_nodes(),
            "ingestion finished"
        );
        Ok(report)
    }

    fn brand_for(&self, category: &str) -> String {
        self.config
            .source_for(category)
            .and_then(|s| s.brand.clone())
            .unwrap_or_else(|| category.to_string())
    }

    fn tag(&self, category: &str, doc: &mut Document) {
        doc.set_metadata("brand", self.brand_for(category));
        if let Some(tag) = self
            .config
            .source_for(category)
            .and_then(|s| s.category_tag.as_deref())
        {
            doc.set_metadata("category", tag);
        }
    }

    /// Counts land in `entry` as each PDF is indexed, so a failure part way
    /// through still reports what was stored.
    async fn ingest_cloud(
        &self,
        category: &str,
        dir: &Path,
        index: &VectorIndex,
        entry: &mut CategoryReport,
    ) -> Result<()> {
        let parser = self
            .parser
            .as_ref()
            .context("No cloud parser configured (is LLAMA_CLOUD_API_KEY set?)")?;

        let pdfs = DirectoryReader::pdf_paths(dir)?;

        for pdf in pdfs {
            let file_name = pdf
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_default();

            let mut docs = parser
                .parse_file(&pdf)
                .await
                .with_context(|| format!("Failed to parse {}", pdf.display()))?;
            for doc in docs.iter_mut() {
                self.tag(category, doc);
                doc.set_metadata("file_name", file_name.as_str());
            }

            let nodes = index.insert_documents(&docs).await?;
            entry.documents += docs.len();
            entry.nodes += nodes;
        }

        Ok(())
    }

    async fn ingest_local(
        &self,
        category: &str,
        dir: &Path,
        index: &VectorIndex,
    ) -> Result<(usize, usize)> {
        let mut docs = DirectoryReader::new()
            .recursive(self.config.recursive)
            .load_data(dir)?;
        for doc in docs.iter_mut() {
            self.tag(category, doc);
        }

        let nodes = index.insert_documents(&docs).await?;
        Ok((docs.len(), nodes))
    }
}
