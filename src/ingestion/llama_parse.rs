//! LlamaCloud parsing client (cloud strategy)
//!
//! Upload a PDF, poll the job until it finishes, then fetch the result as
//! markdown. Pages are separated by `\n---\n` in the returned markdown.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::path::Path;
use std::time::{Duration, Instant};
use tracing::{debug, info};

use crate::config::{Config, ParserConfig};
use crate::errors::{RagError, Result};
use crate::types::Document;

/// Separator between pages in parsed markdown
pub const PAGE_SEPARATOR: &str = "\n---\n";

/// Separator written between pages by [`parse_to_markdown`]
pub const EXPORT_PAGE_SEPARATOR: &str = "\n\n---\n\n";

/// Turns a file into page documents using a remote service
#[async_trait]
pub trait CloudParser: Send + Sync {
    async fn parse_file(&self, path: &Path) -> Result<Vec<Document>>;
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    id: String,
}

#[derive(Debug, Deserialize)]
struct JobStatus {
    status: String,
}

#[derive(Debug, Deserialize)]
struct MarkdownResult {
    markdown: String,
}

pub struct LlamaParseClient {
    client: Client,
    api_key: String,
    config: ParserConfig,
}

impl LlamaParseClient {
    pub fn new(config: &ParserConfig, api_key: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(120))
            .build()?;

        Ok(Self {
            client,
            api_key: api_key.into(),
            config: config.clone(),
        })
    }

    /// Client authenticated with `LLAMA_CLOUD_API_KEY`
    pub fn from_env(config: &ParserConfig) -> Result<Self> {
        let key = Config::llama_cloud_api_key().ok_or_else(|| {
            RagError::Config("LLAMA_CLOUD_API_KEY is not set".to_string())
        })?;
        Self::new(config, key)
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
    }

    async fn check(response: reqwest::Response, what: &str) -> Result<reqwest::Response> {
        if response.status().is_success() {
            return Ok(response);
        }
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        Err(RagError::Parser(format!("{} failed: {} - {}", what, status, body)))
    }

    async fn upload(&self, path: &Path) -> Result<String> {
        let data = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "document.pdf".to_string());

        let part = reqwest::multipart::Part::bytes(data)
            .file_name(file_name)
            .mime_str("application/pdf")?;
        let form = reqwest::multipart::Form::new()
            .part("file", part)
            .text("language", self.config.language.clone());

        let response = self
            .client
            .post(self.url("/api/parsing/upload"))
            .bearer_auth(&self.api_key)
            .multipart(form)
            .send()
            .await?;

        let upload: UploadResponse = Self::check(response, "Upload").await?.json().await?;
        Ok(upload.id)
    }

    async fn wait_for_job(&self, job_id: &str) -> Result<()> {
        let started = Instant::now();
        let max_wait = Duration::from_secs(self.config.max_timeout_secs);
        let interval = Duration::from_secs(self.config.check_interval_secs);

        loop {
            let response = self
                .client
                .get(self.url(&format!("/api/parsing/job/{}", job_id)))
                .bearer_auth(&self.api_key)
                .send()
                .await?;
            let job: JobStatus = Self::check(response, "Status check").await?.json().await?;

            match job.status.as_str() {
                "SUCCESS" => return Ok(()),
                "ERROR" | "CANCELED" | "CANCELLED" => {
                    return Err(RagError::Parser(format!(
                        "Parsing job {} ended with status {}",
                        job_id, job.status
                    )))
                }
                other => debug!(job_id, status = other, "parsing job pending"),
            }

            if started.elapsed() >= max_wait {
                return Err(RagError::Timeout {
                    duration_ms: max_wait.as_millis() as u64,
                });
            }
            tokio::time::sleep(interval).await;
        }
    }

    async fn fetch_markdown(&self, job_id: &str) -> Result<String> {
        let response = self
            .client
            .get(self.url(&format!("/api/parsing/job/{}/result/markdown", job_id)))
            .bearer_auth(&self.api_key)
            .send()
            .await?;
        let result: MarkdownResult = Self::check(response, "Result fetch").await?.json().await?;
        Ok(result.markdown)
    }
}

#[async_trait]
impl CloudParser for LlamaParseClient {
    async fn parse_file(&self, path: &Path) -> Result<Vec<Document>> {
        info!(file = %path.display(), "uploading for parsing");
        let job_id = self.upload(path).await?;
        self.wait_for_job(&job_id).await?;
        let markdown = self.fetch_markdown(&job_id).await?;
        Ok(split_pages(&path.to_string_lossy(), &markdown))
    }
}

/// One document per non-empty page of parsed markdown
pub fn split_pages(source: &str, markdown: &str) -> Vec<Document> {
    markdown
        .split(PAGE_SEPARATOR)
        .map(str::trim)
        .filter(|page| !page.is_empty())
        .enumerate()
        .map(|(i, page)| Document::from_source(source, i, page))
        .collect()
}

/// Parse one PDF and write its pages to a markdown file.
///
/// Returns `Ok(false)` without touching `output` when `input` is missing.
pub async fn parse_to_markdown(
    parser: &dyn CloudParser,
    input: &Path,
    output: &Path,
) -> Result<bool> {
    if !input.exists() {
        return Ok(false);
    }

    let documents = parser.parse_file(input).await?;

    let mut contents = String::new();
    for doc in &documents {
        contents.push_str(&doc.text);
        contents.push_str(EXPORT_PAGE_SEPARATOR);
    }

    if let Some(parent) = output.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent).await?;
        }
    }
    tokio::fs::write(output, contents).await?;

    info!(output = %output.display(), pages = documents.len(), "wrote parsed markdown");
    Ok(true)
}
