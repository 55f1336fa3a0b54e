//! Doctor command for system diagnostics
//!
//! Checks the services and configuration manualbuddy depends on.

use colored::Colorize;
use std::sync::Arc;
use std::time::Instant;

use crate::config::Config;
use crate::llm::LlmClient;
use crate::vector_store::VectorStore;

/// Health check result
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    Pass,
    Warn(String),
    Fail(String),
}

/// Individual health check
#[derive(Debug, Clone)]
pub struct HealthCheck {
    pub name: String,
    pub status: HealthStatus,
    pub detail: Option<String>,
    pub latency_ms: Option<u64>,
}

impl HealthCheck {
    fn new(name: &str, status: HealthStatus) -> Self {
        Self {
            name: name.to_string(),
            status,
            detail: None,
            latency_ms: None,
        }
    }

    fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    fn with_latency(mut self, started: Instant) -> Self {
        self.latency_ms = Some(started.elapsed().as_millis() as u64);
        self
    }
}

/// Doctor diagnostics system
pub struct Doctor {
    config: Config,
    store: Arc<dyn VectorStore>,
    llm: Option<Arc<dyn LlmClient>>,
    llama_cloud_key: bool,
}

impl Doctor {
    /// Create a new doctor instance
    pub fn new(config: Config, store: Arc<dyn VectorStore>) -> Self {
        Self {
            config,
            store,
            llm: None,
            llama_cloud_key: false,
        }
    }

    /// LLM client; absent means no Groq key was found
    pub fn with_llm(mut self, llm: Option<Arc<dyn LlmClient>>) -> Self {
        self.llm = llm;
        self
    }

    pub fn with_llama_cloud_key(mut self, present: bool) -> Self {
        self.llama_cloud_key = present;
        self
    }

    /// Run all health checks
    pub async fn run_diagnostics(&self) -> Vec<HealthCheck> {
        let mut checks = Vec::new();

        let qdrant = self.check_vector_store().await;
        let store_up = qdrant.status == HealthStatus::Pass;
        checks.push(qdrant);
        checks.push(self.check_groq_key());
        checks.push(self.check_groq_api().await);
        checks.push(self.check_llama_cloud_key());
        checks.push(self.check_raw_dir());
        if store_up {
            for tool in &self.config.router.tools {
                checks.push(self.check_collection(&tool.name, &tool.collection).await);
            }
        }

        checks
    }

    /// Check 1: vector store reachable
    async fn check_vector_store(&self) -> HealthCheck {
        let started = Instant::now();
        let name = "Qdrant";
        match self.store.health_check().await {
            Ok(true) => HealthCheck::new(name, HealthStatus::Pass)
                .with_detail(self.config.vector_store.url.clone())
                .with_latency(started),
            Ok(false) => HealthCheck::new(
                name,
                HealthStatus::Fail(format!(
                    "Not reachable at {}",
                    self.config.vector_store.url
                )),
            ),
            Err(e) => HealthCheck::new(name, HealthStatus::Fail(format!("Error: {}", e))),
        }
    }

    /// Check 2: Groq API key present
    fn check_groq_key(&self) -> HealthCheck {
        let name = "Groq API key";
        if self.llm.is_some() {
            HealthCheck::new(name, HealthStatus::Pass)
        } else {
            HealthCheck::new(name, HealthStatus::Fail("GROQ_API_KEY is not set".to_string()))
        }
    }

    /// Check 3: Groq API reachable with our key
    async fn check_groq_api(&self) -> HealthCheck {
        let name = "Groq API";
        let Some(llm) = &self.llm else {
            return HealthCheck::new(name, HealthStatus::Warn("Skipped (no API key)".to_string()));
        };

        let started = Instant::now();
        match llm.health_check().await {
            Ok(true) => HealthCheck::new(name, HealthStatus::Pass)
                .with_detail(llm.model().to_string())
                .with_latency(started),
            Ok(false) => HealthCheck::new(
                name,
                HealthStatus::Fail("Not reachable or key rejected".to_string()),
            ),
            Err(e) => HealthCheck::new(name, HealthStatus::Fail(format!("Error: {}", e))),
        }
    }

    /// Check 4: LlamaCloud key (only needed for cloud parsing)
    fn check_llama_cloud_key(&self) -> HealthCheck {
        let name = "LlamaCloud key";
        if self.llama_cloud_key {
            HealthCheck::new(name, HealthStatus::Pass)
        } else {
            HealthCheck::new(
                name,
                HealthStatus::Warn("Not set - cloud parsing will be skipped".to_string()),
            )
        }
    }

    /// Check 5: raw data directory
    fn check_raw_dir(&self) -> HealthCheck {
        let name = "Raw data";
        let dir = &self.config.ingestion.raw_dir;
        if dir.is_dir() {
            HealthCheck::new(name, HealthStatus::Pass).with_detail(dir.display().to_string())
        } else {
            HealthCheck::new(
                name,
                HealthStatus::Warn(format!("{} does not exist", dir.display())),
            )
        }
    }

    /// Check 6+: one per routed collection
    async fn check_collection(&self, tool: &str, collection: &str) -> HealthCheck {
        match self.store.collection_exists(collection).await {
            Ok(true) => match self.store.count(collection).await {
                Ok(points) => HealthCheck::new(tool, HealthStatus::Pass)
                    .with_detail(format!("{} ({} points)", collection, points)),
                Err(e) => HealthCheck::new(tool, HealthStatus::Fail(format!("Error: {}", e))),
            },
            Ok(false) => HealthCheck::new(
                tool,
                HealthStatus::Warn(format!("{} missing - run `manualbuddy ingest`", collection)),
            ),
            Err(e) => HealthCheck::new(tool, HealthStatus::Fail(format!("Error: {}", e))),
        }
    }

    /// Display diagnostics results
    pub fn display_results(checks: &[HealthCheck]) {
        println!("\n🔍 manualbuddy System Diagnostics\n");
        println!("{:<24} {}", "Check", "Status");
        println!("{}", "=".repeat(60));

        for check in checks {
            let status = match &check.status {
                HealthStatus::Pass => {
                    let mut text = "✓ PASS".to_string();
                    if let Some(detail) = &check.detail {
                        text.push_str(&format!(" {}", detail));
                    }
                    text.green()
                }
                HealthStatus::Warn(msg) => format!("⚠ WARN: {}", msg).yellow(),
                HealthStatus::Fail(msg) => format!("✗ FAIL: {}", msg).red(),
            };
            let latency = check
                .latency_ms
                .map(|ms| format!(" ({}ms)", ms))
                .unwrap_or_default();

            println!("{:<24} {}{}", check.name, status, latency.bright_black());
        }

        println!();
    }

    /// Get overall health status
    pub fn overall_status(checks: &[HealthCheck]) -> bool {
        !checks
            .iter()
            .any(|c| matches!(c.status, HealthStatus::Fail(_)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::ScriptedLlm;
    use crate::vector_store::InMemoryStore;
    use tempfile::TempDir;

    fn config_with_raw_dir(dir: &std::path::Path) -> Config {
        let mut config = Config::default();
        config.ingestion.raw_dir = dir.to_path_buf();
        config
    }

    fn find<'a>(checks: &'a [HealthCheck], name: &str) -> &'a HealthCheck {
        checks.iter().find(|c| c.name == name).unwrap()
    }

    #[tokio::test]
    async fn test_all_good() {
        let raw = TempDir::new().unwrap();
        let store = Arc::new(InMemoryStore::new());
        store.create_collection("siemens_knowledge_base", 4).await.unwrap();
        store.create_collection("rockwell_knowledge_base", 4).await.unwrap();

        let doctor = Doctor::new(config_with_raw_dir(raw.path()), store)
            .with_llm(Some(Arc::new(ScriptedLlm::new(&[]))))
            .with_llama_cloud_key(true);
        let checks = doctor.run_diagnostics().await;

        assert_eq!(checks.len(), 7);
        assert!(checks.iter().all(|c| c.status == HealthStatus::Pass));
        assert_eq!(
            find(&checks, "siemens_manual_tool").detail.as_deref(),
            Some("siemens_knowledge_base (0 points)")
        );
        assert!(Doctor::overall_status(&checks));
    }

    #[tokio::test]
    async fn test_missing_key_fails_and_missing_collections_warn() {
        let raw = TempDir::new().unwrap();
        let doctor = Doctor::new(
            config_with_raw_dir(&raw.path().join("absent")),
            Arc::new(InMemoryStore::new()),
        );
        let checks = doctor.run_diagnostics().await;

        assert!(matches!(find(&checks, "Groq API key").status, HealthStatus::Fail(_)));
        assert!(matches!(find(&checks, "Groq API").status, HealthStatus::Warn(_)));
        assert!(matches!(find(&checks, "LlamaCloud key").status, HealthStatus::Warn(_)));
        assert!(matches!(find(&checks, "Raw data").status, HealthStatus::Warn(_)));
        assert!(matches!(find(&checks, "rockwell_manual_tool").status, HealthStatus::Warn(_)));
        assert!(!Doctor::overall_status(&checks));
    }

    #[test]
    fn test_overall_status_ignores_warnings() {
        let checks = vec![
            HealthCheck::new("Test 1", HealthStatus::Pass),
            HealthCheck::new("Test 2", HealthStatus::Warn("warning".to_string())),
        ];
        assert!(Doctor::overall_status(&checks));
    }
}
