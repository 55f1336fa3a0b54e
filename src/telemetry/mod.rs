//! Telemetry and logging for manualbuddy
//!
//! Logging goes through `tracing`; the collector keeps per-session query
//! events for the `/stats` summary.

use std::sync::{Arc, Mutex};
use std::time::Instant;
use tracing_subscriber::EnvFilter;

use crate::cli::Verbosity;

/// Install the global `tracing` subscriber.
///
/// `RUST_LOG` wins over the verbosity flags when set.
pub fn init_logging(verbosity: Verbosity) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(verbosity.log_directive()));

    // A second init (tests, embedding) is not an error worth reporting
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Telemetry event types
#[derive(Debug, Clone)]
pub enum TelemetryEvent {
    ToolSelected {
        tool: String,
        reason: String,
        timestamp: Instant,
    },
    RetrievalCompleted {
        collection: String,
        nodes: usize,
        duration_ms: u64,
        timestamp: Instant,
    },
    LlmCompleted {
        model: String,
        prompt_chars: usize,
        duration_ms: u64,
        timestamp: Instant,
    },
    QueryCompleted {
        tools: usize,
        duration_ms: u64,
        timestamp: Instant,
    },
    QueryFailed {
        error: String,
        timestamp: Instant,
    },
}

/// Telemetry statistics
#[derive(Debug, Clone, Default)]
pub struct TelemetryStats {
    pub queries: usize,
    pub queries_failed: usize,
    pub tool_selections: usize,
    pub retrievals: usize,
    pub nodes_retrieved: usize,
    pub llm_calls: usize,
    pub llm_time_ms: u64,
    pub query_time_ms: u64,
}

/// Telemetry collector
#[derive(Clone)]
pub struct TelemetryCollector {
    events: Arc<Mutex<Vec<TelemetryEvent>>>,
    stats: Arc<Mutex<TelemetryStats>>,
    start_time: Instant,
}

impl TelemetryCollector {
    /// Create a new telemetry collector
    pub fn new() -> Self {
        Self {
            events: Arc::new(Mutex::new(Vec::new())),
            stats: Arc::new(Mutex::new(TelemetryStats::default())),
            start_time: Instant::now(),
        }
    }

    /// Record an event
    pub fn record(&self, event: TelemetryEvent) {
        if let Ok(mut stats) = self.stats.lock() {
            match &event {
                TelemetryEvent::ToolSelected { .. } => {
                    stats.tool_selections += 1;
                }
                TelemetryEvent::RetrievalCompleted { nodes, .. } => {
                    stats.retrievals += 1;
                    stats.nodes_retrieved += nodes;
                }
                TelemetryEvent::LlmCompleted { duration_ms, .. } => {
                    stats.llm_calls += 1;
                    stats.llm_time_ms += duration_ms;
                }
                TelemetryEvent::QueryCompleted { duration_ms, .. } => {
                    stats.queries += 1;
                    stats.query_time_ms += duration_ms;
                }
                TelemetryEvent::QueryFailed { .. } => {
                    stats.queries += 1;
                    stats.queries_failed += 1;
                }
            }
        }

        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }

    /// Get current statistics
    pub fn get_stats(&self) -> TelemetryStats {
        self.stats.lock().map(|s| s.clone()).unwrap_or_default()
    }

    /// Get elapsed time since start
    pub fn elapsed(&self) -> std::time::Duration {
        self.start_time.elapsed()
    }

    /// Get event count
    pub fn event_count(&self) -> usize {
        self.events.lock().map(|e| e.len()).unwrap_or(0)
    }

    /// Get recent events (last n)
    pub fn recent_events(&self, n: usize) -> Vec<TelemetryEvent> {
        match self.events.lock() {
            Ok(events) => {
                let start = events.len().saturating_sub(n);
                events[start..].to_vec()
            }
            Err(_) => Vec::new(),
        }
    }

    /// Share of queries that produced an answer
    pub fn query_success_rate(&self) -> f64 {
        let stats = self.get_stats();
        if stats.queries == 0 {
            1.0
        } else {
            (stats.queries - stats.queries_failed) as f64 / stats.queries as f64
        }
    }

    /// Mean LLM latency in milliseconds
    pub fn average_llm_ms(&self) -> u64 {
        let stats = self.get_stats();
        if stats.llm_calls == 0 {
            0
        } else {
            stats.llm_time_ms / stats.llm_calls as u64
        }
    }
}

impl Default for TelemetryCollector {
    fn default() -> Self {
        Self::new()
    }
}

const ROUTING_HISTORY: usize = 5;

/// Simple telemetry display
pub struct TelemetryDisplay {
    collector: TelemetryCollector,
    verbosity: Verbosity,
}

impl TelemetryDisplay {
    /// Create a new display
    pub fn new(collector: TelemetryCollector, verbosity: Verbosity) -> Self {
        Self {
            collector,
            verbosity,
        }
    }

    /// Display summary statistics
    pub fn display_summary(&self) {
        if !self.verbosity.show_progress() {
            return;
        }

        let stats = self.collector.get_stats();
        let elapsed = self.collector.elapsed();

        println!("\n📊 Session Summary");
        println!("─────────────────────────────────────");
        println!("Duration:          {:.1}s", elapsed.as_secs_f64());
        println!("Questions:         {}", stats.queries);
        println!("Success rate:      {:.1}%", self.collector.query_success_rate() * 100.0);
        println!("Tools selected:    {}", stats.tool_selections);
        println!("Passages:          {}", stats.nodes_retrieved);
        println!("LLM calls:         {}", stats.llm_calls);
        println!("Avg LLM latency:   {}ms", self.collector.average_llm_ms());

        if self.should_show_details() {
            let routed = self.recent_routing(ROUTING_HISTORY);
            if !routed.is_empty() {
                println!("\nRecent routing:");
                for (tool, reason) in routed {
                    println!("  {:<22} {}", tool, reason);
                }
            }
        }
        println!();
    }

    /// Last `n` tool selections as (tool, reason), oldest first
    pub fn recent_routing(&self, n: usize) -> Vec<(String, String)> {
        let selected: Vec<(String, String)> = self
            .collector
            .recent_events(usize::MAX)
            .into_iter()
            .filter_map(|event| match event {
                TelemetryEvent::ToolSelected { tool, reason, .. } => Some((tool, reason)),
                _ => None,
            })
            .collect();
        let start = selected.len().saturating_sub(n);
        selected[start..].to_vec()
    }

    /// Check if should show routing details
    pub fn should_show_details(&self) -> bool {
        self.verbosity.show_events()
    }
}
