//! Terminal output for the chat loop
//!
//! Banner, spinner while a question is in flight, answers and sources.

use colored::*;
use crossterm::{
    cursor, execute,
    terminal::{Clear, ClearType},
};
use indicatif::{ProgressBar, ProgressStyle};
use std::io;
use std::time::Duration;

use crate::assistant::Assistant;
use crate::types::Response;

const SNIPPET_CHARS: usize = 120;

/// Spinner with a message, ticking at 10 FPS
pub fn spinner(message: impl Into<String>) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    let style = ProgressStyle::with_template("{spinner:.cyan} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner());
    pb.set_style(style);
    pb.set_message(message.into());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

/// Display manager for the chat UI
pub struct DisplayManager {
    show_progress: bool,
}

impl DisplayManager {
    pub fn new(show_progress: bool) -> Self {
        DisplayManager { show_progress }
    }

    /// Show welcome banner
    pub fn show_banner(&self, version: &str, assistant: &Assistant) {
        let width = 64;
        let mode = if assistant.is_routed() {
            format!("Router over {} manuals", assistant.tools().len())
        } else {
            "Direct".to_string()
        };

        println!("\n{}", "=".repeat(width).cyan());
        println!(
            "{}",
            format!("  🚀 ManualBuddy {} - Industrial Manual Assistant READY", version)
                .bold()
                .cyan()
        );
        println!("{}", format!("  Mode: {}", mode).dimmed());
        println!("{}\n", "=".repeat(width).cyan());
        println!(
            "Ask a question (or {} for commands, {} to quit)\n",
            "/help".green(),
            "exit".green()
        );
    }

    /// Spinner shown while retrieval and generation run; hidden when quiet
    pub fn start_thinking(&self) -> Option<ProgressBar> {
        if !self.show_progress {
            return None;
        }
        Some(spinner("Searching manuals and generating answer..."))
    }

    pub fn show_answer(&self, response: &Response) {
        println!("\n{} {}\n", "Agent:".bold().green(), response.text);
    }

    /// Routing decisions behind a response; nothing in direct mode
    pub fn show_selections(&self, response: &Response, assistant: &Assistant) {
        for selection in &response.selections {
            let name = assistant.tool_name(selection.index).unwrap_or("unknown");
            println!(
                "{} {}: {}",
                "Selecting query engine".bright_black(),
                name.cyan(),
                selection.reason
            );
        }
    }

    /// Retrieved passages behind a response, best first
    pub fn show_sources(&self, response: &Response, assistant: &Assistant) {
        if !response.selections.is_empty() {
            println!("\n{}", "Selected Tools:".bold().cyan());
            for selection in &response.selections {
                let name = assistant
                    .tool_name(selection.index)
                    .unwrap_or("unknown");
                println!("  {} {}", name.green(), selection.reason.dimmed());
            }
        }

        if response.source_nodes.is_empty() {
            println!("{}", "No source passages.".yellow());
            return;
        }

        println!("\n{}", "Sources:".bold().cyan());
        println!("{}", "=".repeat(60).cyan());
        for (i, scored) in response.source_nodes.iter().enumerate() {
            let node = &scored.node;
            let brand = node.metadata_value("brand").unwrap_or("-");
            let file = node
                .metadata_value("file_name")
                .or_else(|| node.metadata_value("file_path"))
                .unwrap_or("-");
            println!(
                "  {}. [{:.3}] {} {}",
                i + 1,
                scored.score,
                brand.green(),
                file
            );
            println!("     {}", snippet(&node.text).dimmed());
        }
        println!();
    }

    pub fn show_error(&self, error: &str) {
        println!("\n{} {}\n", "Error:".bold().red(), error);
    }

    pub fn clear_screen(&self) {
        let _ = execute!(io::stdout(), Clear(ClearType::All), cursor::MoveTo(0, 0));
    }
}

fn snippet(text: &str) -> String {
    let flat: String = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() <= SNIPPET_CHARS {
        flat
    } else {
        let cut: String = flat.chars().take(SNIPPET_CHARS).collect();
        format!("{}...", cut)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snippet_flattens_whitespace() {
        assert_eq!(snippet("Terminal\n  X10\tpower"), "Terminal X10 power");
    }

    #[test]
    fn test_snippet_truncates_on_char_boundary() {
        let long = "ü".repeat(200);
        let s = snippet(&long);
        assert!(s.ends_with("..."));
        assert_eq!(s.chars().count(), SNIPPET_CHARS + 3);
    }

    #[test]
    fn test_quiet_display_has_no_spinner() {
        assert!(DisplayManager::new(false).start_thinking().is_none());
    }
}
