//! Interactive chat loop over the manual assistant
//!
//! Reads questions with history, handles slash commands and prints
//! answers with their sources on demand.

pub mod commands;
pub mod display;
pub mod input;

use anyhow::Result;
use colored::*;
use tracing::{debug, warn};

use crate::assistant::Assistant;
use crate::cli::Verbosity;
use crate::repl::commands::{is_command, is_exit_word, CommandHandler};
pub use crate::repl::display::{spinner, DisplayManager};
use crate::repl::input::{InputHandler, Line};
use crate::telemetry::TelemetryDisplay;
use crate::types::Response;

/// Chat session coordinator
pub struct ChatSession {
    assistant: Assistant,
    input_handler: InputHandler,
    command_handler: CommandHandler,
    display_manager: DisplayManager,
    verbosity: Verbosity,
    last_response: Option<Response>,
}

impl ChatSession {
    /// History is persisted to ~/.manualbuddy_history when a home directory exists
    pub fn new(assistant: Assistant, verbosity: Verbosity, verbose_routing: bool) -> Result<Self> {
        let input_handler = match InputHandler::default_history_path() {
            Some(path) => InputHandler::with_history(path)?,
            None => InputHandler::new()?,
        };

        Ok(ChatSession {
            assistant,
            input_handler,
            command_handler: CommandHandler::new(verbose_routing),
            display_manager: DisplayManager::new(verbosity.show_progress()),
            verbosity,
            last_response: None,
        })
    }

    /// Run until exit, Ctrl-D or a readline failure
    pub async fn run(&mut self, version: &str) -> Result<()> {
        self.display_manager.show_banner(version, &self.assistant);

        loop {
            let line = match self.input_handler.read_line()? {
                Line::Text(line) => line,
                Line::Interrupted => {
                    println!("{}", "(Use 'exit' or Ctrl-D to quit)".yellow());
                    continue;
                }
                Line::Eof => break,
            };

            if !self.handle_input(&line).await {
                break;
            }
        }

        if let Err(e) = self.input_handler.save_history() {
            warn!("Failed to save history: {}", e);
        }

        println!("\n{}", "Goodbye!".cyan());
        TelemetryDisplay::new(self.assistant.telemetry().clone(), self.verbosity)
            .display_summary();
        Ok(())
    }

    /// Returns false when the chat should end
    pub async fn handle_input(&mut self, input: &str) -> bool {
        if input.trim().is_empty() {
            return true;
        }

        if is_exit_word(input) {
            return false;
        }

        if is_command(input) {
            let command = self.command_handler.parse(input);
            debug!(?command, "chat command");
            return self.command_handler.execute(
                command,
                &self.assistant,
                &self.display_manager,
                self.last_response.as_ref(),
            );
        }

        self.answer(input).await;
        true
    }

    async fn answer(&mut self, question: &str) {
        let pb = self.display_manager.start_thinking();
        let result = self.assistant.ask(question).await;
        if let Some(pb) = pb {
            pb.finish_and_clear();
        }

        match result {
            Ok(response) => {
                if self.command_handler.is_verbose() {
                    self.display_manager
                        .show_selections(&response, &self.assistant);
                }
                self.display_manager.show_answer(&response);
                self.last_response = Some(response);
            }
            Err(e) => {
                warn!("Query failed: {}", e);
                self.display_manager.show_error(&e.to_string());
            }
        }
    }
}
