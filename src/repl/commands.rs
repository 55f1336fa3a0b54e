//! Slash commands available in the chat loop

use colored::*;

use crate::assistant::Assistant;
use crate::repl::display::DisplayManager;
use crate::telemetry::TelemetryDisplay;
use crate::types::Response;

/// Chat commands
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Help,
    Tools,
    Sources,
    Stats,
    Verbose { enable: bool },
    Clear,
    Exit,
    Unknown { input: String },
}

/// Check whether input is a slash command
pub fn is_command(input: &str) -> bool {
    input.trim_start().starts_with('/')
}

/// Plain `exit` / `quit` end the chat as well
pub fn is_exit_word(input: &str) -> bool {
    matches!(input.trim().to_lowercase().as_str(), "exit" | "quit")
}

/// Parses and executes chat commands
pub struct CommandHandler {
    verbose: bool,
}

impl CommandHandler {
    pub fn new(verbose: bool) -> Self {
        CommandHandler { verbose }
    }

    /// Whether routing decisions are shown with each answer
    pub fn is_verbose(&self) -> bool {
        self.verbose
    }

    /// Parse input string into a command
    pub fn parse(&self, input: &str) -> Command {
        let trimmed = input.trim();
        let Some(body) = trimmed.strip_prefix('/') else {
            return Command::Unknown {
                input: input.to_string(),
            };
        };

        let parts: Vec<&str> = body.split_whitespace().collect();
        let Some(name) = parts.first() else {
            return Command::Unknown {
                input: input.to_string(),
            };
        };

        match name.to_lowercase().as_str() {
            "help" | "h" => Command::Help,
            "tools" => Command::Tools,
            "sources" | "src" => Command::Sources,
            "stats" => Command::Stats,
            "verbose" => {
                let enable = parts
                    .get(1)
                    .map(|s| matches!(s.to_lowercase().as_str(), "on" | "1" | "true"))
                    .unwrap_or(!self.verbose);
                Command::Verbose { enable }
            }
            "clear" | "cls" => Command::Clear,
            "exit" | "quit" | "q" => Command::Exit,
            _ => Command::Unknown {
                input: input.to_string(),
            },
        }
    }

    /// Execute a command; returns false when the chat should end
    pub fn execute(
        &mut self,
        command: Command,
        assistant: &Assistant,
        display: &DisplayManager,
        last_response: Option<&Response>,
    ) -> bool {
        match command {
            Command::Help => {
                self.show_help();
                true
            }
            Command::Tools => {
                self.show_tools(assistant);
                true
            }
            Command::Sources => {
                match last_response {
                    Some(response) => display.show_sources(response, assistant),
                    None => println!("{}", "No answer yet.".yellow()),
                }
                true
            }
            Command::Stats => {
                TelemetryDisplay::new(
                    assistant.telemetry().clone(),
                    crate::cli::Verbosity::Normal,
                )
                .display_summary();
                true
            }
            Command::Verbose { enable } => {
                self.verbose = enable;
                let status = if enable { "enabled" } else { "disabled" };
                println!("{}", format!("Verbose mode {}", status).cyan());
                true
            }
            Command::Clear => {
                display.clear_screen();
                true
            }
            Command::Exit => false,
            Command::Unknown { input } => {
                println!("{}", format!("Unknown command: {}", input).red());
                println!("Type {} for available commands", "/help".cyan());
                true
            }
        }
    }

    fn show_help(&self) {
        println!("\n{}", "Available Commands:".bold().cyan());
        println!("{}", "=".repeat(60).cyan());

        let commands = [
            ("/help, /h", "Show this help message"),
            ("/tools", "List the manuals questions are routed to"),
            ("/sources", "Show passages behind the last answer"),
            ("/stats", "Show session statistics"),
            ("/verbose [on|off]", "Toggle routing details"),
            ("/clear, /cls", "Clear screen"),
            ("/exit, /quit, /q", "Exit chat"),
        ];

        for (cmd, desc) in commands {
            println!("  {:<20} {}", cmd.green(), desc);
        }

        println!("\n{}", "Usage:".bold());
        println!("  - Type your question directly (no / prefix)");
        println!("  - Use {} for question history", "UP/DOWN arrows".cyan());
        println!(
            "  - Type {} or press {} to exit",
            "exit".cyan(),
            "Ctrl-D".cyan()
        );
        println!();
    }

    fn show_tools(&self, assistant: &Assistant) {
        let title = if assistant.is_routed() {
            "Routed Tools:"
        } else {
            "Direct Collection:"
        };
        println!("\n{}", title.bold().cyan());
        println!("{}", "=".repeat(60).cyan());
        for (name, description, collection) in assistant.tools() {
            println!("  {} {}", name.green(), format!("[{}]", collection).dimmed());
            println!("     {}", description);
        }
        println!();
    }
}
