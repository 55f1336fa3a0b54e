//! Command-line argument parsing for manualbuddy
//!
//! Provides clap-based CLI with subcommands and verbosity control.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::config::Config;
use crate::errors::Result;

/// Default input for `manualbuddy parse`
pub const DEFAULT_PARSE_INPUT: &str = "data/s71200_system_manual_en-US_en-US.pdf";

/// Default output for `manualbuddy parse`
pub const DEFAULT_PARSE_OUTPUT: &str = "data/parsed_manual.md";

/// manualbuddy - Ask questions across Siemens and Rockwell hardware manuals
#[derive(Parser, Debug)]
#[command(name = "manualbuddy")]
#[command(author = "Jerome (Kubashen) Naidoo")]
#[command(version)]
#[command(about = "Routed retrieval-augmented Q&A over industrial hardware manuals", long_about = None)]
pub struct Args {
    /// Groq model to use (overrides config)
    #[arg(short, long, global = true)]
    pub model: Option<String>,

    /// Qdrant URL (overrides config and QDRANT_URL)
    #[arg(long, global = true)]
    pub qdrant_url: Option<String>,

    /// Passages retrieved per collection (overrides config)
    #[arg(long, global = true)]
    pub top_k: Option<usize>,

    /// Configuration file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Verbosity level: -q (quiet), default (normal), -v (verbose), -vv (very verbose)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (errors only)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Subcommand (interactive chat when omitted)
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Commands {
    /// Ingest every category under the raw data directory
    Ingest {
        /// Raw data directory (overrides config)
        #[arg(long)]
        data_dir: Option<PathBuf>,

        /// Index into a throwaway in-memory store instead of Qdrant
        #[arg(long)]
        in_memory: bool,
    },

    /// Cloud-parse one PDF into a markdown file
    Parse {
        /// PDF to parse
        #[arg(value_name = "PDF", default_value = DEFAULT_PARSE_INPUT)]
        file: PathBuf,

        /// Markdown output path
        #[arg(short, long, default_value = DEFAULT_PARSE_OUTPUT)]
        output: PathBuf,
    },

    /// Start the interactive chat
    Chat {
        /// Query one collection directly instead of routing
        #[arg(long)]
        collection: Option<String>,
    },

    /// Ask a single question and exit
    Ask {
        /// The question
        #[arg(value_name = "QUESTION", required = true, num_args = 1..)]
        question: Vec<String>,

        /// Query one collection directly instead of routing
        #[arg(long)]
        collection: Option<String>,
    },

    /// Show point counts of configured collections
    Collections,

    /// Run service and configuration health checks
    Doctor,

    /// Display current configuration
    Config,
}

/// Verbosity level enum
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verbosity {
    Quiet,
    Normal,
    Verbose,
    VeryVerbose,
}

impl Args {
    /// Get verbosity level based on flags
    pub fn verbosity(&self) -> Verbosity {
        if self.quiet {
            Verbosity::Quiet
        } else {
            match self.verbose {
                0 => Verbosity::Normal,
                1 => Verbosity::Verbose,
                _ => Verbosity::VeryVerbose,
            }
        }
    }

    /// Subcommand to run; bare invocation starts the chat
    pub fn command(&self) -> Commands {
        self.command
            .clone()
            .unwrap_or(Commands::Chat { collection: None })
    }

    /// Apply command-line overrides on top of loaded configuration.
    ///
    /// The result is validated again, so a flag cannot sneak in a value the
    /// config file would have been rejected for.
    pub fn apply_overrides(&self, config: &mut Config) -> Result<()> {
        if let Some(model) = &self.model {
            config.llm.model = model.clone();
        }
        if let Some(url) = &self.qdrant_url {
            config.vector_store.url = url.clone();
        }
        if let Some(top_k) = self.top_k {
            config.router.similarity_top_k = top_k;
        }
        if let Some(Commands::Ingest {
            data_dir: Some(dir),
            ..
        }) = &self.command
        {
            config.ingestion.raw_dir = dir.clone();
        }
        config.validate()
    }
}

impl Verbosity {
    /// Convert to string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Verbosity::Quiet => "quiet",
            Verbosity::Normal => "normal",
            Verbosity::Verbose => "verbose",
            Verbosity::VeryVerbose => "very_verbose",
        }
    }

    /// Check if should show spinners and banners
    pub fn show_progress(&self) -> bool {
        !matches!(self, Verbosity::Quiet)
    }

    /// Check if should show routing decisions and sources
    pub fn show_events(&self) -> bool {
        matches!(self, Verbosity::Verbose | Verbosity::VeryVerbose)
    }

    /// Default `tracing` filter directive for this level
    pub fn log_directive(&self) -> &'static str {
        match self {
            Verbosity::Quiet => "error",
            Verbosity::Normal => "warn",
            Verbosity::Verbose => "info",
            Verbosity::VeryVerbose => "debug",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(verbose: u8, quiet: bool, command: Option<Commands>) -> Args {
        Args {
            model: None,
            qdrant_url: None,
            top_k: None,
            config: None,
            verbose,
            quiet,
            command,
        }
    }

    #[test]
    fn test_verbosity_levels() {
        assert_eq!(args(0, true, None).verbosity(), Verbosity::Quiet);
        assert_eq!(args(0, false, None).verbosity(), Verbosity::Normal);
        assert_eq!(args(1, false, None).verbosity(), Verbosity::Verbose);
        assert_eq!(args(3, false, None).verbosity(), Verbosity::VeryVerbose);
    }

    #[test]
    fn test_default_command_is_chat() {
        assert_eq!(args(0, false, None).command(), Commands::Chat { collection: None });
    }

    #[test]
    fn test_parse_subcommands() {
        let parsed = Args::try_parse_from(["manualbuddy", "ask", "what", "is", "L+?"]).unwrap();
        match parsed.command() {
            Commands::Ask { question, collection } => {
                assert_eq!(question.join(" "), "what is L+?");
                assert!(collection.is_none());
            }
            other => panic!("unexpected command {:?}", other),
        }

        let parsed = Args::try_parse_from(["manualbuddy", "parse"]).unwrap();
        assert_eq!(
            parsed.command(),
            Commands::Parse {
                file: PathBuf::from(DEFAULT_PARSE_INPUT),
                output: PathBuf::from(DEFAULT_PARSE_OUTPUT),
            }
        );

        let parsed =
            Args::try_parse_from(["manualbuddy", "ingest", "--in-memory", "-v"]).unwrap();
        assert!(matches!(parsed.command(), Commands::Ingest { in_memory: true, .. }));
        assert_eq!(parsed.verbosity(), Verbosity::Verbose);
    }

    #[test]
    fn test_ask_requires_question() {
        assert!(Args::try_parse_from(["manualbuddy", "ask"]).is_err());
    }

    #[test]
    fn test_apply_overrides() {
        let mut parsed = Args::try_parse_from([
            "manualbuddy",
            "--top-k",
            "3",
            "--model",
            "llama-3.1-8b-instant",
            "ingest",
            "--data-dir",
            "/tmp/raw",
        ])
        .unwrap();
        parsed.qdrant_url = Some("http://qdrant:6334".to_string());

        let mut config = Config::default();
        parsed.apply_overrides(&mut config).unwrap();
        assert_eq!(config.router.similarity_top_k, 3);
        assert_eq!(config.llm.model, "llama-3.1-8b-instant");
        assert_eq!(config.vector_store.url, "http://qdrant:6334");
        assert_eq!(config.ingestion.raw_dir, PathBuf::from("/tmp/raw"));
    }

    #[test]
    fn test_zero_top_k_is_rejected() {
        let parsed = Args::try_parse_from(["manualbuddy", "--top-k", "0", "ask", "x"]).unwrap();
        let mut config = Config::default();
        let err = parsed.apply_overrides(&mut config).unwrap_err();
        assert!(matches!(err, crate::errors::RagError::Config(msg) if msg.contains("similarity_top_k")));
    }

    #[test]
    fn test_verbosity_methods() {
        assert!(!Verbosity::Quiet.show_progress());
        assert!(Verbosity::Normal.show_progress());

        assert!(!Verbosity::Normal.show_events());
        assert!(Verbosity::Verbose.show_events());

        assert_eq!(Verbosity::Quiet.log_directive(), "error");
        assert_eq!(Verbosity::VeryVerbose.log_directive(), "debug");
    }
}
