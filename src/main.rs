//! ManualBuddy - Main CLI Entry Point

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use std::collections::BTreeSet;
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

use manualbuddy::{
    assistant::{connect_store, Assistant},
    cli::{Args, Commands, Verbosity},
    config::Config,
    doctor::Doctor,
    embedding::{BertEmbedder, Embedder},
    ingestion::{parse_to_markdown, CloudParser, IngestionPipeline, LlamaParseClient},
    llm::{GroqClient, LlmClient},
    repl::{spinner, ChatSession, DisplayManager},
    telemetry::{init_logging, TelemetryCollector, TelemetryDisplay},
    vector_store::{InMemoryStore, VectorStore},
};

const VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    let args = Args::parse();
    let verbosity = args.verbosity();
    init_logging(verbosity);

    let mut config = Config::load(args.config.clone()).context("Failed to load configuration")?;
    args.apply_overrides(&mut config)
        .context("Invalid command-line override")?;

    match args.command() {
        Commands::Ingest { in_memory, .. } => {
            run_ingest(&config, verbosity, in_memory).await?;
        }
        Commands::Parse { file, output } => {
            run_parse(&config, &file, &output).await?;
        }
        Commands::Chat { collection } => {
            run_chat(&config, verbosity, collection.as_deref()).await?;
        }
        Commands::Ask {
            question,
            collection,
        } => {
            run_ask(&config, verbosity, &question.join(" "), collection.as_deref()).await?;
        }
        Commands::Collections => {
            list_collections(&config).await?;
        }
        Commands::Doctor => {
            run_doctor(&config).await?;
        }
        Commands::Config => {
            show_config(&config)?;
        }
    }

    Ok(())
}

async fn run_ingest(config: &Config, verbosity: Verbosity, in_memory: bool) -> Result<()> {
    let raw_dir = config.ingestion.raw_dir.clone();
    println!("{}", "--- Starting Smart Ingestion ---".bold().cyan());

    let store: Arc<dyn VectorStore> = if in_memory {
        Arc::new(InMemoryStore::new())
    } else {
        connect_store(config).context("Failed to connect to Qdrant")?
    };

    let pb = verbosity
        .show_progress()
        .then(|| spinner("Loading embedding model..."));
    let embedder: Arc<dyn Embedder> =
        Arc::new(BertEmbedder::new(&config.embedding).context("Failed to load embedding model")?);

    let mut pipeline = IngestionPipeline::new(config.ingestion.clone(), store, embedder)
        .with_batch_size(config.embedding.batch_size);
    match LlamaParseClient::from_env(&config.parser) {
        Ok(parser) => {
            let parser: Arc<dyn CloudParser> = Arc::new(parser);
            pipeline = pipeline.with_parser(parser);
        }
        Err(e) => warn!("Cloud parsing unavailable: {}", e),
    }

    if let Some(pb) = &pb {
        pb.set_message(format!("Ingesting {}...", raw_dir.display()));
    }
    let result = pipeline.run(&raw_dir).await;
    if let Some(pb) = pb {
        pb.finish_and_clear();
    }
    let report = result?;

    for category in &report.categories {
        let line = format!(
            "📂 {} -> {} ({})",
            category.category,
            category.collection,
            category.strategy.as_str()
        );
        match &category.skipped {
            Some(reason) => println!("{} {}", line.yellow(), format!("skipped: {}", reason).dimmed()),
            None => println!(
                "{} {}",
                line.green(),
                format!("{} documents, {} chunks", category.documents, category.nodes).dimmed()
            ),
        }
    }

    info!(
        documents = report.total_documents(),
        nodes = report.total_nodes(),
        "ingestion finished"
    );
    println!(
        "\n{}",
        format!(
            "✅ Ingestion complete: {} documents, {} chunks",
            report.total_documents(),
            report.total_nodes()
        )
        .bold()
        .green()
    );
    Ok(())
}

async fn run_parse(config: &Config, file: &Path, output: &Path) -> Result<()> {
    if !file.exists() {
        eprintln!(
            "Error: {} not found. Ensure the file is inside the 'data' folder.",
            file.display()
        );
        std::process::exit(1);
    }

    println!("--- Starting Ingestion of {} ---", file.display());
    let parser = LlamaParseClient::from_env(&config.parser)?;
    parse_to_markdown(&parser, file, output).await?;
    println!("--- Success! ---");
    println!("File saved to: {}", output.display());
    Ok(())
}

async fn run_chat(config: &Config, verbosity: Verbosity, collection: Option<&str>) -> Result<()> {
    println!("{}", "--- Initializing Manual Assistant ---".cyan());
    let telemetry = TelemetryCollector::new();
    let assistant = Assistant::connect(config, collection, telemetry).await?;

    let mut session = ChatSession::new(assistant, verbosity, config.router.verbose)?;
    session.run(VERSION).await
}

async fn run_ask(
    config: &Config,
    verbosity: Verbosity,
    question: &str,
    collection: Option<&str>,
) -> Result<()> {
    let telemetry = TelemetryCollector::new();
    let assistant = Assistant::connect(config, collection, telemetry.clone()).await?;
    let display = DisplayManager::new(verbosity.show_progress());

    let pb = display.start_thinking();
    let result = assistant.ask(question).await;
    if let Some(pb) = pb {
        pb.finish_and_clear();
    }
    let response = result?;

    if config.router.verbose && verbosity.show_progress() {
        display.show_selections(&response, &assistant);
    }
    display.show_answer(&response);
    if verbosity != Verbosity::Quiet && verbosity != Verbosity::Normal {
        display.show_sources(&response, &assistant);
        TelemetryDisplay::new(telemetry, verbosity).display_summary();
    }
    Ok(())
}

async fn list_collections(config: &Config) -> Result<()> {
    let store = connect_store(config).context("Failed to connect to Qdrant")?;

    let mut names = BTreeSet::new();
    names.insert(config.ingestion.default_collection.clone());
    names.extend(config.ingestion.sources.iter().map(|s| s.collection.clone()));
    names.extend(config.router.tools.iter().map(|t| t.collection.clone()));

    println!("\n{}", "Collections:".bold().cyan());
    for name in names {
        if store.collection_exists(&name).await? {
            let points = store.count(&name).await?;
            println!("  {} {}", name.green(), format!("({} points)", points).dimmed());
        } else {
            println!("  {} {}", name.yellow(), "(missing)".dimmed());
        }
    }
    println!();
    Ok(())
}

async fn run_doctor(config: &Config) -> Result<()> {
    let store = connect_store(config).context("Failed to connect to Qdrant")?;
    let llm: Option<Arc<dyn LlmClient>> = match GroqClient::from_env(&config.llm) {
        Ok(client) => Some(Arc::new(client)),
        Err(_) => None,
    };

    let doctor = Doctor::new(config.clone(), store)
        .with_llm(llm)
        .with_llama_cloud_key(Config::llama_cloud_api_key().is_some());
    let checks = doctor.run_diagnostics().await;
    Doctor::display_results(&checks);

    std::process::exit(if Doctor::overall_status(&checks) { 0 } else { 1 });
}

fn show_config(config: &Config) -> Result<()> {
    println!("\n{}", "ManualBuddy Configuration".bold().cyan());
    println!("{}\n", "=".repeat(60).cyan());
    let rendered = toml::to_string_pretty(config).context("Failed to render configuration")?;
    println!("{}", rendered);

    if let Some(path) = Config::default_path() {
        println!("{} {}", "Config file:".dimmed(), path.display());
    }
    Ok(())
}
