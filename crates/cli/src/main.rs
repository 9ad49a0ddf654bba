//! Pathway command-line interface.

mod commands;

use clap::{Parser, Subcommand};
use pathway_core::config::ToolVariant;
use pathway_core::logging::init_logging;
use pathway_core::{AppConfig, AppError};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "pathway",
    version,
    about = "Retrieval-grounded policy assistant with human escalation"
)]
struct Cli {
    /// Workspace root directory
    #[arg(long, global = true)]
    workspace: Option<PathBuf>,

    /// Path to a config file (defaults to <workspace>/pathway.yaml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Document corpus directory
    #[arg(long, global = true)]
    corpus: Option<PathBuf>,

    /// Tool-set variant: A (web search) or B (escalation)
    #[arg(long, global = true)]
    variant: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Enable verbose (debug) logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Ingest the corpus and persist an index snapshot
    Ingest,

    /// Run a single retrieval query against the index
    Query {
        /// The question to search for
        text: String,

        /// Maximum passages to return
        #[arg(long)]
        top_k: Option<usize>,
    },

    /// Start an interactive conversation
    Chat,

    /// Show index and corpus statistics
    Stats,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let variant = match cli.variant.as_deref() {
        Some(raw) => Some(ToolVariant::parse(raw).ok_or_else(|| {
            AppError::Config(format!("Unknown variant {:?} (expected A or B)", raw))
        })?),
        None => None,
    };

    let config = AppConfig::load()?.with_overrides(
        cli.workspace,
        cli.config,
        cli.corpus,
        variant,
        cli.log_level,
        cli.verbose,
        cli.no_color,
    );

    init_logging(config.log_level.as_deref(), config.no_color)?;
    tracing::debug!("Workspace: {:?}", config.workspace);

    match cli.command {
        Commands::Ingest => commands::ingest::run(config).await?,
        Commands::Query { text, top_k } => commands::query::run(config, &text, top_k).await?,
        Commands::Chat => commands::chat::run(config).await?,
        Commands::Stats => commands::stats::run(config).await?,
    }

    Ok(())
}
