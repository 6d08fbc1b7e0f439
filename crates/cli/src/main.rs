//! Inquest CLI
//!
//! Main entry point for the inquest command-line tool.
//! Interrogates a source about a hypothesis and reports what it revealed.

mod commands;

use anyhow::Context;
use clap::{Parser, Subcommand};
use commands::{AskCommand, InspectCommand, InterrogateCommand};
use inquest_core::{config::AppConfig, logging};
use std::path::PathBuf;

/// Inquest - structured interrogation of a knowledge source
#[derive(Parser, Debug)]
#[command(name = "inquest")]
#[command(about = "Structured interrogation of a knowledge source", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to workspace directory (default: current directory)
    #[arg(short, long, global = true, env = "INQUEST_WORKSPACE")]
    workspace: Option<PathBuf>,

    /// Path to config file
    #[arg(short, long, global = true, env = "INQUEST_CONFIG")]
    config: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, global = true, env = "RUST_LOG")]
    log_level: Option<String>,

    /// Enable verbose output (sets log level to debug)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    no_color: bool,

    /// Text-generation provider (ollama)
    #[arg(short, long, global = true, env = "INQUEST_PROVIDER")]
    provider: Option<String>,

    /// Model identifier
    #[arg(short, long, global = true, env = "INQUEST_MODEL")]
    model: Option<String>,

    /// Prompt locale (en, pt)
    #[arg(short, long, global = true, env = "INQUEST_LOCALE")]
    locale: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Interrogate a source about a hypothesis
    Interrogate(InterrogateCommand),

    /// Ask the answer source a single question
    Ask(AskCommand),

    /// Load and split a document without indexing it
    Inspect(InspectCommand),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse command-line arguments first (needed for logging config)
    let cli = Cli::parse();

    let config = AppConfig::load_with_file(cli.config.clone())
        .context("Failed to load configuration")?;

    // Apply CLI overrides
    let config = config.with_overrides(
        cli.workspace,
        cli.config,
        cli.provider,
        cli.model,
        cli.locale,
        cli.log_level,
        cli.verbose,
        cli.no_color,
    );

    // Initialize logging with final configuration
    logging::init_logging(config.log_level.as_deref(), config.no_color)
        .context("Failed to initialize logging")?;

    tracing::info!("Inquest CLI starting");
    tracing::debug!("Workspace: {:?}", config.workspace);
    tracing::debug!("Provider: {}", config.provider);
    tracing::debug!("Model: {}", config.model);

    let command_name = match &cli.command {
        Commands::Interrogate(_) => "interrogate",
        Commands::Ask(_) => "ask",
        Commands::Inspect(_) => "inspect",
    };
    let _span = tracing::info_span!("command", name = command_name).entered();

    // Route to command handlers
    let result = match cli.command {
        Commands::Interrogate(cmd) => cmd.execute(&config).await,
        Commands::Ask(cmd) => cmd.execute(&config).await,
        Commands::Inspect(cmd) => cmd.execute(&config).await,
    };

    match &result {
        Ok(_) => tracing::info!("Command completed successfully"),
        Err(e) => tracing::error!("Command failed: {}", e),
    }

    result.with_context(|| format!("inquest {} failed", command_name))
}
