//! Rhetor CLI - Command-line interface for the fallacy analysis pipeline.

use clap::Parser;
use rhetor_analyzer::AnalysisService;
use rhetor_cli::commands;
use rhetor_cli::{Cli, CliError, Command, Config, Formatter};
use rhetor_llm::CompletionClient;
use rhetor_store::SqliteStore;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> rhetor_cli::Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();

    init_tracing(cli.verbose);

    // Load config, filling the API key from the environment
    let config_path = match &cli.config {
        Some(path) => PathBuf::from(path),
        None => Config::path()?,
    };
    let mut config = Config::load_from(&config_path)?;
    config.apply_env_key(|var| std::env::var(var).ok());
    debug!(path = %config_path.display(), "Configuration loaded");

    // Determine output format
    let format = cli
        .format
        .map(Into::into)
        .unwrap_or(config.settings.format);

    // Determine color setting
    let color_enabled = !cli.no_color && config.settings.color;

    // Create formatter
    let formatter = Formatter::new(format, color_enabled);

    let db_override = cli.db.as_deref().map(Path::new);

    match cli.command {
        Command::Analyze(args) => {
            config.validate()?;
            let store = open_store(&config, db_override)?;
            let provider = config.provider.build()?;
            let client = CompletionClient::new(provider, config.retry.clone());
            let service = AnalysisService::new(client, store, config.analyzer.clone())?;
            commands::execute_analyze(args, &service, &formatter).await?;
        }
        Command::History(args) => {
            let store = open_store(&config, db_override)?;
            commands::execute_history(args, store.as_ref(), &formatter)?;
        }
        Command::Show(args) => {
            let store = open_store(&config, db_override)?;
            commands::execute_show(args, store.as_ref(), &formatter)?;
        }
        Command::Stats(args) => {
            let store = open_store(&config, db_override)?;
            commands::execute_stats(args, store.as_ref(), &formatter)?;
        }
        Command::Kinds => commands::execute_kinds(&formatter)?,
        Command::Explain(args) => commands::execute_explain(args, &formatter)?,
        Command::Config(args) => {
            commands::execute_config(args, &config, &config_path, &formatter)?;
        }
    }

    Ok(())
}

/// Log to stderr; `RUST_LOG` wins over `--verbose`.
fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .init();
}

fn open_store(config: &Config, db_override: Option<&Path>) -> Result<Arc<SqliteStore>, CliError> {
    let path = config.db_path(db_override)?;
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    debug!(path = %path.display(), "Opening attempt store");
    Ok(Arc::new(SqliteStore::new(&path)?))
}
