#![deny(unsafe_code)]

//! Bedside CLI: HTTP front door, terminal chat, and config inspection.

mod repl;
mod server;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use bedside_config::AppConfig;
use bedside_core::{
    CompletionClient, OpenAiCompatClient, PersonaSpec, SessionRegistry, SessionSettings,
};

/// Bedside: persona-driven chat sessions over a hosted language model.
#[derive(Parser)]
#[command(name = "bedside", version, about, long_about = None)]
struct Cli {
    /// Path to configuration file.
    #[arg(short, long, default_value = "bedside.toml")]
    config: PathBuf,

    /// Increase log verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the HTTP API.
    Serve,

    /// Chat in the terminal.
    Chat,

    /// Validate and display configuration.
    Config {
        /// Show the resolved configuration.
        #[arg(long)]
        show: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // A missing .env is normal; real environment variables still apply.
    let dotenv = dotenvy::dotenv().ok();

    let (mut config, from_file) = load_config(&cli.config).await?;

    let filter = match cli.verbose {
        0 => config.logging.level.as_str(),
        1 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .init();

    // Overrides log at debug; apply them once the subscriber is installed.
    apply_overrides(&mut config, |key| std::env::var(key).ok())?;

    if let Some(path) = dotenv {
        info!(path = %path.display(), "Loaded environment file");
    }
    if !from_file {
        info!(path = %cli.config.display(), "Config file not found, using defaults");
    }

    match cli.command {
        Commands::Serve => cmd_serve(&config).await?,
        Commands::Chat => cmd_chat(&config).await?,
        Commands::Config { show } => cmd_config(&cli.config, &config, show)?,
    }

    Ok(())
}

async fn cmd_serve(config: &AppConfig) -> Result<()> {
    let registry = build_registry(config)?;
    info!(
        persona = %registry.persona().name,
        model = %config.llm.model,
        history = config.session.history_capacity,
        "Starting Bedside HTTP server"
    );

    let state = Arc::new(server::AppState {
        registry: Arc::new(registry),
    });
    server::serve(&config.server, state).await
}

async fn cmd_chat(config: &AppConfig) -> Result<()> {
    let registry = build_registry(config)?;
    let session = registry.get_or_create(None);
    info!(persona = %session.persona().name, "Starting terminal chat");

    let stdin = tokio::io::BufReader::new(tokio::io::stdin());
    repl::run(&session, stdin, tokio::io::stdout()).await
}

fn cmd_config(config_path: &Path, config: &AppConfig, show: bool) -> Result<()> {
    if show {
        let toml_str = toml::to_string_pretty(config).context("TOML error")?;
        println!("{toml_str}");
    } else {
        println!("Configuration at '{}' is valid.", config_path.display());
    }
    Ok(())
}

/// Wire the production client, persona, and settings into a registry.
fn build_registry(config: &AppConfig) -> Result<SessionRegistry> {
    let client: Arc<dyn CompletionClient> = Arc::new(
        OpenAiCompatClient::from_config(&config.llm)
            .context("cannot create completion client")?,
    );
    let persona = PersonaSpec::from_config(&config.persona).context("invalid persona")?;
    Ok(SessionRegistry::new(
        client,
        persona,
        SessionSettings::from_config(config),
        config.session.max_sessions,
    ))
}

/// Load the config file, or defaults when it is absent. Returns whether a
/// file was read.
async fn load_config(path: &Path) -> Result<(AppConfig, bool)> {
    let from_file = tokio::fs::try_exists(path).await.unwrap_or(false);
    let config = if from_file {
        AppConfig::load(path)
            .await
            .with_context(|| format!("failed to load {}", path.display()))?
    } else {
        AppConfig::default()
    };
    Ok((config, from_file))
}

/// Apply `PORT`, `ALLOWED_ORIGIN` and `BEDSIDE_MODEL` as resolved by `lookup`.
fn apply_overrides(config: &mut AppConfig, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
    config
        .apply_overrides_from(lookup)
        .context("invalid environment override")
}
