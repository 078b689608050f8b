//! Folio CLI — the main entry point.
//!
//! Commands:
//! - `onboard`  — Initialize config and the persona file
//! - `gateway`  — Start the HTTP gateway
//! - `status`   — Show configuration status
//! - `persona`  — Inspect the stored persona

use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;

#[derive(Parser)]
#[command(
    name = "folio",
    about = "Folio — persona chat backend for portfolio sites",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Use this config file instead of ~/.folio/config.toml
    #[arg(short, long, global = true, env = "FOLIO_CONFIG")]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize configuration and the persona file
    Onboard,

    /// Start the HTTP gateway server
    Gateway {
        /// Override the port
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Show configuration status
    Status,

    /// Inspect the stored persona
    Persona {
        #[command(subcommand)]
        action: PersonaAction,
    },
}

#[derive(Subcommand)]
enum PersonaAction {
    /// Print the sanitized persona document
    Show,

    /// Print the chat system prompt built from the persona
    Prompt,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .init();

    let config_path = cli.config.as_deref();
    match cli.command {
        Commands::Onboard => commands::onboard::run(config_path).await?,
        Commands::Gateway { port } => commands::gateway::run(config_path, port).await?,
        Commands::Status => commands::status::run(config_path).await?,
        Commands::Persona { action } => match action {
            PersonaAction::Show => commands::persona::show(config_path).await?,
            PersonaAction::Prompt => commands::persona::prompt(config_path).await?,
        },
    }

    Ok(())
}
