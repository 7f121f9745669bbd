//! huurwijzer CLI — the main entry point.
//!
//! Commands:
//! - `onboard` — Write a default config file
//! - `serve`   — Start the HTTP API server
//! - `chat`    — Talk to the assistant from the terminal
//! - `prompt`  — Print the rendered system prompt

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "huurwijzer",
    about = "huurwijzer — Dutch rental assistant for expats",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default configuration file
    Onboard,

    /// Start the HTTP API server
    Serve {
        /// Override the port
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Chat with the assistant
    Chat {
        /// Send a single message instead of entering interactive mode
        #[arg(short, long)]
        message: Option<String>,
    },

    /// Print the rendered system prompt
    Prompt,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .init();

    match cli.command {
        Commands::Onboard => commands::onboard::run().await?,
        Commands::Serve { port } => commands::serve::run(port).await?,
        Commands::Chat { message } => commands::chat::run(message).await?,
        Commands::Prompt => commands::prompt::run().await?,
    }

    Ok(())
}
