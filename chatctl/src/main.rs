//! Command-line interface for chatrelay

use chatrelay_core::errors::CoreError;
use clap::Parser;
use std::process;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

mod cli;
mod client;
mod commands;
mod config;
mod output;

use cli::*;
use config::ChatctlConfig;

#[tokio::main]
async fn main() {
    let args = Cli::parse();

    // Serving without -v still reports lifecycle events
    let verbosity = match args.command {
        Commands::Serve { .. } => args.verbose.max(1),
        _ => args.verbose,
    };
    let default_level = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .with_target(false)
        .init();

    match run(&args).await {
        Ok(_) => {
            info!("Command completed successfully");
        }
        Err(e) => {
            error!("Command failed: {}", e);
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    }
}

async fn run(args: &Cli) -> Result<(), CoreError> {
    let client_config = || -> Result<ChatctlConfig, CoreError> {
        let config = ChatctlConfig::load(&args.config)?.with_overrides(args);
        info!("Using chatrelay endpoint: {}", config.endpoint);
        Ok(config)
    };

    match args.command.clone() {
        Commands::Serve { bind, port } => commands::serve::handle_serve_command(&args.config, bind, port).await,
        Commands::Classify { file } => commands::classify::handle_classify_command(file, &client_config()?).await,
        Commands::Chat(chat_args) => commands::chat::handle_chat_command(chat_args, &client_config()?).await,
        Commands::Health => commands::health::handle_health_command(&client_config()?).await,
    }
}
