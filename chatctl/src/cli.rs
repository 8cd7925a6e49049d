//! CLI argument definitions

use chatrelay_core::types::ResponseFormat;
use clap::{Args, Parser, Subcommand};
use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "chatctl")]
#[command(about = "chatrelay control tool")]
#[command(version)]
pub struct Cli {
    /// Configuration file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// chatrelay API endpoint URL
    #[arg(short, long, global = true)]
    pub endpoint: Option<String>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Output format
    #[arg(short = 'f', long, global = true, value_enum)]
    pub format: Option<OutputFormat>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Clone)]
pub enum Commands {
    /// Run the chat relay HTTP server
    Serve {
        /// Address to bind
        #[arg(short, long)]
        bind: Option<IpAddr>,
        /// Port to listen on
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Classify text from a file or stdin without calling a model
    Classify {
        /// Input file; stdin when omitted
        file: Option<PathBuf>,
    },
    /// Send a message to a running server
    Chat(ChatArgs),
    /// Health check
    Health,
}

#[derive(Args, Debug, Clone)]
pub struct ChatArgs {
    /// Message to send
    pub message: String,
    /// Preferred reply shape (text, json, code, markdown, table, mixed, raw)
    #[arg(long)]
    pub format_hint: Option<ResponseFormat>,
    /// Extra system prompt
    #[arg(short, long)]
    pub system: Option<String>,
    /// JSON file with earlier messages ([{"role": "...", "content": "..."}])
    #[arg(long)]
    pub history: Option<PathBuf>,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Table,
    Json,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Table => write!(f, "table"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_chat_command() {
        let cli = Cli::try_parse_from([
            "chatctl",
            "-f",
            "json",
            "chat",
            "list the users",
            "--format-hint",
            "table",
            "--system",
            "Be brief.",
        ])
        .unwrap();

        assert_eq!(cli.format, Some(OutputFormat::Json));
        match cli.command {
            Commands::Chat(args) => {
                assert_eq!(args.message, "list the users");
                assert_eq!(args.format_hint, Some(ResponseFormat::Table));
                assert_eq!(args.system.as_deref(), Some("Be brief."));
                assert!(args.history.is_none());
            }
            _ => panic!("expected chat command"),
        }
    }

    #[test]
    fn test_unknown_format_hint_rejected() {
        let result = Cli::try_parse_from(["chatctl", "chat", "hi", "--format-hint", "yaml"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_parse_serve_command() {
        let cli = Cli::try_parse_from(["chatctl", "-vv", "serve", "--bind", "127.0.0.1", "--port", "9000"]).unwrap();
        assert_eq!(cli.verbose, 2);
        match cli.command {
            Commands::Serve { bind, port } => {
                assert_eq!(bind, Some("127.0.0.1".parse().unwrap()));
                assert_eq!(port, Some(9000));
            }
            _ => panic!("expected serve command"),
        }
    }
}
