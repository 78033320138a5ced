mod config_cmd;
mod decode_cmd;
mod serve;
mod terminal_output;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "signbridge")]
#[command(about = "signbridge — wallet pairing to signing backend bridge")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the bridge (default)
    Serve {
        /// YAML config file; environment variables override it
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// Decode a queue payload from a file or stdin and print body and headers
    Decode {
        /// Input file; reads stdin when omitted
        path: Option<PathBuf>,
    },
    /// Print the effective (redacted) config and validate it
    CheckConfig {
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command.unwrap_or(Commands::Serve { config: None }) {
        Commands::Serve { config } => serve::run(config.as_deref()).await,
        Commands::Decode { path } => decode_cmd::run(path.as_deref()).await,
        Commands::CheckConfig { config } => config_cmd::run(config.as_deref()).await,
    }
}
