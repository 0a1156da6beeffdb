//! Spillway CLI - Command-line interface
//!
//! Provides command-line access to the streaming proxy.

mod commands;

use clap::Parser;

#[derive(Parser)]
#[command(name = "spillway")]
#[command(about = "A same-origin video streaming proxy")]
struct Cli {
    #[command(subcommand)]
    command: commands::Commands,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    commands::handle_command(cli.command).await?;

    Ok(())
}
