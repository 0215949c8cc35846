mod commands;
mod loader;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{CheckCommand, ResolveCommand};

/// Rulecast CLI - contextual settings rules workbench
#[derive(Debug, Parser)]
#[command(
    name = "rulecast",
    version,
    about = "Inspect and validate contextual setting override rules"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Resolve the potential rules for a partial context
    Resolve(ResolveCommand),
    /// Validate a rules document
    Check(CheckCommand),
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let exit_code = match cli.command {
        Commands::Resolve(cmd) => cmd.execute()?,
        Commands::Check(cmd) => cmd.execute()?,
    };

    std::process::exit(exit_code);
}
