//! CLI command definitions and dispatch.

pub mod translate;

use clap::{Parser, Subcommand};

/// dockyard — Translate docker-compose files into image configurations.
#[derive(Parser, Debug)]
#[command(name = "dockyard", version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Command,
}

/// Available CLI subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Resolve one image configuration per compose service.
    Translate(translate::TranslateArgs),
}

/// Dispatches the parsed CLI command to its handler.
///
/// # Errors
///
/// Returns an error if the command execution fails.
pub fn execute(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Command::Translate(args) => translate::execute(args),
    }
}
