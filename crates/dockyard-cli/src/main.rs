//! # dockyard — compose to image configuration translator
//!
//! Reads a docker-compose file (version 2) and prints the resolved build
//! and run configuration of every service as JSON.

mod commands;

use clap::Parser;

use crate::commands::Cli;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    commands::execute(cli)
}
