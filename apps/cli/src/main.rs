//! Prospector CLI: enrich company lists against an Ideal Customer Profile.
//!
//! Fetches each company's website, extracts structured facts with an LLM,
//! scores them against the ICP and prints a ranked list.

mod commands;

use clap::Parser;
use color_eyre::eyre::Result;

use commands::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    commands::init_tracing(&cli);
    commands::run(cli).await
}
