//! docpipe CLI: extract text from document scans and drive batch ingestion.

mod commands;

use clap::Parser;
use color_eyre::eyre::Result;

use commands::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    commands::init_tracing(&cli)?;
    commands::run(cli).await
}
