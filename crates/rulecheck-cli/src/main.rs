//! rulecheck CLI: check a PDF against three natural-language rules.

mod commands;

use anyhow::Result;
use clap::Parser;

use commands::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    commands::init_tracing(cli.verbose);
    commands::run(cli).await
}
