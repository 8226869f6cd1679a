//! shardfs CLI Binary
//!
//! Command-line interface for inspecting a sharded registry layout.

use anyhow::Context;
use clap::Parser;
use shardfs::logging::init_logging;
use shardfs::tooling::cli::{Cli, CliContext};
use std::process;

async fn run(cli: Cli) -> anyhow::Result<String> {
    let config = cli.load_config().context("Error loading configuration")?;
    init_logging(Some(&config.logging)).context("Error initializing logging")?;

    let context = CliContext::new(&cli.root, config)
        .await
        .with_context(|| format!("Error opening store at {}", cli.root.display()))?;
    let output = context.execute(&cli.command).await?;
    Ok(output)
}

fn main() {
    let cli = Cli::parse();

    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Error starting runtime: {}", e);
            process::exit(1);
        }
    };

    match runtime.block_on(run(cli)) {
        Ok(output) => {
            println!("{}", output);
        }
        Err(e) => {
            eprintln!("Error: {:#}", e);
            process::exit(1);
        }
    }
}
