use std::io;

use anyhow::Result;
use clap::Parser;
use stock_insight::{cli::Cli, config::resolve_config};

/// Logs go to stderr; stdout carries the reports.
fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging();

    let config = resolve_config(cli.config.as_deref())?;
    let today = chrono::Local::now().date_naive();

    let stdin = io::stdin().lock();
    let mut stdout = io::stdout().lock();
    stock_insight::cli::run(&cli, &config, today, stdin, &mut stdout).await
}
