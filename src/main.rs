//! FPL Stats - command line front end
//!
//! Loads the season CSV once, runs a single command and prints the result.

use anyhow::{Context, Result};
use clap::Parser;
use fpl_stats::cli::{Cli, CliHandler};
use fpl_stats::config::AppConfig;
use fpl_stats::data::{DataLoader, DataSource};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    // Logs go to stderr so JSON on stdout stays machine readable
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => AppConfig::from_file(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => AppConfig::default(),
    };

    // Polars truncates long frames when printing
    let rows = cli.limit.unwrap_or(config.display_rows);
    if std::env::var_os("POLARS_FMT_MAX_ROWS").is_none() {
        std::env::set_var("POLARS_FMT_MAX_ROWS", rows.to_string());
    }

    let source = DataSource::parse(cli.source.as_deref().unwrap_or(&config.data_url));
    let loader = DataLoader::new(Duration::from_secs(config.http_timeout_secs))?;
    let table = loader
        .load(&source)
        .with_context(|| format!("loading season data from {source:?}"))?;

    let handler = CliHandler::new(table, config, cli.format, cli.limit);
    handler.handle_command(cli.command)?;

    Ok(())
}
