//! `hierarchy` command-line tool
//!
//! Loads a raw role tree from JSON, builds it, and runs one query against it.
//!
//! ```text
//! hierarchy tree.json validate
//! hierarchy tree.json permissions --role 5 --guard web
//! hierarchy tree.json --json flatten
//! ```

mod cli;
mod commands;

use anyhow::{Context, Result};
use clap::Parser;
use cli::Cli;
use hierarchy_sync::SyncConfig;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    match run(Cli::parse()) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::from(2)
        }
    }
}

fn run(cli: Cli) -> Result<bool> {
    let config = match &cli.config {
        Some(path) => SyncConfig::load(path)
            .with_context(|| format!("failed to load config from {}", path.display()))?,
        None => SyncConfig::default(),
    };
    let config = if cli.lenient {
        config.with_strict_ingestion(false)
    } else {
        config
    };

    let report = commands::load_tree(&cli.file, config.ingest_mode())?;
    let outcome = commands::run(&cli.command, &report.tree, cli.json)?;
    println!("{}", outcome.output);
    Ok(outcome.success)
}
