mod cli;
mod commands;
mod discover;
mod manifest;
mod output;

use anyhow::{Context, Result};
use clap::Parser;
use logshelf_config::Config;

use commands::RedactOptions;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = cli::Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    }
    .context("Failed to load config")?;

    match cli.command {
        cli::Commands::Redact {
            input,
            output,
            no_redact,
            debug,
            json,
        } => {
            let options = RedactOptions::from_config(&config, no_redact, debug);
            commands::redact::handle(input, output, &options, json).await
        }
        cli::Commands::Scan { root, json, debug } => {
            let root = match root {
                Some(root) => root,
                None => config.local.projects_root()?,
            };
            let options = RedactOptions::redacting(
                config.redaction.max_line_bytes,
                debug || config.redaction.debug,
            );
            commands::scan::handle(root, &options, json).await
        }
        cli::Commands::Export {
            dest,
            root,
            prefix,
            no_redact,
            debug,
        } => {
            let root = match root {
                Some(root) => root,
                None => config.local.projects_root()?,
            };
            let prefix = prefix.unwrap_or_else(|| config.export.normalized_prefix());
            let options = RedactOptions::from_config(&config, no_redact, debug);
            commands::export::handle(root, dest, &prefix, &options).await
        }
        cli::Commands::Patterns { json } => commands::patterns::handle(json),
    }
}
