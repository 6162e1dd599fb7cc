use anyhow::{Context, Result};
use logshelf_security::Stats;
use std::path::{Path, PathBuf};
use tokio::fs::File;
use tokio::io::AsyncWrite;

use super::RedactOptions;
use crate::output::format_size;

pub async fn handle(
    input: PathBuf,
    output: Option<PathBuf>,
    options: &RedactOptions,
    json: bool,
) -> Result<()> {
    let stats = match &output {
        Some(path) => {
            let mut file = File::create(path)
                .await
                .with_context(|| format!("Failed to create {}", path.display()))?;
            match run(&input, options, &mut file).await {
                Ok(stats) => stats,
                Err(e) => {
                    drop(file);
                    let _ = tokio::fs::remove_file(path).await;
                    return Err(e);
                }
            }
        }
        None => run(&input, options, &mut tokio::io::stdout()).await?,
    };

    match stats {
        Some(stats) if json => eprintln!("{}", serde_json::to_string_pretty(&stats)?),
        Some(stats) => eprintln!("{}", summary_line(&stats)),
        None => eprintln!("Redaction disabled, copied unchanged"),
    }

    Ok(())
}

/// Stream `input` (a path, or `-` for stdin) into `sink`.
pub async fn run<W>(input: &Path, options: &RedactOptions, sink: &mut W) -> Result<Option<Stats>>
where
    W: AsyncWrite + Unpin,
{
    if input == Path::new("-") {
        return options.copy(tokio::io::stdin(), sink).await;
    }

    let file = File::open(input)
        .await
        .with_context(|| format!("Failed to open {}", input.display()))?;
    options
        .copy(file, sink)
        .await
        .with_context(|| format!("Failed to redact {}", input.display()))
}

fn summary_line(stats: &Stats) -> String {
    format!(
        "Redacted {} lines: {} → {} ({:.1}% reduction), {}",
        stats.lines_processed,
        format_size(stats.original_bytes),
        format_size(stats.redacted_bytes),
        stats.percent_reduction(),
        stats
    )
}
