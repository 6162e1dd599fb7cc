use anyhow::{Context, Result};
use logshelf_security::Stats;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tokio::fs::File;

use super::RedactOptions;
use crate::discover::{SessionFile, discover};
use crate::output::{format_size, redaction_summary};

#[derive(Debug, Serialize)]
pub struct ScanEntry {
    pub project: String,
    pub key: String,
    pub path: PathBuf,
    pub size: u64,
    pub stats: Stats,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ScanReport {
    pub root: PathBuf,
    pub files: Vec<ScanEntry>,
    pub total: Stats,
}

pub async fn handle(root: PathBuf, options: &RedactOptions, json: bool) -> Result<()> {
    let report = run(&root, options).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }

    Ok(())
}

/// Redact every session log under `root` into a sink.
pub async fn run(root: &Path, options: &RedactOptions) -> Result<ScanReport> {
    let files = discover(root, "")?;
    let mut entries = Vec::with_capacity(files.len());

    for file in files {
        let (stats, error) = match scan_file(&file, options).await {
            Ok(stats) => (stats, None),
            Err(e) => {
                tracing::warn!("Failed to scan {}: {:#}", file.path.display(), e);
                (Stats::new(), Some(format!("{:#}", e)))
            }
        };
        entries.push(ScanEntry {
            project: file.project,
            key: file.key,
            path: file.path,
            size: file.size,
            stats,
            error,
        });
    }

    let total: Stats = entries.iter().map(|e| &e.stats).sum();
    Ok(ScanReport {
        root: root.to_path_buf(),
        files: entries,
        total,
    })
}

async fn scan_file(file: &SessionFile, options: &RedactOptions) -> Result<Stats> {
    let source = File::open(&file.path)
        .await
        .with_context(|| format!("Failed to open {}", file.path.display()))?;
    let stats = options.copy(source, &mut tokio::io::sink()).await?;
    Ok(stats.unwrap_or_default())
}

fn print_report(report: &ScanReport) {
    if report.files.is_empty() {
        println!("No session logs found under {}", report.root.display());
        return;
    }

    let width = report
        .files
        .iter()
        .map(|e| e.key.len())
        .max()
        .unwrap_or(0)
        .max("FILE".len());

    println!(
        "{:<width$}  {:>10}  {:>10}  {:>8}",
        "FILE",
        "SIZE",
        "REDACTED",
        "MATCHES",
        width = width
    );
    for entry in &report.files {
        if let Some(error) = &entry.error {
            println!("{:<width$}  error: {}", entry.key, error, width = width);
            continue;
        }
        println!(
            "{:<width$}  {:>10}  {:>10}  {:>8}",
            entry.key,
            format_size(entry.size),
            format_size(entry.stats.redacted_bytes),
            entry.stats.total_matches,
            width = width
        );
    }

    println!(
        "\n{} files, {} lines, {}",
        report.files.len(),
        report.total.lines_processed,
        report.total
    );
    let summary = redaction_summary(&report.total);
    if !summary.is_empty() {
        print!("\n{}", summary);
    }
}
