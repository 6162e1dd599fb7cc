use anyhow::{Context, Result, bail};
use logshelf_security::Stats;
use std::io::Write;
use std::path::{Path, PathBuf};
use tokio::fs::File;

use super::RedactOptions;
use crate::discover::{SessionFile, discover};
use crate::manifest::Manifest;
use crate::output::{file_stats_suffix, format_size, redaction_summary};

#[derive(Debug, Default)]
pub struct ExportReport {
    pub exported: usize,
    /// Files left alone because the manifest shows them unchanged
    pub skipped: usize,
    pub failed: usize,
    pub exported_bytes: u64,
    pub stats: Stats,
}

pub async fn handle(
    root: PathBuf,
    dest: PathBuf,
    prefix: &str,
    options: &RedactOptions,
) -> Result<()> {
    let files = discover(&root, prefix)?;
    if files.is_empty() {
        println!("No session logs found under {}", root.display());
        return Ok(());
    }

    let manifest_path = Manifest::path(&dest, prefix);
    let mut manifest = Manifest::load(&manifest_path).unwrap_or_else(|e| {
        tracing::warn!("{:#}; treating as first export", e);
        Manifest::default()
    });

    let report = run(&files, &dest, options, &mut manifest).await?;

    if report.exported > 0 {
        if let Err(e) = manifest.save(&manifest_path) {
            tracing::warn!("Exports succeeded but the manifest was not saved: {:#}", e);
        }
    }

    println!(
        "\nExport complete: {} exported ({}), {} skipped, {} failed",
        report.exported,
        format_size(report.exported_bytes),
        report.skipped,
        report.failed
    );
    let summary = redaction_summary(&report.stats);
    if !summary.is_empty() {
        print!("\n{}", summary);
    }

    if report.failed > 0 {
        bail!("{} of {} files failed to export", report.failed, files.len());
    }
    Ok(())
}

/// Write every changed file to `dest/<key>`, printing progress as it goes.
///
/// Files `manifest` shows as unchanged are skipped; every successful export
/// is recorded in it. A file that fails is reported and skipped; the others
/// still export.
pub async fn run(
    files: &[SessionFile],
    dest: &Path,
    options: &RedactOptions,
    manifest: &mut Manifest,
) -> Result<ExportReport> {
    let mut report = ExportReport::default();
    let total = files.len();

    for (i, file) in files.iter().enumerate() {
        if manifest.is_unchanged(file) {
            println!(
                "[{}/{}] Skipping {} (unchanged)",
                i + 1,
                total,
                file.path.display()
            );
            report.skipped += 1;
            continue;
        }

        print!(
            "[{}/{}] Exporting {} ({})",
            i + 1,
            total,
            file.path.display(),
            format_size(file.size)
        );
        std::io::stdout().flush()?;

        match export_file(file, dest, options).await {
            Ok(stats) => {
                match stats {
                    Some(stats) => {
                        println!("{}", file_stats_suffix(&stats));
                        report.stats += &stats;
                    }
                    None => println!(),
                }
                manifest.record(file);
                report.exported += 1;
                report.exported_bytes += file.size;
            }
            Err(e) => {
                println!();
                tracing::warn!("Failed to export {}: {:#}", file.path.display(), e);
                report.failed += 1;
            }
        }
    }

    Ok(report)
}

async fn export_file(
    file: &SessionFile,
    dest: &Path,
    options: &RedactOptions,
) -> Result<Option<Stats>> {
    let target = dest.join(&file.key);
    if let Some(parent) = target.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }

    // A failed export never leaves a file at the final key.
    let partial = partial_path(&target);
    let result: Result<Option<Stats>> = async {
        let source = File::open(&file.path)
            .await
            .with_context(|| format!("Failed to open {}", file.path.display()))?;
        let mut sink = File::create(&partial)
            .await
            .with_context(|| format!("Failed to create {}", partial.display()))?;
        options.copy(source, &mut sink).await
    }
    .await;

    match result {
        Ok(stats) => {
            tokio::fs::rename(&partial, &target)
                .await
                .with_context(|| format!("Failed to move {} into place", target.display()))?;
            Ok(stats)
        }
        Err(e) => {
            let _ = tokio::fs::remove_file(&partial).await;
            Err(e)
        }
    }
}

fn partial_path(target: &Path) -> PathBuf {
    let mut name = target.file_name().unwrap_or_default().to_os_string();
    name.push(".partial");
    target.with_file_name(name)
}
