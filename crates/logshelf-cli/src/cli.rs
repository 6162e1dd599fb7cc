use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "logshelf")]
#[command(about = "Redact and export Claude Code session logs", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Config file (default: platform config dir)
    #[arg(long, global = true, env = "LOGSHELF_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Redact a single JSONL file
    Redact {
        /// Input file, or "-" for stdin
        input: PathBuf,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Copy the input unchanged
        #[arg(long)]
        no_redact: bool,

        /// Print every match to stderr, unredacted
        #[arg(long)]
        debug: bool,

        /// Print stats as JSON
        #[arg(long)]
        json: bool,
    },

    /// Dry run: redact every session log and report what would change
    Scan {
        /// Projects root (default from config)
        #[arg(long)]
        root: Option<PathBuf>,

        #[arg(long)]
        json: bool,

        /// Print every match to stderr, unredacted
        #[arg(long)]
        debug: bool,
    },

    /// Write redacted copies of every session log under a directory
    Export {
        /// Destination directory
        #[arg(long)]
        dest: PathBuf,

        /// Projects root (default from config)
        #[arg(long)]
        root: Option<PathBuf>,

        /// Key prefix (default from config)
        #[arg(long)]
        prefix: Option<String>,

        /// Copy files unchanged
        #[arg(long)]
        no_redact: bool,

        /// Print every match to stderr, unredacted
        #[arg(long)]
        debug: bool,
    },

    /// List redaction patterns in match order
    Patterns {
        #[arg(long)]
        json: bool,
    },
}
