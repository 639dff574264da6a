//! CLI definition using clap.
//!
//! Paperboy has no subcommands: launching it opens the dashboard.

use clap::Parser;
use std::path::PathBuf;

/// Paperboy - terminal dashboard for a scheduled arXiv research digest
#[derive(Parser, Debug)]
#[command(name = "paperboy")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Optional config file path
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Directory holding settings and digest history (overrides config)
    #[arg(short, long)]
    pub data_dir: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    /// Check if verbose mode is enabled
    pub fn is_verbose(&self) -> bool {
        self.verbose
    }
}
