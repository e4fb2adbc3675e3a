use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "prlens",
    version,
    about = "Index project docs and pull-request diffs, then retrieve review context"
)]
pub struct Cli {
    /// Configuration environment (selects config.<env>.toml); defaults to RUST_ENV or `dev`
    #[arg(long, global = true)]
    pub env: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Rebuild the index from a directory (defaults to the configured docs root)
    Index {
        path: Option<PathBuf>,
        /// Hide the progress bar
        #[arg(long)]
        no_progress: bool,
    },
    /// Search the persisted index
    Search {
        query: String,
        #[arg(short = 'k', long)]
        top_k: Option<usize>,
        /// Print results as JSON
        #[arg(long)]
        json: bool,
    },
    /// Add a pull-request diff to the index, read from a file or stdin
    Diff {
        /// Pull-request reference, e.g. a number or branch name
        pr_ref: String,
        #[arg(long)]
        file: Option<PathBuf>,
        /// Search the updated index right away
        #[arg(long)]
        query: Option<String>,
        #[arg(short = 'k', long)]
        top_k: Option<usize>,
    },
    /// Show what the persisted index holds
    Stats,
}
