//! casebook: import Markdown test case documents into a local store and track
//! test results across re-imports.

mod commands;
mod config;
mod log_bridge;

use std::path::PathBuf;
use std::process::ExitCode;

use casebook_core::types::TestStatus;
use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "casebook")]
#[command(version)]
#[command(
    about = "casebook - Markdown test case documents with tracked results",
    long_about = None
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to the configuration file. Also via `CASEBOOK_CONFIG`.
    #[arg(long, global = true, value_name = "FILE", env = "CASEBOOK_CONFIG")]
    pub config: Option<PathBuf>,

    /// Store file (overrides `storePath` from the config). Also via `CASEBOOK_STORE`.
    #[arg(long, global = true, value_name = "FILE", env = "CASEBOOK_STORE")]
    pub store: Option<PathBuf>,

    /// Log at debug level (`RUST_LOG` still takes precedence)
    #[arg(short = 'v', long, global = true)]
    pub verbose: bool,

    /// Do not copy log output to the log file
    #[arg(long = "no-log-file", global = true)]
    pub no_log_file: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Parse a document and print the result as JSON without importing it
    Parse {
        file: PathBuf,
        /// Single-line JSON
        #[arg(long)]
        compact: bool,
    },

    /// Import a document, keeping results of test cases that already exist
    Import {
        file: PathBuf,
        /// Import into this page id
        #[arg(long)]
        page_id: Option<String>,
        /// Page identifier such as `LoginPage` (default: derived from the path)
        #[arg(long)]
        page_name: Option<String>,
        /// Display name for a new page (default: the document's `# ` heading)
        #[arg(long)]
        display_name: Option<String>,
    },

    /// List test cases with their ids
    Cases {
        #[arg(long)]
        page_id: Option<String>,
        /// Only cases with this status
        #[arg(long)]
        status: Option<TestStatus>,
    },

    /// Record a test result
    Status {
        /// Test case id
        id: String,
        /// pending, failed or passed
        status: TestStatus,
        #[arg(long)]
        notes: Option<String>,
    },

    /// Show pass/fail counts
    Stats {
        #[arg(long)]
        page_id: Option<String>,
    },

    /// List pages
    Pages,

    /// Delete a page with its categories and test cases
    #[command(alias = "rm")]
    DeletePage { page_id: String },

    /// Write a JSON backup of the whole store
    Export {
        /// Output file (default: test-cases-backup-YYYY-MM-DD.json)
        path: Option<PathBuf>,
    },

    /// Replace the store with a JSON backup
    Restore { path: PathBuf },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let log_file = (!cli.no_log_file).then(log_bridge::default_log_path);
    let default_filter = if cli.verbose { "debug" } else { "warn" };
    if let Err(e) = log_bridge::init(default_filter, log_file) {
        log_bridge::write_fallback_line(&format!("failed to initialize logger: {}", e));
    }

    match commands::run(cli).await {
        Ok(code) => code,
        Err(e) => {
            log::error!("[casebook.cli] {:#}", e);
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
