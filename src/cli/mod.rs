pub mod check;
pub mod rewrite;
pub mod schema;

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use snafu::ResultExt;

use crate::config::MigrateConfig;
use crate::error::migrate_error::{ConfigSnafu, IoSnafu};
use crate::error::Result;
use crate::report::MigrationReport;

#[derive(Parser)]
#[command(
    name = "mockswap",
    version,
    about = "Migrate JMock rule-based tests to Mockito"
)]
pub struct Cli {
    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Rewrite Java test sources in place
    Rewrite {
        /// Files or directories to migrate
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        /// Report what would change without writing
        #[arg(long)]
        dry_run: bool,

        /// Output the report as JSON
        #[arg(long)]
        json: bool,

        /// Config file (default: .mockswap.toml in the current directory)
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// List files that would change; exits 1 if any would or if a file has errors
    Check {
        /// Files or directories to inspect
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        /// Output the report as JSON
        #[arg(long)]
        json: bool,

        /// Config file (default: .mockswap.toml in the current directory)
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Print the JSON Schema of a serialized type
    Schema {
        /// Schema name: report, config
        #[arg(default_value = "report")]
        name: String,
    },
}

/// Resolve the run configuration for a subcommand.
pub(crate) fn load_config(path: Option<&Path>) -> Result<MigrateConfig> {
    let cwd = std::env::current_dir().context(IoSnafu { path: "." })?;
    MigrateConfig::load(path, &cwd).context(ConfigSnafu)
}

pub(crate) fn print_json(report: &MigrationReport) -> Result<()> {
    let output = serde_json::to_string_pretty(report).map_err(|e| {
        crate::error::MigrateError::Json {
            source: e,
            location: snafu::Location::default(),
        }
    })?;
    println!("{output}");
    Ok(())
}

/// Print one line per file that changed or carries diagnostics.
pub(crate) fn print_summary(report: &MigrationReport, verb: &str) {
    for file in &report.files {
        if !file.changed && file.diagnostics.is_empty() {
            continue;
        }
        let mark = if file.changed { verb } else { "kept" };
        println!("{mark:>9} {} ({})", file.path.display(), file.state);
        for diagnostic in &file.diagnostics {
            println!(
                "          line {}: [{}] {}",
                diagnostic.line, diagnostic.severity, diagnostic.message
            );
        }
    }
    println!(
        "{} file(s) scanned, {} {verb}, {} aborted",
        report.files.len(),
        report.changed,
        report.aborted
    );
}
