//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use clap::Parser;
use std::path::PathBuf;

/// Scoutbatch - run a static analyzer over a corpus and collect its JSON results
///
/// Every regular file in the corpus directory is handed to the analyzer,
/// one at a time. The last JSON object the analyzer prints is tagged with
/// the file name and appended to the output log (one object per line).
///
/// Examples:
///   scoutbatch
///   scoutbatch --samples ./bytecode --tool-dir ./crypto_scout
///   scoutbatch --samples ./bytecode --command python3,main.py --timeout 600
///   scoutbatch --samples ./bytecode --dry-run
///   scoutbatch --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Directory holding the artifacts to analyze
    ///
    /// Default: from config or /samples.
    #[arg(short, long, value_name = "DIR", env = "SCOUTBATCH_SAMPLES")]
    pub samples: Option<PathBuf>,

    /// Output log path (newline-delimited JSON)
    ///
    /// Truncated at the start of every run. Default: results.jsonl in the
    /// samples directory.
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Working directory the analyzer is started in
    ///
    /// Default: from config or /crypto_scout.
    #[arg(short = 'w', long, value_name = "DIR", env = "SCOUTBATCH_TOOL_DIR")]
    pub tool_dir: Option<PathBuf>,

    /// Analyzer command and arguments (comma-separated)
    ///
    /// Example: --command sh,run.sh
    #[arg(long, value_name = "PROG,ARGS", value_delimiter = ',')]
    pub command: Option<Vec<String>>,

    /// Mode selector passed to the analyzer as OPTION
    #[arg(long, value_name = "MODE")]
    pub mode: Option<String>,

    /// Per-artifact timeout in seconds
    ///
    /// The analyzer is killed when it runs longer and the artifact is
    /// reported as failed. Off by default.
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Path to configuration file
    ///
    /// If not specified, looks for .scoutbatch.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long)]
    pub quiet: bool,

    /// Dry run: list the artifacts that would be analyzed and exit
    ///
    /// The analyzer is never started and the output log is not touched.
    #[arg(long)]
    pub dry_run: bool,

    /// Generate a default .scoutbatch.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        // Skip validation for --init-config
        if self.init_config {
            return Ok(());
        }

        // Check for conflicting options
        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        // Validate timeout if provided
        if let Some(timeout) = self.timeout {
            if timeout == 0 {
                return Err("Timeout must be at least 1 second".to_string());
            }
        }

        // Validate command if provided
        if let Some(ref command) = self.command {
            if command.first().map_or(true, |program| program.trim().is_empty()) {
                return Err("Command must name a program".to_string());
            }
        }

        // Validate samples directory if provided; a missing directory is
        // reported when the run starts.
        if let Some(ref samples) = self.samples {
            if samples.exists() && !samples.is_dir() {
                return Err(format!(
                    "Samples path is not a directory: {}",
                    samples.display()
                ));
            }
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}
