//! Batch loop: enumerate the corpus, analyze each artifact, append results.
//!
//! Artifacts are processed strictly one after another. A failure on one
//! artifact is reported and skipped; only problems with the corpus
//! directory or the output log end the run early.

use crate::config::Config;
use crate::driver::{AnalysisDriver, DriverConfig};
use crate::models::{Artifact, ArtifactOutcome, RunSummary};
use crate::output::OutputLog;
use crate::scanner::ArtifactScanner;
use anyhow::Result;
use indicatif::{ProgressBar, ProgressStyle};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Everything a batch run needs, fixed at start of run.
#[derive(Debug, Clone)]
pub struct BatchConfig {
    /// Directory holding the artifacts.
    pub corpus_dir: PathBuf,
    /// Output log path.
    pub output: PathBuf,
    /// Analyzer invocation settings.
    pub driver: DriverConfig,
    /// Show a spinner while the analyzer runs.
    pub show_progress: bool,
}

impl From<&Config> for BatchConfig {
    fn from(config: &Config) -> Self {
        Self {
            corpus_dir: config.corpus.dir.clone(),
            output: config.output_path(),
            driver: config.driver_config(),
            show_progress: true,
        }
    }
}

/// Drives the analyzer over a whole corpus.
pub struct BatchRunner {
    config: BatchConfig,
    driver: AnalysisDriver,
}

impl BatchRunner {
    /// Create a new runner.
    pub fn new(config: BatchConfig) -> Self {
        let driver = AnalysisDriver::new(config.driver.clone());
        Self { config, driver }
    }

    /// Run the batch and return its summary.
    ///
    /// Per-artifact failures never end the run; an unreadable corpus
    /// directory or an unwritable output log does.
    pub async fn run(&self) -> Result<RunSummary> {
        let start_time = Instant::now();

        let scanner = ArtifactScanner::new(self.config.corpus_dir.clone());
        let artifacts = scanner.scan()?;

        if !self.config.driver.working_dir.is_dir() {
            warn!(
                "Analyzer working directory does not exist: {}",
                self.config.driver.working_dir.display()
            );
        }

        let mut log = OutputLog::create(&self.config.output)?;
        let artifacts = exclude_output_log(artifacts, log.path());

        let total = artifacts.len();
        let mut summary = RunSummary::new(total, log.path().to_path_buf());
        println!("Found {} files.", total);
        info!(
            "Analyzing {} artifacts from {}",
            total,
            self.config.corpus_dir.display()
        );

        for (index, artifact) in artifacts.iter().enumerate() {
            // The corpus may change while the run is in progress.
            if !artifact.is_regular_file() {
                debug!("Skipping {}: no longer a regular file", artifact.filename);
                summary.skipped += 1;
                continue;
            }

            println!("[{}/{}] Processing {} ...", index + 1, total, artifact.filename);

            let outcome = self.process(artifact, &mut log).await?;
            if outcome != ArtifactOutcome::Recorded {
                println!("  -> ERROR: {}", outcome);
            }
            summary.record(&outcome);
        }

        summary.duration_seconds = start_time.elapsed().as_secs_f64();
        println!("\nAll done. Results saved to {}", log.path().display());
        info!(
            "Wrote {} records ({} without output, {} failed)",
            log.written(),
            summary.no_output,
            summary.failed
        );

        Ok(summary)
    }

    /// Analyze one artifact and append its record, if any.
    ///
    /// Only a failed write to the output log is returned as an error.
    async fn process(&self, artifact: &Artifact, log: &mut OutputLog) -> Result<ArtifactOutcome> {
        let spinner = self.spinner(&artifact.filename);
        let result = self.driver.analyze(artifact).await;
        spinner.finish_and_clear();

        match result {
            Ok(Some(record)) => {
                log.append(&record)?;
                debug!("Recorded result for {}", artifact.filename);
                Ok(ArtifactOutcome::Recorded)
            }
            Ok(None) => {
                warn!("No JSON output for {}", artifact.filename);
                Ok(ArtifactOutcome::NoOutput)
            }
            Err(e) => {
                warn!("Analyzer failed on {}: {}", artifact.filename, e);
                Ok(ArtifactOutcome::Failed(e.to_string()))
            }
        }
    }

    fn spinner(&self, filename: &str) -> ProgressBar {
        if !self.config.show_progress {
            return ProgressBar::hidden();
        }

        let pb = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::with_template("{spinner:.green} [{elapsed_precise}] {msg}") {
            pb.set_style(style);
        }
        pb.set_message(format!("analyzing {}", filename));
        pb.enable_steady_tick(Duration::from_millis(120));
        pb
    }
}

/// Drop the output log from the artifact list when it lives in the corpus.
pub fn exclude_output_log(artifacts: Vec<Artifact>, output: &Path) -> Vec<Artifact> {
    let Ok(output) = fs::canonicalize(output) else {
        return artifacts;
    };

    artifacts
        .into_iter()
        .filter(|artifact| match fs::canonicalize(&artifact.path) {
            Ok(path) if path == output => {
                debug!("Not analyzing the output log {}", artifact.filename);
                false
            }
            _ => true,
        })
        .collect()
}
