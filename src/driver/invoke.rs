//! Invocation of the external analyzer, one child process per artifact.

use crate::driver::extract::extract_record;
use crate::models::{AnalysisRecord, Artifact};
use std::path::PathBuf;
use std::process::{Output, Stdio};
use std::time::Duration;
use thiserror::Error;
use tokio::process::Command;
use tracing::debug;

/// Environment variable selecting the analyzer's mode.
pub const MODE_VAR: &str = "OPTION";
/// Environment variable holding the corpus directory.
pub const CORPUS_DIR_VAR: &str = "BYTECODE_DIR";
/// Environment variable holding the artifact's file name.
pub const FILE_NAME_VAR: &str = "BYTECODE_FILE_NAME";

/// Configuration for the analysis driver.
#[derive(Debug, Clone)]
pub struct DriverConfig {
    /// Program and arguments used to start the analyzer.
    pub command: Vec<String>,
    /// Working directory the analyzer is started in.
    pub working_dir: PathBuf,
    /// Corpus directory handed to the analyzer.
    pub corpus_dir: PathBuf,
    /// Mode selector ("p" = process/parse).
    pub mode: String,
    /// Per-artifact timeout. `None` waits indefinitely.
    pub timeout_seconds: Option<u64>,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            command: vec!["sh".to_string(), "run.sh".to_string()],
            working_dir: PathBuf::from("/crypto_scout"),
            corpus_dir: PathBuf::from("/samples"),
            mode: "p".to_string(),
            timeout_seconds: None,
        }
    }
}

/// Errors that stop the analyzer from running to completion on one artifact.
#[derive(Debug, Error)]
pub enum DriverError {
    #[error("analyzer command is empty")]
    EmptyCommand,

    #[error("failed to start `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to collect output of `{command}`: {source}")]
    Io {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("timed out after {0}s")]
    Timeout(u64),
}

/// Runs the analyzer on artifacts and extracts its results.
pub struct AnalysisDriver {
    config: DriverConfig,
}

impl AnalysisDriver {
    /// Create a new driver.
    pub fn new(config: DriverConfig) -> Self {
        Self { config }
    }

    /// Variables set on top of the inherited environment for one artifact.
    pub fn environment(&self, artifact: &Artifact) -> Vec<(&'static str, String)> {
        vec![
            (MODE_VAR, self.config.mode.clone()),
            (
                CORPUS_DIR_VAR,
                self.config.corpus_dir.to_string_lossy().to_string(),
            ),
            (FILE_NAME_VAR, artifact.filename.clone()),
        ]
    }

    /// Run the analyzer on one artifact.
    ///
    /// Returns `Ok(None)` when the analyzer printed no parseable JSON object.
    /// The analyzer's exit status is not checked.
    pub async fn analyze(&self, artifact: &Artifact) -> Result<Option<AnalysisRecord>, DriverError> {
        let output = self.run_tool(artifact).await?;

        debug!("{} exited with {}", artifact.filename, output.status);
        if !output.stderr.is_empty() {
            debug!(
                "{} stderr: {}",
                artifact.filename,
                String::from_utf8_lossy(&output.stderr).trim_end()
            );
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        Ok(extract_record(&stdout).map(|fields| AnalysisRecord::new(fields, &artifact.filename)))
    }

    /// Spawn the analyzer and wait for it to exit.
    async fn run_tool(&self, artifact: &Artifact) -> Result<Output, DriverError> {
        let (program, args) = self
            .config
            .command
            .split_first()
            .ok_or(DriverError::EmptyCommand)?;

        let mut cmd = Command::new(program);
        cmd.args(args)
            .current_dir(&self.config.working_dir)
            .envs(self.environment(artifact))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        debug!(
            "Running `{}` in {} for {}",
            self.command_line(),
            self.config.working_dir.display(),
            artifact.filename
        );

        let child = cmd.spawn().map_err(|source| DriverError::Spawn {
            command: self.command_line(),
            source,
        })?;

        let wait = child.wait_with_output();
        let result = match self.config.timeout_seconds {
            // Dropping the timed-out future drops the child, which kills it.
            Some(secs) => tokio::time::timeout(Duration::from_secs(secs), wait)
                .await
                .map_err(|_| DriverError::Timeout(secs))?,
            None => wait.await,
        };

        result.map_err(|source| DriverError::Io {
            command: self.command_line(),
            source,
        })
    }

    fn command_line(&self) -> String {
        self.config.command.join(" ")
    }
}
