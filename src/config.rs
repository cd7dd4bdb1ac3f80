//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.scoutbatch.toml` files.

use crate::driver::DriverConfig;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default configuration file name.
pub const CONFIG_FILE_NAME: &str = ".scoutbatch.toml";

/// Output log file name used when no explicit output path is given.
pub const DEFAULT_OUTPUT_NAME: &str = "results.jsonl";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Corpus settings.
    #[serde(default)]
    pub corpus: CorpusConfig,

    /// Analyzer settings.
    #[serde(default)]
    pub tool: ToolConfig,
}

/// Where the artifacts live and where results go.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorpusConfig {
    /// Directory holding the artifacts.
    #[serde(default = "default_corpus_dir")]
    pub dir: PathBuf,

    /// Output log path. Defaults to `results.jsonl` inside the corpus directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<PathBuf>,
}

impl Default for CorpusConfig {
    fn default() -> Self {
        Self {
            dir: default_corpus_dir(),
            output: None,
        }
    }
}

fn default_corpus_dir() -> PathBuf {
    PathBuf::from("/samples")
}

/// External analyzer settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolConfig {
    /// Program and arguments used to start the analyzer.
    #[serde(default = "default_command")]
    pub command: Vec<String>,

    /// Directory the analyzer is started in.
    #[serde(default = "default_working_dir")]
    pub working_dir: PathBuf,

    /// Mode selector passed as `OPTION`.
    #[serde(default = "default_mode")]
    pub mode: String,

    /// Per-artifact timeout in seconds. Unset means wait indefinitely.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_seconds: Option<u64>,
}

impl Default for ToolConfig {
    fn default() -> Self {
        Self {
            command: default_command(),
            working_dir: default_working_dir(),
            mode: default_mode(),
            timeout_seconds: None,
        }
    }
}

fn default_command() -> Vec<String> {
    vec!["sh".to_string(), "run.sh".to_string()]
}

fn default_working_dir() -> PathBuf {
    PathBuf::from("/crypto_scout")
}

fn default_mode() -> String {
    "p".to_string()
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        let default_path = Path::new(CONFIG_FILE_NAME);

        if default_path.exists() {
            Ok(Some(Self::load(default_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence over config file settings, but only
    /// when they were actually given.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(ref samples) = args.samples {
            self.corpus.dir = samples.clone();
        }
        if let Some(ref output) = args.output {
            self.corpus.output = Some(output.clone());
        }

        if let Some(ref tool_dir) = args.tool_dir {
            self.tool.working_dir = tool_dir.clone();
        }
        if let Some(ref command) = args.command {
            self.tool.command = command.clone();
        }
        if let Some(ref mode) = args.mode {
            self.tool.mode = mode.clone();
        }
        if let Some(timeout) = args.timeout {
            self.tool.timeout_seconds = Some(timeout);
        }
    }

    /// The effective output log path.
    pub fn output_path(&self) -> PathBuf {
        self.corpus
            .output
            .clone()
            .unwrap_or_else(|| self.corpus.dir.join(DEFAULT_OUTPUT_NAME))
    }

    /// Settings for the analysis driver.
    pub fn driver_config(&self) -> DriverConfig {
        DriverConfig {
            command: self.tool.command.clone(),
            working_dir: self.tool.working_dir.clone(),
            corpus_dir: self.corpus.dir.clone(),
            mode: self.tool.mode.clone(),
            timeout_seconds: self.tool.timeout_seconds,
        }
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Args;
    use clap::Parser;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.corpus.dir, PathBuf::from("/samples"));
        assert_eq!(config.tool.command, vec!["sh", "run.sh"]);
        assert_eq!(config.tool.working_dir, PathBuf::from("/crypto_scout"));
        assert_eq!(config.tool.mode, "p");
        assert!(config.tool.timeout_seconds.is_none());
        assert_eq!(config.output_path(), PathBuf::from("/samples/results.jsonl"));
    }

    #[test]
    fn test_parse_config() {
        let toml_content = r#"
[corpus]
dir = "/data/bytecode"
output = "/tmp/out.jsonl"

[tool]
command = ["python3", "main.py", "--quiet"]
working_dir = "/opt/scout"
timeout_seconds = 120
"#;

        let config: Config = toml::from_str(toml_content).unwrap();
        assert_eq!(config.corpus.dir, PathBuf::from("/data/bytecode"));
        assert_eq!(config.output_path(), PathBuf::from("/tmp/out.jsonl"));
        assert_eq!(config.tool.command, vec!["python3", "main.py", "--quiet"]);
        assert_eq!(config.tool.working_dir, PathBuf::from("/opt/scout"));
        assert_eq!(config.tool.mode, "p");
        assert_eq!(config.tool.timeout_seconds, Some(120));
    }

    #[test]
    fn test_merge_with_args() {
        let mut config = Config::default();
        let mut args = Args::parse_from(["scoutbatch"]);
        args.samples = Some(PathBuf::from("/corpus"));
        args.command = Some(vec!["./scout".to_string()]);
        args.timeout = Some(30);

        config.merge_with_args(&args);

        assert_eq!(config.corpus.dir, PathBuf::from("/corpus"));
        assert_eq!(config.output_path(), PathBuf::from("/corpus/results.jsonl"));
        assert_eq!(config.tool.command, vec!["./scout"]);
        assert_eq!(config.tool.timeout_seconds, Some(30));
        // Not given on the command line, so the file/default value stays.
        assert_eq!(config.tool.working_dir, PathBuf::from("/crypto_scout"));
        assert_eq!(config.tool.mode, "p");
    }

    #[test]
    fn test_driver_config() {
        let mut config = Config::default();
        config.corpus.dir = PathBuf::from("/corpus");
        config.tool.mode = "x".to_string();

        let driver = config.driver_config();
        assert_eq!(driver.corpus_dir, PathBuf::from("/corpus"));
        assert_eq!(driver.mode, "x");
        assert_eq!(driver.command, vec!["sh", "run.sh"]);
    }

    #[test]
    fn test_default_toml_generation() {
        let toml_str = Config::default_toml();
        assert!(!toml_str.is_empty());
        assert!(toml_str.contains("[corpus]"));
        assert!(toml_str.contains("[tool]"));

        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.tool.command, vec!["sh", "run.sh"]);
    }
}
