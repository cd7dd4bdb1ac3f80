//! Data models for the batch driver.
//!
//! This module contains the core data structures shared by the scanner,
//! the analysis driver and the batch loop.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Map, Value};
use std::fmt;
use std::path::PathBuf;

/// Key the driver stamps on every record.
pub const FILENAME_KEY: &str = "filename";

/// A single input file discovered in the corpus directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    /// Base name of the file, unique within a run.
    pub filename: String,
    /// Resolved location of the file.
    pub path: PathBuf,
    /// File size in bytes at enumeration time.
    pub size: u64,
}

impl Artifact {
    /// Returns true if the path is (still) a regular file.
    ///
    /// Symlinks are followed, so a link to a regular file counts.
    pub fn is_regular_file(&self) -> bool {
        self.path.is_file()
    }
}

/// Structured result for one artifact, as emitted by the analyzer and
/// tagged with the artifact's file name.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct AnalysisRecord(Map<String, Value>);

impl AnalysisRecord {
    /// Build a record from the analyzer's fields, setting `filename`.
    ///
    /// A `filename` field supplied by the analyzer is overwritten in place.
    pub fn new(mut fields: Map<String, Value>, filename: &str) -> Self {
        fields.insert(FILENAME_KEY.to_string(), Value::String(filename.to_string()));
        Self(fields)
    }

    /// The artifact name this record belongs to.
    pub fn filename(&self) -> &str {
        self.get(FILENAME_KEY)
            .and_then(Value::as_str)
            .unwrap_or_default()
    }

    /// Look up a field by key.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Serialize as a single JSON line (no trailing newline).
    pub fn to_json_line(&self) -> serde_json::Result<String> {
        serde_json::to_string(&self.0)
    }
}

/// What happened to one artifact during a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArtifactOutcome {
    /// A record was written to the output log.
    Recorded,
    /// The analyzer ran but printed no parseable JSON object.
    NoOutput,
    /// The analyzer could not be run to completion.
    Failed(String),
}

impl fmt::Display for ArtifactOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArtifactOutcome::Recorded => write!(f, "recorded"),
            ArtifactOutcome::NoOutput => write!(f, "No JSON output"),
            ArtifactOutcome::Failed(reason) => write!(f, "{}", reason),
        }
    }
}

/// Summary of a completed batch run.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    /// When the run started.
    pub started_at: DateTime<Utc>,
    /// Number of artifacts enumerated.
    pub total: usize,
    /// Records written to the output log.
    pub recorded: usize,
    /// Artifacts for which the analyzer printed no JSON object.
    pub no_output: usize,
    /// Artifacts the analyzer could not be run on.
    pub failed: usize,
    /// Artifacts that vanished or stopped being regular files mid-run.
    pub skipped: usize,
    /// Wall-clock duration of the run.
    pub duration_seconds: f64,
    /// Location of the output log.
    pub output: PathBuf,
}

impl RunSummary {
    /// Creates an empty summary for a run that is about to start.
    pub fn new(total: usize, output: PathBuf) -> Self {
        Self {
            started_at: Utc::now(),
            total,
            recorded: 0,
            no_output: 0,
            failed: 0,
            skipped: 0,
            duration_seconds: 0.0,
            output,
        }
    }

    /// Count one artifact outcome.
    pub fn record(&mut self, outcome: &ArtifactOutcome) {
        match outcome {
            ArtifactOutcome::Recorded => self.recorded += 1,
            ArtifactOutcome::NoOutput => self.no_output += 1,
            ArtifactOutcome::Failed(_) => self.failed += 1,
        }
    }

    /// Number of artifacts the analyzer was invoked on.
    pub fn processed(&self) -> usize {
        self.recorded + self.no_output + self.failed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fields(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected an object"),
        }
    }

    #[test]
    fn test_record_appends_filename() {
        let record = AnalysisRecord::new(fields(json!({"a": 1, "b": "x"})), "sample.bin");

        assert_eq!(record.filename(), "sample.bin");
        assert_eq!(
            record.to_json_line().unwrap(),
            r#"{"a":1,"b":"x","filename":"sample.bin"}"#
        );
    }

    #[test]
    fn test_record_overwrites_tool_filename() {
        let record = AnalysisRecord::new(
            fields(json!({"filename": "bogus", "score": 7})),
            "real.bin",
        );

        assert_eq!(record.filename(), "real.bin");
        assert_eq!(record.get("score"), Some(&json!(7)));
        // Overwritten in place, so the key keeps its position.
        assert_eq!(
            record.to_json_line().unwrap(),
            r#"{"filename":"real.bin","score":7}"#
        );
    }

    #[test]
    fn test_record_json_line() {
        let record = AnalysisRecord::new(fields(json!({"vulnerable": true})), "c.bin");
        let line = record.to_json_line().unwrap();

        assert_eq!(line, r#"{"vulnerable":true,"filename":"c.bin"}"#);
        assert!(!line.contains('\n'));
    }

    #[test]
    fn test_record_keeps_numbers_verbatim() {
        let tool_line = r#"{"amount":123456789012345678901234567890,"balance":-98765432109876543210,"ratio":0.1}"#;
        let record = AnalysisRecord::new(serde_json::from_str(tool_line).unwrap(), "x");

        assert_eq!(
            record.to_json_line().unwrap(),
            r#"{"amount":123456789012345678901234567890,"balance":-98765432109876543210,"ratio":0.1,"filename":"x"}"#
        );
    }

    #[test]
    fn test_run_summary_counts() {
        let mut summary = RunSummary::new(4, PathBuf::from("out.jsonl"));
        summary.record(&ArtifactOutcome::Recorded);
        summary.record(&ArtifactOutcome::Recorded);
        summary.record(&ArtifactOutcome::NoOutput);
        summary.record(&ArtifactOutcome::Failed("timed out".to_string()));

        assert_eq!(summary.recorded, 2);
        assert_eq!(summary.no_output, 1);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.processed(), 4);
    }

    #[test]
    fn test_outcome_display() {
        assert_eq!(ArtifactOutcome::NoOutput.to_string(), "No JSON output");
        assert_eq!(
            ArtifactOutcome::Failed("timed out after 5s".to_string()).to_string(),
            "timed out after 5s"
        );
    }
}
