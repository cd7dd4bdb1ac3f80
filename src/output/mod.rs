//! Output log writer.
//!
//! The output log is newline-delimited JSON: one analysis record per line,
//! in processing order. It is truncated when opened and flushed after
//! every record, so an interrupted run leaves a readable prefix.

use crate::models::AnalysisRecord;
use anyhow::{Context, Result};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Append-only writer for analysis records.
pub struct OutputLog {
    path: PathBuf,
    writer: BufWriter<File>,
    written: usize,
}

impl OutputLog {
    /// Create (or truncate) the output log at `path`.
    pub fn create(path: &Path) -> Result<Self> {
        let file = File::create(path)
            .with_context(|| format!("Failed to create output log: {}", path.display()))?;

        Ok(Self {
            path: path.to_path_buf(),
            writer: BufWriter::new(file),
            written: 0,
        })
    }

    /// Append one record as a single line and flush it to disk.
    pub fn append(&mut self, record: &AnalysisRecord) -> Result<()> {
        let line = record
            .to_json_line()
            .with_context(|| format!("Failed to serialize record for {}", record.filename()))?;

        writeln!(self.writer, "{}", line)
            .and_then(|_| self.writer.flush())
            .with_context(|| format!("Failed to write to {}", self.path.display()))?;

        self.written += 1;
        Ok(())
    }

    /// Number of records written so far.
    pub fn written(&self) -> usize {
        self.written
    }

    /// Location of the log.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Map, Value};
    use tempfile::TempDir;

    fn record(value: Value, filename: &str) -> AnalysisRecord {
        let fields: Map<String, Value> = serde_json::from_value(value).unwrap();
        AnalysisRecord::new(fields, filename)
    }

    #[test]
    fn test_append_writes_lines() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("results.jsonl");

        let mut log = OutputLog::create(&path).unwrap();
        log.append(&record(json!({"a": 1}), "one.bin")).unwrap();
        log.append(&record(json!({"a": 2}), "two.bin")).unwrap();
        assert_eq!(log.written(), 2);

        // Flushed per record, readable while the log is still open.
        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(
            content,
            "{\"a\":1,\"filename\":\"one.bin\"}\n{\"a\":2,\"filename\":\"two.bin\"}\n"
        );
    }

    #[test]
    fn test_create_truncates() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("results.jsonl");
        std::fs::write(&path, "{\"stale\":true}\n").unwrap();

        let log = OutputLog::create(&path).unwrap();
        assert_eq!(log.path(), path.as_path());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "");
    }

    #[test]
    fn test_create_in_missing_directory_fails() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("missing").join("results.jsonl");

        assert!(OutputLog::create(&path).is_err());
    }
}
