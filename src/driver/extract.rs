//! Extraction of the analyzer's structured result from noisy stdout.
//!
//! The analyzer is free to print progress and diagnostic lines; its
//! result is a single-line JSON object, normally the last one printed.

use serde_json::{Map, Value};

/// Find the last line of `stdout` that parses as a JSON object.
///
/// Lines are split on `\n`, `\r\n` and a lone `\r` (carriage-return
/// progress output), trimmed and scanned from the end. Only lines that
/// start with `{` and end with `}` are tried; candidates that fail to parse
/// are skipped and the scan continues further back. Returns `None` when no
/// candidate parses.
pub fn extract_record(stdout: &str) -> Option<Map<String, Value>> {
    stdout
        .split(|c: char| c == '\r' || c == '\n')
        .rev()
        .map(str::trim)
        .filter(|line| is_candidate(line))
        .find_map(|line| serde_json::from_str::<Map<String, Value>>(line).ok())
}

/// A candidate line looks like a JSON object.
fn is_candidate(line: &str) -> bool {
    line.starts_with('{') && line.ends_with('}')
}
