//! Session side-channel protocol.
//!
//! The synthesized script writes one JSON array to stderr as its last line,
//! one record per cell. Ordinary stdout of the executed code never mixes with
//! it, and interpreter warnings printed earlier on stderr are skipped.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Result of one cell, as reported by the interpreter.
///
/// Field order is the wire and cache-file order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellResult {
    pub success: bool,
    pub stderr: String,
    pub stdout: String,
    /// `<md5 of code>-<ordinal>`
    pub id: String,
    pub code: String,
}

impl CellResult {
    /// Text reported when a failing cell is promoted to an error.
    pub fn failure_output(&self) -> String {
        format!("{} {}", self.stderr, self.stdout)
    }
}

/// Deterministic identifier of a cell.
pub fn cell_id(code: &str, ordinal: usize) -> String {
    format!("{:x}-{}", md5::compute(code.as_bytes()), ordinal)
}

/// Decode the side channel into exactly `expected` ordered records.
pub fn parse_results(stderr: &str, expected: &[String]) -> Result<Vec<CellResult>> {
    let line = stderr
        .lines()
        .rev()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .ok_or_else(|| Error::Protocol("interpreter reported no results".to_string()))?;

    let results: Vec<CellResult> = serde_json::from_str(line)
        .map_err(|e| Error::Protocol(format!("{} in side channel: {}", e, truncate(line, 200))))?;

    if results.len() != expected.len() {
        return Err(Error::Protocol(format!(
            "expected {} cell results, got {}",
            expected.len(),
            results.len()
        )));
    }

    if let Some((got, want)) = results
        .iter()
        .zip(expected)
        .find(|(r, id)| &r.id != *id)
        .map(|(r, id)| (r.id.as_str(), id.as_str()))
    {
        return Err(Error::Protocol(format!(
            "cell results out of order: got {}, expected {}",
            got, want
        )));
    }

    Ok(results)
}

fn truncate(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}
