//! Outcome replay.
//!
//! Loads a recorded win/loss stream and replays it through the sizing
//! controller to measure how the progression behaves.

pub mod runner;

use anyhow::{Context, Result};
use std::path::Path;
use tracing::info;

use crate::types::{SizerError, TradeOutcome};

/// Parse an outcome stream: one outcome per line, blank lines and `#`
/// comments skipped.
pub fn parse_outcomes(text: &str) -> Result<Vec<TradeOutcome>, SizerError> {
    let mut outcomes = Vec::new();
    for (idx, raw) in text.lines().enumerate() {
        let line = match raw.split('#').next() {
            Some(l) => l.trim(),
            None => continue,
        };
        if line.is_empty() {
            continue;
        }
        let outcome = line
            .parse::<TradeOutcome>()
            .map_err(|_| SizerError::OutcomeParse {
                line: idx + 1,
                value: line.to_string(),
            })?;
        outcomes.push(outcome);
    }
    Ok(outcomes)
}

/// Read and parse an outcome file.
pub fn load_outcomes(path: impl AsRef<Path>) -> Result<Vec<TradeOutcome>> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read outcomes file: {}", path.display()))?;
    let outcomes = parse_outcomes(&text)
        .with_context(|| format!("Failed to parse outcomes file: {}", path.display()))?;

    info!(
        path = %path.display(),
        count = outcomes.len(),
        "Outcomes loaded"
    );
    Ok(outcomes)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_skips_blanks_and_comments() {
        let text = "# session 1\nW\n\nl  # stopped out\nloss\n1\n";
        let outcomes = parse_outcomes(text).unwrap();
        assert_eq!(
            outcomes,
            vec![
                TradeOutcome::Win,
                TradeOutcome::Loss,
                TradeOutcome::Loss,
                TradeOutcome::Win,
            ]
        );
    }

    #[test]
    fn test_parse_reports_line_number() {
        let err = parse_outcomes("W\nL\nmaybe\n").unwrap_err();
        match err {
            SizerError::OutcomeParse { line, value } => {
                assert_eq!(line, 3);
                assert_eq!(value, "maybe");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_parse_empty() {
        assert!(parse_outcomes("").unwrap().is_empty());
    }

    #[test]
    fn test_load_missing_file() {
        let err = load_outcomes("/nonexistent/outcomes.txt").unwrap_err();
        assert!(err.to_string().contains("Failed to read outcomes file"));
    }
}
