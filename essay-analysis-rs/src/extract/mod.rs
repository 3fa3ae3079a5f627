//! Structured output extraction
//!
//! Turns raw provider text into a validated [`AnalysisResult`]. A strict parse
//! of the whole text is tried first. If that fails, a structural repair step
//! takes the span from the first `{` to the last `}` and parses it with the
//! same strict rules. Nothing else is attempted and no result is ever
//! fabricated.

mod schema;

pub use schema::{AnalysisResult, Dimension, DimensionLabel, Quote, Score, MAX_SCORE, MIN_SCORE};

use tracing::debug;

use crate::error::{AnalysisError, Result};
use crate::util::truncate_string;

/// How a result was obtained
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractionPath {
    /// The whole text parsed
    Strict,
    /// Only the repaired span parsed
    Repaired,
}

/// Parser for provider responses
#[derive(Debug, Clone, Default)]
pub struct ResponseExtractor;

impl ResponseExtractor {
    pub fn new() -> Self {
        Self
    }

    /// Extract a validated result from raw provider text
    pub fn extract(&self, raw_text: &str) -> Result<AnalysisResult> {
        self.extract_with_path(raw_text).map(|(result, _)| result)
    }

    /// Like [`extract`](Self::extract), also reporting whether repair was needed
    pub fn extract_with_path(&self, raw_text: &str) -> Result<(AnalysisResult, ExtractionPath)> {
        let strict_error = match parse_strict(raw_text) {
            Ok(result) => return Ok((result, ExtractionPath::Strict)),
            Err(e) => e,
        };

        debug!(
            error = %strict_error,
            chars = raw_text.len(),
            "Strict parse failed, attempting structural repair"
        );

        let span = match repair_span(raw_text) {
            Some(span) => span,
            None => {
                return Err(AnalysisError::response_format(
                    format!("no JSON object found in response ({})", strict_error),
                    raw_text,
                ))
            }
        };

        match parse_strict(span) {
            Ok(result) => {
                debug!(
                    span_chars = span.len(),
                    preview = %truncate_string(span, 80),
                    "Recovered result from embedded object"
                );
                Ok((result, ExtractionPath::Repaired))
            }
            Err(repair_error) => Err(AnalysisError::response_format(
                format!("response does not match the result schema: {}", repair_error),
                raw_text,
            )),
        }
    }
}

/// The object span used by structural repair, if any
///
/// Greedy from the first `{` to the last `}`; not brace-depth aware.
pub fn repair_span(raw_text: &str) -> Option<&str> {
    let start = raw_text.find('{')?;
    let end = raw_text.rfind('}')?;
    if end < start {
        return None;
    }
    Some(&raw_text[start..=end])
}

fn parse_strict(text: &str) -> std::result::Result<AnalysisResult, String> {
    let result: AnalysisResult = serde_json::from_str(text).map_err(|e| e.to_string())?;
    result.validate()?;
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repair_span_is_greedy() {
        assert_eq!(repair_span("a {x} b {y} c"), Some("{x} b {y}"));
        assert_eq!(repair_span("multi\n{\n\"k\": 1\n}\nline"), Some("{\n\"k\": 1\n}"));
        assert_eq!(repair_span("} backwards {"), None);
        assert_eq!(repair_span("no braces"), None);
    }
}
