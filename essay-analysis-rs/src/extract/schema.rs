//! Analysis result schema
//!
//! Serialized field names are the public wire format of a successful analysis.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Lowest accepted score
pub const MIN_SCORE: f64 = 0.0;

/// Highest accepted score
pub const MAX_SCORE: f64 = 100.0;

/// One of the four fixed grading dimensions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum DimensionLabel {
    Structure,
    Content,
    Language,
    Grammar,
}

impl DimensionLabel {
    /// All labels in canonical order
    pub const ALL: [DimensionLabel; 4] = [
        DimensionLabel::Structure,
        DimensionLabel::Content,
        DimensionLabel::Language,
        DimensionLabel::Grammar,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Structure => "structure",
            Self::Content => "content",
            Self::Language => "language",
            Self::Grammar => "grammar",
        }
    }
}

impl fmt::Display for DimensionLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<String> for DimensionLabel {
    type Error = String;

    /// Accepts English labels in any case and the Chinese rubric names
    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.trim().to_lowercase().as_str() {
            "structure" | "结构" => Ok(Self::Structure),
            "content" | "内容" => Ok(Self::Content),
            "language" | "语言" => Ok(Self::Language),
            "grammar" | "语法" => Ok(Self::Grammar),
            _ => Err(format!("unknown dimension label: {}", value)),
        }
    }
}

impl From<DimensionLabel> for String {
    fn from(label: DimensionLabel) -> Self {
        label.as_str().to_string()
    }
}

/// Score of one dimension
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dimension {
    pub label: DimensionLabel,
    pub score: f64,
    pub comment: String,
}

/// Total score plus the four dimension scores
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Score {
    pub total: f64,
    pub dimensions: Vec<Dimension>,
}

impl Score {
    /// Score for a given dimension, if present
    pub fn dimension(&self, label: DimensionLabel) -> Option<&Dimension> {
        self.dimensions.iter().find(|d| d.label == label)
    }
}

/// A recommended sentence or famous quote
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quote {
    pub text: String,

    #[serde(default)]
    pub author: String,
}

/// Structured evaluation of one essay
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub score: Score,
    pub feedback: String,

    /// 1-2 expected, not enforced
    #[serde(default)]
    pub suggestions: Vec<String>,

    /// 2-3 expected, not enforced
    #[serde(default)]
    pub quotes: Vec<Quote>,
}

impl AnalysisResult {
    /// Check score ranges and that each fixed label appears exactly once
    pub fn validate(&self) -> Result<(), String> {
        check_score("score.total", self.score.total)?;

        if self.score.dimensions.len() != DimensionLabel::ALL.len() {
            return Err(format!(
                "expected {} dimensions, found {}",
                DimensionLabel::ALL.len(),
                self.score.dimensions.len()
            ));
        }

        for label in DimensionLabel::ALL {
            let count = self
                .score
                .dimensions
                .iter()
                .filter(|d| d.label == label)
                .count();
            if count != 1 {
                return Err(format!("dimension {} appears {} times", label, count));
            }
        }

        for dimension in &self.score.dimensions {
            check_score(&format!("score.dimensions.{}", dimension.label), dimension.score)?;
        }

        Ok(())
    }
}

fn check_score(field: &str, value: f64) -> Result<(), String> {
    if value.is_finite() && (MIN_SCORE..=MAX_SCORE).contains(&value) {
        Ok(())
    } else {
        Err(format!(
            "{} = {} is outside [{}, {}]",
            field, value, MIN_SCORE, MAX_SCORE
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_aliases() {
        let parse = |s: &str| DimensionLabel::try_from(s.to_string());

        assert_eq!(parse("Structure"), Ok(DimensionLabel::Structure));
        assert_eq!(parse(" GRAMMAR "), Ok(DimensionLabel::Grammar));
        assert_eq!(parse("内容"), Ok(DimensionLabel::Content));
        assert_eq!(parse("语言"), Ok(DimensionLabel::Language));
        assert!(parse("style").is_err());
    }

    #[test]
    fn test_label_serializes_lowercase_english() {
        let dimension = Dimension {
            label: DimensionLabel::Grammar,
            score: 70.0,
            comment: "ok".to_string(),
        };
        let json = serde_json::to_value(&dimension).unwrap();
        assert_eq!(json["label"], "grammar");
    }

    #[test]
    fn test_quote_author_is_optional() {
        let quote: Quote = serde_json::from_str(r#"{"text": "Brevity is the soul of wit."}"#).unwrap();
        assert_eq!(quote.author, "");
    }
}
