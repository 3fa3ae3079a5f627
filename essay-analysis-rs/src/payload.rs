//! Prompt payload construction
//!
//! Turns a validated [`EssaySubmission`] into the ordered, provider-agnostic
//! segments sent to every candidate. A payload is built once per request and
//! reused unchanged across retries and fallbacks.

use std::sync::Arc;

use crate::error::Result;
use crate::submission::{EssaySubmission, MediaType};

/// Grading instructions sent with every submission
pub const GRADING_INSTRUCTIONS: &str = r#"You are an experienced writing teacher and essay coach. Analyze the student's essay and grade it.
Score four dimensions on a 0-100 scale: structure, content, language and grammar, plus a 0-100 total.
Feedback must be specific, easy to understand and actionable.
Recommend 2-3 good sentences or famous quotes, and give 1-2 concrete revision suggestions.

Respond with JSON only, in exactly this shape:
{
  "score": {
    "total": number,
    "dimensions": [
      { "label": "structure", "score": number, "comment": "short comment" },
      { "label": "content", "score": number, "comment": "short comment" },
      { "label": "language", "score": number, "comment": "short comment" },
      { "label": "grammar", "score": number, "comment": "short comment" }
    ]
  },
  "feedback": "overall summary",
  "suggestions": ["suggestion 1", "suggestion 2"],
  "quotes": [{ "text": "quote", "author": "author" }]
}"#;

/// Extra instruction for photographed essays
pub const TRANSCRIBE_INSTRUCTIONS: &str =
    "First transcribe the handwritten or printed text in this image, then analyze and grade the transcribed essay.";

/// Prefix placed before the essay text in the content segment
pub const ESSAY_PREFIX: &str = "Here is the student's essay:\n\n";

/// One ordered element of a prompt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromptSegment {
    /// Plain instruction or content text
    Text(String),
    /// Binary attachment sent inline
    InlineData { bytes: Arc<[u8]>, media_type: MediaType },
}

/// Immutable ordered prompt for one analysis
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptPayload {
    segments: Vec<PromptSegment>,
}

impl PromptPayload {
    pub fn segments(&self) -> &[PromptSegment] {
        &self.segments
    }

    /// Whether any segment is a binary attachment
    pub fn has_inline_data(&self) -> bool {
        self.segments
            .iter()
            .any(|segment| matches!(segment, PromptSegment::InlineData { .. }))
    }

    /// Total size of the text segments, for logs
    pub fn text_len(&self) -> usize {
        self.segments
            .iter()
            .map(|segment| match segment {
                PromptSegment::Text(text) => text.len(),
                PromptSegment::InlineData { .. } => 0,
            })
            .sum()
    }
}

/// Builds prompt payloads from submissions
#[derive(Debug, Clone)]
pub struct PayloadBuilder {
    max_image_bytes: usize,
}

impl PayloadBuilder {
    pub fn new(max_image_bytes: usize) -> Self {
        Self { max_image_bytes }
    }

    /// Validate a submission and build its payload
    pub fn build(&self, submission: &EssaySubmission) -> Result<PromptPayload> {
        submission.validate(self.max_image_bytes)?;

        let segments = match submission {
            EssaySubmission::Text { content } => vec![
                PromptSegment::Text(GRADING_INSTRUCTIONS.to_string()),
                PromptSegment::Text(format!("{}{}", ESSAY_PREFIX, content)),
            ],
            EssaySubmission::Image { bytes, media_type } => vec![
                PromptSegment::Text(GRADING_INSTRUCTIONS.to_string()),
                PromptSegment::Text(TRANSCRIBE_INSTRUCTIONS.to_string()),
                PromptSegment::InlineData {
                    bytes: Arc::from(bytes.as_slice()),
                    media_type: *media_type,
                },
            ],
        };

        Ok(PromptPayload { segments })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FailureKind;

    fn builder() -> PayloadBuilder {
        PayloadBuilder::new(1024)
    }

    #[test]
    fn test_text_content_is_verbatim() {
        let essays = [
            "A short essay.",
            "  leading and trailing whitespace  \n",
            "多行\n中文作文\r\n with mixed 😀 content",
        ];

        for essay in essays {
            let payload = builder().build(&EssaySubmission::text(essay)).unwrap();
            assert_eq!(payload.segments().len(), 2);
            assert_eq!(
                payload.segments()[0],
                PromptSegment::Text(GRADING_INSTRUCTIONS.to_string())
            );
            match &payload.segments()[1] {
                PromptSegment::Text(text) => {
                    assert_eq!(text.strip_prefix(ESSAY_PREFIX), Some(essay));
                }
                other => panic!("unexpected segment: {:?}", other),
            }
            assert!(!payload.has_inline_data());
        }
    }

    #[test]
    fn test_image_payload_order() {
        let submission = EssaySubmission::image(vec![1, 2, 3, 4], "image/png").unwrap();
        let payload = builder().build(&submission).unwrap();

        assert_eq!(payload.segments().len(), 3);
        assert_eq!(
            payload.segments()[1],
            PromptSegment::Text(TRANSCRIBE_INSTRUCTIONS.to_string())
        );
        match &payload.segments()[2] {
            PromptSegment::InlineData { bytes, media_type } => {
                assert_eq!(&bytes[..], &[1, 2, 3, 4]);
                assert_eq!(*media_type, MediaType::Png);
            }
            other => panic!("unexpected segment: {:?}", other),
        }
        assert!(payload.has_inline_data());
        assert_eq!(
            payload.text_len(),
            GRADING_INSTRUCTIONS.len() + TRANSCRIBE_INSTRUCTIONS.len()
        );
    }

    #[test]
    fn test_rejects_blank_text_and_empty_image() {
        for blank in ["", "   ", "\n\t"] {
            let err = builder().build(&EssaySubmission::text(blank)).unwrap_err();
            assert_eq!(err.kind(), FailureKind::ValidationError);
        }

        let empty = EssaySubmission::image(Vec::new(), "image/jpeg").unwrap();
        assert_eq!(builder().build(&empty).unwrap_err().kind(), FailureKind::ValidationError);

        let oversized = EssaySubmission::image(vec![0; 2048], "image/jpeg").unwrap();
        assert!(builder().build(&oversized).is_err());
    }
}
