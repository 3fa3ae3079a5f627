//! Essay submissions as received from the caller

use std::fmt;
use std::str::FromStr;

use crate::error::{AnalysisError, Result};

/// Image media types the provider accepts as inline data
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaType {
    Jpeg,
    Png,
    Webp,
    Heic,
    Heif,
}

impl MediaType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaType::Jpeg => "image/jpeg",
            MediaType::Png => "image/png",
            MediaType::Webp => "image/webp",
            MediaType::Heic => "image/heic",
            MediaType::Heif => "image/heif",
        }
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MediaType {
    type Err = AnalysisError;

    /// Parse a declared content type, ignoring parameters and case
    fn from_str(s: &str) -> Result<Self> {
        let essence = s.split(';').next().unwrap_or_default().trim().to_ascii_lowercase();
        match essence.as_str() {
            "image/jpeg" | "image/jpg" | "image/pjpeg" => Ok(MediaType::Jpeg),
            "image/png" => Ok(MediaType::Png),
            "image/webp" => Ok(MediaType::Webp),
            "image/heic" => Ok(MediaType::Heic),
            "image/heif" => Ok(MediaType::Heif),
            "" => Err(AnalysisError::validation("image media type is missing")),
            other => Err(AnalysisError::validation(format!(
                "unsupported image media type: {}",
                other
            ))),
        }
    }
}

/// A student essay, either typed in or photographed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EssaySubmission {
    Text { content: String },
    Image { bytes: Vec<u8>, media_type: MediaType },
}

impl EssaySubmission {
    /// Create a text submission; the content is kept verbatim
    pub fn text(content: impl Into<String>) -> Self {
        EssaySubmission::Text {
            content: content.into(),
        }
    }

    /// Create an image submission from raw bytes and a declared content type
    pub fn image(bytes: Vec<u8>, declared_type: &str) -> Result<Self> {
        let media_type = declared_type.parse()?;
        Ok(EssaySubmission::Image { bytes, media_type })
    }

    /// Short name of the variant, for logs
    pub fn kind(&self) -> &'static str {
        match self {
            EssaySubmission::Text { .. } => "text",
            EssaySubmission::Image { .. } => "image",
        }
    }

    /// Check the variant is well formed
    pub fn validate(&self, max_image_bytes: usize) -> Result<()> {
        match self {
            EssaySubmission::Text { content } if content.trim().is_empty() => {
                Err(AnalysisError::validation("essay text is empty"))
            }
            EssaySubmission::Text { .. } => Ok(()),
            EssaySubmission::Image { bytes, .. } if bytes.is_empty() => {
                Err(AnalysisError::validation("essay image is empty"))
            }
            EssaySubmission::Image { bytes, .. } if bytes.len() > max_image_bytes => {
                Err(AnalysisError::validation(format!(
                    "essay image is {} bytes, limit is {} bytes",
                    bytes.len(),
                    max_image_bytes
                )))
            }
            EssaySubmission::Image { .. } => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FailureKind;

    #[test]
    fn test_media_type_parsing() {
        assert_eq!("image/png".parse::<MediaType>().unwrap(), MediaType::Png);
        assert_eq!("IMAGE/JPEG; charset=binary".parse::<MediaType>().unwrap(), MediaType::Jpeg);
        assert_eq!("image/jpg".parse::<MediaType>().unwrap(), MediaType::Jpeg);

        let err = "application/pdf".parse::<MediaType>().unwrap_err();
        assert_eq!(err.kind(), FailureKind::ValidationError);
        assert!("".parse::<MediaType>().is_err());
    }

    #[test]
    fn test_validate_text() {
        assert!(EssaySubmission::text("My summer holiday").validate(10).is_ok());
        assert!(EssaySubmission::text("").validate(10).is_err());
        assert!(EssaySubmission::text(" \n\t ").validate(10).is_err());
    }

    #[test]
    fn test_validate_image() {
        let ok = EssaySubmission::image(vec![0xFF, 0xD8, 0xFF], "image/jpeg").unwrap();
        assert!(ok.validate(16).is_ok());
        assert!(ok.validate(2).is_err());

        let empty = EssaySubmission::image(Vec::new(), "image/png").unwrap();
        assert_eq!(empty.validate(16).unwrap_err().kind(), FailureKind::ValidationError);

        assert!(EssaySubmission::image(vec![1, 2, 3], "text/plain").is_err());
    }
}
