//! Request decoding and validation
//!
//! Turns an incoming `POST /api/analyze` body into an [`EssaySubmission`].
//! Two encodings are accepted:
//!
//! - `application/json`: `{"kind": "text", "content": "..."}` or
//!   `{"kind": "image", "data": "<base64 or data URL>", "media_type": "image/png"}`
//! - `multipart/form-data`: a `type` field (`text` or `image`) and a `content`
//!   field holding the essay text or the image file

use axum::extract::{multipart::MultipartError, DefaultBodyLimit, Multipart};
use axum::http::{
    header::{CONTENT_LENGTH, CONTENT_TYPE},
    HeaderMap, StatusCode,
};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use serde::Deserialize;

use essay_analysis::EssaySubmission;

use crate::error::GatewayError;

/// Default maximum request payload size (10MB)
pub const MAX_PAYLOAD_SIZE: usize = 10 * 1024 * 1024;

/// Body limit for the router's extractors
///
/// Over-limit bodies surface as extractor errors, which the handlers turn
/// into [`GatewayError::PayloadTooLarge`].
pub fn payload_limit_config() -> DefaultBodyLimit {
    DefaultBodyLimit::max(MAX_PAYLOAD_SIZE)
}

/// Reject a request whose declared Content-Length is over the limit
pub fn check_content_length(headers: &HeaderMap) -> Result<(), GatewayError> {
    let declared = headers
        .get(CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok());

    match declared {
        Some(len) if len > MAX_PAYLOAD_SIZE as u64 => Err(GatewayError::PayloadTooLarge(format!(
            "Request size {} exceeds maximum allowed size {}",
            len, MAX_PAYLOAD_SIZE
        ))),
        _ => Ok(()),
    }
}

/// Map a multipart read failure, keeping body-limit hits distinct
fn multipart_error(what: &str, err: MultipartError) -> GatewayError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        GatewayError::PayloadTooLarge(format!(
            "multipart body exceeds maximum allowed size {}",
            MAX_PAYLOAD_SIZE
        ))
    } else {
        GatewayError::InvalidFormat(format!("{}: {}", what, err))
    }
}

/// How the request body is encoded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyEncoding {
    Json,
    Multipart,
}

/// Determine the body encoding from the Content-Type header
pub fn body_encoding(headers: &HeaderMap) -> Result<BodyEncoding, GatewayError> {
    let content_type = headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_ascii_lowercase();

    if content_type.starts_with("application/json") {
        Ok(BodyEncoding::Json)
    } else if content_type.starts_with("multipart/form-data") {
        Ok(BodyEncoding::Multipart)
    } else {
        Err(GatewayError::ContentType(format!(
            "expected application/json or multipart/form-data, got '{}'",
            content_type
        )))
    }
}

/// JSON request body
#[derive(Debug, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum AnalyzeRequest {
    Text {
        content: String,
    },
    Image {
        data: String,
        #[serde(default)]
        media_type: Option<String>,
    },
}

impl AnalyzeRequest {
    /// Convert into a submission, decoding image data
    pub fn into_submission(self) -> Result<EssaySubmission, GatewayError> {
        match self {
            AnalyzeRequest::Text { content } => Ok(EssaySubmission::text(content)),
            AnalyzeRequest::Image { data, media_type } => {
                let (url_type, encoded) = split_data_url(&data);
                let declared = media_type.as_deref().or(url_type).unwrap_or_default();

                let bytes = BASE64
                    .decode(encoded.trim())
                    .map_err(|e| GatewayError::InvalidFormat(format!("image data is not valid base64: {}", e)))?;

                Ok(EssaySubmission::image(bytes, declared)?)
            }
        }
    }
}

/// Split `data:<type>;base64,<payload>` into its parts; other input is returned as is
fn split_data_url(data: &str) -> (Option<&str>, &str) {
    let Some(rest) = data.strip_prefix("data:") else {
        return (None, data);
    };

    match rest.split_once(',') {
        Some((meta, payload)) => {
            let media_type = meta.split(';').next().filter(|t| !t.is_empty());
            (media_type, payload)
        }
        None => (None, data),
    }
}

/// Decode a JSON body
pub fn decode_json(body: &[u8]) -> Result<EssaySubmission, GatewayError> {
    let request: AnalyzeRequest = serde_json::from_slice(body)
        .map_err(|e| GatewayError::InvalidFormat(format!("invalid JSON body: {}", e)))?;
    request.into_submission()
}

/// Decode a multipart form with `type` and `content` fields
pub async fn decode_multipart(mut multipart: Multipart) -> Result<EssaySubmission, GatewayError> {
    let mut kind: Option<String> = None;
    let mut content: Option<(Option<String>, Vec<u8>)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error("malformed multipart body", e))?
    {
        match field.name() {
            Some("type") => {
                let value = field
                    .text()
                    .await
                    .map_err(|e| multipart_error("unreadable type field", e))?;
                kind = Some(value.trim().to_ascii_lowercase());
            }
            Some("content") => {
                let content_type = field.content_type().map(str::to_string);
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| multipart_error("unreadable content field", e))?;
                content = Some((content_type, bytes.to_vec()));
            }
            _ => {}
        }
    }

    let (content_type, bytes) =
        content.ok_or_else(|| GatewayError::InvalidFormat("missing content field".to_string()))?;

    match kind.as_deref() {
        Some("text") => {
            let text = String::from_utf8(bytes)
                .map_err(|_| GatewayError::InvalidFormat("essay text is not valid UTF-8".to_string()))?;
            Ok(EssaySubmission::text(text))
        }
        Some("image") => Ok(EssaySubmission::image(
            bytes,
            content_type.as_deref().unwrap_or_default(),
        )?),
        Some(other) => Err(GatewayError::InvalidFormat(format!(
            "type must be text or image, got '{}'",
            other
        ))),
        None => Err(GatewayError::InvalidFormat("missing type field".to_string())),
    }
}
