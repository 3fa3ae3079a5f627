//! Gateway failures and their HTTP representation

use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use essay_analysis::{AnalysisError, FailureKind};

/// Error body returned for every failed request
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub kind: String,
    pub code: u16,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
}

/// Failure of a gateway request
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("Invalid request format: {0}")]
    InvalidFormat(String),

    #[error("Unsupported content type: {0}")]
    ContentType(String),

    #[error("Request payload too large: {0}")]
    PayloadTooLarge(String),

    #[error(transparent)]
    Analysis(#[from] AnalysisError),
}

impl GatewayError {
    /// HTTP status for this failure
    pub fn status(&self) -> StatusCode {
        match self {
            Self::InvalidFormat(_) => StatusCode::BAD_REQUEST,
            Self::ContentType(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            Self::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            Self::Analysis(err) => status_for_kind(err.kind()),
        }
    }

    /// Stable failure kind name
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidFormat(_) | Self::ContentType(_) | Self::PayloadTooLarge(_) => {
                FailureKind::ValidationError.as_str()
            }
            Self::Analysis(err) => err.kind().as_str(),
        }
    }

    /// Convert to HTTP status code and error response
    pub fn to_response(&self) -> (StatusCode, Json<ErrorResponse>) {
        let status = self.status();

        let (details, request_id) = match self {
            Self::Analysis(err) => (
                err.details(),
                err.context().and_then(|c| c.request_id.clone()),
            ),
            _ => (None, None),
        };

        (
            status,
            Json(ErrorResponse {
                error: self.to_string(),
                kind: self.kind().to_string(),
                code: status.as_u16(),
                details,
                request_id,
            }),
        )
    }
}

/// HTTP status for an analysis failure kind
pub fn status_for_kind(kind: FailureKind) -> StatusCode {
    match kind {
        FailureKind::ValidationError => StatusCode::BAD_REQUEST,
        FailureKind::ConfigurationError => StatusCode::INTERNAL_SERVER_ERROR,
        FailureKind::TransientProviderError | FailureKind::ExhaustionError => {
            StatusCode::SERVICE_UNAVAILABLE
        }
        FailureKind::PermanentProviderError | FailureKind::ResponseFormatError => {
            StatusCode::BAD_GATEWAY
        }
        FailureKind::TimeoutError => StatusCode::GATEWAY_TIMEOUT,
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let (status, body) = self.to_response();
        let request_id = body
            .request_id
            .as_deref()
            .and_then(|id| HeaderValue::from_str(id).ok());

        let mut response = (status, body).into_response();
        if let Some(value) = request_id {
            response
                .headers_mut()
                .insert(crate::REQUEST_ID_HEADER.clone(), value);
        }
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use essay_analysis::ProviderFailure;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            GatewayError::from(AnalysisError::validation("empty")).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            GatewayError::from(AnalysisError::configuration("no key")).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            GatewayError::from(AnalysisError::response_format("bad", "raw")).status(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(status_for_kind(FailureKind::TimeoutError), StatusCode::GATEWAY_TIMEOUT);
        assert_eq!(
            GatewayError::PayloadTooLarge("big".into()).status(),
            StatusCode::PAYLOAD_TOO_LARGE
        );
    }

    #[test]
    fn test_body_carries_details_and_request_id() {
        let err = AnalysisError::Exhausted {
            attempted: 3,
            last: ProviderFailure::transient("UNAVAILABLE", "overloaded").with_status_code(503),
        }
        .with_request_id("req-1");

        let (status, Json(body)) = GatewayError::from(err).to_response();

        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body.kind, "exhaustion_error");
        assert_eq!(body.code, 503);
        assert_eq!(body.request_id.as_deref(), Some("req-1"));
        assert!(body.details.unwrap().contains("UNAVAILABLE"));
    }

    #[test]
    fn test_error_response_echoes_request_id_header() {
        let err = GatewayError::from(AnalysisError::validation("empty").with_request_id("req-9"));
        let response = err.into_response();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(response.headers()["x-request-id"], "req-9");

        let response = GatewayError::ContentType("text/plain".into()).into_response();
        assert!(!response.headers().contains_key("x-request-id"));
    }
}
