//! Error mapping for provider responses
//!
//! This module is the single place where provider statuses become a
//! [`FailureClass`]. Invokers never classify on their own.

use reqwest::StatusCode;
use serde_json::Value;

use super::{FailureClass, ProviderFailure};
use crate::util::{sanitize_for_logging, truncate_string};

/// Longest provider error body carried into a failure message
const MAX_ERROR_BODY: usize = 300;

/// Classify an HTTP status reported by the provider
///
/// Rate limiting, request timeouts and 5xx statuses that signal a temporary
/// condition are transient. Anything else (unknown model, bad request,
/// rejected credential) will not improve by retrying the same candidate.
pub fn classify_status(status: u16) -> FailureClass {
    match status {
        408 | 429 | 500 | 502 | 503 | 504 => FailureClass::Transient,
        _ => FailureClass::Permanent,
    }
}

/// Default status label when the provider body does not carry one
fn status_label(status: StatusCode) -> &'static str {
    match status.as_u16() {
        400 => "INVALID_ARGUMENT",
        401 => "UNAUTHENTICATED",
        403 => "PERMISSION_DENIED",
        404 => "NOT_FOUND",
        408 => "DEADLINE_EXCEEDED",
        429 => "RESOURCE_EXHAUSTED",
        500 => "INTERNAL",
        502 => "BAD_GATEWAY",
        503 => "UNAVAILABLE",
        504 => "DEADLINE_EXCEEDED",
        _ => "UNKNOWN",
    }
}

/// Map a non-success provider response to a classified failure
///
/// Understands the `{"error": {"code", "message", "status"}}` envelope and
/// falls back to the raw body otherwise.
pub fn map_provider_error(status: StatusCode, body: &str) -> ProviderFailure {
    let class = classify_status(status.as_u16());

    let (label, message) = match serde_json::from_str::<Value>(body) {
        Ok(json) => {
            let error = json.get("error").unwrap_or(&json);
            let label = error
                .get("status")
                .and_then(|s| s.as_str())
                .unwrap_or_else(|| status_label(status))
                .to_string();
            let message = error
                .get("message")
                .and_then(|m| m.as_str())
                .map(str::to_string)
                .unwrap_or_else(|| status.to_string());
            (label, message)
        }
        Err(_) if body.trim().is_empty() => (status_label(status).to_string(), status.to_string()),
        Err(_) => (status_label(status).to_string(), format!("{}: {}", status, body.trim())),
    };

    let message = truncate_string(&sanitize_for_logging(&message), MAX_ERROR_BODY);

    ProviderFailure {
        class,
        status_code: Some(status.as_u16()),
        status: label,
        message,
    }
}

/// Map a transport-level error (no usable HTTP response)
pub fn map_transport_error(err: &reqwest::Error) -> ProviderFailure {
    if let Some(status) = err.status() {
        return map_provider_error(status, "");
    }

    let message = sanitize_for_logging(&err.to_string());
    if err.is_timeout() {
        ProviderFailure::transient("TIMEOUT", format!("Request timed out: {}", message))
    } else if err.is_connect() {
        ProviderFailure::transient("NETWORK", format!("Connection failed: {}", message))
    } else if err.is_decode() {
        ProviderFailure::permanent("MALFORMED_RESPONSE", format!("Response decode error: {}", message))
    } else if err.is_builder() || err.is_request() {
        ProviderFailure::permanent("INVALID_REQUEST", format!("Invalid request: {}", message))
    } else {
        ProviderFailure::transient("NETWORK", format!("Network error: {}", message))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_status() {
        for code in [408, 429, 500, 502, 503, 504] {
            assert_eq!(classify_status(code), FailureClass::Transient, "status {}", code);
        }
        for code in [400, 401, 403, 404, 409, 422] {
            assert_eq!(classify_status(code), FailureClass::Permanent, "status {}", code);
        }
    }

    #[test]
    fn test_map_google_error_envelope() {
        let body = r#"{"error":{"code":429,"message":"Quota exceeded for model","status":"RESOURCE_EXHAUSTED"}}"#;
        let failure = map_provider_error(StatusCode::TOO_MANY_REQUESTS, body);

        assert_eq!(failure.class, FailureClass::Transient);
        assert_eq!(failure.status_code, Some(429));
        assert_eq!(failure.status, "RESOURCE_EXHAUSTED");
        assert_eq!(failure.message, "Quota exceeded for model");
    }

    #[test]
    fn test_map_plain_body() {
        let failure = map_provider_error(StatusCode::NOT_FOUND, "model not found");
        assert_eq!(failure.class, FailureClass::Permanent);
        assert_eq!(failure.status, "NOT_FOUND");
        assert!(failure.message.contains("model not found"));

        let empty = map_provider_error(StatusCode::SERVICE_UNAVAILABLE, "");
        assert_eq!(empty.class, FailureClass::Transient);
        assert_eq!(empty.status, "UNAVAILABLE");
    }

    #[test]
    fn test_map_redacts_keys_in_messages() {
        let body = r#"{"error":{"code":400,"message":"API key not valid. api_key=AIzaSecret123","status":"INVALID_ARGUMENT"}}"#;
        let failure = map_provider_error(StatusCode::BAD_REQUEST, body);
        assert!(!failure.message.contains("AIzaSecret123"));
    }
}
