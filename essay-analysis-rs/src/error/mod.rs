//! Error handling for essay analysis
//!
//! This module provides the typed failure taxonomy of an analysis:
//! - Validation and configuration errors raised before any provider call
//! - Transient and permanent provider failures from a single attempt
//! - Exhaustion, response format and timeout errors ending an orchestration
//!
//! Every variant maps to a stable [`FailureKind`] so the HTTP boundary can
//! serialize it without matching on messages.

use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

use serde::Serialize;
use thiserror::Error;

pub mod mapping;

/// Result type for essay analysis operations
pub type Result<T> = std::result::Result<T, AnalysisError>;

/// Whether retrying the same candidate could plausibly succeed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureClass {
    /// Rate limiting, temporary unavailability, internal provider errors
    Transient,
    /// Unknown model, malformed request, rejected credentials
    Permanent,
}

impl fmt::Display for FailureClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transient => write!(f, "transient"),
            Self::Permanent => write!(f, "permanent"),
        }
    }
}

/// A classified failure of one invocation attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderFailure {
    /// Retry classification
    pub class: FailureClass,

    /// HTTP status reported by the provider, if the call reached it
    pub status_code: Option<u16>,

    /// Provider status label (e.g. `RESOURCE_EXHAUSTED`, `NETWORK`)
    pub status: String,

    /// Human readable detail
    pub message: String,
}

impl ProviderFailure {
    /// Create a transient failure
    pub fn transient(status: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            class: FailureClass::Transient,
            status_code: None,
            status: status.into(),
            message: message.into(),
        }
    }

    /// Create a permanent failure
    pub fn permanent(status: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            class: FailureClass::Permanent,
            status_code: None,
            status: status.into(),
            message: message.into(),
        }
    }

    /// Attach the HTTP status code
    pub fn with_status_code(mut self, code: u16) -> Self {
        self.status_code = Some(code);
        self
    }

    pub fn is_transient(&self) -> bool {
        self.class == FailureClass::Transient
    }
}

impl fmt::Display for ProviderFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.status_code {
            Some(code) => write!(f, "{} ({} {}): {}", self.class, code, self.status, self.message),
            None => write!(f, "{} ({}): {}", self.class, self.status, self.message),
        }
    }
}

/// Stable, serializable name of a failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    ValidationError,
    ConfigurationError,
    TransientProviderError,
    PermanentProviderError,
    ExhaustionError,
    ResponseFormatError,
    TimeoutError,
}

impl FailureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ValidationError => "validation_error",
            Self::ConfigurationError => "configuration_error",
            Self::TransientProviderError => "transient_provider_error",
            Self::PermanentProviderError => "permanent_provider_error",
            Self::ExhaustionError => "exhaustion_error",
            Self::ResponseFormatError => "response_format_error",
            Self::TimeoutError => "timeout_error",
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Main error type for essay analysis
#[derive(Error, Debug)]
pub enum AnalysisError {
    /// Malformed or missing submission content
    #[error("Validation error: {0}")]
    Validation(String),

    /// Missing or invalid credential or configuration
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A single attempt failed in a way that may self-resolve
    #[error("Transient provider error: {0}")]
    TransientProvider(ProviderFailure),

    /// A single attempt was rejected unrecoverably by its candidate
    #[error("Permanent provider error: {0}")]
    PermanentProvider(ProviderFailure),

    /// Every candidate was tried and none succeeded
    #[error("All {attempted} candidate models failed, last failure: {last}")]
    Exhausted {
        attempted: usize,
        last: ProviderFailure,
    },

    /// A candidate answered with text that could not be parsed or repaired
    #[error("Response format error: {message}")]
    ResponseFormat { message: String, raw_text: String },

    /// The end-to-end deadline elapsed
    #[error("Timeout error: analysis exceeded its {deadline:?} deadline")]
    Timeout {
        deadline: Duration,
        last: Option<ProviderFailure>,
    },

    /// Errors with additional context
    #[error("{inner}")]
    WithContext {
        inner: Box<AnalysisError>,
        context: ErrorContext,
    },
}

impl AnalysisError {
    /// Create a validation error
    pub fn validation(message: impl Into<String>) -> Self {
        AnalysisError::Validation(message.into())
    }

    /// Create a configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        AnalysisError::Configuration(message.into())
    }

    /// Create a response format error carrying the raw provider text
    pub fn response_format(message: impl Into<String>, raw_text: impl Into<String>) -> Self {
        AnalysisError::ResponseFormat {
            message: message.into(),
            raw_text: raw_text.into(),
        }
    }

    /// Add context to an existing error
    pub fn with_context(self, context: ErrorContext) -> Self {
        AnalysisError::WithContext {
            inner: Box::new(self),
            context,
        }
    }

    /// Tag the error with a request id, reusing existing context if present
    pub fn with_request_id(self, id: impl Into<String>) -> Self {
        match self {
            AnalysisError::WithContext { inner, mut context } => {
                context.request_id = Some(id.into());
                AnalysisError::WithContext { inner, context }
            }
            other => other.with_context(ErrorContext::new().request_id(id)),
        }
    }

    /// The error with any context layers removed
    pub fn root(&self) -> &AnalysisError {
        match self {
            AnalysisError::WithContext { inner, .. } => inner.root(),
            other => other,
        }
    }

    /// Context attached to this error, if any
    pub fn context(&self) -> Option<&ErrorContext> {
        match self {
            AnalysisError::WithContext { context, .. } => Some(context),
            _ => None,
        }
    }

    /// The stable failure kind
    pub fn kind(&self) -> FailureKind {
        match self.root() {
            AnalysisError::Validation(_) => FailureKind::ValidationError,
            AnalysisError::Configuration(_) => FailureKind::ConfigurationError,
            AnalysisError::TransientProvider(_) => FailureKind::TransientProviderError,
            AnalysisError::PermanentProvider(_) => FailureKind::PermanentProviderError,
            AnalysisError::Exhausted { .. } => FailureKind::ExhaustionError,
            AnalysisError::ResponseFormat { .. } => FailureKind::ResponseFormatError,
            AnalysisError::Timeout { .. } => FailureKind::TimeoutError,
            AnalysisError::WithContext { .. } => unreachable!("root() strips context"),
        }
    }

    /// Diagnostic detail for the caller: raw provider text or underlying status
    pub fn details(&self) -> Option<String> {
        match self.root() {
            AnalysisError::ResponseFormat { raw_text, .. } => Some(raw_text.clone()),
            AnalysisError::Exhausted { last, .. } => Some(last.to_string()),
            AnalysisError::Timeout { last, .. } => last.as_ref().map(ToString::to_string),
            AnalysisError::TransientProvider(failure)
            | AnalysisError::PermanentProvider(failure) => Some(failure.to_string()),
            _ => None,
        }
    }

    /// Check if this is a retryable error
    pub fn is_retryable(&self) -> bool {
        matches!(self.root(), AnalysisError::TransientProvider(_))
    }
}

impl From<ProviderFailure> for AnalysisError {
    fn from(failure: ProviderFailure) -> Self {
        match failure.class {
            FailureClass::Transient => AnalysisError::TransientProvider(failure),
            FailureClass::Permanent => AnalysisError::PermanentProvider(failure),
        }
    }
}

/// Convert reqwest errors that happen outside an attempt (e.g. client setup)
impl From<reqwest::Error> for AnalysisError {
    fn from(err: reqwest::Error) -> Self {
        AnalysisError::from(mapping::map_transport_error(&err))
    }
}

/// Error context information
#[derive(Debug, Clone)]
pub struct ErrorContext {
    /// Request ID for tracing
    pub request_id: Option<String>,

    /// Request timestamp
    pub timestamp: chrono::DateTime<chrono::Utc>,

    /// Number of invocation attempts made before the failure
    pub attempts: Option<usize>,

    /// Additional context data
    pub data: HashMap<String, String>,
}

impl Default for ErrorContext {
    fn default() -> Self {
        Self {
            request_id: None,
            timestamp: chrono::Utc::now(),
            attempts: None,
            data: HashMap::new(),
        }
    }
}

impl ErrorContext {
    /// Create a new error context
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a request ID
    pub fn request_id(mut self, id: impl Into<String>) -> Self {
        self.request_id = Some(id.into());
        self
    }

    /// Add the attempt count
    pub fn attempts(mut self, attempts: usize) -> Self {
        self.attempts = Some(attempts);
        self
    }

    /// Add a context value and return self (builder pattern)
    pub fn with<K, V>(mut self, key: K, value: V) -> Self
    where
        K: Into<String>,
        V: fmt::Display,
    {
        self.data.insert(key.into(), value.to_string());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_survives_context() {
        let err = AnalysisError::validation("empty essay")
            .with_context(ErrorContext::new().request_id("req-1").attempts(0));

        assert_eq!(err.kind(), FailureKind::ValidationError);
        assert_eq!(err.context().and_then(|c| c.request_id.as_deref()), Some("req-1"));
        assert_eq!(err.to_string(), "Validation error: empty essay");
    }

    #[test]
    fn test_request_id_merges_into_existing_context() {
        let err = AnalysisError::Timeout {
            deadline: Duration::from_secs(60),
            last: None,
        }
        .with_context(ErrorContext::new().attempts(4))
        .with_request_id("req-9");

        let context = err.context().unwrap();
        assert_eq!(context.request_id.as_deref(), Some("req-9"));
        assert_eq!(context.attempts, Some(4));
        assert_eq!(err.kind(), FailureKind::TimeoutError);
        assert!(matches!(err, AnalysisError::WithContext { ref inner, .. } if !matches!(**inner, AnalysisError::WithContext { .. })));
    }

    #[test]
    fn test_provider_failure_conversion() {
        let transient: AnalysisError = ProviderFailure::transient("UNAVAILABLE", "overloaded")
            .with_status_code(503)
            .into();
        let permanent: AnalysisError = ProviderFailure::permanent("NOT_FOUND", "no such model")
            .with_status_code(404)
            .into();

        assert_eq!(transient.kind(), FailureKind::TransientProviderError);
        assert!(transient.is_retryable());
        assert_eq!(permanent.kind(), FailureKind::PermanentProviderError);
        assert!(!permanent.is_retryable());
    }

    #[test]
    fn test_details_carry_raw_text() {
        let err = AnalysisError::response_format("no JSON object found", "Sorry, I cannot grade this.");
        assert_eq!(err.details().as_deref(), Some("Sorry, I cannot grade this."));

        let exhausted = AnalysisError::Exhausted {
            attempted: 2,
            last: ProviderFailure::transient("RESOURCE_EXHAUSTED", "quota").with_status_code(429),
        };
        assert_eq!(exhausted.kind(), FailureKind::ExhaustionError);
        assert!(exhausted.details().unwrap().contains("429"));
    }

    #[test]
    fn test_failure_kind_serializes_snake_case() {
        let json = serde_json::to_string(&FailureKind::ResponseFormatError).unwrap();
        assert_eq!(json, "\"response_format_error\"");
        assert_eq!(FailureKind::TimeoutError.as_str(), "timeout_error");
    }
}
