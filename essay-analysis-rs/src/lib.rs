//! # Essay Analysis
//!
//! Resilient "analyze this essay" operation against an unreliable,
//! rate-limited, multi-model generative provider.
//!
//! This crate provides:
//!
//! - Submission normalization into a provider-agnostic prompt payload
//! - An ordered candidate registry of fallback models
//! - A single-attempt invoker with status classification (plus a Gemini client)
//! - A linear backoff retry policy and a fallback orchestrator state machine
//! - Structured-output extraction with a narrow structural repair pass
//!
//! ## Architecture
//!
//! ```text
//! PayloadBuilder -> FallbackOrchestrator(CandidateRegistry, Invoker, RetryPolicy)
//!                -> ResponseExtractor -> caller
//! ```
//!
//! `EssayAnalyzer` wires these together for one request at a time; it holds
//! no mutable state and can be shared behind an `Arc` across tasks.

pub mod analyzer;
pub use analyzer::{AnalysisOutcome, EssayAnalyzer};

pub mod config;
pub use config::{
    AnalyzerConfig, ConfigProvider, ConfigProviderExt, EnvConfigProvider, MemoryConfigProvider,
    ProviderConfig,
};

pub mod error;
pub use error::{AnalysisError, ErrorContext, FailureClass, FailureKind, ProviderFailure, Result};

pub mod extract;
pub use extract::{AnalysisResult, DimensionLabel, ExtractionPath, ResponseExtractor};

pub mod invoker;
pub use invoker::{gemini::GeminiInvoker, InvocationResult, Invoker};

pub mod payload;
pub use payload::{PayloadBuilder, PromptPayload, PromptSegment};

pub mod registry;
pub use registry::{CandidateModel, CandidateRegistry};

pub mod resilience;
pub use resilience::{
    AttemptOutcome, FallbackOrchestrator, InvocationAttempt, OrchestrationReport, RetryConfig,
    RetryDecision, RetryPolicy,
};

pub mod submission;
pub use submission::{EssaySubmission, MediaType};

pub mod util;

#[cfg(test)]
mod tests;
