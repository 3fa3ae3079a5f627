//! Resilience patterns for provider invocation
//!
//! This module provides:
//! - A per-candidate retry policy with linear backoff
//! - The fallback orchestrator that walks the candidate registry

mod orchestrator;
mod retry;

pub use orchestrator::{AttemptOutcome, FallbackOrchestrator, InvocationAttempt, OrchestrationReport};
pub use retry::{RetryConfig, RetryDecision, RetryPolicy};
