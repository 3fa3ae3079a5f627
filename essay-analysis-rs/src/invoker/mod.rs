//! Single-attempt provider invocation
//!
//! An [`Invoker`] performs exactly one call against one candidate and reports
//! either the raw response text or a classified [`ProviderFailure`]. Retries,
//! backoff and fallback live in [`crate::resilience`], never here.

pub mod gemini;

use async_trait::async_trait;

use crate::error::ProviderFailure;
use crate::payload::PromptPayload;
use crate::registry::CandidateModel;

/// Outcome of one invocation attempt
pub type InvocationResult = std::result::Result<String, ProviderFailure>;

/// A generative-content capability
#[async_trait]
pub trait Invoker: Send + Sync {
    /// Provider name, for logs
    fn name(&self) -> &str;

    /// Whether a usable credential is configured
    ///
    /// Checked once before an orchestration starts; a missing credential
    /// short-circuits the whole chain.
    fn has_credential(&self) -> bool;

    /// Perform one call against `candidate` with `payload`, no internal retry
    async fn invoke(&self, candidate: &CandidateModel, payload: &PromptPayload) -> InvocationResult;
}
