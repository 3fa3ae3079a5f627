//! Analysis facade
//!
//! [`EssayAnalyzer`] runs one submission through payload building, the
//! fallback chain and response extraction, and tags any failure with the
//! request id.

use std::sync::Arc;
use std::time::Duration;

use tracing::{info, info_span, warn, Instrument};

use crate::config::AnalyzerConfig;
use crate::error::{AnalysisError, Result};
use crate::extract::{AnalysisResult, ExtractionPath, ResponseExtractor};
use crate::invoker::{gemini::GeminiInvoker, Invoker};
use crate::payload::PayloadBuilder;
use crate::resilience::{FallbackOrchestrator, InvocationAttempt, RetryPolicy};
use crate::submission::EssaySubmission;
use crate::util::generate_request_id;

/// Successful analysis with its provenance
#[derive(Debug, Clone)]
pub struct AnalysisOutcome {
    pub result: AnalysisResult,

    /// Candidate that produced the result
    pub model: String,

    pub request_id: String,

    pub attempts: Vec<InvocationAttempt>,

    /// Whether structural repair was needed
    pub repaired: bool,

    pub elapsed: Duration,
}

/// Shared, stateless entry point for analyses
#[derive(Debug, Clone)]
pub struct EssayAnalyzer {
    payload_builder: PayloadBuilder,
    orchestrator: FallbackOrchestrator,
    extractor: ResponseExtractor,
}

impl EssayAnalyzer {
    /// Create an analyzer over any invoker
    pub fn new(config: &AnalyzerConfig, invoker: Arc<dyn Invoker>) -> Result<Self> {
        let orchestrator = FallbackOrchestrator::new(
            config.registry()?,
            invoker,
            RetryPolicy::new(config.retry.clone()),
            config.deadline,
        );

        Ok(Self {
            payload_builder: PayloadBuilder::new(config.max_image_bytes),
            orchestrator,
            extractor: ResponseExtractor::new(),
        })
    }

    /// Create an analyzer backed by the Gemini client
    pub fn from_config(config: &AnalyzerConfig) -> Result<Self> {
        let invoker = GeminiInvoker::new(&config.provider)?;
        Self::new(config, Arc::new(invoker))
    }

    pub fn orchestrator(&self) -> &FallbackOrchestrator {
        &self.orchestrator
    }

    /// Analyze a submission under a fresh request id
    pub async fn analyze(&self, submission: &EssaySubmission) -> Result<AnalysisOutcome> {
        self.analyze_with_id(submission, &generate_request_id()).await
    }

    /// Analyze a submission under the caller's request id
    pub async fn analyze_with_id(
        &self,
        submission: &EssaySubmission,
        request_id: &str,
    ) -> Result<AnalysisOutcome> {
        let span = info_span!("analysis", request_id = %request_id, kind = submission.kind());

        async {
            self.run(submission, request_id).await.map_err(|err| {
                warn!(kind = %err.kind(), "Analysis failed: {}", err);
                err.with_request_id(request_id)
            })
        }
        .instrument(span)
        .await
    }

    async fn run(&self, submission: &EssaySubmission, request_id: &str) -> Result<AnalysisOutcome> {
        let invoker = self.orchestrator.invoker();
        if !invoker.has_credential() {
            return Err(AnalysisError::configuration(format!(
                "no credential configured for provider {}",
                invoker.name()
            )));
        }

        let payload = self.payload_builder.build(submission)?;
        let report = self.orchestrator.run(&payload).await?;

        let (result, path) = self.extractor.extract_with_path(&report.raw_text)?;

        info!(
            model = %report.candidate,
            attempts = report.attempts.len(),
            repaired = path == ExtractionPath::Repaired,
            total = result.score.total,
            "Analysis complete"
        );

        Ok(AnalysisOutcome {
            result,
            model: report.candidate.id().to_string(),
            request_id: request_id.to_string(),
            attempts: report.attempts,
            repaired: path == ExtractionPath::Repaired,
            elapsed: report.elapsed,
        })
    }
}
