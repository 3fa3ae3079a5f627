//! Fallback orchestration across candidate models
//!
//! One [`FallbackOrchestrator::run`] drives a single analysis request through
//! the candidate registry as an explicit state machine:
//!
//! - `Selecting(i)`: past the end of the registry the chain is exhausted,
//!   past the deadline it times out, otherwise candidate `i` is attempted.
//! - `Attempting`: one invoker call, bounded by the request deadline. A failure
//!   is handed to the [`RetryPolicy`].
//! - `Waiting`: non-blocking backoff before the next attempt on the same
//!   candidate.
//! - `Succeeded` / `Exhausted`: terminal.
//!
//! Candidates are tried strictly in priority order and never revisited.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::{sleep, timeout_at, Instant};
use tracing::{debug, info, warn};

use crate::error::{AnalysisError, ErrorContext, FailureClass, ProviderFailure, Result};
use crate::invoker::Invoker;
use crate::payload::PromptPayload;
use crate::registry::{CandidateModel, CandidateRegistry};

use super::retry::{RetryDecision, RetryPolicy};

/// Outcome of one recorded attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptOutcome {
    Success,
    TransientFailure(ProviderFailure),
    PermanentFailure(ProviderFailure),
}

impl AttemptOutcome {
    fn from_failure(failure: &ProviderFailure) -> Self {
        match failure.class {
            FailureClass::Transient => Self::TransientFailure(failure.clone()),
            FailureClass::Permanent => Self::PermanentFailure(failure.clone()),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }
}

/// One entry of the attempt log
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvocationAttempt {
    /// Candidate id
    pub candidate: String,

    /// 1-based attempt number on this candidate
    pub attempt: u32,

    pub outcome: AttemptOutcome,

    /// Time spent in the call, excluding backoff
    pub elapsed: Duration,
}

/// Successful orchestration
#[derive(Debug, Clone)]
pub struct OrchestrationReport {
    /// Raw text returned by the satisfying candidate
    pub raw_text: String,

    /// The candidate that satisfied the request
    pub candidate: CandidateModel,

    /// Every attempt in the order it was made
    pub attempts: Vec<InvocationAttempt>,

    /// Wall time of the whole run including backoff
    pub elapsed: Duration,
}

/// Why a run ended without success
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ExhaustionCause {
    CandidatesExhausted,
    DeadlineExceeded,
}

#[derive(Debug)]
enum State<'a> {
    Selecting(usize),
    Attempting {
        index: usize,
        candidate: &'a CandidateModel,
        attempt: u32,
    },
    Waiting {
        index: usize,
        candidate: &'a CandidateModel,
        attempt: u32,
        delay: Duration,
    },
    Succeeded {
        candidate: &'a CandidateModel,
        raw_text: String,
    },
    Exhausted(ExhaustionCause),
}

/// Drives an [`Invoker`] across a [`CandidateRegistry`]
#[derive(Clone)]
pub struct FallbackOrchestrator {
    registry: CandidateRegistry,
    invoker: Arc<dyn Invoker>,
    policy: RetryPolicy,
    deadline: Duration,
}

impl std::fmt::Debug for FallbackOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FallbackOrchestrator")
            .field("registry", &self.registry.ids())
            .field("invoker", &self.invoker.name())
            .field("policy", self.policy.config())
            .field("deadline", &self.deadline)
            .finish()
    }
}

impl FallbackOrchestrator {
    /// Create a new orchestrator
    pub fn new(
        registry: CandidateRegistry,
        invoker: Arc<dyn Invoker>,
        policy: RetryPolicy,
        deadline: Duration,
    ) -> Self {
        Self {
            registry,
            invoker,
            policy,
            deadline,
        }
    }

    pub fn registry(&self) -> &CandidateRegistry {
        &self.registry
    }

    pub fn invoker(&self) -> &Arc<dyn Invoker> {
        &self.invoker
    }

    pub fn deadline(&self) -> Duration {
        self.deadline
    }

    /// Run the fallback chain for one payload
    ///
    /// Fails with `Exhausted` when every candidate failed, or `Timeout` when
    /// the deadline elapsed first. Failures carry the attempt count as context.
    pub async fn run(&self, payload: &PromptPayload) -> Result<OrchestrationReport> {
        let started = Instant::now();
        let deadline = started + self.deadline;

        let mut attempts: Vec<InvocationAttempt> = Vec::new();
        let mut last_failure: Option<ProviderFailure> = None;
        let mut state = State::Selecting(0);

        loop {
            state = match state {
                State::Selecting(index) => match self.registry.get(index) {
                    None => State::Exhausted(ExhaustionCause::CandidatesExhausted),
                    Some(_) if Instant::now() >= deadline => {
                        State::Exhausted(ExhaustionCause::DeadlineExceeded)
                    }
                    Some(candidate) => State::Attempting {
                        index,
                        candidate,
                        attempt: 1,
                    },
                },

                State::Attempting {
                    index,
                    candidate,
                    attempt,
                } => {
                    let call_started = Instant::now();
                    let (result, timed_out) =
                        if payload.has_inline_data() && !candidate.supports_inline_data() {
                            let failure = ProviderFailure::permanent(
                                "UNSUPPORTED_INPUT",
                                format!("{} does not accept inline image data", candidate),
                            );
                            (Err(failure), false)
                        } else {
                            match timeout_at(deadline, self.invoker.invoke(candidate, payload)).await {
                                Ok(result) => (result, false),
                                Err(_) => {
                                    let failure = ProviderFailure::transient(
                                        "DEADLINE_EXCEEDED",
                                        format!("request deadline of {:?} elapsed during the call", self.deadline),
                                    );
                                    (Err(failure), true)
                                }
                            }
                        };
                    let elapsed = call_started.elapsed();

                    match result {
                        Ok(raw_text) => {
                            attempts.push(InvocationAttempt {
                                candidate: candidate.id().to_string(),
                                attempt,
                                outcome: AttemptOutcome::Success,
                                elapsed,
                            });
                            State::Succeeded { candidate, raw_text }
                        }
                        Err(failure) => {
                            let decision = if timed_out {
                                RetryDecision::AbortChain
                            } else {
                                let remaining = deadline.saturating_duration_since(Instant::now());
                                self.policy.decide(attempt, &failure, Some(remaining))
                            };

                            warn!(
                                candidate = %candidate,
                                attempt,
                                status = %failure.status,
                                class = %failure.class,
                                decision = %decision,
                                "Attempt failed: {}",
                                failure.message
                            );

                            attempts.push(InvocationAttempt {
                                candidate: candidate.id().to_string(),
                                attempt,
                                outcome: AttemptOutcome::from_failure(&failure),
                                elapsed,
                            });
                            last_failure = Some(failure);

                            match decision {
                                RetryDecision::RetrySameCandidate(delay) => State::Waiting {
                                    index,
                                    candidate,
                                    attempt,
                                    delay,
                                },
                                RetryDecision::AdvanceToNextCandidate => State::Selecting(index + 1),
                                RetryDecision::AbortChain => {
                                    State::Exhausted(ExhaustionCause::DeadlineExceeded)
                                }
                            }
                        }
                    }
                }

                State::Waiting {
                    index,
                    candidate,
                    attempt,
                    delay,
                } => {
                    debug!(
                        candidate = %candidate,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        "Backing off before retry"
                    );
                    sleep(delay).await;
                    State::Attempting {
                        index,
                        candidate,
                        attempt: attempt + 1,
                    }
                }

                State::Succeeded { candidate, raw_text } => {
                    let elapsed = started.elapsed();
                    info!(
                        candidate = %candidate,
                        attempts = attempts.len(),
                        elapsed_ms = elapsed.as_millis() as u64,
                        "Candidate satisfied request"
                    );
                    return Ok(OrchestrationReport {
                        raw_text,
                        candidate: candidate.clone(),
                        attempts,
                        elapsed,
                    });
                }

                State::Exhausted(cause) => {
                    let context = ErrorContext::new()
                        .attempts(attempts.len())
                        .with("elapsed_ms", started.elapsed().as_millis());

                    let err = match cause {
                        ExhaustionCause::CandidatesExhausted => {
                            let last = last_failure.unwrap_or_else(|| {
                                ProviderFailure::permanent("NO_CANDIDATES", "no candidate was attempted")
                            });
                            warn!(
                                attempts = attempts.len(),
                                candidates = self.registry.len(),
                                "All candidates failed"
                            );
                            AnalysisError::Exhausted {
                                attempted: self.registry.len(),
                                last,
                            }
                        }
                        ExhaustionCause::DeadlineExceeded => {
                            warn!(
                                attempts = attempts.len(),
                                deadline_ms = self.deadline.as_millis() as u64,
                                "Request deadline exceeded"
                            );
                            AnalysisError::Timeout {
                                deadline: self.deadline,
                                last: last_failure,
                            }
                        }
                    };

                    return Err(err.with_context(context));
                }
            };
        }
    }
}
