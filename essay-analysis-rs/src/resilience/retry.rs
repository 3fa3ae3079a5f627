//! Per-candidate retry policy
//!
//! Decides, after one failed attempt, whether to retry the same candidate
//! after a delay, move on to the next candidate, or abort the whole chain.
//! The delay grows linearly with the attempt number (`base_delay * attempt`).

use std::fmt;
use std::time::Duration;

use crate::error::ProviderFailure;

/// Retry policy configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryConfig {
    /// Maximum attempts per candidate, including the first one
    pub max_attempts: u32,

    /// Delay unit; the wait after attempt `n` is `base_delay * n`
    pub base_delay: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(2000),
        }
    }
}

impl fmt::Display for RetryConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "RetryConfig {{ max_attempts: {}, base_delay: {:?} }}",
            self.max_attempts, self.base_delay
        )
    }
}

/// What to do after a failed attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Wait, then call the same candidate again
    RetrySameCandidate(Duration),

    /// Abandon this candidate for the rest of the request
    AdvanceToNextCandidate,

    /// Stop the chain; the remaining deadline cannot cover the next wait
    AbortChain,
}

impl fmt::Display for RetryDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RetrySameCandidate(delay) => write!(f, "retry after {:?}", delay),
            Self::AdvanceToNextCandidate => write!(f, "advance"),
            Self::AbortChain => write!(f, "abort"),
        }
    }
}

/// Stateless retry decision function
#[derive(Debug, Clone, Default)]
pub struct RetryPolicy {
    config: RetryConfig,
}

impl RetryPolicy {
    /// Create a new retry policy with the specified configuration
    pub fn new(config: RetryConfig) -> Self {
        Self { config }
    }

    /// Get the current retry configuration
    pub fn config(&self) -> &RetryConfig {
        &self.config
    }

    /// Backoff before attempt `attempt + 1`
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.config.base_delay.saturating_mul(attempt.max(1))
    }

    /// Decide after `attempt` (1-based) failed with `failure`
    ///
    /// `remaining` is the time left before the request deadline, if one applies.
    pub fn decide(
        &self,
        attempt: u32,
        failure: &ProviderFailure,
        remaining: Option<Duration>,
    ) -> RetryDecision {
        if !failure.is_transient() || attempt >= self.config.max_attempts {
            return RetryDecision::AdvanceToNextCandidate;
        }

        let delay = self.delay_for(attempt);
        match remaining {
            Some(remaining) if delay >= remaining => RetryDecision::AbortChain,
            _ => RetryDecision::RetrySameCandidate(delay),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn transient() -> ProviderFailure {
        ProviderFailure::transient("RESOURCE_EXHAUSTED", "quota").with_status_code(429)
    }

    fn permanent() -> ProviderFailure {
        ProviderFailure::permanent("NOT_FOUND", "unknown model").with_status_code(404)
    }

    #[test]
    fn test_transient_retries_with_linear_delay() {
        let policy = RetryPolicy::default();

        assert_eq!(
            policy.decide(1, &transient(), None),
            RetryDecision::RetrySameCandidate(Duration::from_millis(2000))
        );
        assert_eq!(
            policy.decide(2, &transient(), None),
            RetryDecision::RetrySameCandidate(Duration::from_millis(4000))
        );
    }

    #[test]
    fn test_budget_exhausted_advances() {
        let policy = RetryPolicy::default();
        assert_eq!(
            policy.decide(3, &transient(), None),
            RetryDecision::AdvanceToNextCandidate
        );
    }

    #[test]
    fn test_permanent_advances_immediately() {
        let policy = RetryPolicy::default();
        assert_eq!(
            policy.decide(1, &permanent(), None),
            RetryDecision::AdvanceToNextCandidate
        );
    }

    #[test]
    fn test_delay_past_deadline_aborts() {
        let policy = RetryPolicy::default();

        assert_eq!(
            policy.decide(1, &transient(), Some(Duration::from_millis(1500))),
            RetryDecision::AbortChain
        );
        assert_eq!(
            policy.decide(1, &transient(), Some(Duration::from_millis(2500))),
            RetryDecision::RetrySameCandidate(Duration::from_millis(2000))
        );
        // Permanent failures still advance; selecting the next candidate checks the deadline.
        assert_eq!(
            policy.decide(1, &permanent(), Some(Duration::ZERO)),
            RetryDecision::AdvanceToNextCandidate
        );
    }

    #[test]
    fn test_single_attempt_budget() {
        let policy = RetryPolicy::new(RetryConfig {
            max_attempts: 1,
            base_delay: Duration::from_millis(10),
        });
        assert_eq!(
            policy.decide(1, &transient(), None),
            RetryDecision::AdvanceToNextCandidate
        );
    }
}
