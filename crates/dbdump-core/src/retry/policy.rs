use std::time::Duration;

/// Decision returned by the retry policy after a failed attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Attempts are used up; surface the last error.
    GiveUp,
    /// Try again right away. Attempts run back-to-back; only the per-attempt
    /// timeout spaces them out.
    Retry,
}

/// Bounded retry for session establishment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectPolicy {
    /// Maximum number of attempts (including the first).
    pub max_attempts: u32,
    /// Upper bound on a single attempt.
    pub attempt_timeout: Duration,
}

impl Default for ConnectPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 10,
            attempt_timeout: Duration::from_secs(10),
        }
    }
}

impl ConnectPolicy {
    /// `attempt` is 1-based (1 = first attempt).
    pub fn decide(&self, attempt: u32) -> RetryDecision {
        if attempt >= self.max_attempts {
            RetryDecision::GiveUp
        } else {
            RetryDecision::Retry
        }
    }

    /// True once `attempt` is past half of `max_attempts`; failures from then on log at warn.
    pub fn is_escalated(&self, attempt: u32) -> bool {
        attempt > self.max_attempts / 2
    }
}
