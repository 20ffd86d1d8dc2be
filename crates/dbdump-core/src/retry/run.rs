//! Retry loop: run a connection attempt until success or the policy says stop.

use std::future::Future;

use super::error::{AttemptError, ConnectError};
use super::policy::{ConnectPolicy, RetryDecision};
use crate::session::SessionError;

/// Runs `attempt_fn` until it succeeds or `policy.max_attempts` is reached.
/// Each attempt is cut off after `policy.attempt_timeout`; the attempt number
/// (1-based) is passed in. `host` and `site` only label logs and the final error.
pub async fn run_with_retry<T, F, Fut>(
    policy: &ConnectPolicy,
    host: &str,
    site: &str,
    mut attempt_fn: F,
) -> Result<T, ConnectError>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, SessionError>>,
{
    let mut attempt = 1u32;
    loop {
        let result = match tokio::time::timeout(policy.attempt_timeout, attempt_fn(attempt)).await {
            Ok(r) => r.map_err(AttemptError::from),
            Err(_) => Err(AttemptError::Timeout(policy.attempt_timeout)),
        };
        let err = match result {
            Ok(value) => {
                tracing::debug!(host, site, attempt, "ssh session established");
                return Ok(value);
            }
            Err(e) => e,
        };

        if policy.is_escalated(attempt) {
            tracing::warn!(host, site, attempt, max = policy.max_attempts, error = %err, "ssh attempt failed");
        } else {
            tracing::debug!(host, site, attempt, max = policy.max_attempts, error = %err, "ssh attempt failed");
        }

        match policy.decide(attempt) {
            RetryDecision::GiveUp => {
                return Err(ConnectError {
                    host: host.to_string(),
                    site: site.to_string(),
                    attempts: attempt,
                    last: err,
                });
            }
            RetryDecision::Retry => attempt += 1,
        }
    }
}
