//! Connection error types: one failed attempt vs. an exhausted retry budget.

use std::time::Duration;
use thiserror::Error;

use crate::session::SessionError;

/// A single failed connection attempt. Retried while attempts remain.
#[derive(Debug, Error)]
pub enum AttemptError {
    #[error("attempt timed out after {}s", .0.as_secs_f64())]
    Timeout(Duration),
    #[error(transparent)]
    Session(#[from] SessionError),
}

impl AttemptError {
    pub fn kind(&self) -> &'static str {
        match self {
            AttemptError::Timeout(_) => "timeout",
            AttemptError::Session(e) => e.kind(),
        }
    }
}

/// Every attempt failed. Carries the call site that asked for the session and
/// the last attempt's error.
#[derive(Debug, Error)]
#[error("{site}: ssh to {host} failed after {attempts} attempt(s) ({}): {last}", .last.kind())]
pub struct ConnectError {
    pub host: String,
    pub site: String,
    pub attempts: u32,
    #[source]
    pub last: AttemptError,
}
