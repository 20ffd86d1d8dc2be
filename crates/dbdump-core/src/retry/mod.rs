//! Connection retry policy.
//!
//! Every SSH session, whether opened for discovery or for a dump job, goes
//! through the same bounded retry loop: a fixed number of attempts, each capped
//! by a timeout, with failures logged louder once half the budget is spent.

mod error;
mod policy;
mod run;

pub use error::{AttemptError, ConnectError};
pub use policy::{ConnectPolicy, RetryDecision};
pub use run::run_with_retry;
