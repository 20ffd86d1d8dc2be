//! Bounded job scheduler.
//!
//! Runs a target's jobs as tokio tasks behind an admission gate: at most
//! `capacity` jobs are inside connect → execute → close at any instant, the
//! rest wait. Each job opens its own session; a failing job never cancels or
//! blocks its siblings, and every job ends in exactly one [`JobResult`].
//!
//! There is no per-command timeout: a hung remote dump holds its slot until
//! the remote process ends.
//!
//! [`JobResult`]: crate::report::JobResult

mod execute;
mod gate;
mod progress;
mod run;

pub use gate::{AdmissionGate, GateGuard};
pub use progress::{JobCompletion, JobState};
pub use run::run_jobs;
