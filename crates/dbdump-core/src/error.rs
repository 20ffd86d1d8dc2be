//! Errors that abort a whole target's run.
//!
//! Failures inside a single dump job never surface here; they end up as a
//! [`JobOutcome`](crate::report::JobOutcome) in the batch report instead.

use thiserror::Error;

use crate::discovery::DiscoveryError;

#[derive(Debug, Error)]
pub enum DumpError {
    /// Databases or tables could not be enumerated, so no job list can be built.
    #[error("discovery failed for {target}: {source}")]
    Discovery {
        target: String,
        #[source]
        source: DiscoveryError,
    },
}
