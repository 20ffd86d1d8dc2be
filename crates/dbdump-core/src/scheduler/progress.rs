//! Job lifecycle states and per-job completion events.

use crate::report::JobOutcome;

/// `Pending → Connecting → Running → {Succeeded | Failed | Errored}`.
/// Connection retries happen inside `Connecting`; exhausting them goes straight to `Errored`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    Pending,
    Connecting,
    Running,
    Succeeded,
    Failed,
    Errored,
}

impl JobState {
    pub fn as_str(self) -> &'static str {
        match self {
            JobState::Pending => "pending",
            JobState::Connecting => "connecting",
            JobState::Running => "running",
            JobState::Succeeded => "succeeded",
            JobState::Failed => "failed",
            JobState::Errored => "errored",
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, JobState::Succeeded | JobState::Failed | JobState::Errored)
    }
}

impl From<&JobOutcome> for JobState {
    fn from(outcome: &JobOutcome) -> Self {
        match outcome {
            JobOutcome::Succeeded => JobState::Succeeded,
            JobOutcome::Failed { .. } => JobState::Failed,
            JobOutcome::Errored { .. } => JobState::Errored,
        }
    }
}

/// Sent once per finished job, in completion order.
#[derive(Debug, Clone)]
pub struct JobCompletion {
    /// `{dbtype}:{host}:{server}:{port}:{database}[:{table}]`
    pub name: String,
    pub outcome: JobOutcome,
    /// Jobs finished so far in this batch, including this one.
    pub done: usize,
    pub total: usize,
}

impl JobCompletion {
    pub fn state(&self) -> JobState {
        JobState::from(&self.outcome)
    }
}
