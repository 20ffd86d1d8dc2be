//! Per-job outcomes and the batch summary for one target.

use serde::Serialize;
use std::fmt::Write as _;

use crate::jobs::Job;
use crate::target::Target;

/// Terminal outcome of one job's single execution attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum JobOutcome {
    Succeeded,
    /// The dump command ran and exited nonzero; `stderr` is what it wrote.
    Failed { exit_code: i32, stderr: String },
    /// The job never got a usable result (connection exhausted, local I/O, panic).
    Errored { cause: String },
}

impl JobOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            JobOutcome::Succeeded => "succeeded",
            JobOutcome::Failed { .. } => "failed",
            JobOutcome::Errored { .. } => "errored",
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, JobOutcome::Succeeded)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct JobResult {
    pub job: Job,
    /// Command the job ran, credentials masked.
    pub command: String,
    pub outcome: JobOutcome,
    pub elapsed_ms: u64,
}

impl JobResult {
    /// Masks credentials in the command and in any captured stderr or error.
    pub fn new(target: &Target, job: Job, outcome: JobOutcome, elapsed_ms: u64) -> Self {
        let outcome = match outcome {
            JobOutcome::Failed { exit_code, stderr } => JobOutcome::Failed {
                exit_code,
                stderr: target.mask(&stderr),
            },
            JobOutcome::Errored { cause } => JobOutcome::Errored {
                cause: target.mask(&cause),
            },
            JobOutcome::Succeeded => JobOutcome::Succeeded,
        };
        Self {
            command: target.mask(&job.command),
            job,
            outcome,
            elapsed_ms,
        }
    }

    /// Log at a level matching the outcome.
    pub fn log(&self) {
        match &self.outcome {
            JobOutcome::Succeeded => {
                tracing::debug!(job = %self.job.name, elapsed_ms = self.elapsed_ms, "dump succeeded")
            }
            JobOutcome::Failed { exit_code, stderr } => tracing::warn!(
                job = %self.job.name,
                exit_code,
                stderr = %stderr.trim(),
                "dump command failed"
            ),
            JobOutcome::Errored { cause } => {
                tracing::error!(job = %self.job.name, cause = %cause, "dump job errored")
            }
        }
    }
}

/// All results of one target's batch plus counts. Built once all jobs finished.
#[derive(Debug, Clone, Serialize)]
pub struct BatchReport {
    pub target: String,
    pub succeeded: usize,
    pub failed: usize,
    pub errored: usize,
    pub results: Vec<JobResult>,
}

impl BatchReport {
    pub fn new(target: &Target, results: Vec<JobResult>) -> Self {
        let mut report = Self {
            target: target.label(),
            succeeded: 0,
            failed: 0,
            errored: 0,
            results,
        };
        for r in &report.results {
            match r.outcome {
                JobOutcome::Succeeded => report.succeeded += 1,
                JobOutcome::Failed { .. } => report.failed += 1,
                JobOutcome::Errored { .. } => report.errored += 1,
            }
        }
        report
    }

    pub fn total(&self) -> usize {
        self.results.len()
    }

    pub fn is_success(&self) -> bool {
        self.failed == 0 && self.errored == 0
    }

    pub fn log_summary(&self) {
        if self.is_success() {
            tracing::info!(
                target = %self.target,
                jobs = self.total(),
                "batch finished: all jobs succeeded"
            );
        } else {
            tracing::warn!(
                target = %self.target,
                jobs = self.total(),
                succeeded = self.succeeded,
                failed = self.failed,
                errored = self.errored,
                "batch finished with failures"
            );
        }
    }

    /// Text summary: counts, then every non-success job with its command and
    /// captured stderr or error. Passwords are masked.
    pub fn render(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(
            out,
            "{}: {} job(s), {} succeeded, {} failed, {} errored",
            self.target,
            self.total(),
            self.succeeded,
            self.failed,
            self.errored
        );
        for r in self.results.iter().filter(|r| !r.outcome.is_success()) {
            let _ = writeln!(out, "  [{}] {}", r.outcome.label(), r.job.name);
            let _ = writeln!(out, "    command: {}", r.command);
            match &r.outcome {
                JobOutcome::Failed { exit_code, stderr } => {
                    let _ = writeln!(out, "    exit status: {}", exit_code);
                    for line in stderr.lines().filter(|l| !l.trim().is_empty()) {
                        let _ = writeln!(out, "    stderr: {}", line);
                    }
                }
                JobOutcome::Errored { cause } => {
                    let _ = writeln!(out, "    error: {}", cause);
                }
                JobOutcome::Succeeded => {}
            }
        }
        out
    }
}
