//! Run a batch of jobs concurrently behind the admission gate.

use std::sync::Arc;
use std::time::Instant;
use tokio::sync::mpsc;

use super::execute::execute_job;
use super::gate::AdmissionGate;
use super::progress::{JobCompletion, JobState};
use crate::jobs::Job;
use crate::report::{JobOutcome, JobResult};
use crate::session::ConnectionSupplier;
use crate::target::Target;

/// Runs every job in `jobs` once and returns their results in submission order.
///
/// All jobs are spawned up front and queue on `gate`; each holds its slot from
/// connect to close. A job that panics is reported as `Errored` and does not
/// affect the others. If `progress_tx` is `Some`, one [`JobCompletion`] is sent
/// per job as it finishes.
pub async fn run_jobs(
    target: &Target,
    jobs: Vec<Job>,
    supplier: &ConnectionSupplier,
    gate: Arc<AdmissionGate>,
    progress_tx: Option<&mpsc::Sender<JobCompletion>>,
) -> Vec<JobResult> {
    let total = jobs.len();
    let target = Arc::new(target.clone());
    let mut join_set = tokio::task::JoinSet::new();

    for (index, job) in jobs.into_iter().enumerate() {
        let target = Arc::clone(&target);
        let supplier = supplier.clone();
        let gate = Arc::clone(&gate);
        join_set.spawn(async move {
            tracing::trace!(job = %job.name, state = JobState::Pending.as_str());
            let started = Instant::now();
            let worker = {
                let job = job.clone();
                let target = Arc::clone(&target);
                tokio::spawn(async move {
                    let _slot = match gate.admit().await {
                        Ok(slot) => slot,
                        Err(e) => {
                            return JobOutcome::Errored {
                                cause: format!("admission gate: {}", e),
                            }
                        }
                    };
                    execute_job(&job, &target, &supplier).await
                })
            };
            let outcome = match worker.await {
                Ok(outcome) => outcome,
                Err(e) => JobOutcome::Errored {
                    cause: format!("job task failed: {}", e),
                },
            };
            let result = JobResult::new(
                &target,
                job,
                outcome,
                started.elapsed().as_millis() as u64,
            );
            (index, result)
        });
    }

    let mut results: Vec<Option<JobResult>> = (0..total).map(|_| None).collect();
    let mut done = 0usize;
    while let Some(joined) = join_set.join_next().await {
        let (index, result) = match joined {
            Ok(pair) => pair,
            Err(e) => {
                tracing::error!(error = %e, "job wrapper task failed");
                continue;
            }
        };
        done += 1;
        result.log();
        if let Some(tx) = progress_tx {
            let _ = tx
                .send(JobCompletion {
                    name: result.job.name.clone(),
                    outcome: result.outcome.clone(),
                    done,
                    total,
                })
                .await;
        }
        results[index] = Some(result);
    }

    results.into_iter().flatten().collect()
}
