//! One job's single execution attempt: connect, prepare paths, run, close.

use std::path::Path;

use super::progress::JobState;
use crate::jobs::Job;
use crate::report::JobOutcome;
use crate::session::{close_quietly, ConnectionSupplier, Session};
use crate::target::Target;

/// Upper bound on stderr kept in a `Failed` outcome; the `.err` file keeps everything.
const STDERR_KEEP_BYTES: usize = 16 * 1024;

/// Runs `job` on its own session. The session is closed on every path out of
/// here; the caller holds the gate slot around this call.
pub(super) async fn execute_job(
    job: &Job,
    target: &Target,
    supplier: &ConnectionSupplier,
) -> JobOutcome {
    tracing::debug!(job = %job.name, state = JobState::Connecting.as_str());
    let mut session = match supplier.connect(target, &job.name).await {
        Ok(s) => s,
        Err(e) => {
            return JobOutcome::Errored {
                cause: e.to_string(),
            }
        }
    };
    let outcome = run_on_session(session.as_mut(), job, target).await;
    close_quietly(session.as_mut(), &target.host).await;
    outcome
}

async fn run_on_session(session: &mut dyn Session, job: &Job, target: &Target) -> JobOutcome {
    for path in [&job.stdout_path, &job.stderr_path] {
        if let Err(e) = ensure_parent(path).await {
            return JobOutcome::Errored {
                cause: format!("create directory for {}: {}", path.display(), e),
            };
        }
    }

    tracing::debug!(job = %job.name, state = JobState::Running.as_str(), output = %job.stdout_path.display());
    match session
        .exec_to_files(&job.command, &job.stdout_path, &job.stderr_path)
        .await
    {
        Ok(0) => JobOutcome::Succeeded,
        Ok(exit_code) => JobOutcome::Failed {
            exit_code,
            stderr: read_stderr(&job.stderr_path).await,
        },
        Err(e) => JobOutcome::Errored {
            cause: format!("run on {}: {}", target.host, e),
        },
    }
}

/// `create_dir_all` treats an existing directory as success, so sibling jobs
/// racing on the same database directory are fine.
async fn ensure_parent(path: &Path) -> std::io::Result<()> {
    match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => tokio::fs::create_dir_all(dir).await,
        _ => Ok(()),
    }
}

/// Tail of the error file, lossily decoded.
async fn read_stderr(path: &Path) -> String {
    match tokio::fs::read(path).await {
        Ok(bytes) => {
            let start = bytes.len().saturating_sub(STDERR_KEEP_BYTES);
            String::from_utf8_lossy(&bytes[start..]).into_owned()
        }
        Err(e) => format!("<could not read {}: {}>", path.display(), e),
    }
}
