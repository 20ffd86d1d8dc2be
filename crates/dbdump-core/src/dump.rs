//! Per-target entry points: discover, build the job list, run it, report.

use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc;

use crate::config::DumpConfig;
use crate::discovery::Discoverer;
use crate::error::DumpError;
use crate::jobs::{build_jobs, DatabaseSelection, JobPlan, OutputLayout};
use crate::report::BatchReport;
use crate::retry::ConnectPolicy;
use crate::scheduler::{run_jobs, AdmissionGate, JobCompletion};
use crate::session::{ConnectionSupplier, Connector, SshConnector};
use crate::target::{Target, TargetSpec};

/// Everything a target run needs besides the target itself.
#[derive(Clone)]
pub struct DumpContext {
    pub supplier: ConnectionSupplier,
    pub layout: OutputLayout,
    pub concurrency: usize,
}

impl DumpContext {
    pub fn new(
        connector: Arc<dyn Connector>,
        policy: ConnectPolicy,
        layout: OutputLayout,
        concurrency: usize,
    ) -> Self {
        Self {
            supplier: ConnectionSupplier::new(connector, policy),
            layout,
            concurrency: concurrency.max(1),
        }
    }

    /// OpenSSH connector, policy, layout and concurrency from the global config.
    pub fn from_config(cfg: &DumpConfig) -> Self {
        let policy = cfg.connection.policy();
        let connector = SshConnector::new(cfg.ssh.clone(), policy.attempt_timeout);
        Self::new(
            Arc::new(connector),
            policy,
            OutputLayout::new(&cfg.dump_destination, &cfg.dump_error),
            cfg.concurrency,
        )
    }

    fn discoverer(&self) -> Discoverer {
        Discoverer::new(self.supplier.clone())
    }
}

/// Discover and build the job plan for `spec` without running anything.
pub async fn plan_target(ctx: &DumpContext, spec: &TargetSpec) -> Result<JobPlan, DumpError> {
    build_jobs(&ctx.discoverer(), &spec.target, &spec.filters, &ctx.layout)
        .await
        .map_err(|source| DumpError::Discovery {
            target: spec.target.label(),
            source,
        })
}

/// Full run for one target. Only discovery failures return `Err`; job failures
/// are reported in the returned batch.
pub async fn dump_target(
    ctx: &DumpContext,
    spec: &TargetSpec,
    progress_tx: Option<&mpsc::Sender<JobCompletion>>,
) -> Result<BatchReport, DumpError> {
    let target = &spec.target;
    tracing::info!(target = %target.label(), source = %spec.source.display(), "dump started");

    let JobPlan { jobs, selection } = plan_target(ctx, spec).await?;
    write_database_lists(&ctx.layout, target, &selection).await;
    let err_files: Vec<PathBuf> = jobs.iter().map(|j| j.stderr_path.clone()).collect();

    let gate = Arc::new(AdmissionGate::new(ctx.concurrency));
    let results = run_jobs(target, jobs, &ctx.supplier, Arc::clone(&gate), progress_tx).await;
    tracing::debug!(target = %target.label(), peak = gate.peak(), capacity = gate.capacity(), "gate usage");

    let removed = remove_empty_files(&err_files).await;
    if removed > 0 {
        tracing::debug!(target = %target.label(), removed, "removed empty error files");
    }

    let report = BatchReport::new(target, results);
    report.log_summary();
    Ok(report)
}

/// Write the `dumped` (full) and `stronly` (schema-only) database lists for
/// `target`, one name per line. Failures are logged; the dumps still run.
pub async fn write_database_lists(
    layout: &OutputLayout,
    target: &Target,
    selection: &DatabaseSelection,
) {
    if let Err(e) = tokio::fs::create_dir_all(layout.error_root()).await {
        tracing::warn!(dir = %layout.error_root().display(), error = %e, "cannot create error directory");
        return;
    }
    for (list, names) in [("dumped", &selection.full), ("stronly", &selection.structure_only)] {
        let path = layout.database_list_path(target, list);
        if let Err(e) = tokio::fs::write(&path, names.join("\n")).await {
            tracing::warn!(path = %path.display(), error = %e, "cannot write database list");
        }
    }
}

/// Delete each path that exists and is zero bytes long. Returns how many were removed.
pub async fn remove_empty_files(paths: &[PathBuf]) -> usize {
    let mut removed = 0;
    for path in paths {
        match tokio::fs::metadata(path).await {
            Ok(meta) if meta.is_file() && meta.len() == 0 => {
                match tokio::fs::remove_file(path).await {
                    Ok(()) => removed += 1,
                    Err(e) => tracing::debug!(path = %path.display(), error = %e, "remove empty file"),
                }
            }
            _ => {}
        }
    }
    removed
}
