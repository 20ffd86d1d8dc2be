//! `dbdump run` – dump one or more targets, each with its own scheduler.

use anyhow::{bail, Result};
use dbdump_core::config::DumpConfig;
use dbdump_core::dump::{dump_target, DumpContext};
use dbdump_core::report::BatchReport;
use dbdump_core::scheduler::JobCompletion;
use dbdump_core::target::{load_target, target_files_in};
use std::path::PathBuf;

/// Flags of `dbdump run` that override the config file.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    pub jobs: Option<usize>,
    pub dump_destination: Option<PathBuf>,
    pub dump_error: Option<PathBuf>,
    pub json: bool,
}

impl RunOptions {
    fn apply(&self, cfg: &DumpConfig) -> DumpConfig {
        let mut cfg = cfg.clone();
        if let Some(jobs) = self.jobs {
            cfg.concurrency = jobs;
        }
        if let Some(dir) = &self.dump_destination {
            cfg.dump_destination = dir.clone();
        }
        if let Some(dir) = &self.dump_error {
            cfg.dump_error = dir.clone();
        }
        cfg
    }
}

/// Expand directories into their target files (non-recursive, sorted); plain
/// paths are taken as given.
pub fn collect_target_files(paths: &[PathBuf], extension: &str) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for path in paths {
        if path.is_dir() {
            let found = target_files_in(path, extension)?;
            if found.is_empty() {
                tracing::warn!(dir = %path.display(), extension, "no target files in directory");
            }
            files.extend(found);
        } else {
            files.push(path.clone());
        }
    }
    Ok(files)
}

enum TargetRun {
    Done(BatchReport),
    Aborted(String, String),
}

pub async fn run_dump(cfg: &DumpConfig, targets: &[PathBuf], opts: &RunOptions) -> Result<()> {
    let cfg = opts.apply(cfg);
    let files = collect_target_files(targets, &cfg.target_extension)?;
    if files.is_empty() {
        bail!("no target files found");
    }

    let mut runs = Vec::new();
    let mut specs = Vec::new();
    for file in &files {
        match load_target(file) {
            Ok(spec) => specs.push(spec),
            Err(e) => runs.push(TargetRun::Aborted(file.display().to_string(), format!("{:#}", e))),
        }
    }

    let ctx = DumpContext::from_config(&cfg);
    tracing::info!(
        targets = specs.len(),
        concurrency = ctx.concurrency,
        dump_destination = %ctx.layout.dump_destination.display(),
        "run started"
    );

    let (progress_tx, progress_rx) = tokio::sync::mpsc::channel::<JobCompletion>(64);
    let printer = tokio::spawn(print_progress(progress_rx, opts.json));

    let mut join_set = tokio::task::JoinSet::new();
    for spec in specs {
        let ctx = ctx.clone();
        let tx = progress_tx.clone();
        join_set.spawn(async move {
            match dump_target(&ctx, &spec, Some(&tx)).await {
                Ok(report) => TargetRun::Done(report),
                Err(e) => {
                    tracing::error!(target = %spec.target.label(), error = %e, "target aborted");
                    TargetRun::Aborted(spec.target.label(), spec.target.mask(&e.to_string()))
                }
            }
        });
    }
    drop(progress_tx);

    while let Some(joined) = join_set.join_next().await {
        match joined {
            Ok(run) => runs.push(run),
            Err(e) => runs.push(TargetRun::Aborted("<unknown>".to_string(), format!("target task failed: {}", e))),
        }
    }
    let _ = printer.await;

    let mut unclean = 0usize;
    for run in &runs {
        if print_run(run, opts.json)? {
            unclean += 1;
        }
    }
    if unclean > 0 {
        bail!("{} of {} target(s) did not complete cleanly", unclean, runs.len());
    }
    tracing::info!(targets = runs.len(), "run completed");
    Ok(())
}

/// Print one target's outcome; returns true when the target did not fully succeed.
fn print_run(run: &TargetRun, json: bool) -> Result<bool> {
    match run {
        TargetRun::Done(report) => {
            if json {
                println!("{}", serde_json::to_string_pretty(report)?);
            } else {
                print!("{}", report.render());
            }
            Ok(!report.is_success())
        }
        TargetRun::Aborted(name, error) => {
            if json {
                let value = serde_json::json!({ "target": name, "aborted": error });
                println!("{}", serde_json::to_string_pretty(&value)?);
            } else {
                println!("{}: aborted: {}", name, error);
            }
            Ok(true)
        }
    }
}

async fn print_progress(mut rx: tokio::sync::mpsc::Receiver<JobCompletion>, quiet: bool) {
    while let Some(c) = rx.recv().await {
        if quiet {
            continue;
        }
        println!("[{}/{}] {:<9} {}", c.done, c.total, c.state().as_str(), c.name);
    }
}
