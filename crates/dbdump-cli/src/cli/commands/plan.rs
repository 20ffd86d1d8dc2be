//! `dbdump plan` – discovery plus job list, no dumps.

use anyhow::Result;
use dbdump_core::config::DumpConfig;
use dbdump_core::dump::{plan_target, DumpContext};
use dbdump_core::target::load_target;
use std::path::Path;

pub async fn run_plan(cfg: &DumpConfig, target_path: &Path) -> Result<()> {
    let spec = load_target(target_path)?;
    let ctx = DumpContext::from_config(cfg);
    let plan = plan_target(&ctx, &spec).await?;
    let jobs = &plan.jobs;

    println!("{}: {} job(s)", spec.target.label(), jobs.len());
    println!("full dump:   {}", plan.selection.full.join(", "));
    println!("schema only: {}", plan.selection.structure_only.join(", "));
    println!("{:<7} {:<48} {}", "KIND", "NAME", "OUTPUT");
    for job in jobs {
        println!(
            "{:<7} {:<48} {}",
            job.kind.as_str(),
            job.name,
            job.stdout_path.display()
        );
        println!("        $ {}", spec.target.mask(&job.command));
    }
    Ok(())
}
