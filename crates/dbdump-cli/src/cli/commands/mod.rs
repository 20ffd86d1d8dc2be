//! CLI command handlers, one file per command.

mod completions;
mod config;
mod plan;
mod run;

pub use completions::run_completions;
pub use config::run_config;
pub use plan::run_plan;
pub use run::{run_dump, RunOptions};

#[cfg(test)]
pub use run::collect_target_files;
