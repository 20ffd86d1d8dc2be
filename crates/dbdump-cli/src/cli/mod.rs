//! CLI for dbdump.

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use clap_complete::Shell;
use dbdump_core::config::{self, DumpConfig};
use std::path::PathBuf;

use commands::{run_completions, run_config, run_dump, run_plan, RunOptions};

/// Top-level CLI for dbdump.
#[derive(Debug, Parser)]
#[command(name = "dbdump")]
#[command(about = "dbdump: parallel database dumps over SSH", long_about = None)]
pub struct Cli {
    /// Config file to use instead of ~/.config/dbdump/config.toml.
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Dump every database of the given targets (files or directories of target files).
    Run {
        /// Target files, or directories scanned for target files.
        #[arg(required = true, value_name = "TARGET")]
        targets: Vec<PathBuf>,
        /// Maximum dump jobs running at once per target (overrides config).
        #[arg(long, short = 'j', visible_alias = "concurrency", value_name = "N")]
        jobs: Option<usize>,
        /// Root directory for dump files (overrides config).
        #[arg(long, value_name = "DIR")]
        dump_destination: Option<PathBuf>,
        /// Directory for per-job error files (overrides config).
        #[arg(long, value_name = "DIR")]
        dump_error: Option<PathBuf>,
        /// Print each target's report as JSON instead of text.
        #[arg(long)]
        json: bool,
    },

    /// Discover a target and print the jobs a run would execute, without dumping.
    Plan {
        /// Target file.
        target: PathBuf,
    },

    /// Print the config file path and the effective configuration.
    Config,

    /// Generate shell completions on stdout.
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

fn load_config(path: Option<&PathBuf>) -> Result<(PathBuf, DumpConfig)> {
    match path {
        Some(path) => Ok((path.clone(), config::load_from_path(path)?)),
        None => Ok((config::config_path()?, config::load_or_init()?)),
    }
}

impl CliCommand {
    pub async fn run_from_args() -> Result<()> {
        let cli = Cli::parse();

        if let CliCommand::Completions { shell } = cli.command {
            run_completions(shell);
            return Ok(());
        }

        let (cfg_path, cfg) = load_config(cli.config.as_ref())?;
        tracing::debug!(path = %cfg_path.display(), "loaded config: {:?}", cfg);

        match cli.command {
            CliCommand::Run {
                targets,
                jobs,
                dump_destination,
                dump_error,
                json,
            } => {
                let opts = RunOptions {
                    jobs,
                    dump_destination,
                    dump_error,
                    json,
                };
                run_dump(&cfg, &targets, &opts).await?
            }
            CliCommand::Plan { target } => run_plan(&cfg, &target).await?,
            CliCommand::Config => run_config(&cfg_path, &cfg)?,
            CliCommand::Completions { .. } => {}
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests;
