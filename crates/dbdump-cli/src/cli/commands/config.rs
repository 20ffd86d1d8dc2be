//! `dbdump config` – show where the config lives and what is in effect.

use anyhow::{Context, Result};
use dbdump_core::config::DumpConfig;
use std::path::Path;

pub fn run_config(path: &Path, cfg: &DumpConfig) -> Result<()> {
    let body = toml::to_string_pretty(cfg).context("serialize config")?;
    println!("# {}", path.display());
    print!("{}", body);
    Ok(())
}
