//! Target descriptor files: one TOML file per database server.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use super::{DbType, FilterSet, Target};

/// On-disk shape of a target file.
///
/// ```toml
/// host = "web01.example.org"
/// dbtype = "postgres"
/// user = "postgres"
/// password = "secret"
/// server = "127.0.0.1"
/// port = 5432
///
/// [filters]
/// include = [".*"]
/// exclude = ["^template", "^tmp_"]
/// structure_only = ["^tmp_"]
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TargetFile {
    pub host: String,
    pub dbtype: DbType,
    pub user: String,
    #[serde(default)]
    pub password: String,
    pub server: String,
    pub port: u16,
    #[serde(default)]
    pub filters: FilterLists,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterLists {
    pub include: Vec<String>,
    pub exclude: Vec<String>,
    pub structure_only: Vec<String>,
}

/// A validated target with its compiled filters, ready for the scheduler.
#[derive(Debug, Clone)]
pub struct TargetSpec {
    pub source: PathBuf,
    pub target: Target,
    pub filters: FilterSet,
}

impl TargetFile {
    pub fn into_spec(self, source: PathBuf) -> Result<TargetSpec> {
        if self.host.trim().is_empty() {
            anyhow::bail!("{}: host must not be empty", source.display());
        }
        if self.server.trim().is_empty() {
            anyhow::bail!("{}: server must not be empty", source.display());
        }
        if self.user.trim().is_empty() {
            anyhow::bail!("{}: user must not be empty", source.display());
        }
        if self.port == 0 {
            anyhow::bail!("{}: port must be nonzero", source.display());
        }
        let filters = FilterSet::new(
            &self.filters.include,
            &self.filters.exclude,
            &self.filters.structure_only,
        )
        .with_context(|| format!("{}: invalid filter pattern", source.display()))?;
        Ok(TargetSpec {
            source,
            target: Target {
                host: self.host,
                dbtype: self.dbtype,
                user: self.user,
                password: self.password,
                server: self.server,
                port: self.port,
            },
            filters,
        })
    }
}

/// Read and validate one target file.
pub fn load_target(path: &Path) -> Result<TargetSpec> {
    let data =
        fs::read_to_string(path).with_context(|| format!("read target: {}", path.display()))?;
    let file: TargetFile =
        toml::from_str(&data).with_context(|| format!("parse target: {}", path.display()))?;
    file.into_spec(path.to_path_buf())
}

/// Files directly inside `dir` whose extension is `extension`, sorted by path.
pub fn target_files_in(dir: &Path, extension: &str) -> Result<Vec<PathBuf>> {
    let extension = extension.trim_start_matches('.');
    let mut files = Vec::new();
    for entry in
        fs::read_dir(dir).with_context(|| format!("read target dir: {}", dir.display()))?
    {
        let path = entry?.path();
        if path.is_file() && path.extension().and_then(|e| e.to_str()) == Some(extension) {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}
