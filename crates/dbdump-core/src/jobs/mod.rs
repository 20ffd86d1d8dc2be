//! Dump jobs: one job produces exactly one dump file.

mod build;
mod layout;

pub use build::{build_jobs, plan_jobs, DatabaseSelection, JobBuilder, JobPlan};
pub use layout::{OutputLayout, ROLES_DATABASE};

use serde::Serialize;
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum JobKind {
    /// Server-wide users, roles and grants.
    Roles,
    /// Schema of one database, no rows.
    Schema,
    /// Rows of one table.
    Data,
}

impl JobKind {
    pub fn as_str(self) -> &'static str {
        match self {
            JobKind::Roles => "roles",
            JobKind::Schema => "schema",
            JobKind::Data => "data",
        }
    }
}

/// One scheduled dump. `database` is `None` only for roles; `table` is set only for data.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Job {
    pub kind: JobKind,
    pub database: Option<String>,
    pub table: Option<String>,
    /// Literal remote command (credentials included).
    #[serde(skip)]
    pub command: String,
    pub stdout_path: PathBuf,
    pub stderr_path: PathBuf,
    /// Human-readable name: `{dbtype}:{host}:{server}:{port}:{database}[:{table}]`.
    pub name: String,
}

impl Job {
    /// File stem of the dump: `roles`, `schema` or `data-<table>`.
    pub fn mode(&self) -> String {
        mode_for(self.kind, self.table.as_deref())
    }
}

pub(crate) fn mode_for(kind: JobKind, table: Option<&str>) -> String {
    match (kind, table) {
        (JobKind::Roles, _) => "roles".to_string(),
        (JobKind::Schema, _) => "schema".to_string(),
        (JobKind::Data, Some(t)) => format!("data-{}", t),
        (JobKind::Data, None) => "data".to_string(),
    }
}
