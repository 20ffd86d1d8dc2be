//! Where dump and error files go.

use std::path::{Path, PathBuf};

use crate::target::Target;

/// Database segment used for the server-wide roles dump.
pub const ROLES_DATABASE: &str = "all";

/// Output roots for one run.
///
/// - dump: `{dump_destination}/{host}/{dbtype}/{server}/{port}/{database}/{mode}.sql`
/// - error: `{dump_error}/{host}-{dbtype}-{server}-{port}-{database}-{mode}.err`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputLayout {
    pub dump_destination: PathBuf,
    pub dump_error: PathBuf,
}

impl OutputLayout {
    pub fn new(dump_destination: impl Into<PathBuf>, dump_error: impl Into<PathBuf>) -> Self {
        Self {
            dump_destination: dump_destination.into(),
            dump_error: dump_error.into(),
        }
    }

    /// Directory holding every dump of `database`.
    pub fn database_dir(&self, target: &Target, database: &str) -> PathBuf {
        self.dump_destination
            .join(&target.host)
            .join(target.dbtype.as_str())
            .join(&target.server)
            .join(target.port.to_string())
            .join(database)
    }

    pub fn dump_path(&self, target: &Target, database: &str, mode: &str) -> PathBuf {
        self.database_dir(target, database)
            .join(format!("{}.sql", mode))
    }

    pub fn error_path(&self, target: &Target, database: &str, mode: &str) -> PathBuf {
        self.dump_error.join(format!(
            "{}-{}-{}-{}-{}-{}.err",
            target.host, target.dbtype, target.server, target.port, database, mode
        ))
    }

    pub fn error_root(&self) -> &Path {
        &self.dump_error
    }

    /// Record of the databases a run selected, next to the error files:
    /// `{dump_error}/{host}-{dbtype}-{server}-{port}-{list}_dblist.info`.
    pub fn database_list_path(&self, target: &Target, list: &str) -> PathBuf {
        self.error_root().join(format!(
            "{}-{}-{}-{}-{}_dblist.info",
            target.host, target.dbtype, target.server, target.port, list
        ))
    }
}
