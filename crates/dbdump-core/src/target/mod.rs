//! Target descriptors: which database server to dump and which databases are in scope.

mod file;
mod filter;

pub use file::{load_target, target_files_in, TargetFile, TargetSpec};
pub use filter::{FilterSet, Scope};

use serde::{Deserialize, Serialize};
use std::fmt;

/// Database engine on the remote server. Selects discovery queries and dump commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DbType {
    Mysql,
    Postgres,
}

impl DbType {
    pub fn as_str(self) -> &'static str {
        match self {
            DbType::Mysql => "mysql",
            DbType::Postgres => "postgres",
        }
    }
}

impl fmt::Display for DbType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One database server reachable over SSH.
///
/// `host` is the SSH host the commands run on; `server` and `port` address the
/// database server as seen from that host.
#[derive(Clone, PartialEq, Eq)]
pub struct Target {
    pub host: String,
    pub dbtype: DbType,
    pub user: String,
    pub password: String,
    pub server: String,
    pub port: u16,
}

impl Target {
    /// Short identifier used in log fields: `postgres:web01:10.0.0.5:5432`.
    pub fn label(&self) -> String {
        format!("{}:{}:{}:{}", self.dbtype, self.host, self.server, self.port)
    }

    /// Replace the credential tokens `-p'<password>'` and
    /// `PGPASSWORD="<password>"` in `text` with `***`. Only those tokens are
    /// touched, so a short password never garbles the rest of a command line.
    pub fn mask(&self, text: &str) -> String {
        if self.password.is_empty() {
            return text.to_string();
        }
        let mysql = format!("-p'{}'", self.password);
        let postgres = format!("PGPASSWORD=\"{}\"", self.password);
        text.replace(&mysql, "-p'***'")
            .replace(&postgres, "PGPASSWORD=\"***\"")
    }
}

impl fmt::Debug for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Target")
            .field("host", &self.host)
            .field("dbtype", &self.dbtype)
            .field("user", &self.user)
            .field("password", &"***")
            .field("server", &self.server)
            .field("port", &self.port)
            .finish()
    }
}
