//! Topology discovery: which databases a server has, and which tables each holds.
//!
//! Every discovery call runs on its own short-lived session, separate from the
//! sessions used by dump jobs.

use thiserror::Error;

use crate::command::Commands;
use crate::retry::ConnectError;
use crate::session::{close_quietly, ConnectionSupplier, Session, SessionError};
use crate::target::{DbType, Target};

#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error(transparent)]
    Connect(#[from] ConnectError),
    #[error("{what} on {host} exited with status {exit_code}: {stderr}")]
    Command {
        host: String,
        what: String,
        exit_code: i32,
        stderr: String,
    },
    #[error("{what} on {host}: unexpected output {output:?}")]
    Parse {
        host: String,
        what: String,
        output: String,
    },
    #[error("{what} on {host}: {source}")]
    Session {
        host: String,
        what: String,
        #[source]
        source: SessionError,
    },
}

/// Tables of one database. `count` is what the server reported; for mysql an
/// empty schema is detected by count alone and the listing is never run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableListing {
    pub tables: Vec<String>,
    pub count: usize,
}

impl TableListing {
    pub fn is_empty(&self) -> bool {
        self.count == 0 || self.tables.is_empty()
    }
}

/// One name per line; blank lines dropped, surrounding whitespace trimmed.
pub fn parse_names(stdout: &str) -> Vec<String> {
    stdout
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect()
}

async fn run_query(
    session: &mut dyn Session,
    target: &Target,
    what: &str,
    command: &str,
) -> Result<String, DiscoveryError> {
    let out = session
        .exec(command)
        .await
        .map_err(|source| DiscoveryError::Session {
            host: target.host.clone(),
            what: what.to_string(),
            source,
        })?;
    if !out.success() {
        return Err(DiscoveryError::Command {
            host: target.host.clone(),
            what: what.to_string(),
            exit_code: out.exit_code,
            stderr: target.mask(out.stderr.trim()),
        });
    }
    Ok(out.stdout)
}

/// Enumerate databases over an open session.
pub async fn query_databases(
    session: &mut dyn Session,
    target: &Target,
) -> Result<Vec<String>, DiscoveryError> {
    let cmd = Commands::new(target).list_databases();
    let stdout = run_query(session, target, "list databases", &cmd).await?;
    Ok(parse_names(&stdout))
}

/// Enumerate the tables of `database` over an open session.
pub async fn query_tables(
    session: &mut dyn Session,
    target: &Target,
    database: &str,
) -> Result<TableListing, DiscoveryError> {
    let commands = Commands::new(target);
    match target.dbtype {
        DbType::Mysql => {
            let what = format!("count tables of {}", database);
            let stdout = run_query(session, target, &what, &commands.count_tables(database)).await?;
            let count: usize = stdout.trim().parse().map_err(|_| DiscoveryError::Parse {
                host: target.host.clone(),
                what,
                output: stdout.trim().to_string(),
            })?;
            if count == 0 {
                tracing::debug!(host = %target.host, database, "no tables, skipping listing");
                return Ok(TableListing::default());
            }
            let what = format!("list tables of {}", database);
            let stdout = run_query(session, target, &what, &commands.list_tables(database)).await?;
            Ok(TableListing {
                tables: parse_names(&stdout),
                count,
            })
        }
        DbType::Postgres => {
            let what = format!("list tables of {}", database);
            let stdout = run_query(session, target, &what, &commands.list_tables(database)).await?;
            let tables = parse_names(&stdout);
            Ok(TableListing {
                count: tables.len(),
                tables,
            })
        }
    }
}

/// Discovery over fresh sessions from the connection supplier.
#[derive(Clone)]
pub struct Discoverer {
    supplier: ConnectionSupplier,
}

impl Discoverer {
    pub fn new(supplier: ConnectionSupplier) -> Self {
        Self { supplier }
    }

    pub async fn list_databases(&self, target: &Target) -> Result<Vec<String>, DiscoveryError> {
        let mut session = self.supplier.connect(target, "list databases").await?;
        let result = query_databases(session.as_mut(), target).await;
        close_quietly(session.as_mut(), &target.host).await;
        let names = result?;
        tracing::debug!(target = %target.label(), count = names.len(), "databases discovered");
        Ok(names)
    }

    pub async fn list_tables(
        &self,
        target: &Target,
        database: &str,
    ) -> Result<TableListing, DiscoveryError> {
        let site = format!("list tables of {}", database);
        let mut session = self.supplier.connect(target, &site).await?;
        let result = query_tables(session.as_mut(), target, database).await;
        close_quietly(session.as_mut(), &target.host).await;
        result
    }
}
