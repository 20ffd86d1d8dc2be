//! Shell command text for discovery queries and dumps.
//!
//! All command strings are built here. Credentials are interpolated into the
//! command line (`-p'<password>'` for mysql, `PGPASSWORD="<password>"` for
//! postgres), which makes them visible to other processes on the SSH host while
//! the command runs. Summaries mask them with [`Target::mask`].

use crate::target::{DbType, Target};

/// Command builder bound to one target.
#[derive(Debug, Clone, Copy)]
pub struct Commands<'a> {
    target: &'a Target,
}

impl<'a> Commands<'a> {
    pub fn new(target: &'a Target) -> Self {
        Self { target }
    }

    fn mysql_conn(&self) -> String {
        let t = self.target;
        format!("-h {} -P {} -u {} -p'{}'", t.server, t.port, t.user, t.password)
    }

    /// `PGPASSWORD="..." <program> -h <server> -p <port> -U <user>`
    fn pg(&self, program: &str) -> String {
        let t = self.target;
        format!(
            "PGPASSWORD=\"{}\" {} -h {} -p {} -U {}",
            t.password, program, t.server, t.port, t.user
        )
    }

    fn mysql_query(&self, database: Option<&str>, sql: &str) -> String {
        match database {
            Some(db) => format!("mysql {} -N -B {} -e \"{}\"", self.mysql_conn(), db, sql),
            None => format!("mysql {} -N -B -e \"{}\"", self.mysql_conn(), sql),
        }
    }

    fn psql_query(&self, database: &str, sql: &str) -> String {
        format!("{} -d {} -At -c \"{}\"", self.pg("psql"), database, sql)
    }

    /// One database name per output line.
    pub fn list_databases(&self) -> String {
        match self.target.dbtype {
            DbType::Mysql => self.mysql_query(None, "SHOW DATABASES"),
            DbType::Postgres => self.psql_query(
                "postgres",
                "SELECT datname FROM pg_database WHERE NOT datistemplate ORDER BY datname",
            ),
        }
    }

    /// Single number: tables in `database` according to information_schema (mysql only).
    pub fn count_tables(&self, database: &str) -> String {
        self.mysql_query(
            None,
            &format!(
                "SELECT COUNT(*) FROM information_schema.tables WHERE table_schema = '{}'",
                database
            ),
        )
    }

    /// One table name per output line.
    pub fn list_tables(&self, database: &str) -> String {
        match self.target.dbtype {
            DbType::Mysql => self.mysql_query(Some(database), "SHOW TABLES"),
            DbType::Postgres => self.psql_query(
                database,
                "SELECT tablename FROM pg_tables WHERE schemaname = 'public' ORDER BY tablename",
            ),
        }
    }

    /// Server-wide users, roles and grants.
    pub fn roles(&self) -> String {
        match self.target.dbtype {
            DbType::Mysql => format!(
                "{} | mysql {} -N -B | sed 's/$/;/'",
                self.mysql_query(
                    None,
                    "SELECT CONCAT('SHOW GRANTS FOR ''', user, '''@''', host, ''';') FROM mysql.user WHERE user <> '' AND host <> ''",
                ),
                self.mysql_conn()
            ),
            DbType::Postgres => format!(
                "{} --roles-only --quote-all-identifiers",
                self.pg("pg_dumpall")
            ),
        }
    }

    pub fn schema(&self, database: &str) -> String {
        match self.target.dbtype {
            DbType::Mysql => format!(
                "mysqldump {} --routines --no-data --skip-lock-tables {}",
                self.mysql_conn(),
                database
            ),
            DbType::Postgres => format!(
                "{} {} --schema-only --quote-all-identifiers",
                self.pg("pg_dump"),
                database
            ),
        }
    }

    pub fn data(&self, database: &str, table: &str) -> String {
        match self.target.dbtype {
            DbType::Mysql => format!(
                "mysqldump {} --no-create-info --complete-insert --hex-blob {} {}",
                self.mysql_conn(),
                database,
                table
            ),
            DbType::Postgres => format!(
                "{} -d {} --table='public.\"{}\"' --data-only --column-inserts --quote-all-identifiers",
                self.pg("pg_dump"),
                database,
                table
            ),
        }
    }
}
