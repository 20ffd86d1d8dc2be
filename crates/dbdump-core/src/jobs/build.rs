//! Turn discovered databases and tables into the job list for one target.

use serde::Serialize;
use std::collections::HashMap;

use super::layout::{OutputLayout, ROLES_DATABASE};
use super::{mode_for, Job, JobKind};
use crate::command::Commands;
use crate::discovery::{Discoverer, DiscoveryError, TableListing};
use crate::target::{FilterSet, Scope, Target};

/// Builds individual jobs for one target: command text, output paths and name.
#[derive(Debug, Clone, Copy)]
pub struct JobBuilder<'a> {
    target: &'a Target,
    layout: &'a OutputLayout,
}

impl<'a> JobBuilder<'a> {
    pub fn new(target: &'a Target, layout: &'a OutputLayout) -> Self {
        Self { target, layout }
    }

    fn job(&self, kind: JobKind, database: Option<&str>, table: Option<&str>, command: String) -> Job {
        let t = self.target;
        let db_segment = database.unwrap_or(ROLES_DATABASE);
        let mode = mode_for(kind, table);
        let mut name = format!("{}:{}:{}:{}:{}", t.dbtype, t.host, t.server, t.port, db_segment);
        if let Some(table) = table {
            name.push(':');
            name.push_str(table);
        }
        Job {
            kind,
            database: database.map(str::to_string),
            table: table.map(str::to_string),
            command,
            stdout_path: self.layout.dump_path(t, db_segment, &mode),
            stderr_path: self.layout.error_path(t, db_segment, &mode),
            name,
        }
    }

    pub fn roles(&self) -> Job {
        self.job(JobKind::Roles, None, None, Commands::new(self.target).roles())
    }

    pub fn schema(&self, database: &str) -> Job {
        let cmd = Commands::new(self.target).schema(database);
        self.job(JobKind::Schema, Some(database), None, cmd)
    }

    pub fn data(&self, database: &str, table: &str) -> Job {
        let cmd = Commands::new(self.target).data(database, table);
        self.job(JobKind::Data, Some(database), Some(table), cmd)
    }
}

/// Databases chosen for a full dump and for a schema-only dump, in discovery order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DatabaseSelection {
    pub full: Vec<String>,
    pub structure_only: Vec<String>,
}

impl DatabaseSelection {
    pub fn classify(filters: &FilterSet, databases: &[String]) -> Self {
        let mut selection = Self::default();
        for database in databases {
            match filters.scope(database) {
                Scope::Full => selection.full.push(database.clone()),
                Scope::StructureOnly => selection.structure_only.push(database.clone()),
                Scope::Excluded | Scope::Skipped => {}
            }
        }
        selection
    }
}

/// Jobs for one target plus the database selection they were built from.
#[derive(Debug, Clone)]
pub struct JobPlan {
    pub jobs: Vec<Job>,
    pub selection: DatabaseSelection,
}

/// Build the job list from discovery results.
///
/// Order: the roles job, then each database in discovery order with its schema
/// job before its data jobs. `tables` only needs entries for databases in full
/// scope; a missing or empty entry yields no data jobs.
pub fn plan_jobs(
    target: &Target,
    filters: &FilterSet,
    layout: &OutputLayout,
    databases: &[String],
    tables: &HashMap<String, TableListing>,
) -> Vec<Job> {
    let builder = JobBuilder::new(target, layout);
    let mut jobs = vec![builder.roles()];
    for database in databases {
        match filters.scope(database) {
            Scope::Full => {
                jobs.push(builder.schema(database));
                if let Some(listing) = tables.get(database).filter(|l| !l.is_empty()) {
                    jobs.extend(listing.tables.iter().map(|t| builder.data(database, t)));
                }
            }
            Scope::StructureOnly => jobs.push(builder.schema(database)),
            Scope::Excluded => tracing::debug!(database = %database, "excluded"),
            Scope::Skipped => tracing::debug!(database = %database, "not included, skipped"),
        }
    }
    jobs
}

/// Discover databases and tables for `target` and build its job plan.
///
/// Any discovery failure aborts the whole target: without a complete topology
/// the job set cannot be built safely.
pub async fn build_jobs(
    discoverer: &Discoverer,
    target: &Target,
    filters: &FilterSet,
    layout: &OutputLayout,
) -> Result<JobPlan, DiscoveryError> {
    let databases = discoverer.list_databases(target).await?;
    let selection = DatabaseSelection::classify(filters, &databases);
    let mut tables = HashMap::new();
    for database in &selection.full {
        let listing = discoverer.list_tables(target, database).await?;
        tracing::debug!(
            target = %target.label(),
            database = %database,
            tables = listing.count,
            "tables discovered"
        );
        tables.insert(database.clone(), listing);
    }
    let jobs = plan_jobs(target, filters, layout, &databases, &tables);
    tracing::info!(
        target = %target.label(),
        databases = databases.len(),
        full = selection.full.len(),
        structure_only = selection.structure_only.len(),
        jobs = jobs.len(),
        "job list built"
    );
    Ok(JobPlan { jobs, selection })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::target::DbType;
    use std::collections::HashSet;

    fn target() -> Target {
        Target {
            host: "web01".to_string(),
            dbtype: DbType::Postgres,
            user: "postgres".to_string(),
            password: "pw".to_string(),
            server: "127.0.0.1".to_string(),
            port: 5432,
        }
    }

    fn names(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    fn filters(include: &[&str], exclude: &[&str], structure_only: &[&str]) -> FilterSet {
        FilterSet::new(&names(include), &names(exclude), &names(structure_only)).unwrap()
    }

    fn topology() -> (Vec<String>, HashMap<String, TableListing>) {
        let dbs = names(&["app_db", "tmp_cache", "staging_app"]);
        let mut tables = HashMap::new();
        for (db, t) in [
            ("app_db", vec!["users", "orders"]),
            ("tmp_cache", vec!["entries"]),
            ("staging_app", vec!["users"]),
        ] {
            let t = names(&t);
            tables.insert(
                db.to_string(),
                TableListing {
                    count: t.len(),
                    tables: t,
                },
            );
        }
        (dbs, tables)
    }

    fn summary(jobs: &[Job]) -> Vec<(JobKind, Option<String>, Option<String>)> {
        jobs.iter()
            .map(|j| (j.kind, j.database.clone(), j.table.clone()))
            .collect()
    }

    fn layout() -> OutputLayout {
        OutputLayout::new("/d", "/e")
    }

    #[test]
    fn include_exclude_scenario() {
        let (dbs, tables) = topology();
        let jobs = plan_jobs(&target(), &filters(&[".*app.*"], &["^tmp_"], &[]), &layout(), &dbs, &tables);
        let s = |k, d: &str, t: Option<&str>| (k, Some(d.to_string()), t.map(str::to_string));
        assert_eq!(
            summary(&jobs),
            vec![
                (JobKind::Roles, None, None),
                s(JobKind::Schema, "app_db", None),
                s(JobKind::Data, "app_db", Some("users")),
                s(JobKind::Data, "app_db", Some("orders")),
                s(JobKind::Schema, "staging_app", None),
                s(JobKind::Data, "staging_app", Some("users")),
            ]
        );
    }

    #[test]
    fn structure_only_adds_schema_for_excluded() {
        let (dbs, tables) = topology();
        let jobs = plan_jobs(
            &target(),
            &filters(&[".*app.*"], &["^tmp_"], &["^tmp_"]),
            &layout(),
            &dbs,
            &tables,
        );
        let tmp: Vec<_> = jobs
            .iter()
            .filter(|j| j.database.as_deref() == Some("tmp_cache"))
            .collect();
        assert_eq!(tmp.len(), 1);
        assert_eq!(tmp[0].kind, JobKind::Schema);
    }

    #[test]
    fn exactly_one_roles_job_even_when_nothing_matches() {
        let (dbs, tables) = topology();
        let jobs = plan_jobs(&target(), &FilterSet::default(), &layout(), &dbs, &tables);
        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].kind, JobKind::Roles);
        assert_eq!(jobs[0].database, None);
        assert_eq!(jobs[0].name, "postgres:web01:127.0.0.1:5432:all");
        assert_eq!(
            jobs[0].stdout_path,
            std::path::PathBuf::from("/d/web01/postgres/127.0.0.1/5432/all/roles.sql")
        );
    }

    #[test]
    fn empty_listing_gives_schema_only() {
        let dbs = names(&["empty"]);
        let mut tables = HashMap::new();
        tables.insert("empty".to_string(), TableListing::default());
        let jobs = plan_jobs(&target(), &filters(&[".*"], &[], &[]), &layout(), &dbs, &tables);
        assert_eq!(
            summary(&jobs),
            vec![
                (JobKind::Roles, None, None),
                (JobKind::Schema, Some("empty".to_string()), None)
            ]
        );
    }

    #[test]
    fn identical_inputs_give_identical_job_sets() {
        let (dbs, tables) = topology();
        let f = filters(&[".*"], &["^tmp_"], &["^tmp_"]);
        let a: HashSet<Job> = plan_jobs(&target(), &f, &layout(), &dbs, &tables).into_iter().collect();
        let b: HashSet<Job> = plan_jobs(&target(), &f, &layout(), &dbs, &tables).into_iter().collect();
        assert_eq!(a, b);
    }

    #[test]
    fn data_job_carries_table_name_and_paths() {
        let t = target();
        let l = layout();
        let job = JobBuilder::new(&t, &l).data("app_db", "users");
        assert_eq!(job.mode(), "data-users");
        assert_eq!(job.name, "postgres:web01:127.0.0.1:5432:app_db:users");
        assert_eq!(
            job.stderr_path,
            std::path::PathBuf::from("/e/web01-postgres-127.0.0.1-5432-app_db-data-users.err")
        );
        assert!(job.command.contains("--table='public.\"users\"'"));
    }

    #[test]
    fn selection_splits_full_and_structure_only() {
        let (dbs, _) = topology();
        let sel = DatabaseSelection::classify(&filters(&[".*app.*"], &["^tmp_"], &["^tmp_"]), &dbs);
        assert_eq!(sel.full, names(&["app_db", "staging_app"]));
        assert_eq!(sel.structure_only, names(&["tmp_cache"]));
        assert_eq!(DatabaseSelection::classify(&FilterSet::default(), &dbs), DatabaseSelection::default());
    }
}
