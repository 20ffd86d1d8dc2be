//! Scripted in-memory SSH connector.
//!
//! Commands are answered by a script closure; dump commands run through
//! `exec_to_files` write the scripted stdout/stderr to the given files after an
//! optional delay. Counters record connects, closes and concurrently running
//! dumps so tests can check scheduling invariants.

#![allow(dead_code)]

use async_trait::async_trait;
use dbdump_core::session::{CommandOutput, Connector, Session, SessionError};
use std::path::Path;
use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub type Script = dyn Fn(&str) -> CommandOutput + Send + Sync;

pub fn ok(stdout: &str) -> CommandOutput {
    CommandOutput {
        exit_code: 0,
        stdout: stdout.to_string(),
        stderr: String::new(),
    }
}

pub fn fail(exit_code: i32, stderr: &str) -> CommandOutput {
    CommandOutput {
        exit_code,
        stdout: String::new(),
        stderr: stderr.to_string(),
    }
}

#[derive(Default)]
pub struct Stats {
    pub connect_attempts: AtomicU32,
    pub connects: AtomicU32,
    pub closes: AtomicU32,
    pub running: AtomicUsize,
    pub peak_running: AtomicUsize,
    pub commands: Mutex<Vec<String>>,
}

impl Stats {
    pub fn commands(&self) -> Vec<String> {
        self.commands.lock().unwrap().clone()
    }
}

pub struct FakeConnector {
    script: Arc<Script>,
    failures_left: AtomicU32,
    dump_delay: Duration,
    pub stats: Arc<Stats>,
}

impl FakeConnector {
    pub fn new(script: impl Fn(&str) -> CommandOutput + Send + Sync + 'static) -> Self {
        Self {
            script: Arc::new(script),
            failures_left: AtomicU32::new(0),
            dump_delay: Duration::ZERO,
            stats: Arc::new(Stats::default()),
        }
    }

    /// The first `n` connection attempts are refused.
    pub fn failing_first(self, n: u32) -> Self {
        self.failures_left.store(n, Ordering::SeqCst);
        self
    }

    pub fn with_dump_delay(mut self, delay: Duration) -> Self {
        self.dump_delay = delay;
        self
    }
}

#[async_trait]
impl Connector for FakeConnector {
    async fn connect(&self, host: &str) -> Result<Box<dyn Session>, SessionError> {
        let attempt = self.stats.connect_attempts.fetch_add(1, Ordering::SeqCst) + 1;
        let refused = self
            .failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if refused {
            return Err(SessionError::Refused(format!("{} attempt {}", host, attempt)));
        }
        self.stats.connects.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(FakeSession {
            script: Arc::clone(&self.script),
            delay: self.dump_delay,
            stats: Arc::clone(&self.stats),
            closed: false,
        }))
    }
}

struct FakeSession {
    script: Arc<Script>,
    delay: Duration,
    stats: Arc<Stats>,
    closed: bool,
}

struct RunningGuard<'a>(&'a Stats);

impl Drop for RunningGuard<'_> {
    fn drop(&mut self) {
        self.0.running.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl Session for FakeSession {
    async fn exec(&mut self, command: &str) -> Result<CommandOutput, SessionError> {
        self.stats.commands.lock().unwrap().push(command.to_string());
        Ok((self.script)(command))
    }

    async fn exec_to_files(
        &mut self,
        command: &str,
        stdout: &Path,
        stderr: &Path,
    ) -> Result<i32, SessionError> {
        self.stats.commands.lock().unwrap().push(command.to_string());
        let now = self.stats.running.fetch_add(1, Ordering::SeqCst) + 1;
        let _guard = RunningGuard(&self.stats);
        self.stats.peak_running.fetch_max(now, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        let out = (self.script)(command);
        std::fs::write(stdout, out.stdout.as_bytes())?;
        std::fs::write(stderr, out.stderr.as_bytes())?;
        Ok(out.exit_code)
    }

    async fn close(&mut self) -> Result<(), SessionError> {
        if !self.closed {
            self.closed = true;
            self.stats.closes.fetch_add(1, Ordering::SeqCst);
        }
        Ok(())
    }
}

impl Drop for FakeSession {
    fn drop(&mut self) {
        // a session dropped without close (e.g. panic) still counts as torn down
        if !self.closed {
            self.stats.closes.fetch_add(1, Ordering::SeqCst);
        }
    }
}

/// Script answering discovery queries for `databases` (name, tables) in either
/// dbtype's dialect; every other command is a dump that succeeds.
pub fn topology_script(
    databases: &[(&str, &[&str])],
) -> impl Fn(&str) -> CommandOutput + Send + Sync + 'static {
    let databases: Vec<(String, Vec<String>)> = databases
        .iter()
        .map(|(d, t)| (d.to_string(), t.iter().map(|s| s.to_string()).collect()))
        .collect();
    move |cmd: &str| {
        if cmd.contains("SHOW DATABASES") || cmd.contains("FROM pg_database") {
            let names: Vec<&str> = databases.iter().map(|(d, _)| d.as_str()).collect();
            return ok(&format!("{}\n", names.join("\n")));
        }
        if cmd.contains("information_schema.tables") {
            let db = between(cmd, "table_schema = '", "'");
            let count = tables_of(&databases, db).len();
            return ok(&format!("{}\n", count));
        }
        if cmd.contains("SHOW TABLES") {
            let db = between(cmd, "-N -B ", " -e");
            return ok(&tables_of(&databases, db).join("\n"));
        }
        if cmd.contains("FROM pg_tables") {
            let db = between(cmd, " -d ", " -At");
            return ok(&tables_of(&databases, db).join("\n"));
        }
        ok("-- dump\n")
    }
}

fn tables_of<'a>(databases: &'a [(String, Vec<String>)], db: &str) -> &'a [String] {
    databases
        .iter()
        .find(|(d, _)| d == db)
        .map(|(_, t)| t.as_slice())
        .unwrap_or(&[])
}

fn between<'a>(s: &'a str, start: &str, end: &str) -> &'a str {
    let from = s.find(start).map(|i| i + start.len()).unwrap_or(0);
    let rest = &s[from..];
    let to = rest.find(end).unwrap_or(rest.len());
    &rest[..to]
}
