//! Remote session abstraction.
//!
//! A [`Connector`] performs one authentication attempt and hands back a
//! [`Session`]; the [`ConnectionSupplier`] wraps it in the retry policy. Each
//! session belongs to exactly one caller and must be closed by it.

mod ssh;
mod supplier;

pub use ssh::SshConnector;
pub use supplier::ConnectionSupplier;

use async_trait::async_trait;
use std::io;
use std::path::Path;
use thiserror::Error;

/// Captured result of a remote command run for its output (discovery queries).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },
    #[error("ssh master for {host} exited with status {status}: {stderr}")]
    MasterExited {
        host: String,
        status: i32,
        stderr: String,
    },
    #[error("connection refused: {0}")]
    Refused(String),
    #[error("session already closed")]
    Closed,
    #[error("session i/o: {0}")]
    Io(#[from] io::Error),
}

impl SessionError {
    pub fn kind(&self) -> &'static str {
        match self {
            SessionError::Spawn { .. } => "spawn",
            SessionError::MasterExited { .. } => "handshake",
            SessionError::Refused(_) => "refused",
            SessionError::Closed => "closed",
            SessionError::Io(_) => "io",
        }
    }
}

/// An authenticated connection to one SSH host.
#[async_trait]
pub trait Session: Send {
    /// Run `command` remotely and capture stdout and stderr.
    async fn exec(&mut self, command: &str) -> Result<CommandOutput, SessionError>;

    /// Run `command` remotely with stdout written to `stdout` and stderr to
    /// `stderr` (both local files, truncated). Returns the remote exit status.
    async fn exec_to_files(
        &mut self,
        command: &str,
        stdout: &Path,
        stderr: &Path,
    ) -> Result<i32, SessionError>;

    /// Tear the connection down. Safe to call more than once.
    async fn close(&mut self) -> Result<(), SessionError>;
}

/// Opens sessions. One call is one attempt; retries live in [`ConnectionSupplier`].
#[async_trait]
pub trait Connector: Send + Sync {
    async fn connect(&self, host: &str) -> Result<Box<dyn Session>, SessionError>;
}

/// Close `session`, logging instead of failing; used on every exit path.
pub async fn close_quietly(session: &mut dyn Session, host: &str) {
    if let Err(e) = session.close().await {
        tracing::debug!(host, error = %e, "closing ssh session failed");
    }
}
