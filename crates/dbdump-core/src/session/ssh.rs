//! OpenSSH-backed sessions.
//!
//! Each session starts its own control master (`ssh -M -S <socket> -N`) in a
//! private temp directory; remote commands are multiplexed over that socket and
//! `close` sends `-O exit`. The master child is killed on drop, so a session
//! abandoned by a timeout or a panic does not leave a connection behind.

use async_trait::async_trait;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tempfile::TempDir;
use tokio::io::AsyncReadExt;
use tokio::process::{Child, Command};

use super::{CommandOutput, Connector, Session, SessionError};
use crate::config::SshConfig;

const READY_POLL: Duration = Duration::from_millis(100);

/// Connects to SSH hosts using the system `ssh` client.
#[derive(Debug, Clone)]
pub struct SshConnector {
    cfg: SshConfig,
    connect_timeout: Duration,
}

impl SshConnector {
    /// `connect_timeout` is passed to ssh as `ConnectTimeout`; the retry loop
    /// enforces its own per-attempt bound on top of it.
    pub fn new(cfg: SshConfig, connect_timeout: Duration) -> Self {
        Self {
            cfg,
            connect_timeout,
        }
    }

    /// Options shared by the master and every multiplexed client.
    fn base_args(&self) -> Vec<OsString> {
        let mut args: Vec<OsString> = Vec::new();
        let mut opt = |o: String| {
            args.push("-o".into());
            args.push(o.into());
        };
        opt("BatchMode=yes".to_string());
        opt("LogLevel=ERROR".to_string());
        opt("StrictHostKeyChecking=no".to_string());
        opt("UserKnownHostsFile=/dev/null".to_string());
        opt(format!("ConnectTimeout={}", self.connect_timeout.as_secs().max(1)));
        opt(format!("ServerAliveInterval={}", self.cfg.keepalive_interval_secs));
        opt(format!("ServerAliveCountMax={}", self.cfg.keepalive_count_max));
        args.push("-l".into());
        args.push(self.cfg.user.clone().into());
        if let Some(port) = self.cfg.port {
            args.push("-p".into());
            args.push(port.to_string().into());
        }
        if let Some(key) = &self.cfg.identity_file {
            args.push("-i".into());
            args.push(key.clone().into_os_string());
        }
        args
    }

    fn spawn_err(&self, source: std::io::Error) -> SessionError {
        SessionError::Spawn {
            program: self.cfg.program.clone(),
            source,
        }
    }
}

#[async_trait]
impl Connector for SshConnector {
    async fn connect(&self, host: &str) -> Result<Box<dyn Session>, SessionError> {
        let socket_dir = tempfile::Builder::new().prefix("dbdump-ssh-").tempdir()?;
        let socket = socket_dir.path().join("ctl");
        let base_args = self.base_args();

        let master = Command::new(&self.cfg.program)
            .args(&base_args)
            .arg("-M")
            .arg("-S")
            .arg(&socket)
            .arg("-N")
            .arg(host)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| self.spawn_err(e))?;

        let mut session = SshSession {
            program: self.cfg.program.clone(),
            host: host.to_string(),
            base_args,
            socket,
            master,
            _socket_dir: socket_dir,
            closed: false,
        };

        loop {
            if let Some(status) = session.master.try_wait()? {
                let mut stderr = String::new();
                if let Some(mut pipe) = session.master.stderr.take() {
                    let _ = pipe.read_to_string(&mut stderr).await;
                }
                return Err(SessionError::MasterExited {
                    host: host.to_string(),
                    status: status.code().unwrap_or(-1),
                    stderr: stderr.trim().to_string(),
                });
            }
            if session.control("check").await? {
                break;
            }
            tokio::time::sleep(READY_POLL).await;
        }

        if let Some(pipe) = session.master.stderr.take() {
            // Keep reading so a chatty master never blocks on a full pipe.
            tokio::spawn(drain(pipe));
        }
        tracing::trace!(host, socket = %session.socket.display(), "ssh control master ready");
        Ok(Box::new(session))
    }
}

async fn drain(mut pipe: tokio::process::ChildStderr) {
    let mut sink = Vec::new();
    let _ = pipe.read_to_end(&mut sink).await;
}

/// A live control master plus what is needed to multiplex commands over it.
pub struct SshSession {
    program: String,
    host: String,
    base_args: Vec<OsString>,
    socket: PathBuf,
    master: Child,
    _socket_dir: TempDir,
    closed: bool,
}

impl SshSession {
    fn client(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.base_args)
            .arg("-S")
            .arg(&self.socket)
            .arg("-o")
            .arg("ControlMaster=no")
            .stdin(Stdio::null());
        cmd
    }

    /// `ssh -O <op>`; true when the master accepted the request.
    async fn control(&self, op: &str) -> Result<bool, SessionError> {
        let status = self
            .client()
            .arg("-O")
            .arg(op)
            .arg(&self.host)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await
            .map_err(|source| SessionError::Spawn {
                program: self.program.clone(),
                source,
            })?;
        Ok(status.success())
    }
}

#[async_trait]
impl Session for SshSession {
    async fn exec(&mut self, command: &str) -> Result<CommandOutput, SessionError> {
        if self.closed {
            return Err(SessionError::Closed);
        }
        let out = self
            .client()
            .arg(&self.host)
            .arg(command)
            .output()
            .await?;
        Ok(CommandOutput {
            exit_code: out.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&out.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&out.stderr).into_owned(),
        })
    }

    async fn exec_to_files(
        &mut self,
        command: &str,
        stdout: &Path,
        stderr: &Path,
    ) -> Result<i32, SessionError> {
        if self.closed {
            return Err(SessionError::Closed);
        }
        let out_file = tokio::fs::File::create(stdout).await?.into_std().await;
        let err_file = tokio::fs::File::create(stderr).await?.into_std().await;
        let status = self
            .client()
            .arg(&self.host)
            .arg(command)
            .stdout(Stdio::from(out_file))
            .stderr(Stdio::from(err_file))
            .status()
            .await?;
        Ok(status.code().unwrap_or(-1))
    }

    async fn close(&mut self) -> Result<(), SessionError> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        if !self.control("exit").await.unwrap_or(false) {
            tracing::debug!(host = %self.host, "ssh -O exit refused, killing master");
            let _ = self.master.kill().await;
        }
        let _ = self.master.wait().await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn connector(cfg: SshConfig) -> SshConnector {
        SshConnector::new(cfg, Duration::from_secs(10))
    }

    fn args_as_strings(c: &SshConnector) -> Vec<String> {
        c.base_args()
            .into_iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect()
    }

    #[test]
    fn base_args_carry_user_and_keepalive() {
        let args = args_as_strings(&connector(SshConfig::default()));
        assert!(args.contains(&"BatchMode=yes".to_string()));
        assert!(args.contains(&"StrictHostKeyChecking=no".to_string()));
        assert!(args.contains(&"ServerAliveInterval=600".to_string()));
        assert!(args.contains(&"ServerAliveCountMax=10000".to_string()));
        assert!(args.contains(&"ConnectTimeout=10".to_string()));
        let l = args.iter().position(|a| a == "-l").unwrap();
        assert_eq!(args[l + 1], "rbackup");
        assert!(!args.contains(&"-p".to_string()));
        assert!(!args.contains(&"-i".to_string()));
    }

    #[test]
    fn base_args_include_port_and_identity_when_set() {
        let cfg = SshConfig {
            port: Some(2222),
            identity_file: Some(PathBuf::from("/etc/bb/sshkeys/rbackup.oss")),
            ..SshConfig::default()
        };
        let args = args_as_strings(&connector(cfg));
        let p = args.iter().position(|a| a == "-p").unwrap();
        assert_eq!(args[p + 1], "2222");
        let i = args.iter().position(|a| a == "-i").unwrap();
        assert_eq!(args[i + 1], "/etc/bb/sshkeys/rbackup.oss");
    }

    #[tokio::test]
    async fn missing_ssh_binary_is_a_spawn_error() {
        let cfg = SshConfig {
            program: "/nonexistent/dbdump-test-ssh".to_string(),
            ..SshConfig::default()
        };
        let err = match connector(cfg).connect("localhost").await {
            Err(e) => e,
            Ok(_) => panic!("expected spawn failure"),
        };
        assert!(matches!(err, SessionError::Spawn { .. }));
        assert_eq!(err.kind(), "spawn");
    }

    #[tokio::test]
    async fn exec_to_files_on_closed_session_is_refused() {
        let dir = tempfile::tempdir().unwrap();
        let master = Command::new("true")
            .kill_on_drop(true)
            .spawn()
            .unwrap();
        let mut session = SshSession {
            program: "/nonexistent/dbdump-test-ssh".to_string(),
            host: "localhost".to_string(),
            base_args: Vec::new(),
            socket: dir.path().join("ctl"),
            master,
            _socket_dir: tempfile::tempdir().unwrap(),
            closed: true,
        };
        let out = dir.path().join("out.sql");
        let err = session
            .exec_to_files("true", &out, &dir.path().join("out.err"))
            .await
            .unwrap_err();
        assert!(matches!(err, SessionError::Closed));
        assert!(!out.exists());
    }

    #[tokio::test]
    async fn exec_to_files_truncates_outputs_before_running() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out.sql");
        let err = dir.path().join("out.err");
        std::fs::write(&out, b"stale dump").unwrap();
        let master = Command::new("true").kill_on_drop(true).spawn().unwrap();
        let mut session = SshSession {
            program: "/nonexistent/dbdump-test-ssh".to_string(),
            host: "localhost".to_string(),
            base_args: Vec::new(),
            socket: dir.path().join("ctl"),
            master,
            _socket_dir: tempfile::tempdir().unwrap(),
            closed: false,
        };
        // the client binary is missing, but both files are created first
        let res = session.exec_to_files("true", &out, &err).await;
        assert!(matches!(res, Err(SessionError::Io(_))));
        assert_eq!(std::fs::read(&out).unwrap(), b"");
        assert!(err.exists());
    }
}
