use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::retry::ConnectPolicy;

/// Connection policy (optional section in config.toml).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionConfig {
    /// Maximum number of SSH connection attempts (including the first).
    pub max_attempts: u32,
    /// Upper bound for a single attempt, in seconds.
    pub attempt_timeout_secs: u64,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            max_attempts: 10,
            attempt_timeout_secs: 10,
        }
    }
}

impl ConnectionConfig {
    pub fn policy(&self) -> ConnectPolicy {
        ConnectPolicy {
            max_attempts: self.max_attempts.max(1),
            attempt_timeout: Duration::from_secs(self.attempt_timeout_secs.max(1)),
        }
    }
}

/// OpenSSH client options used for every session.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SshConfig {
    /// ssh binary (resolved through PATH unless absolute).
    pub program: String,
    /// Remote login user on the SSH host.
    pub user: String,
    /// Private key passed with `-i`; ssh defaults apply when unset.
    pub identity_file: Option<PathBuf>,
    /// SSH port; ssh defaults apply when unset.
    pub port: Option<u16>,
    pub keepalive_interval_secs: u64,
    pub keepalive_count_max: u32,
}

impl Default for SshConfig {
    fn default() -> Self {
        Self {
            program: "ssh".to_string(),
            user: "rbackup".to_string(),
            identity_file: None,
            port: None,
            keepalive_interval_secs: 600,
            keepalive_count_max: 10_000,
        }
    }
}

/// Global configuration loaded from `~/.config/dbdump/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DumpConfig {
    /// Maximum number of dump jobs running at once per target.
    pub concurrency: usize,
    /// Root directory for `.sql` dump files.
    pub dump_destination: PathBuf,
    /// Root directory for per-job `.err` files.
    pub dump_error: PathBuf,
    /// Extension of target descriptor files when scanning a directory.
    pub target_extension: String,
    pub connection: ConnectionConfig,
    pub ssh: SshConfig,
}

impl Default for DumpConfig {
    fn default() -> Self {
        Self {
            concurrency: 8,
            dump_destination: PathBuf::from("/backup/data"),
            dump_error: PathBuf::from("/backup/error"),
            target_extension: "toml".to_string(),
            connection: ConnectionConfig::default(),
            ssh: SshConfig::default(),
        }
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("dbdump")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<DumpConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = DumpConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }
    load_from_path(&path)
}

/// Load configuration from an explicit file (`--config`).
pub fn load_from_path(path: &Path) -> Result<DumpConfig> {
    let data = fs::read_to_string(path)
        .with_context(|| format!("read config: {}", path.display()))?;
    let cfg: DumpConfig =
        toml::from_str(&data).with_context(|| format!("parse config: {}", path.display()))?;
    Ok(cfg)
}
