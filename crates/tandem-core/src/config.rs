//! Optional config from .tandemrc or ~/.tandemrc (JSON). Merged with env and CLI.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{Result, TandemError};
use crate::pool::PoolConfig;
use crate::timer::DEFAULT_SLOW_OPERATION_MS;

const RC_FILE: &str = ".tandemrc";

/// Env var overriding the configured worker count
pub const WORKERS_ENV: &str = "TANDEM_WORKERS";

/// Optional config from file. Env and CLI override these.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct Config {
    /// Worker count; None = available hardware concurrency
    pub workers: Option<usize>,
    pub thread_name_prefix: String,
    pub slow_operation_ms: u64,
    /// Record file for the names demo
    pub data_file: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            workers: None,
            thread_name_prefix: PoolConfig::default().thread_name_prefix,
            slow_operation_ms: DEFAULT_SLOW_OPERATION_MS,
            data_file: None,
        }
    }
}

impl Config {
    pub fn pool_config(&self) -> PoolConfig {
        let config = PoolConfig::new().thread_name_prefix(self.thread_name_prefix.clone());
        match self.workers {
            Some(n) => config.workers(n),
            None => config,
        }
    }

    /// Apply `TANDEM_WORKERS` when it is set and non-empty.
    pub fn apply_env(&mut self) -> Result<()> {
        match std::env::var(WORKERS_ENV) {
            Ok(raw) => self.apply_workers_override(WORKERS_ENV, &raw),
            Err(_) => Ok(()),
        }
    }

    /// Override `workers` from a textual source. Blank input is ignored.
    pub fn apply_workers_override(&mut self, source: &str, raw: &str) -> Result<()> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Ok(());
        }
        let count = raw.parse::<usize>().map_err(|_| {
            TandemError::Config(format!("{}: expected a worker count, got {:?}", source, raw))
        })?;
        self.set_workers(source, count)
    }

    /// Set the worker count. Zero is rejected.
    pub fn set_workers(&mut self, source: &str, count: usize) -> Result<()> {
        validate_workers(source, Some(count))?;
        self.workers = Some(count);
        Ok(())
    }
}

fn validate_workers(source: &str, workers: Option<usize>) -> Result<()> {
    if workers == Some(0) {
        return Err(TandemError::Config(format!(
            "{}: workers must be at least 1",
            source
        )));
    }
    Ok(())
}

/// Load config from .tandemrc in dir, then ~/.tandemrc. Missing or invalid file = default.
pub fn load_config(dir: &Path) -> Config {
    let mut candidates = vec![dir.join(RC_FILE)];
    if let Some(home) = dirs::home_dir() {
        candidates.push(home.join(RC_FILE));
    }
    for path in &candidates {
        if path.is_file() {
            match load_config_file(path) {
                Ok(cfg) => return cfg,
                Err(e) => {
                    log::warn!("ignoring {}: {}", path.display(), e);
                }
            }
            break;
        }
    }
    Config::default()
}

/// Load an explicit config file; errors are reported, not defaulted.
pub fn load_config_file(path: &Path) -> Result<Config> {
    let raw = std::fs::read_to_string(path)?;
    let cfg: Config = serde_json::from_str(&raw)?;
    validate_workers(&path.display().to_string(), cfg.workers)?;
    log::debug!("loaded config from {}", path.display());
    Ok(cfg)
}
