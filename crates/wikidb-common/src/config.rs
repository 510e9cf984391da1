use std::path::PathBuf;

use serde::Deserialize;

use crate::error::{Error, Result};

fn default_prepare_timeout_ms() -> u64 {
    5000
}

fn default_commit_timeout_ms() -> u64 {
    5000
}

fn default_log_directive() -> String {
    "info".to_owned()
}

/// Immutable, once-read node configuration.
///
/// Constructed once at process startup and threaded explicitly into the
/// coordinator/replica/node constructors; nothing in this crate reaches for a
/// global config singleton.
#[derive(Clone, Debug, Deserialize)]
pub struct Config {
    pub this_ip: String,
    pub port: u16,
    pub coordinator: String,
    pub replicas: Vec<String>,

    #[serde(default)]
    pub data_dir: Option<PathBuf>,

    #[serde(default = "default_prepare_timeout_ms")]
    pub prepare_timeout_ms: u64,

    #[serde(default = "default_commit_timeout_ms")]
    pub commit_timeout_ms: u64,

    #[serde(default)]
    pub log: LogConfig,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct LogConfig {
    #[serde(default = "default_log_directive")]
    pub directive: String,
}

impl Config {
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        toml::from_str(raw).map_err(|e| Error::Config(e.to_string()))
    }

    pub fn from_file(path: &std::path::Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("reading {}: {e}", path.display())))?;
        Self::from_toml_str(&raw)
    }

    /// True iff this node is the single statically-configured coordinator:
    /// a node assumes the coordinator role iff `this_ip == coordinator`.
    pub fn is_coordinator(&self) -> bool {
        self.this_ip == self.coordinator
    }

    pub fn data_dir(&self) -> PathBuf {
        self.data_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from(format!("./data/{}-{}", self.this_ip, self.port)))
    }

    pub fn prepare_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.prepare_timeout_ms)
    }

    pub fn commit_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.commit_timeout_ms)
    }
}
