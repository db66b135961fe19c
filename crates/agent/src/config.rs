//! TOML configuration for the nebula agent.
//!
//! Every key is optional; a missing file or section falls back to the
//! defaults below.

use std::path::{Path, PathBuf};

use anyhow::{Context, ensure};
use nebula_primitives::DEFAULT_CHUNK_SIZE;
use serde::Deserialize;

/// Largest file `chunk` accepts by default (100 MiB).
pub(crate) const DEFAULT_MAX_FILE_SIZE: u64 = 100 * 1024 * 1024;

/// Top-level configuration, parsed from TOML.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct AgentConfig {
    /// Chunking and local storage.
    pub(crate) storage: StorageSection,
    /// Logging configuration.
    pub(crate) log: LogSection,
}

/// `[storage]` section.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub(crate) struct StorageSection {
    /// Root of the local chunk cache.
    pub(crate) data_dir: PathBuf,
    /// Scratch space for partially assembled files.
    pub(crate) temp_dir: PathBuf,
    /// Chunk size in bytes.
    pub(crate) chunk_size: usize,
    /// Largest file accepted for chunking, in bytes.
    pub(crate) max_file_size: u64,
}

impl Default for StorageSection {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./data"),
            temp_dir: PathBuf::from("./temp"),
            chunk_size: DEFAULT_CHUNK_SIZE,
            max_file_size: DEFAULT_MAX_FILE_SIZE,
        }
    }
}

/// `[log]` section.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub(crate) struct LogSection {
    /// Log level filter (e.g. `"info"`, `"debug"`), overridden by `RUST_LOG`.
    pub(crate) level: String,
}

impl Default for LogSection {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl AgentConfig {
    /// Load config from a TOML file, or use defaults if no path given.
    pub(crate) fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        match path {
            Some(p) => {
                let content = std::fs::read_to_string(p)
                    .with_context(|| format!("failed to read {}", p.display()))?;
                let config: Self = toml::from_str(&content)
                    .with_context(|| format!("failed to parse {}", p.display()))?;
                Ok(config)
            }
            None => Ok(Self::default()),
        }
    }

    /// Parse config from a TOML string (used in tests).
    #[cfg(test)]
    pub(crate) fn from_toml(s: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(s)?)
    }

    /// Apply command-line overrides.
    pub(crate) fn with_overrides(
        mut self,
        chunk_size: Option<usize>,
        data_dir: Option<PathBuf>,
    ) -> Self {
        if let Some(size) = chunk_size {
            self.storage.chunk_size = size;
        }
        if let Some(dir) = data_dir {
            self.storage.data_dir = dir;
        }
        self
    }

    /// Reject values the agent cannot run with.
    pub(crate) fn validate(&self) -> anyhow::Result<()> {
        ensure!(
            self.storage.chunk_size > 0,
            "storage.chunk_size must be greater than zero"
        );
        ensure!(
            self.storage.max_file_size > 0,
            "storage.max_file_size must be greater than zero"
        );
        Ok(())
    }
}
