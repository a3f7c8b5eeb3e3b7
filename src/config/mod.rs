//! Pipeline configuration
//!
//! A single `PipelineConfig` is built at startup and handed to every
//! component. Values are layered, later layers winning:
//!
//! 1. Hardcoded defaults
//! 2. Optional TOML file (`--config`)
//! 3. Command-line flags
//!
//! Database credentials are only ever read from the environment
//! (`TROLLEY_USERNAME`, `TROLLEY_PASSWORD`).

pub mod source;


pub use source::{Credentials, SourceConfig, JUNCTION_TABLE, PASSWORD_VAR, USERNAME_VAR};

use crate::error::{ExtractError, ExtractResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Number of junction rows fetched per chunk
pub const DEFAULT_PAGE_SIZE: u64 = 1_000_000;

/// Number of chunks extracted concurrently
pub const DEFAULT_WORKER_COUNT: usize = 4;

/// Configuration for one pipeline run
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PipelineConfig {
    /// Pull junctions from the source database before consolidating
    #[serde(default)]
    pub extraction_enabled: bool,

    /// Rows per chunk
    #[serde(default = "default_page_size")]
    pub page_size: u64,

    /// Maximum chunks extracted at once
    #[serde(default = "default_worker_count")]
    pub worker_count: usize,

    /// Directory holding per-chunk CSV files
    #[serde(default = "default_vertices_dir")]
    pub vertices_dir: PathBuf,

    /// Directory receiving the consolidated gzip outputs
    #[serde(default = "default_condensed_dir")]
    pub condensed_dir: PathBuf,

    /// Draw progress bars on stderr
    #[serde(default = "default_true")]
    pub show_progress: bool,

    /// Source database location
    #[serde(default)]
    pub source: SourceConfig,

    /// Database credentials, taken from the environment only
    #[serde(skip)]
    pub credentials: Option<Credentials>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            extraction_enabled: false,
            page_size: DEFAULT_PAGE_SIZE,
            worker_count: DEFAULT_WORKER_COUNT,
            vertices_dir: default_vertices_dir(),
            condensed_dir: default_condensed_dir(),
            show_progress: true,
            source: SourceConfig::default(),
            credentials: None,
        }
    }
}

impl PipelineConfig {
    /// Load configuration from a TOML file, falling back to defaults for
    /// every field the file leaves out
    pub fn from_file(path: &Path) -> ExtractResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ExtractError::configuration(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Self::from_toml(&content).map_err(|e| {
            ExtractError::configuration(format!("Invalid config file {}: {}", path.display(), e))
        })
    }

    /// Parse configuration from TOML text
    pub fn from_toml(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Attach credentials read from the process environment
    pub fn with_env_credentials(mut self) -> Self {
        self.credentials = Credentials::from_env();
        self
    }

    /// Check that numeric settings are usable
    pub fn validate(&self) -> ExtractResult<()> {
        if self.page_size == 0 {
            return Err(ExtractError::configuration("page_size must be greater than 0"));
        }
        if self.worker_count == 0 {
            return Err(ExtractError::configuration(
                "worker_count must be greater than 0",
            ));
        }
        Ok(())
    }

    /// Credentials needed for extraction, or a configuration error naming
    /// the environment variables to set
    pub fn require_credentials(&self) -> ExtractResult<&Credentials> {
        self.credentials.as_ref().ok_or_else(|| {
            ExtractError::configuration(format!(
                "must set {} and {} environment variables",
                USERNAME_VAR, PASSWORD_VAR
            ))
        })
    }
}

fn default_page_size() -> u64 {
    DEFAULT_PAGE_SIZE
}

fn default_worker_count() -> usize {
    DEFAULT_WORKER_COUNT
}

fn default_vertices_dir() -> PathBuf {
    PathBuf::from("tomtom-vertices")
}

fn default_condensed_dir() -> PathBuf {
    PathBuf::from("tomtom-condensed")
}

fn default_true() -> bool {
    true
}
