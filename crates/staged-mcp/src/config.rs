//! Configuration file support for staged-mcp.
//!
//! Loads `staged-mcp.toml` from the repository directory, falling back to
//! `<config dir>/staged-mcp/config.toml`.

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use staged_git::{SummaryLimits, DEFAULT_DIFF_MAX_BYTES};
use staged_runner::{RunnerConfig, DEFAULT_MAX_CONCURRENT, DEFAULT_TIMEOUT};

/// The per-repository config file name
pub const CONFIG_FILE_NAME: &str = "staged-mcp.toml";

/// Server configuration loaded from TOML
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(deny_unknown_fields, default)]
pub struct ServerConfig {
    /// git binary to run
    pub git_binary: PathBuf,
    /// Kill a git process that runs longer than this
    #[serde(with = "humantime_serde")]
    pub timeout: Duration,
    /// Maximum number of git processes running at once
    pub max_concurrent_commands: usize,
    /// Defaults for `get-staged-diff`
    pub diff: DiffDefaults,
    /// Defaults for `get-diff-summary`
    pub summary: SummaryDefaults,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields, default)]
pub struct DiffDefaults {
    pub max_bytes: usize,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields, default)]
pub struct SummaryDefaults {
    pub max_files: usize,
    pub max_hunks_per_file: usize,
    pub max_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            git_binary: PathBuf::from("git"),
            timeout: DEFAULT_TIMEOUT,
            max_concurrent_commands: DEFAULT_MAX_CONCURRENT,
            diff: DiffDefaults::default(),
            summary: SummaryDefaults::default(),
        }
    }
}

impl Default for DiffDefaults {
    fn default() -> Self {
        Self {
            max_bytes: DEFAULT_DIFF_MAX_BYTES,
        }
    }
}

impl Default for SummaryDefaults {
    fn default() -> Self {
        let limits = SummaryLimits::default();
        Self {
            max_files: limits.max_files,
            max_hunks_per_file: limits.max_hunks_per_file,
            max_bytes: limits.max_bytes,
        }
    }
}

impl SummaryDefaults {
    pub fn limits(&self) -> SummaryLimits {
        SummaryLimits {
            max_files: self.max_files,
            max_hunks_per_file: self.max_hunks_per_file,
            max_bytes: self.max_bytes,
        }
    }
}

impl ServerConfig {
    /// Load configuration.
    ///
    /// An explicit path must exist. Otherwise the repository file wins over
    /// the user config file, and defaults apply when neither exists. A file
    /// that exists but fails to parse is a hard error.
    pub fn load(explicit: Option<&Path>, repo_dir: &Path) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }

        let candidates = [
            Some(repo_dir.join(CONFIG_FILE_NAME)),
            dirs::config_dir().map(|dir| dir.join("staged-mcp").join("config.toml")),
        ];

        for path in candidates.into_iter().flatten() {
            if path.exists() {
                return Self::from_file(&path);
            }
        }

        Ok(Self::default())
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;

        let config: ServerConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))?;

        config
            .validate()
            .with_context(|| format!("Invalid configuration in {}", path.display()))?;

        tracing::debug!(path = %path.display(), "Loaded configuration");
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_concurrent_commands == 0 {
            bail!("max_concurrent_commands must be greater than zero");
        }
        if self.timeout.is_zero() {
            bail!("timeout must be greater than zero");
        }
        if self.diff.max_bytes == 0 {
            bail!("diff.max_bytes must be greater than zero");
        }
        self.summary.limits().validate()?;
        Ok(())
    }

    pub fn runner_config(&self) -> RunnerConfig {
        RunnerConfig::default()
            .with_timeout(Some(self.timeout))
            .with_max_concurrent(self.max_concurrent_commands)
    }
}
