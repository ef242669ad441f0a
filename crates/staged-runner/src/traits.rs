use async_trait::async_trait;
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

use crate::CommandOutput;

/// Ceiling for captured stdout/stderr. Large enough that real diffs are never
/// cut here; content truncation belongs to the callers.
pub const DEFAULT_MAX_OUTPUT_BYTES: usize = 100 * 1024 * 1024;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

pub const DEFAULT_MAX_CONCURRENT: usize = 4;

/// Errors that can occur while running an external command
#[derive(Error, Debug)]
pub enum RunnerError {
    #[error("Command not found: {0}")]
    NotFound(String),

    #[error("Failed to spawn command: {0}")]
    SpawnFailed(#[source] std::io::Error),

    #[error("Command timed out after {0:?}")]
    Timeout(Duration),

    #[error("{}", failure_message(.exit_code, .stderr))]
    Failed { exit_code: i32, stderr: String },

    #[error("Command output exceeded {0} bytes")]
    OutputTooLarge(usize),

    #[error("Failed to read command output: {0}")]
    Io(#[from] std::io::Error),

    #[error("Command runner is shut down")]
    ShutDown,
}

/// The `fatal:`/`error:` line of stderr, else its first non-empty line.
/// Usage dumps that follow the headline are dropped.
fn failure_message(exit_code: &i32, stderr: &str) -> String {
    let mut lines = stderr.lines().map(str::trim).filter(|line| !line.is_empty());
    let first = lines.clone().next();

    let headline = lines
        .find(|line| line.starts_with("fatal:") || line.starts_with("error:"))
        .or(first);

    match headline {
        Some(line) => line.to_string(),
        None => format!("Command exited with status {}", exit_code),
    }
}


/// Configuration shared by every command a runner executes
#[derive(Debug, Clone)]
pub struct RunnerConfig {
    /// Kill the process after this long (None = no limit)
    pub timeout: Option<Duration>,
    /// Maximum bytes captured per stream before the run fails
    pub max_output_bytes: usize,
    /// Maximum number of processes running at once
    pub max_concurrent: usize,
    /// Additional environment variables
    pub env_vars: HashMap<String, String>,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            timeout: Some(DEFAULT_TIMEOUT),
            max_output_bytes: DEFAULT_MAX_OUTPUT_BYTES,
            max_concurrent: DEFAULT_MAX_CONCURRENT,
            env_vars: HashMap::new(),
        }
    }
}

impl RunnerConfig {
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_max_output_bytes(mut self, max_output_bytes: usize) -> Self {
        self.max_output_bytes = max_output_bytes;
        self
    }

    pub fn with_max_concurrent(mut self, max_concurrent: usize) -> Self {
        self.max_concurrent = max_concurrent;
        self
    }

    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env_vars.insert(key.into(), value.into());
        self
    }
}

/// Runs one external binary with per-call arguments and working directory
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Human-readable name of the runner (e.g., "git")
    fn name(&self) -> &str;

    /// Run the binary once. Non-zero exits are reported as [`RunnerError::Failed`].
    async fn run(&self, args: &[&str], working_dir: &Path) -> Result<CommandOutput, RunnerError>;

    /// Check if the binary is available on the system
    async fn is_available(&self) -> bool;
}
