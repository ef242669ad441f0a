use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::process::Command;
use tokio::sync::Semaphore;
use tracing::debug;

use crate::{CommandOutput, CommandRunner, ProcessSpawner, RunnerConfig, RunnerError};

/// Runner for the `git` binary
#[derive(Debug, Clone)]
pub struct GitRunner {
    binary_path: PathBuf,
    config: RunnerConfig,
    permits: Arc<Semaphore>,
}

impl GitRunner {
    pub fn new() -> Self {
        Self::with_config(PathBuf::from("git"), RunnerConfig::default())
    }

    pub fn with_binary_path(path: PathBuf) -> Self {
        Self::with_config(path, RunnerConfig::default())
    }

    pub fn with_config(binary_path: PathBuf, config: RunnerConfig) -> Self {
        // Git must never stop to page output or ask for credentials
        let config = config
            .with_env("GIT_PAGER", "cat")
            .with_env("GIT_TERMINAL_PROMPT", "0");
        let permits = Arc::new(Semaphore::new(config.max_concurrent.max(1)));

        Self {
            binary_path,
            config,
            permits,
        }
    }
}

impl Default for GitRunner {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CommandRunner for GitRunner {
    fn name(&self) -> &str {
        "git"
    }

    async fn run(&self, args: &[&str], working_dir: &Path) -> Result<CommandOutput, RunnerError> {
        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|_| RunnerError::ShutDown)?;

        debug!(
            available_permits = self.permits.available_permits(),
            "Acquired git process permit"
        );

        ProcessSpawner::spawn(&self.binary_path, args, working_dir, &self.config).await
    }

    async fn is_available(&self) -> bool {
        Command::new(&self.binary_path)
            .arg("--version")
            .output()
            .await
            .map(|o| o.status.success())
            .unwrap_or(false)
    }
}
