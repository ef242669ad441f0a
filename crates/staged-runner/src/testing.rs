//! A scripted [`CommandRunner`] for tests that must not spawn processes.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::{CommandOutput, CommandRunner, RunnerError};

/// One recorded `run` call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedCall {
    pub args: Vec<String>,
    pub working_dir: PathBuf,
}

/// Replays queued responses in order and records every call it receives
#[derive(Debug, Default)]
pub struct ScriptedRunner {
    responses: Mutex<VecDeque<Result<CommandOutput, RunnerError>>>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl ScriptedRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a successful run printing `stdout`
    pub fn with_stdout(self, stdout: impl Into<String>) -> Self {
        self.with_response(Ok(CommandOutput::from_stdout(stdout)))
    }

    /// Queue a failed run
    pub fn with_error(self, error: RunnerError) -> Self {
        self.with_response(Err(error))
    }

    pub fn with_response(self, response: Result<CommandOutput, RunnerError>) -> Self {
        self.responses
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push_back(response);
        self
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

#[async_trait]
impl CommandRunner for ScriptedRunner {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn run(&self, args: &[&str], working_dir: &Path) -> Result<CommandOutput, RunnerError> {
        self.calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(RecordedCall {
                args: args.iter().map(|a| a.to_string()).collect(),
                working_dir: working_dir.to_path_buf(),
            });

        self.responses
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .pop_front()
            .unwrap_or_else(|| Err(RunnerError::Io(std::io::Error::other("no scripted response"))))
    }

    async fn is_available(&self) -> bool {
        true
    }
}
