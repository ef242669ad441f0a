use std::time::Duration;

/// Output captured from one external command execution
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    /// Decoded stdout (lossy UTF-8)
    pub stdout: String,
    /// Decoded stderr (lossy UTF-8)
    pub stderr: String,
    /// Exit code from the process
    pub exit_code: i32,
    /// Duration of execution
    pub duration: Duration,
}

impl CommandOutput {
    pub fn new(stdout: String, stderr: String, exit_code: i32, duration: Duration) -> Self {
        Self {
            stdout,
            stderr,
            exit_code,
            duration,
        }
    }

    /// Output of a successful run with the given stdout and nothing else
    pub fn from_stdout(stdout: impl Into<String>) -> Self {
        Self::new(stdout.into(), String::new(), 0, Duration::ZERO)
    }

    /// Check if the command exited successfully
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}
