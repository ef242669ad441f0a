use std::io::ErrorKind;
use std::path::Path;
use std::process::Stdio;
use std::time::Instant;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;
use tracing::{debug, trace};

use crate::{CommandOutput, RunnerConfig, RunnerError};

/// Utility for spawning external processes
pub struct ProcessSpawner;

impl ProcessSpawner {
    /// Spawn a process, wait for it and capture its output.
    ///
    /// Both streams are read concurrently and capped at
    /// `config.max_output_bytes`. The child is killed if the timeout fires or
    /// the capture fails part way.
    pub async fn spawn(
        binary: &Path,
        args: &[&str],
        working_dir: &Path,
        config: &RunnerConfig,
    ) -> Result<CommandOutput, RunnerError> {
        let start = Instant::now();

        debug!(
            binary = %binary.display(),
            args = ?args,
            working_dir = %working_dir.display(),
            "Spawning process"
        );

        let mut cmd = Command::new(binary);
        cmd.args(args)
            .current_dir(working_dir)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .stdin(Stdio::null()) // Non-interactive
            .kill_on_drop(true);

        for (key, value) in &config.env_vars {
            cmd.env(key, value);
        }

        let mut child = cmd.spawn().map_err(|e| match e.kind() {
            ErrorKind::NotFound => RunnerError::NotFound(binary.display().to_string()),
            _ => RunnerError::SpawnFailed(e),
        })?;

        let stdout_handle = child
            .stdout
            .take()
            .ok_or_else(|| RunnerError::Io(std::io::Error::other("stdout not captured")))?;
        let stderr_handle = child
            .stderr
            .take()
            .ok_or_else(|| RunnerError::Io(std::io::Error::other("stderr not captured")))?;

        let limit = config.max_output_bytes;
        let capture = async {
            let (stdout, stderr) = tokio::try_join!(
                read_capped(stdout_handle, limit),
                read_capped(stderr_handle, limit)
            )?;
            let status = child.wait().await?;
            Ok::<_, RunnerError>((stdout, stderr, status))
        };

        let (stdout, stderr, status) = match config.timeout {
            Some(timeout) => tokio::time::timeout(timeout, capture)
                .await
                .map_err(|_| RunnerError::Timeout(timeout))??,
            None => capture.await?,
        };

        let duration = start.elapsed();
        let exit_code = status.code().unwrap_or(-1);
        let stdout = String::from_utf8_lossy(&stdout).into_owned();
        let stderr = String::from_utf8_lossy(&stderr).into_owned();

        debug!(
            exit_code,
            duration_ms = duration.as_millis(),
            stdout_bytes = stdout.len(),
            stderr_bytes = stderr.len(),
            "Process completed"
        );
        trace!(stderr = %stderr, "stderr");

        if !status.success() {
            return Err(RunnerError::Failed { exit_code, stderr });
        }

        Ok(CommandOutput::new(stdout, stderr, exit_code, duration))
    }
}

/// Read a stream to the end, failing once it yields more than `limit` bytes.
async fn read_capped<R>(reader: R, limit: usize) -> Result<Vec<u8>, RunnerError>
where
    R: AsyncRead + Unpin,
{
    let mut buf = Vec::new();
    let ceiling = u64::try_from(limit).unwrap_or(u64::MAX).saturating_add(1);
    reader.take(ceiling).read_to_end(&mut buf).await?;

    if buf.len() > limit {
        return Err(RunnerError::OutputTooLarge(limit));
    }

    Ok(buf)
}
