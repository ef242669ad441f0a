use std::path::Path;
use std::sync::Arc;
use tracing::{debug, warn};

use staged_runner::CommandRunner;

use crate::{ChangedFilesResult, DiffResult};

/// Default byte budget for [`DiffReader::read_staged_diff`]
pub const DEFAULT_DIFF_MAX_BYTES: usize = 200_000;

/// Staged diff with ten lines of context so hunks carry enough surrounding code
pub const STAGED_DIFF_ARGS: [&str; 3] = ["diff", "--cached", "--unified=10"];

pub const CHANGED_FILES_ARGS: [&str; 3] = ["diff", "--cached", "--name-only"];

/// Reads the staging area through a [`CommandRunner`]
#[derive(Clone)]
pub struct DiffReader {
    runner: Arc<dyn CommandRunner>,
}

impl DiffReader {
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self { runner }
    }

    /// Read the staged diff, cut to at most `max_bytes` bytes.
    ///
    /// An empty diff with `error == None` means nothing is staged; a failed
    /// git invocation also yields an empty diff but carries the error text.
    pub async fn read_staged_diff(&self, working_dir: &Path, max_bytes: usize) -> DiffResult {
        let output = match self.runner.run(&STAGED_DIFF_ARGS, working_dir).await {
            Ok(output) => output,
            Err(e) => {
                warn!(error = %e, working_dir = %working_dir.display(), "Failed to read staged diff");
                return DiffResult::failed(e.to_string());
            }
        };

        if output.stdout.is_empty() {
            debug!("No staged changes");
            return DiffResult::default();
        }

        let (diff, truncated) = truncate_to_bytes(&output.stdout, max_bytes);

        debug!(
            raw_bytes = output.stdout.len(),
            returned_bytes = diff.len(),
            truncated,
            "Read staged diff"
        );

        DiffResult {
            diff: diff.to_string(),
            truncated,
            error: None,
        }
    }

    /// List the paths of all staged files
    pub async fn read_changed_files(&self, working_dir: &Path) -> ChangedFilesResult {
        match self.runner.run(&CHANGED_FILES_ARGS, working_dir).await {
            Ok(output) => {
                let files = parse_name_only(&output.stdout);
                debug!(files = files.len(), "Read changed files");
                ChangedFilesResult { files, error: None }
            }
            Err(e) => {
                warn!(error = %e, working_dir = %working_dir.display(), "Failed to read changed files");
                ChangedFilesResult::failed(e.to_string())
            }
        }
    }
}

/// Cut `text` to at most `max_bytes` bytes on a UTF-8 character boundary.
///
/// ASCII text is cut at exactly `max_bytes`; a multi-byte character straddling
/// the limit is dropped whole, so the result may be up to 3 bytes shorter.
pub fn truncate_to_bytes(text: &str, max_bytes: usize) -> (&str, bool) {
    if text.len() <= max_bytes {
        return (text, false);
    }

    let mut end = max_bytes;
    while !text.is_char_boundary(end) {
        end -= 1;
    }

    (&text[..end], true)
}

/// Parse `git diff --name-only` output into trimmed, non-empty paths
pub fn parse_name_only(output: &str) -> Vec<String> {
    output
        .split('\n')
        .map(str::trim)
        .filter(|path| !path.is_empty())
        .map(String::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use staged_runner::testing::ScriptedRunner;
    use staged_runner::RunnerError;
    use std::path::PathBuf;

    fn reader_with(runner: ScriptedRunner) -> (DiffReader, Arc<ScriptedRunner>) {
        let runner = Arc::new(runner);
        (DiffReader::new(runner.clone()), runner)
    }

    #[test]
    fn test_truncate_under_limit_is_unchanged() {
        assert_eq!(truncate_to_bytes("abc", 3), ("abc", false));
        assert_eq!(truncate_to_bytes("abc", 10), ("abc", false));
        assert_eq!(truncate_to_bytes("", 0), ("", false));
    }

    #[test]
    fn test_truncate_ascii_is_exact() {
        let text = "x".repeat(500);
        let (cut, truncated) = truncate_to_bytes(&text, 120);
        assert!(truncated);
        assert_eq!(cut.len(), 120);
    }

    #[test]
    fn test_truncate_never_splits_a_character() {
        // "é" is two bytes, "日" three, "🦀" four
        let text = "aé日🦀".repeat(20);
        for max in 0..text.len() {
            let (cut, truncated) = truncate_to_bytes(&text, max);
            assert!(truncated);
            assert!(cut.len() <= max);
            assert!(max - cut.len() < 4);
            assert!(text.starts_with(cut));
        }
    }

    #[test]
    fn test_parse_name_only_drops_blank_entries() {
        let files = parse_name_only("src/main.rs\n  README.md  \n\n\r\nsrc/main.rs\n");
        assert_eq!(files, vec!["src/main.rs", "README.md", "src/main.rs"]);
        assert!(parse_name_only("").is_empty());
        assert!(parse_name_only("\n\n").is_empty());
    }

    #[tokio::test]
    async fn test_read_staged_diff_passes_args_and_working_dir() {
        let (reader, runner) = reader_with(ScriptedRunner::new().with_stdout("diff --git a/x b/x\n"));
        let dir = PathBuf::from("/work/repo");

        let result = reader.read_staged_diff(&dir, DEFAULT_DIFF_MAX_BYTES).await;

        assert_eq!(result.diff, "diff --git a/x b/x\n");
        assert!(!result.truncated);
        assert_eq!(result.error, None);

        let calls = runner.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].args, STAGED_DIFF_ARGS);
        assert_eq!(calls[0].working_dir, dir);
    }

    #[tokio::test]
    async fn test_read_staged_diff_empty_has_no_error() {
        let (reader, _) = reader_with(ScriptedRunner::new().with_stdout(""));

        let result = reader.read_staged_diff(Path::new("."), 100).await;

        assert_eq!(result, DiffResult::default());
    }

    #[tokio::test]
    async fn test_read_staged_diff_truncates() {
        let diff = format!("diff --git a/big b/big\n{}", "+line\n".repeat(100));
        let (reader, _) = reader_with(ScriptedRunner::new().with_stdout(diff.clone()));

        let result = reader.read_staged_diff(Path::new("."), 64).await;

        assert!(result.truncated);
        assert_eq!(result.diff.len(), 64);
        assert_eq!(result.diff, diff[..64]);
        assert_eq!(result.error, None);
    }

    #[tokio::test]
    async fn test_read_staged_diff_failure_becomes_error_text() {
        let (reader, _) = reader_with(ScriptedRunner::new().with_error(RunnerError::Failed {
            exit_code: 129,
            stderr: "fatal: not a git repository\n".to_string(),
        }));

        let result = reader.read_staged_diff(Path::new("/tmp"), 100).await;

        assert_eq!(result.diff, "");
        assert!(!result.truncated);
        assert_eq!(result.error.as_deref(), Some("fatal: not a git repository"));
    }

    #[tokio::test]
    async fn test_read_changed_files() {
        let (reader, runner) = reader_with(ScriptedRunner::new().with_stdout("a.txt\nb/c.txt\n"));

        let result = reader.read_changed_files(Path::new(".")).await;

        assert_eq!(result.files, vec!["a.txt", "b/c.txt"]);
        assert_eq!(result.error, None);
        assert_eq!(runner.calls()[0].args, CHANGED_FILES_ARGS);
    }

    #[tokio::test]
    async fn test_read_changed_files_failure() {
        let (reader, _) = reader_with(
            ScriptedRunner::new().with_error(RunnerError::NotFound("git".to_string())),
        );

        let result = reader.read_changed_files(Path::new(".")).await;

        assert!(result.files.is_empty());
        assert_eq!(result.error.as_deref(), Some("Command not found: git"));
    }
}
