//! MCP tools over the git staging area.
//!
//! Every tool returns its result as structured JSON plus a text echo of the
//! same JSON. Git or parse failures are reported in the result's `error`
//! field, never as protocol errors.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use rmcp::handler::server::tool::ToolRouter;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::model::{CallToolResult, Content, Implementation, ServerCapabilities, ServerInfo};
use rmcp::schemars;
use rmcp::{tool, tool_handler, tool_router, ErrorData as McpError, ServerHandler};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use staged_git::{DiffReader, DiffSummarizer, SummaryLimits};
use staged_runner::CommandRunner;

use crate::config::ServerConfig;

/// Default bounds used when a tool call omits them
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToolDefaults {
    pub diff_max_bytes: usize,
    pub summary: SummaryLimits,
}

impl From<&ServerConfig> for ToolDefaults {
    fn from(config: &ServerConfig) -> Self {
        Self {
            diff_max_bytes: config.diff.max_bytes,
            summary: config.summary.limits(),
        }
    }
}

/// Staging area MCP service bound to one repository directory
#[derive(Clone)]
pub struct StagedServer {
    summarizer: DiffSummarizer,
    working_dir: PathBuf,
    defaults: ToolDefaults,
    tool_router: ToolRouter<Self>,
}

impl StagedServer {
    pub fn new(
        runner: Arc<dyn CommandRunner>,
        working_dir: PathBuf,
        defaults: ToolDefaults,
    ) -> Self {
        Self {
            summarizer: DiffSummarizer::new(DiffReader::new(runner)),
            working_dir,
            defaults,
            tool_router: Self::tool_router(),
        }
    }

    fn reader(&self) -> &DiffReader {
        self.summarizer.reader()
    }
}

#[tool_handler]
impl ServerHandler for StagedServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some("Read-only views of the git staging area. Use 'get-changed-files' to list staged paths, 'get-diff-summary' for a compact per-file hunk overview, and 'get-staged-diff' for the full staged diff.".into()),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: env!("CARGO_PKG_NAME").to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
                ..Implementation::from_build_env()
            },
            ..Default::default()
        }
    }
}

// ============================================================================
// Tool Input Schemas
// ============================================================================

#[derive(Debug, Default, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct StagedDiffRequest {
    /// Byte budget for the returned diff (default: 200000)
    #[schemars(description = "Maximum size of the returned diff in bytes")]
    pub max_bytes: Option<usize>,
}

#[derive(Debug, Default, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct DiffSummaryRequest {
    /// Maximum files to include (default: 10)
    #[schemars(description = "Maximum number of files to include")]
    pub max_files: Option<usize>,

    /// Maximum hunks per file (default: 3)
    #[schemars(description = "Maximum number of hunks per file")]
    pub max_hunks_per_file: Option<usize>,

    /// Byte budget for the diff that is summarized (default: 100000)
    #[schemars(description = "Maximum size in bytes of the staged diff read before summarizing")]
    pub max_bytes: Option<usize>,
}

// ============================================================================
// Tool Implementations
// ============================================================================

#[tool_router]
impl StagedServer {
    #[tool(
        name = "get-staged-diff",
        description = "Get the staged diff (git diff --cached) with 10 lines of context. Output is cut to maxBytes and flagged as truncated."
    )]
    pub async fn get_staged_diff(
        &self,
        Parameters(request): Parameters<StagedDiffRequest>,
    ) -> Result<CallToolResult, McpError> {
        let start = Instant::now();
        let max_bytes = request.max_bytes.unwrap_or(self.defaults.diff_max_bytes);

        let result = self.reader().read_staged_diff(&self.working_dir, max_bytes).await;

        info!(
            tool = "get-staged-diff",
            max_bytes,
            bytes = result.diff.len(),
            truncated = result.truncated,
            failed = result.error.is_some(),
            duration_ms = start.elapsed().as_millis(),
            "Tool completed"
        );
        Ok(tool_result(&result))
    }

    #[tool(
        name = "get-changed-files",
        description = "List the paths of all staged files, in git's order."
    )]
    pub async fn get_changed_files(&self) -> Result<CallToolResult, McpError> {
        let start = Instant::now();

        let result = self.reader().read_changed_files(&self.working_dir).await;

        info!(
            tool = "get-changed-files",
            files = result.files.len(),
            failed = result.error.is_some(),
            duration_ms = start.elapsed().as_millis(),
            "Tool completed"
        );
        Ok(tool_result(&result))
    }

    #[tool(
        name = "get-diff-summary",
        description = "Summarize the staged diff as per-file hunk excerpts: at most maxFiles files, maxHunksPerFile hunks each, every hunk capped at 1000 characters."
    )]
    pub async fn get_diff_summary(
        &self,
        Parameters(request): Parameters<DiffSummaryRequest>,
    ) -> Result<CallToolResult, McpError> {
        let start = Instant::now();
        let defaults = self.defaults.summary;
        let limits = SummaryLimits {
            max_files: request.max_files.unwrap_or(defaults.max_files),
            max_hunks_per_file: request
                .max_hunks_per_file
                .unwrap_or(defaults.max_hunks_per_file),
            max_bytes: request.max_bytes.unwrap_or(defaults.max_bytes),
        };

        let result = self.summarizer.summarize(&self.working_dir, &limits).await;

        info!(
            tool = "get-diff-summary",
            files = result.files.len(),
            hunks = result.total_hunks(),
            truncated = result.truncated,
            failed = result.error.is_some(),
            duration_ms = start.elapsed().as_millis(),
            "Tool completed"
        );
        Ok(tool_result(&result))
    }
}

/// Structured JSON result with a text echo of the same JSON
fn tool_result<T: Serialize>(result: &T) -> CallToolResult {
    match serde_json::to_value(result) {
        Ok(value) => CallToolResult::structured(value),
        Err(e) => {
            warn!(error = %e, "Failed to serialize tool result");
            CallToolResult::error(vec![Content::text(format!("Error: {e}"))])
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rmcp::model::RawContent;
    use serde_json::json;
    use staged_runner::testing::ScriptedRunner;
    use staged_runner::RunnerError;

    fn server_with(runner: ScriptedRunner) -> (StagedServer, Arc<ScriptedRunner>) {
        let runner = Arc::new(runner);
        let defaults = ToolDefaults::from(&ServerConfig::default());
        let server = StagedServer::new(runner.clone(), PathBuf::from("/repo"), defaults);
        (server, runner)
    }

    fn structured(result: &CallToolResult) -> serde_json::Value {
        result.structured_content.clone().unwrap()
    }

    fn text(result: &CallToolResult) -> String {
        match &result.content[0].raw {
            RawContent::Text(text) => text.text.clone(),
            other => panic!("expected text content, got {:?}", other),
        }
    }

    const ONE_FILE_DIFF: &str = "\
diff --git a/src/app.rs b/src/app.rs
index 1111111..2222222 100644
--- a/src/app.rs
+++ b/src/app.rs
@@ -3,7 +3,7 @@ fn main() {
     let a = 1;
-    let b = 2;
+    let b = 3;
     let c = 4;
";

    #[tokio::test]
    async fn test_get_staged_diff_uses_default_budget() {
        let (server, runner) = server_with(ScriptedRunner::new().with_stdout(ONE_FILE_DIFF));

        let result = server
            .get_staged_diff(Parameters(StagedDiffRequest::default()))
            .await
            .unwrap();

        assert_eq!(
            structured(&result),
            json!({ "diff": ONE_FILE_DIFF, "truncated": false, "error": null })
        );
        assert_ne!(result.is_error, Some(true));
        assert_eq!(runner.calls()[0].working_dir, PathBuf::from("/repo"));
    }

    #[tokio::test]
    async fn test_get_staged_diff_truncates() {
        let (server, _) = server_with(ScriptedRunner::new().with_stdout(ONE_FILE_DIFF));

        let result = server
            .get_staged_diff(Parameters(StagedDiffRequest { max_bytes: Some(10) }))
            .await
            .unwrap();

        let value = structured(&result);
        assert_eq!(value["diff"], "diff --git");
        assert_eq!(value["truncated"], true);
    }

    #[tokio::test]
    async fn test_text_echo_matches_structured_json() {
        let (server, _) = server_with(ScriptedRunner::new().with_stdout("a.txt\nb.txt\n"));

        let result = server.get_changed_files().await.unwrap();

        let echoed: serde_json::Value = serde_json::from_str(&text(&result)).unwrap();
        assert_eq!(echoed, structured(&result));
        assert_eq!(echoed, json!({ "files": ["a.txt", "b.txt"], "error": null }));
    }

    #[tokio::test]
    async fn test_get_diff_summary() {
        let (server, _) = server_with(ScriptedRunner::new().with_stdout(ONE_FILE_DIFF));

        let result = server
            .get_diff_summary(Parameters(DiffSummaryRequest::default()))
            .await
            .unwrap();

        assert_eq!(
            structured(&result),
            json!({
                "files": [{
                    "path": "src/app.rs",
                    "hunks": ["@@ -3,7 +3,7 @@ fn main() {\n     let a = 1;\n-    let b = 2;\n+    let b = 3;\n     let c = 4;"]
                }],
                "truncated": false,
                "error": null
            })
        );
    }

    #[tokio::test]
    async fn test_git_failure_is_a_successful_call_with_error_field() {
        let (server, _) = server_with(ScriptedRunner::new().with_error(RunnerError::Failed {
            exit_code: 128,
            stderr: "fatal: not a git repository (or any of the parent directories): .git"
                .to_string(),
        }));

        let result = server.get_changed_files().await.unwrap();

        let value = structured(&result);
        assert_eq!(value["files"], json!([]));
        assert_eq!(
            value["error"],
            "fatal: not a git repository (or any of the parent directories): .git"
        );
    }

    #[tokio::test]
    async fn test_zero_limit_reports_error() {
        let (server, runner) = server_with(ScriptedRunner::new());

        let result = server
            .get_diff_summary(Parameters(DiffSummaryRequest {
                max_files: Some(0),
                ..DiffSummaryRequest::default()
            }))
            .await
            .unwrap();

        let value = structured(&result);
        assert_eq!(value["files"], json!([]));
        assert_eq!(value["truncated"], false);
        assert_eq!(value["error"], "maxFiles must be greater than zero");
        assert!(runner.calls().is_empty());
    }

    #[test]
    fn test_request_uses_camel_case() {
        let request: DiffSummaryRequest =
            serde_json::from_value(json!({ "maxFiles": 2, "maxHunksPerFile": 1 })).unwrap();
        assert_eq!(request.max_files, Some(2));
        assert_eq!(request.max_hunks_per_file, Some(1));
        assert_eq!(request.max_bytes, None);
    }

    #[test]
    fn test_server_exposes_three_tools() {
        let (server, _) = server_with(ScriptedRunner::new());

        let mut names: Vec<String> = server
            .tool_router
            .list_all()
            .into_iter()
            .map(|tool| tool.name.to_string())
            .collect();
        names.sort();

        assert_eq!(
            names,
            vec!["get-changed-files", "get-diff-summary", "get-staged-diff"]
        );
        assert_eq!(server.get_info().server_info.name, "staged-mcp");
    }
}
