use serde::{Deserialize, Serialize};

/// Staged diff text, possibly cut to a byte budget
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffResult {
    /// Unified diff text; empty when nothing is staged or git failed
    pub diff: String,
    /// True iff the raw diff exceeded the byte budget and was cut
    pub truncated: bool,
    pub error: Option<String>,
}

impl DiffResult {
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            diff: String::new(),
            truncated: false,
            error: Some(error.into()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.diff.is_empty()
    }
}

/// Paths with staged changes, in git's output order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangedFilesResult {
    pub files: Vec<String>,
    pub error: Option<String>,
}

impl ChangedFilesResult {
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            files: Vec::new(),
            error: Some(error.into()),
        }
    }
}

/// The first few hunks of one file in the staged diff
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileHunkSummary {
    /// Post-image path (the `b/` side of the diff header)
    pub path: String,
    /// Hunk texts, each starting with `@@`
    pub hunks: Vec<String>,
}

/// Bounded per-file hunk excerpts of the staged diff
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffSummaryResult {
    pub files: Vec<FileHunkSummary>,
    /// Propagated from the underlying [`DiffResult`]
    pub truncated: bool,
    pub error: Option<String>,
}

impl DiffSummaryResult {
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            files: Vec::new(),
            truncated: false,
            error: Some(error.into()),
        }
    }

    /// Total hunks across all files
    pub fn total_hunks(&self) -> usize {
        self.files.iter().map(|f| f.hunks.len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_serializes_as_null() {
        let json = serde_json::to_value(ChangedFilesResult::default()).unwrap();
        assert_eq!(json, serde_json::json!({ "files": [], "error": null }));
    }

    #[test]
    fn test_summary_wire_shape() {
        let result = DiffSummaryResult {
            files: vec![FileHunkSummary {
                path: "src/lib.rs".to_string(),
                hunks: vec!["@@ -1 +1 @@\n-a\n+b".to_string()],
            }],
            truncated: true,
            error: None,
        };

        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "files": [{ "path": "src/lib.rs", "hunks": ["@@ -1 +1 @@\n-a\n+b"] }],
                "truncated": true,
                "error": null
            })
        );
        assert_eq!(result.total_hunks(), 1);
    }

    #[test]
    fn test_failed_diff_is_empty() {
        let result = DiffResult::failed("fatal: not a git repository");
        assert!(result.is_empty());
        assert!(!result.truncated);
        assert_eq!(result.error.as_deref(), Some("fatal: not a git repository"));
    }
}
