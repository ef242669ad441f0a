//! # staged-git
//!
//! Read-only queries against the git staging area.
//!
//! ## Overview
//!
//! - [`DiffReader`] fetches the staged diff (`git diff --cached --unified=10`)
//!   and the staged file list (`git diff --cached --name-only`)
//! - [`DiffSummarizer`] turns the staged diff into a bounded list of
//!   per-file hunk excerpts, small enough to hand to an LLM
//!
//! Every operation takes the repository directory explicitly and always
//! returns a result value; failures are reported in its `error` field.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use staged_git::{DiffReader, DiffSummarizer, SummaryLimits};
//! use staged_runner::GitRunner;
//!
//! let reader = DiffReader::new(Arc::new(GitRunner::new()));
//! let files = reader.read_changed_files(&repo_dir).await;
//!
//! let summarizer = DiffSummarizer::new(reader);
//! let summary = summarizer.summarize(&repo_dir, &SummaryLimits::default()).await;
//! ```

mod reader;
mod summary;
mod types;

pub use reader::{
    parse_name_only, truncate_to_bytes, DiffReader, CHANGED_FILES_ARGS, DEFAULT_DIFF_MAX_BYTES,
    STAGED_DIFF_ARGS,
};
pub use summary::{
    summarize_diff, DiffSummarizer, SummaryError, SummaryLimits, FILE_HEADER_MARKER,
    HUNK_MARKER, HUNK_TRUNCATION_MARKER, MAX_HUNK_CHARS,
};
pub use types::{ChangedFilesResult, DiffResult, DiffSummaryResult, FileHunkSummary};
