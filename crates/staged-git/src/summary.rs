use std::path::Path;
use thiserror::Error;
use tracing::{debug, warn};

use crate::{DiffReader, DiffSummaryResult, FileHunkSummary};

/// Marker line that starts each per-file section of a unified diff
pub const FILE_HEADER_MARKER: &str = "diff --git ";

/// Marker that starts each hunk
pub const HUNK_MARKER: &str = "@@";

/// Hunks longer than this many characters are cut
pub const MAX_HUNK_CHARS: usize = 1000;

/// Appended to a hunk that was cut at [`MAX_HUNK_CHARS`]
pub const HUNK_TRUNCATION_MARKER: &str = "\n... [hunk truncated]";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SummaryError {
    #[error("{0} must be greater than zero")]
    InvalidLimit(&'static str),
}

/// Bounds applied when summarizing a diff
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SummaryLimits {
    pub max_files: usize,
    pub max_hunks_per_file: usize,
    /// Byte budget for the underlying staged diff
    pub max_bytes: usize,
}

impl Default for SummaryLimits {
    fn default() -> Self {
        Self {
            max_files: 10,
            max_hunks_per_file: 3,
            max_bytes: 100_000,
        }
    }
}

impl SummaryLimits {
    pub fn validate(&self) -> Result<(), SummaryError> {
        if self.max_files == 0 {
            return Err(SummaryError::InvalidLimit("maxFiles"));
        }
        if self.max_hunks_per_file == 0 {
            return Err(SummaryError::InvalidLimit("maxHunksPerFile"));
        }
        if self.max_bytes == 0 {
            return Err(SummaryError::InvalidLimit("maxBytes"));
        }
        Ok(())
    }
}

/// Builds bounded hunk summaries of the staged diff
#[derive(Clone)]
pub struct DiffSummarizer {
    reader: DiffReader,
}

impl DiffSummarizer {
    pub fn new(reader: DiffReader) -> Self {
        Self { reader }
    }

    pub fn reader(&self) -> &DiffReader {
        &self.reader
    }

    /// Fetch the staged diff and summarize it. Never fails: errors land in
    /// the result's `error` field.
    pub async fn summarize(&self, working_dir: &Path, limits: &SummaryLimits) -> DiffSummaryResult {
        if let Err(e) = limits.validate() {
            warn!(error = %e, "Rejected summary limits");
            return DiffSummaryResult::failed(e.to_string());
        }

        let staged = self.reader.read_staged_diff(working_dir, limits.max_bytes).await;
        if staged.is_empty() {
            return DiffSummaryResult {
                files: Vec::new(),
                truncated: staged.truncated,
                error: staged.error,
            };
        }

        match summarize_diff(&staged.diff, limits) {
            Ok(files) => DiffSummaryResult {
                files,
                truncated: staged.truncated,
                error: None,
            },
            Err(e) => DiffSummaryResult::failed(e.to_string()),
        }
    }
}

/// Summarize raw unified diff text.
///
/// Files appear in diff order, at most `max_files` of them, each with at most
/// `max_hunks_per_file` hunks. Sections whose header lacks the
/// `a/<path> b/<path>` form are skipped.
pub fn summarize_diff(
    diff: &str,
    limits: &SummaryLimits,
) -> Result<Vec<FileHunkSummary>, SummaryError> {
    limits.validate()?;

    let (_preamble, sections) = split_before_lines(diff, FILE_HEADER_MARKER);
    let mut files = Vec::new();

    for section in sections {
        if files.len() >= limits.max_files {
            break;
        }

        let Some(path) = section_path(section) else {
            debug!(
                header = section.lines().next().unwrap_or_default(),
                "Skipping diff section with unrecognized header"
            );
            continue;
        };

        let (_file_header, hunks) = split_before_lines(section, HUNK_MARKER);
        let hunks = hunks
            .into_iter()
            .take(limits.max_hunks_per_file)
            .map(format_hunk)
            .collect();

        files.push(FileHunkSummary { path, hunks });
    }

    debug!(files = files.len(), "Summarized diff");
    Ok(files)
}

/// Split `text` before every line that starts with `marker`.
///
/// Returns the text preceding the first marker line and the marker-led parts.
fn split_before_lines<'a>(text: &'a str, marker: &str) -> (&'a str, Vec<&'a str>) {
    let starts: Vec<usize> = line_starts(text)
        .filter(|&start| text[start..].starts_with(marker))
        .collect();

    let Some(&first) = starts.first() else {
        return (text, Vec::new());
    };

    let parts = starts
        .iter()
        .enumerate()
        .map(|(i, &start)| {
            let end = starts.get(i + 1).copied().unwrap_or(text.len());
            &text[start..end]
        })
        .collect();

    (&text[..first], parts)
}

fn line_starts(text: &str) -> impl Iterator<Item = usize> + '_ {
    std::iter::once(0)
        .chain(text.match_indices('\n').map(|(i, _)| i + 1))
        .filter(move |&start| start < text.len())
}

/// Post-image path of a file section.
///
/// Resolved in order: the two equal halves of `a/<p> b/<p>`, the extended
/// header's `rename to` or `+++ b/` line, then the first ` b/` of the header.
fn section_path(section: &str) -> Option<String> {
    let mut lines = section.lines();
    let header = lines.next()?;
    let paths = header
        .strip_prefix(FILE_HEADER_MARKER)?
        .strip_prefix("a/")?
        .trim_end();

    let path = same_name_path(paths)
        .or_else(|| extended_header_path(lines))
        .or_else(|| first_split_path(paths))?;

    if path.is_empty() {
        return None;
    }
    Some(path.to_string())
}

/// `<p> b/<p>` with both halves equal
fn same_name_path(paths: &str) -> Option<&str> {
    let half = paths.len().checked_sub(" b/".len())?;
    if half % 2 != 0 {
        return None;
    }
    let n = half / 2;
    if !paths.is_char_boundary(n) || !paths.is_char_boundary(n + 3) {
        return None;
    }

    let (old, rest) = paths.split_at(n);
    let new = rest.strip_prefix(" b/")?;
    (old == new).then_some(new)
}

fn extended_header_path<'a>(lines: impl Iterator<Item = &'a str>) -> Option<&'a str> {
    for line in lines.map(str::trim_end) {
        if line.starts_with(HUNK_MARKER) {
            break;
        }
        if let Some(path) = line
            .strip_prefix("rename to ")
            .or_else(|| line.strip_prefix("+++ b/"))
        {
            return Some(path);
        }
    }
    None
}

/// First ` b/` that leaves a non-empty old path
fn first_split_path(paths: &str) -> Option<&str> {
    let (split, _) = paths.match_indices(" b/").find(|&(i, _)| i > 0)?;
    Some(&paths[split + " b/".len()..])
}

/// Trim a raw hunk, guarantee the `@@` prefix, and cap its length
fn format_hunk(raw: &str) -> String {
    let trimmed = raw.trim();

    // Unreachable for hunks produced by split_before_lines; kept as a guard
    let mut hunk = if trimmed.starts_with(HUNK_MARKER) {
        trimmed.to_string()
    } else {
        format!("{HUNK_MARKER}{trimmed}")
    };

    if let Some((cut, _)) = hunk.char_indices().nth(MAX_HUNK_CHARS) {
        hunk.truncate(cut);
        hunk.push_str(HUNK_TRUNCATION_MARKER);
    }

    hunk
}
