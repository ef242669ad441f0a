//! # staged-runner
//!
//! External command execution for staged-mcp.
//!
//! Every git query goes through a [`CommandRunner`]. The production
//! implementation, [`GitRunner`], spawns one `git` process per call with an
//! explicit working directory, captures both streams as text and reports
//! every failure as a [`RunnerError`] value.
//!
//! ## Limits
//!
//! - Output ceiling of [`DEFAULT_MAX_OUTPUT_BYTES`] per stream
//! - Per-call timeout (default [`DEFAULT_TIMEOUT`]); the child is killed on expiry
//! - At most [`RunnerConfig::max_concurrent`] git processes at once

mod git;
mod output;
mod spawner;
mod traits;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use git::GitRunner;
pub use output::CommandOutput;
pub use spawner::ProcessSpawner;
pub use traits::{
    CommandRunner, RunnerConfig, RunnerError, DEFAULT_MAX_CONCURRENT, DEFAULT_MAX_OUTPUT_BYTES,
    DEFAULT_TIMEOUT,
};
