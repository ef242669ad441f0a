mod config;
mod server;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use rmcp::{transport::stdio, ServiceExt};
use serde::Serialize;
use tracing::{info, warn};

use staged_git::{DiffReader, DiffSummarizer, SummaryLimits};
use staged_logging::LogFormat;
use staged_runner::{CommandRunner, GitRunner};

use crate::config::ServerConfig;
use crate::server::{StagedServer, ToolDefaults};

#[derive(Parser, Debug)]
#[command(
    name = "staged-mcp",
    about = "MCP server exposing read-only git staging area queries",
    version,
    author
)]
struct Cli {
    /// Repository directory (default: current directory)
    #[arg(short = 'C', long, global = true)]
    repo: Option<PathBuf>,

    /// Config file (default: ./staged-mcp.toml, then the user config dir)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log level filter; RUST_LOG takes precedence
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Log output format
    #[arg(long, global = true, value_enum, default_value = "pretty")]
    log_format: LogFormatChoice,

    /// Write logs to this file instead of stderr
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Serve MCP over stdio (default)
    Serve,

    /// Print the staged diff as JSON
    StagedDiff {
        /// Byte budget for the returned diff
        #[arg(long)]
        max_bytes: Option<usize>,
    },

    /// Print the staged file list as JSON
    ChangedFiles,

    /// Print the per-file hunk summary as JSON
    Summary {
        /// Maximum number of files
        #[arg(long)]
        max_files: Option<usize>,

        /// Maximum hunks per file
        #[arg(long)]
        max_hunks_per_file: Option<usize>,

        /// Byte budget for the diff that is summarized
        #[arg(long)]
        max_bytes: Option<usize>,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogFormatChoice {
    Pretty,
    Json,
    Compact,
}

impl From<LogFormatChoice> for LogFormat {
    fn from(choice: LogFormatChoice) -> Self {
        match choice {
            LogFormatChoice::Pretty => LogFormat::Pretty,
            LogFormatChoice::Json => LogFormat::Json,
            LogFormatChoice::Compact => LogFormat::Compact,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let _log_guard = staged_logging::init_tracing(
        &cli.log_level,
        cli.log_format.into(),
        cli.log_file.as_deref(),
    )
    .context("Failed to initialize logging")?;

    // The process working directory is consulted here and nowhere else
    let repo_dir = match cli.repo.clone() {
        Some(dir) => dir,
        None => std::env::current_dir().context("Failed to get current directory")?,
    };

    let config = ServerConfig::load(cli.config.as_deref(), &repo_dir)?;
    let runner: Arc<dyn CommandRunner> = Arc::new(GitRunner::with_config(
        config.git_binary.clone(),
        config.runner_config(),
    ));

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => serve(runner, repo_dir, &config).await,
        Commands::StagedDiff { max_bytes } => {
            let reader = DiffReader::new(runner);
            let max_bytes = max_bytes.unwrap_or(config.diff.max_bytes);
            print_json(&reader.read_staged_diff(&repo_dir, max_bytes).await)
        }
        Commands::ChangedFiles => {
            let reader = DiffReader::new(runner);
            print_json(&reader.read_changed_files(&repo_dir).await)
        }
        Commands::Summary {
            max_files,
            max_hunks_per_file,
            max_bytes,
        } => {
            let defaults = config.summary.limits();
            let limits = SummaryLimits {
                max_files: max_files.unwrap_or(defaults.max_files),
                max_hunks_per_file: max_hunks_per_file.unwrap_or(defaults.max_hunks_per_file),
                max_bytes: max_bytes.unwrap_or(defaults.max_bytes),
            };
            let summarizer = DiffSummarizer::new(DiffReader::new(runner));
            print_json(&summarizer.summarize(&repo_dir, &limits).await)
        }
    }
}

async fn serve(
    runner: Arc<dyn CommandRunner>,
    repo_dir: PathBuf,
    config: &ServerConfig,
) -> Result<()> {
    if !runner.is_available().await {
        warn!(
            binary = %config.git_binary.display(),
            "git binary is not available; every tool call will report an error"
        );
    }
    warn_if_missing(&repo_dir);

    info!(
        repo = %repo_dir.display(),
        runner = runner.name(),
        "Starting MCP server on stdio"
    );
    let server = StagedServer::new(runner, repo_dir, ToolDefaults::from(config));

    let service = server
        .serve(stdio())
        .await
        .context("Failed to start MCP server")?;

    let reason = service.waiting().await.context("MCP server task failed")?;
    info!(reason = ?reason, "MCP server stopped");

    Ok(())
}

fn warn_if_missing(repo_dir: &Path) {
    if !repo_dir.is_dir() {
        warn!(repo = %repo_dir.display(), "Repository directory does not exist");
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    println!("{}", json);
    Ok(())
}
