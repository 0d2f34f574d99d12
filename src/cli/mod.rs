//! Command-line interface for Reshape.
//!
//! This module handles argument parsing and output payloads only.
//! NO matching or file operations are performed here.

use clap::Parser;
use serde::Serialize;
use serde_json::Value;
use std::path::PathBuf;

/// Reshape: structural find and replace for source code.
#[derive(Parser, Debug)]
#[command(name = "reshape")]
#[command(author, version, about, long_about = None)]
#[command(subcommand_required = true)]
pub struct Cli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Print machine-readable JSON instead of text.
    #[arg(long, global = true)]
    pub json: bool,
}

/// Find snippet given inline or read from a file.
#[derive(clap::Args, Debug, Clone)]
pub struct FindArgs {
    /// Find snippet.
    #[arg(long, value_name = "CODE", required_unless_present = "find_file", conflicts_with = "find_file")]
    pub find: Option<String>,

    /// File containing the find snippet.
    #[arg(long, value_name = "FILE")]
    pub find_file: Option<PathBuf>,

    /// Ignore the declared name of each matched construct.
    #[arg(short, long)]
    pub ignore_identifiers: bool,

    /// Language tag (typescript, javascript, css, ...). Detected from the extension by default.
    #[arg(long, value_name = "LANG")]
    pub language: Option<String>,

    /// Enable fuzzy text matching with the given minimum score (0.0 to 1.0).
    #[arg(long, value_name = "SCORE")]
    pub fuzzy: Option<f64>,
}

/// Replacement text given inline or read from a file.
#[derive(clap::Args, Debug, Clone)]
pub struct ReplaceArgs {
    /// Replacement text. An empty string deletes the matches.
    #[arg(long, value_name = "CODE", required_unless_present = "replace_file", conflicts_with = "replace_file")]
    pub replace: Option<String>,

    /// File containing the replacement text.
    #[arg(long, value_name = "FILE")]
    pub replace_file: Option<PathBuf>,
}

/// Backup options for commands that write files.
#[derive(clap::Args, Debug, Clone)]
pub struct BackupArgs {
    /// Create a backup before writing.
    #[arg(long)]
    pub create_backup: bool,

    /// Optional operation ID for the backup (auto-generated UUID if not provided).
    #[arg(long, requires = "create_backup")]
    pub operation_id: Option<String>,
}

/// Available Reshape commands.
#[derive(clap::Subcommand, Debug)]
pub enum Commands {
    /// List matches of a snippet in a file.
    Find {
        /// File to search.
        #[arg(short, long)]
        file: PathBuf,

        /// What to search for.
        #[command(flatten)]
        find: FindArgs,

        /// Show a replacement preview for each match.
        #[arg(long, value_name = "CODE")]
        preview: Option<String>,
    },

    /// Replace every match of a snippet in a file.
    Replace {
        /// File to edit.
        #[arg(short, long)]
        file: PathBuf,

        /// What to search for.
        #[command(flatten)]
        find: FindArgs,

        /// What to put in its place.
        #[command(flatten)]
        replace: ReplaceArgs,

        /// Backup options.
        #[command(flatten)]
        backup: BackupArgs,
    },

    /// Replace matches in every file selected by a glob.
    ApplyFiles {
        /// Glob pattern for matching files (e.g., "src/**/*.ts").
        #[arg(short, long)]
        glob: String,

        /// What to search for.
        #[command(flatten)]
        find: FindArgs,

        /// What to put in its place.
        #[command(flatten)]
        replace: ReplaceArgs,

        /// Backup options.
        #[command(flatten)]
        backup: BackupArgs,
    },

    /// Execute a JSON plan of find/replace steps.
    Plan {
        /// Path to the plan.json file.
        #[arg(short, long)]
        file: PathBuf,

        /// Backup options.
        #[command(flatten)]
        backup: BackupArgs,
    },

    /// Undo a previous operation by restoring from a backup manifest.
    Undo {
        /// Path to the backup manifest file.
        #[arg(short, long)]
        manifest: PathBuf,
    },
}

/// Parse command-line arguments.
///
/// This function is the entry point for CLI argument parsing.
/// It returns the parsed Cli struct or exits on error.
pub fn parse_args() -> Cli {
    Cli::parse()
}

/// JSON success payload for CLI responses.
#[derive(Serialize)]
pub struct CliSuccessPayload {
    /// Status indicator ("ok").
    pub status: &'static str,
    /// Human-readable message.
    pub message: String,
    /// Optional structured data.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl CliSuccessPayload {
    /// Construct a payload containing only the message.
    pub fn message_only(message: String) -> Self {
        Self {
            status: "ok",
            message,
            data: None,
        }
    }

    /// Construct a payload with structured data.
    pub fn with_data(message: String, data: Value) -> Self {
        Self {
            status: "ok",
            message,
            data: Some(data),
        }
    }
}

/// JSON error payload for CLI responses.
#[derive(Serialize)]
pub struct CliErrorPayload {
    /// Status indicator ("error").
    pub status: &'static str,
    /// Structured error details.
    pub error: ErrorDetails,
}

/// Details for a CLI error payload.
#[derive(Serialize)]
pub struct ErrorDetails {
    /// Error kind identifier (Parse, StaleMatches, etc.).
    pub kind: &'static str,
    /// Human-readable message.
    pub message: String,
    /// Optional file context.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    /// Optional hint for remediation steps.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

impl CliErrorPayload {
    /// Build payload from a ReshapeError instance.
    pub fn from_error(error: &crate::ReshapeError) -> Self {
        CliErrorPayload {
            status: "error",
            error: ErrorDetails {
                kind: error.kind(),
                message: error.to_string(),
                file: error
                    .file_path()
                    .map(|path| path.to_string_lossy().to_string()),
                hint: error.hint().map(|h| h.to_string()),
            },
        }
    }
}
