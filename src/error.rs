//! Reshape error types.
//!
//! All errors are typed and provide root cause information.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for Reshape operations.
#[derive(Error, Debug)]
pub enum ReshapeError {
    /// I/O error during file operations.
    #[error("I/O error for path {path}: {source}")]
    Io {
        /// The file path that caused the I/O error.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The find snippet (or a host file) could not be parsed.
    #[error("Parse error in {origin}: {message}")]
    Parse {
        /// What was being parsed (`find snippet`, a file path, ...).
        origin: String,
        /// Human-readable parse error message.
        message: String,
    },

    /// Structural parsing was requested for a language without a grammar.
    #[error("No structural parser for language '{0}'")]
    UnsupportedLanguage(String),

    /// Invalid byte span.
    #[error("Invalid span ({start}, {end}) for text of length {len}")]
    InvalidSpan {
        /// Start byte offset.
        start: usize,
        /// End byte offset.
        end: usize,
        /// Length of the text the span was applied to.
        len: usize,
    },

    /// Two matches in one replacement batch overlap.
    #[error("Overlapping matches: {first_start}..{first_end} and {second_start}..{second_end}")]
    OverlappingMatches {
        /// Start of the earlier match.
        first_start: usize,
        /// End of the earlier match.
        first_end: usize,
        /// Start of the later match.
        second_start: usize,
        /// End of the later match.
        second_end: usize,
    },

    /// Replace was requested without a current match set.
    #[error("No matches stored; run a find first")]
    NoMatches,

    /// The buffer changed after the matches were computed.
    #[error("Document changed since the last find (expected hash {expected}, found {actual})")]
    StaleMatches {
        /// Hash recorded when the matches were found.
        expected: String,
        /// Hash of the current buffer contents.
        actual: String,
    },

    /// The host buffer refused an edit.
    #[error("Edit rejected: {0}")]
    EditRejected(String),

    /// Invalid glob pattern.
    #[error("Invalid glob pattern: {0}")]
    Pattern(#[from] glob::PatternError),

    /// Invalid plan schema.
    #[error("Invalid plan schema: {message}")]
    InvalidPlanSchema {
        /// The schema validation error message.
        message: String,
    },

    /// Plan execution failed at step.
    #[error("Plan execution failed at step {step}: {error}")]
    PlanExecutionFailed {
        /// The step number that failed (1-based).
        step: usize,
        /// The error that occurred.
        error: String,
    },

    /// JSON (de)serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// UTF-8 validation error.
    #[error("UTF-8 error: {0}")]
    Utf8(#[from] std::str::Utf8Error),

    /// Generic error with context.
    #[error("{0}")]
    Other(String),
}

impl From<std::io::Error> for ReshapeError {
    fn from(err: std::io::Error) -> Self {
        ReshapeError::Io {
            path: PathBuf::from("<unknown>"),
            source: err,
        }
    }
}

impl ReshapeError {
    /// Stable identifier for the error variant, used in JSON payloads.
    pub fn kind(&self) -> &'static str {
        match self {
            ReshapeError::Io { .. } => "Io",
            ReshapeError::Parse { .. } => "Parse",
            ReshapeError::UnsupportedLanguage(_) => "UnsupportedLanguage",
            ReshapeError::InvalidSpan { .. } => "InvalidSpan",
            ReshapeError::OverlappingMatches { .. } => "OverlappingMatches",
            ReshapeError::NoMatches => "NoMatches",
            ReshapeError::StaleMatches { .. } => "StaleMatches",
            ReshapeError::EditRejected(_) => "EditRejected",
            ReshapeError::Pattern(_) => "Pattern",
            ReshapeError::InvalidPlanSchema { .. } => "InvalidPlanSchema",
            ReshapeError::PlanExecutionFailed { .. } => "PlanExecutionFailed",
            ReshapeError::Json(_) => "Json",
            ReshapeError::Utf8(_) => "Utf8",
            ReshapeError::Other(_) => "Other",
        }
    }

    /// Optional remediation hint for the user.
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            ReshapeError::Parse { .. } => {
                Some("Check the find snippet for unbalanced brackets or a stray token")
            }
            ReshapeError::StaleMatches { .. } => Some("Run find again on the current document"),
            ReshapeError::NoMatches => Some("Run find before replace"),
            ReshapeError::OverlappingMatches { .. } => {
                Some("Approximate text matches overlapped; narrow the find snippet")
            }
            ReshapeError::UnsupportedLanguage(_) => {
                Some("Structural matching supports typescript, typescriptreact, javascript and javascriptreact")
            }
            _ => None,
        }
    }

    /// File path associated with the error, if any.
    pub fn file_path(&self) -> Option<&std::path::Path> {
        match self {
            ReshapeError::Io { path, .. } => Some(path.as_path()),
            _ => None,
        }
    }
}

/// Result type alias for Reshape operations.
pub type Result<T> = std::result::Result<T, ReshapeError>;
