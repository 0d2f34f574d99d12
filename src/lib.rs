//! Reshape: structural find and replace for source files.
//!
//! A find snippet is parsed with tree-sitter and matched against the host
//! file by syntactic equivalence, so formatting, comments and quote style do
//! not matter. A host with syntax errors is still searched structurally.
//! Languages without a grammar use comment-stripped, whitespace-normalized
//! text search, and so do structural languages when the tree search finds
//! nothing.

#![warn(missing_docs)]
// env_logger is used by src/main.rs (binary), not this library
#![expect(unused_crate_dependencies)]

pub mod cli;
pub mod error;
pub mod ingest;
pub mod matcher;
pub mod patch;
pub mod plan;
pub mod session;
pub mod text;

/// Re-export common error types for convenience.
pub use error::{Result, ReshapeError};

/// Re-export the byte range type shared by every module.
pub use ingest::{parse_to_pattern, Span};

/// Re-export the search entry points.
pub use matcher::{equivalent, find_matches, find_sequences, MatchMode, MatchResult, SearchOptions};

/// Re-export replacement and session types.
pub use patch::apply_replacements;
pub use session::Session;

/// Re-export the text fallback entry points.
pub use text::{find_approximate_matches, normalize_text};

/// Reshape version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
