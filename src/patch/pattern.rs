//! Find and replace across files selected by a glob pattern.
//!
//! Every file gets the same treatment as a single document: its language
//! tag comes from the extension (or a forced tag), matches come from
//! [`find_matches`], and replacements run in descending offset order. All
//! files are matched and patched in memory first; nothing is written if
//! any file fails to match.

use super::backup::BackupWriter;
use super::buffer::{MemoryBuffer, TextBuffer};
use super::{apply_replacements, compute_hash, read_with_hash, write_atomic, FilePatchSummary};
use crate::error::{Result, ReshapeError};
use crate::ingest::detect_language;
use crate::matcher::{find_matches, MatchResult, SearchOptions};
use glob::glob;
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Configuration for a multi-file replacement.
#[derive(Debug, Clone)]
pub struct ApplyFilesConfig {
    /// Glob pattern for matching files.
    pub glob_pattern: String,
    /// Find snippet.
    pub find: String,
    /// Replacement text.
    pub replace: String,
    /// Language tag for every file. Detected from the extension when `None`.
    pub language: Option<String>,
    /// Search options shared by all files.
    pub options: SearchOptions,
}

/// A match found in one file.
#[derive(Debug, Clone, Serialize)]
pub struct FileMatch {
    /// File where the match was found.
    pub file: PathBuf,
    /// Language tag used for the file.
    pub language: String,
    /// Line number (1-based).
    pub line: usize,
    /// Column number (0-based, bytes).
    pub column: usize,
    /// The matched text.
    pub matched_text: String,
    /// The match itself.
    #[serde(flatten)]
    pub result: MatchResult,
}

/// Result of a multi-file replacement.
#[derive(Debug, Clone, Serialize)]
pub struct ApplyFilesResult {
    /// Files that were patched.
    pub files_patched: Vec<FilePatchSummary>,
    /// Number of replacements made.
    pub replacements_count: usize,
}

struct FileSearch {
    path: PathBuf,
    language: String,
    content: String,
    before_hash: String,
    matches: Vec<MatchResult>,
}

/// Find matches in every file selected by the glob.
pub fn find_in_files(config: &ApplyFilesConfig) -> Result<Vec<FileMatch>> {
    let mut found = Vec::new();

    for search in search_files(config)? {
        let buffer = MemoryBuffer::new(&search.content);
        for result in search.matches {
            let position = buffer.position_at(result.span.start);
            found.push(FileMatch {
                file: search.path.clone(),
                language: search.language.clone(),
                line: position.line + 1,
                column: position.column,
                matched_text: search
                    .content
                    .get(result.span.start..result.span.end)
                    .unwrap_or("")
                    .to_string(),
                result,
            });
        }
    }

    Ok(found)
}

/// Replace matches in every file selected by the glob.
///
/// With a backup writer, each file is copied aside before it is written.
/// A failed write rolls back the files already written.
pub fn apply_to_files(
    config: &ApplyFilesConfig,
    mut backup: Option<&mut BackupWriter>,
) -> Result<ApplyFilesResult> {
    let mut pending = Vec::new();
    for search in search_files(config)? {
        if search.matches.is_empty() {
            continue;
        }
        let patched = apply_replacements(&search.content, &search.matches, &config.replace)?;
        pending.push((search, patched));
    }

    let mut written: Vec<(PathBuf, String)> = Vec::new();
    let mut files_patched = Vec::new();
    let mut replacements_count = 0;

    for (search, patched) in pending {
        if let Some(writer) = backup.as_deref_mut() {
            writer.backup_file(&search.path)?;
        }

        if let Err(err) = write_atomic(&search.path, patched.as_bytes()) {
            rollback_files(&written);
            return Err(err);
        }

        log::info!(
            "Patched {} ({} replacement(s))",
            search.path.display(),
            search.matches.len()
        );

        replacements_count += search.matches.len();
        files_patched.push(FilePatchSummary {
            file: search.path.clone(),
            replacements: search.matches.len(),
            before_hash: search.before_hash,
            after_hash: compute_hash(patched.as_bytes()),
        });
        written.push((search.path, search.content));
    }

    Ok(ApplyFilesResult {
        files_patched,
        replacements_count,
    })
}

fn search_files(config: &ApplyFilesConfig) -> Result<Vec<FileSearch>> {
    let mut searches = Vec::new();

    for path in expand_glob(&config.glob_pattern)? {
        let language = language_for(&path, config.language.as_deref())?;
        let (content, before_hash) = read_with_hash(&path)?;
        let matches = find_matches(&content, &config.find, &language, &config.options).map_err(
            |err| match err {
                ReshapeError::Parse { message, .. } => ReshapeError::Parse {
                    origin: format!("find snippet ({})", path.display()),
                    message,
                },
                other => other,
            },
        )?;

        log::debug!("{}: {} match(es)", path.display(), matches.len());
        searches.push(FileSearch {
            path,
            language,
            content,
            before_hash,
            matches,
        });
    }

    Ok(searches)
}

fn expand_glob(pattern: &str) -> Result<Vec<PathBuf>> {
    let mut paths = Vec::new();
    for entry in glob(pattern)? {
        let path = entry.map_err(|e| ReshapeError::Io {
            path: e.path().to_path_buf(),
            source: e.into_error(),
        })?;

        // Skip directories
        if path.is_dir() {
            continue;
        }
        paths.push(path);
    }
    Ok(paths)
}

fn language_for(path: &Path, forced: Option<&str>) -> Result<String> {
    if let Some(tag) = forced {
        return Ok(tag.to_string());
    }
    detect_language(path)
        .map(|language| language.as_str().to_string())
        .ok_or_else(|| {
            ReshapeError::Other(format!(
                "Cannot detect language for file: {}",
                path.display()
            ))
        })
}

fn rollback_files(files: &[(PathBuf, String)]) {
    for (path, original) in files.iter().rev() {
        if let Err(err) = write_atomic(path, original.as_bytes()) {
            log::error!("Rollback failed for {}: {}", path.display(), err);
        }
    }
}
