//! Span replacement with atomic writes.
//!
//! This module provides the edit side of find/replace:
//! - Span validation (bounds, UTF-8 boundaries, no overlaps)
//! - Rope edits applied in descending start order
//! - Atomic file replacement (temp file in the same directory + fsync + rename)
//! - SHA-256 content hashes for stale-match and backup checks

pub mod backup;
pub mod buffer;
pub mod pattern;

use crate::error::{Result, ReshapeError};
use crate::ingest::Span;
use crate::matcher::MatchResult;
use ropey::Rope;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::io::Write;
use std::path::{Path, PathBuf};

pub use backup::{restore_from_manifest, BackupEntry, BackupManifest, BackupWriter};
pub use buffer::{FileBuffer, MemoryBuffer, Position, TextBuffer};
pub use pattern::{apply_to_files, find_in_files, ApplyFilesConfig, ApplyFilesResult, FileMatch};

/// Result summary for a patched file.
#[derive(Debug, Clone, Serialize)]
pub struct FilePatchSummary {
    /// Path of the patched file.
    pub file: PathBuf,
    /// Number of spans replaced.
    pub replacements: usize,
    /// SHA-256 before patching.
    pub before_hash: String,
    /// SHA-256 after patching.
    pub after_hash: String,
}

/// Replace every matched span in `host_text` with `replacement`.
///
/// Spans are validated first, then applied from the highest start offset
/// down so earlier offsets stay valid while later text changes length.
pub fn apply_replacements(host_text: &str, matches: &[MatchResult], replacement: &str) -> Result<String> {
    let spans: Vec<Span> = matches.iter().map(|m| m.span).collect();
    apply_spans(host_text, &spans, replacement)
}

/// Span form of [`apply_replacements`].
pub fn apply_spans(host_text: &str, spans: &[Span], replacement: &str) -> Result<String> {
    validate_spans(host_text, spans)?;

    let mut ordered = spans.to_vec();
    ordered.sort_by_key(|span| std::cmp::Reverse(span.start));

    let mut rope = Rope::from_str(host_text);
    for span in &ordered {
        let start_char = rope.byte_to_char(span.start);
        let end_char = rope.byte_to_char(span.end);
        rope.remove(start_char..end_char);
        rope.insert(start_char, replacement);
    }

    log::debug!("Applied {} replacement(s)", ordered.len());
    Ok(rope.to_string())
}

/// Check that every span is in bounds, on char boundaries, and disjoint from the others.
pub fn validate_spans(text: &str, spans: &[Span]) -> Result<()> {
    let mut sorted = spans.to_vec();
    sorted.sort();

    let mut previous: Option<Span> = None;
    for span in sorted {
        if span.start > span.end
            || span.end > text.len()
            || !text.is_char_boundary(span.start)
            || !text.is_char_boundary(span.end)
        {
            return Err(ReshapeError::InvalidSpan {
                start: span.start,
                end: span.end,
                len: text.len(),
            });
        }

        if let Some(prev) = previous {
            if span.start < prev.end {
                return Err(ReshapeError::OverlappingMatches {
                    first_start: prev.start,
                    first_end: prev.end,
                    second_start: span.start,
                    second_end: span.end,
                });
            }
        }
        previous = Some(span);
    }

    Ok(())
}

/// Compute SHA-256 hash of contents.
pub fn compute_hash(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    let result = hasher.finalize();
    format!("{:x}", result)
}

/// Read a UTF-8 file together with its hash.
pub fn read_with_hash(path: &Path) -> Result<(String, String)> {
    let bytes = std::fs::read(path).map_err(|e| ReshapeError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;
    let hash = compute_hash(&bytes);
    let data = String::from_utf8(bytes).map_err(|e| ReshapeError::Utf8(e.utf8_error()))?;
    Ok((data, hash))
}

/// Replace `file_path` with `content` via a synced temp file in the same directory.
pub fn write_atomic(file_path: &Path, content: &[u8]) -> Result<()> {
    let io_err = |source: std::io::Error| ReshapeError::Io {
        path: file_path.to_path_buf(),
        source,
    };

    let file_dir = match file_path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };

    let mut temp_file = tempfile::NamedTempFile::new_in(file_dir).map_err(io_err)?;
    temp_file.write_all(content).map_err(io_err)?;
    temp_file.as_file().sync_all().map_err(io_err)?;
    temp_file.persist(file_path).map_err(|e| io_err(e.error))?;
    Ok(())
}

/// Apply matches to a file on disk and write it back atomically.
pub fn patch_file(file_path: &Path, matches: &[MatchResult], replacement: &str) -> Result<FilePatchSummary> {
    let (original, before_hash) = read_with_hash(file_path)?;
    let patched = apply_replacements(&original, matches, replacement)?;
    write_atomic(file_path, patched.as_bytes())?;

    log::info!(
        "Patched {} ({} replacement(s))",
        file_path.display(),
        matches.len()
    );

    Ok(FilePatchSummary {
        file: file_path.to_path_buf(),
        replacements: matches.len(),
        before_hash,
        after_hash: compute_hash(patched.as_bytes()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_descending_application_keeps_offsets() {
        let text = "0123456789abcdefghij0123456789";
        let spans = [Span::new(5, 10), Span::new(20, 25)];
        let result = apply_spans(text, &spans, "XYZ").expect("apply");
        assert_eq!(result, "01234XYZabcdefghijXYZ56789");
    }

    #[test]
    fn test_overlap_rejected() {
        let result = validate_spans("abcdefghij", &[Span::new(0, 5), Span::new(4, 6)]);
        assert!(matches!(result, Err(ReshapeError::OverlappingMatches { .. })));
    }

    #[test]
    fn test_out_of_bounds_and_char_boundary_rejected() {
        assert!(matches!(
            validate_spans("abc", &[Span::new(1, 9)]),
            Err(ReshapeError::InvalidSpan { .. })
        ));
        assert!(matches!(
            validate_spans("é", &[Span::new(1, 2)]),
            Err(ReshapeError::InvalidSpan { .. })
        ));
    }

    #[test]
    fn test_multibyte_text() {
        let text = "é = 1; é = 1;";
        let spans = [Span::new(0, 7), Span::new(8, 15)];
        let result = apply_spans(text, &spans, "ok;").expect("apply");
        assert_eq!(result, "ok; ok;");
    }

    #[test]
    fn test_write_atomic_replaces_file() {
        let workspace = TempDir::new().expect("Failed to create temp dir");
        let file = workspace.path().join("a.ts");
        std::fs::write(&file, "old").expect("Failed to write file");

        write_atomic(&file, b"new").expect("Failed to write atomically");

        assert_eq!(std::fs::read_to_string(&file).expect("read"), "new");
        let leftovers = std::fs::read_dir(workspace.path()).expect("read dir").count();
        assert_eq!(leftovers, 1, "No temp files should remain");
    }

    #[test]
    fn test_hash_is_hex_sha256() {
        let hash = compute_hash(b"hello");
        assert_eq!(hash.len(), 64);
        assert_eq!(
            hash,
            "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824"
        );
    }
}
