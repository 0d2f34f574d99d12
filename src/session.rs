//! Find/replace session state.
//!
//! A [`Session`] holds at most one [`MatchSet`], the result of the latest
//! find. A new find replaces it wholesale. A replace consumes it: the set
//! is cleared once the edits land and kept when they fail, so the caller
//! can retry without searching again.

use crate::error::{Result, ReshapeError};
use crate::ingest::Span;
use crate::matcher::{find_matches, MatchResult, SearchOptions};
use crate::patch::{compute_hash, validate_spans, TextBuffer};
use serde::Serialize;

/// Matches from one find, bound to the text they were computed on.
#[derive(Debug, Clone, Serialize)]
pub struct MatchSet {
    matches: Vec<MatchResult>,
    document_hash: String,
    language: String,
}

impl MatchSet {
    /// Matches in document order.
    pub fn matches(&self) -> &[MatchResult] {
        &self.matches
    }

    /// SHA-256 of the searched text.
    pub fn document_hash(&self) -> &str {
        &self.document_hash
    }

    /// Language tag used for the search.
    pub fn language(&self) -> &str {
        &self.language
    }

    /// Number of matches.
    pub fn len(&self) -> usize {
        self.matches.len()
    }

    /// True when the find came up empty.
    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }
}

/// Outcome of a successful replace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReplaceOutcome {
    /// Number of spans replaced.
    pub replaced: usize,
    /// Set when the edits were applied but saving the buffer failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub save_error: Option<String>,
}

/// Holder of the current match set.
#[derive(Debug, Default)]
pub struct Session {
    current: Option<MatchSet>,
}

impl Session {
    /// Session with no matches.
    pub fn new() -> Self {
        Self::default()
    }

    /// Search `host_text` and make the result the current match set.
    ///
    /// On error (for example a find snippet that does not parse) the
    /// previous match set is left as it was.
    pub fn find(
        &mut self,
        host_text: &str,
        find_snippet: &str,
        language_tag: &str,
        options: &SearchOptions,
    ) -> Result<&MatchSet> {
        let matches = find_matches(host_text, find_snippet, language_tag, options)?;
        let set = MatchSet {
            matches,
            document_hash: compute_hash(host_text.as_bytes()),
            language: language_tag.to_string(),
        };
        Ok(self.current.insert(set))
    }

    /// [`Session::find`] over a buffer's current text.
    pub fn find_in<B: TextBuffer + ?Sized>(
        &mut self,
        buffer: &B,
        find_snippet: &str,
        language_tag: &str,
        options: &SearchOptions,
    ) -> Result<&MatchSet> {
        let text = buffer.text();
        self.find(&text, find_snippet, language_tag, options)
    }

    /// Current match set, if any.
    pub fn current(&self) -> Option<&MatchSet> {
        self.current.as_ref()
    }

    /// Drop the current match set.
    pub fn clear(&mut self) {
        self.current = None;
    }

    /// Replace every current match in `buffer` with `replacement`, then save.
    ///
    /// Fails with [`ReshapeError::NoMatches`] when there is nothing to
    /// replace and [`ReshapeError::StaleMatches`] when the buffer no longer
    /// holds the text that was searched. Edits go in descending start order.
    /// A save failure does not undo the edits; it is reported in the outcome.
    pub fn replace<B: TextBuffer + ?Sized>(
        &mut self,
        buffer: &mut B,
        replacement: &str,
    ) -> Result<ReplaceOutcome> {
        let set = match &self.current {
            Some(set) if !set.is_empty() => set,
            _ => return Err(ReshapeError::NoMatches),
        };

        let original = buffer.text();
        let actual = compute_hash(original.as_bytes());
        if actual != set.document_hash {
            return Err(ReshapeError::StaleMatches {
                expected: set.document_hash.clone(),
                actual,
            });
        }

        let mut spans: Vec<Span> = set.matches.iter().map(|m| m.span).collect();
        validate_spans(&original, &spans)?;
        spans.sort_by_key(|span| std::cmp::Reverse(span.start));

        for span in &spans {
            if let Err(err) = buffer.replace(*span, replacement) {
                log::warn!("Edit at {}..{} failed, restoring buffer: {}", span.start, span.end, err);
                restore(buffer, &original);
                return Err(err);
            }
        }

        let replaced = spans.len();
        self.current = None;

        let save_error = match buffer.save() {
            Ok(()) => None,
            Err(err) => {
                log::warn!("Replaced {} match(es) but saving failed: {}", replaced, err);
                Some(err.to_string())
            }
        };

        log::info!("Replaced {} match(es)", replaced);
        Ok(ReplaceOutcome {
            replaced,
            save_error,
        })
    }
}

fn restore<B: TextBuffer + ?Sized>(buffer: &mut B, original: &str) {
    let current_len = buffer.text().len();
    if let Err(err) = buffer.replace(Span::new(0, current_len), original) {
        log::error!("Failed to restore buffer after a rejected edit: {}", err);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::patch::MemoryBuffer;

    #[test]
    fn test_find_then_replace_clears_set() {
        let mut session = Session::new();
        let mut buffer = MemoryBuffer::new("const a = 1; const b = 2;");

        let found = session
            .find_in(&buffer, "const a = 1;", "typescript", &SearchOptions::default())
            .expect("find");
        assert_eq!(found.len(), 1);

        let outcome = session.replace(&mut buffer, "const a = 10;").expect("replace");
        assert_eq!(outcome.replaced, 1);
        assert_eq!(outcome.save_error, None);
        assert_eq!(buffer.text(), "const a = 10; const b = 2;");
        assert!(session.current().is_none());
    }

    #[test]
    fn test_replace_without_find() {
        let mut session = Session::new();
        let mut buffer = MemoryBuffer::new("x");
        assert!(matches!(
            session.replace(&mut buffer, "y"),
            Err(ReshapeError::NoMatches)
        ));
    }

    #[test]
    fn test_clear() {
        let mut session = Session::new();
        session
            .find("a();", "a();", "javascript", &SearchOptions::default())
            .expect("find");
        assert!(session.current().is_some());
        session.clear();
        assert!(session.current().is_none());
    }
}
