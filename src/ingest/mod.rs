//! Source → tree-sitter syntax tree ingestion.
//!
//! This module parses host documents and find snippets with tree-sitter
//! and exposes the result through the [`Syntax`] adapter the matcher
//! works on.

pub mod adapter;
pub mod detect;
pub mod pattern;

pub use adapter::{NodeKind, Syntax};
pub use detect::{detect_language, CommentStyle, Language};
pub use pattern::{parse_to_pattern, Pattern, PatternMode};

use crate::error::{Result, ReshapeError};
use serde::{Deserialize, Serialize};

/// Half-open byte range `[start, end)` into a text buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Span {
    /// Start byte offset (inclusive).
    pub start: usize,
    /// End byte offset (exclusive).
    pub end: usize,
}

impl Span {
    /// Create a new span.
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Number of bytes covered.
    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    /// True for zero-width spans.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether two spans share at least one byte.
    pub fn overlaps(&self, other: &Span) -> bool {
        self.start < other.end && other.start < self.end
    }
}

/// A parsed document: the tree-sitter tree and the text it indexes into.
pub struct SyntaxTree {
    tree: tree_sitter::Tree,
    source: String,
    language: Language,
}

impl std::fmt::Debug for SyntaxTree {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyntaxTree")
            .field("language", &self.language)
            .field("len", &self.source.len())
            .field("has_errors", &self.has_errors())
            .finish()
    }
}

impl SyntaxTree {
    /// Root node of the tree.
    pub fn root(&self) -> Syntax<'_> {
        Syntax::new(self.tree.root_node(), &self.source)
    }

    /// Text the tree was parsed from.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Language of the grammar used.
    pub fn language(&self) -> Language {
        self.language
    }

    /// Whether tree-sitter had to recover from syntax errors.
    pub fn has_errors(&self) -> bool {
        self.tree.root_node().has_error()
    }

    /// Location of the first ERROR or MISSING node, as (0-based row, byte column).
    pub fn first_error(&self) -> Option<(usize, usize)> {
        first_error_node(self.tree.root_node()).map(|node| {
            let point = node.start_position();
            (point.row, point.column)
        })
    }
}

fn first_error_node(node: tree_sitter::Node<'_>) -> Option<tree_sitter::Node<'_>> {
    if node.is_error() || node.is_missing() {
        return Some(node);
    }
    if !node.has_error() {
        return None;
    }
    let mut cursor = node.walk();
    let children: Vec<_> = node.children(&mut cursor).collect();
    children.into_iter().find_map(first_error_node)
}

/// Parse `source` with the grammar for `language`.
///
/// `origin` names what is being parsed and only appears in error messages.
/// Trees with recovered syntax errors are returned as-is; callers decide
/// whether that is acceptable.
pub fn parse_source(source: &str, language: Language, origin: &str) -> Result<SyntaxTree> {
    let grammar = language
        .tree_sitter_language()
        .ok_or_else(|| ReshapeError::UnsupportedLanguage(language.as_str().to_string()))?;

    let mut parser = tree_sitter::Parser::new();
    parser
        .set_language(&grammar)
        .map_err(|e| ReshapeError::Parse {
            origin: origin.to_string(),
            message: format!("Failed to set {} language: {:?}", language.as_str(), e),
        })?;

    let tree = parser
        .parse(source, None)
        .ok_or_else(|| ReshapeError::Parse {
            origin: origin.to_string(),
            message: "Parse failed - no tree returned".to_string(),
        })?;

    Ok(SyntaxTree {
        tree,
        source: source.to_string(),
        language,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_span_overlap() {
        let a = Span::new(0, 5);
        assert!(a.overlaps(&Span::new(4, 8)));
        assert!(!a.overlaps(&Span::new(5, 8)));
        assert!(!Span::new(3, 3).overlaps(&a));
        assert_eq!(a.len(), 5);
    }

    #[test]
    fn test_parse_reports_errors() {
        let tree = parse_source("foo(((", Language::TypeScript, "test").expect("tree");
        assert!(tree.has_errors());
        assert!(tree.first_error().is_some());

        let clean = parse_source("foo();", Language::TypeScript, "test").expect("tree");
        assert!(!clean.has_errors());
        assert_eq!(clean.first_error(), None);
    }

    #[test]
    fn test_parse_unsupported_language() {
        let result = parse_source("body {}", Language::Css, "test");
        assert!(matches!(result, Err(ReshapeError::UnsupportedLanguage(_))));
    }
}
