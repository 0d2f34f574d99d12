//! Find-snippet parsing.
//!
//! A snippet is either a single bare expression or a list of statements.
//! The distinction matters: `foo()` matches the call wherever it is used
//! as a value, `foo();` only matches a standalone statement.

use super::{parse_source, Language, Syntax, SyntaxTree};
use crate::error::{Result, ReshapeError};

/// How a pattern is matched against the host tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatternMode {
    /// One expression, compared against every node of the host.
    Expression,
    /// Consecutive statements, compared against statement-list siblings.
    Statements,
}

/// Parsed find snippet.
#[derive(Debug)]
pub struct Pattern {
    tree: SyntaxTree,
    mode: PatternMode,
}

impl Pattern {
    /// Matching mode chosen for the snippet.
    pub fn mode(&self) -> PatternMode {
        self.mode
    }

    /// The tree the pattern nodes live in.
    pub fn tree(&self) -> &SyntaxTree {
        &self.tree
    }

    /// Ordered pattern nodes.
    pub fn nodes(&self) -> Vec<Syntax<'_>> {
        let statements = self.tree.root().named_children();
        match self.mode {
            PatternMode::Statements => statements,
            PatternMode::Expression => statements
                .first()
                .and_then(|statement| statement.first_named())
                .into_iter()
                .collect(),
        }
    }

    /// Number of pattern nodes.
    pub fn len(&self) -> usize {
        self.nodes().len()
    }

    /// True when the snippet holds nothing to search for (only comments, say).
    pub fn is_empty(&self) -> bool {
        self.nodes().is_empty()
    }
}

/// Parse a find snippet into a [`Pattern`].
///
/// The snippet is trimmed first. A snippet that does not parse cleanly is a
/// [`ReshapeError::Parse`]; a snippet with no statements yields an empty
/// pattern, not an error.
pub fn parse_to_pattern(snippet: &str, language: Language) -> Result<Pattern> {
    let trimmed = snippet.trim();
    let tree = parse_source(trimmed, language, "find snippet")?;

    if let Some((row, column)) = tree.first_error() {
        return Err(ReshapeError::Parse {
            origin: "find snippet".to_string(),
            message: format!(
                "syntax error at line {}, column {}",
                row + 1,
                column + 1
            ),
        });
    }

    let statements = tree.root().named_children();
    let bare_expression = statements.len() == 1
        && statements[0].grammar_kind() == "expression_statement"
        && !trimmed.ends_with(';');

    let mode = if bare_expression {
        PatternMode::Expression
    } else {
        PatternMode::Statements
    };

    log::debug!(
        "Parsed find snippet as {:?} with {} top-level statement(s)",
        mode,
        statements.len()
    );

    Ok(Pattern { tree, mode })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::NodeKind;

    #[test]
    fn test_bare_expression_without_semicolon() {
        let pattern = parse_to_pattern("  foo()  \n", Language::TypeScript).expect("pattern");
        assert_eq!(pattern.mode(), PatternMode::Expression);
        let nodes = pattern.nodes();
        assert_eq!(nodes.len(), 1);
        assert_eq!(nodes[0].kind(), NodeKind::CallExpression);
    }

    #[test]
    fn test_terminated_expression_is_statement() {
        let pattern = parse_to_pattern("foo();", Language::TypeScript).expect("pattern");
        assert_eq!(pattern.mode(), PatternMode::Statements);
        assert_eq!(pattern.nodes()[0].kind(), NodeKind::ExpressionStatement);
    }

    #[test]
    fn test_multiple_statements() {
        let pattern =
            parse_to_pattern("init();\nrun()", Language::JavaScript).expect("pattern");
        assert_eq!(pattern.mode(), PatternMode::Statements);
        assert_eq!(pattern.len(), 2);
    }

    #[test]
    fn test_comment_only_snippet_is_empty() {
        let pattern =
            parse_to_pattern("// nothing here", Language::TypeScript).expect("pattern");
        assert!(pattern.is_empty());
    }

    #[test]
    fn test_malformed_snippet_is_parse_error() {
        let result = parse_to_pattern("foo(((", Language::TypeScript);
        assert!(matches!(result, Err(ReshapeError::Parse { .. })));
    }
}
