//! Match orchestration.
//!
//! Structural languages are searched with the syntax-tree matcher first;
//! when that finds nothing the normalized text matcher gets a turn. Every
//! other language goes straight to the text matcher.

pub mod equivalence;
pub mod sequence;

pub use equivalence::{compare_modifiers, compare_node_arrays, equivalent};
pub use sequence::{find_expressions, find_sequences, find_structural};

pub use crate::ingest::Span;

use crate::error::Result;
use crate::ingest::{parse_source, parse_to_pattern, Language};
use crate::text::TextSearch;
use serde::{Deserialize, Serialize};

/// Search configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchOptions {
    /// Ignore the declared name of each top-level matched construct.
    pub ignore_identifiers: bool,
    /// Minimum Sørensen–Dice score for fuzzy text matches. `None` disables fuzzy search.
    pub fuzzy_threshold: Option<f64>,
}

/// How a match was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchMode {
    /// Syntax-tree equivalence. The span is exact.
    Structural,
    /// Normalized text search. The span is a best-effort re-mapping.
    TextApproximate,
    /// Word-window similarity search. The span is a best-effort re-mapping.
    Fuzzy,
}

/// One match in a host document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    /// Byte range in the host text.
    pub span: Span,
    /// How the match was found.
    pub mode: MatchMode,
    /// Number of pattern nodes, for structural matches.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub node_count: Option<usize>,
    /// Similarity score, for fuzzy matches.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
    /// True when the text matcher ran because structural search came up empty.
    #[serde(default)]
    pub fallback: bool,
}

impl MatchResult {
    /// Exact match from the syntax-tree matcher.
    pub fn structural(span: Span, node_count: usize) -> Self {
        Self {
            span,
            mode: MatchMode::Structural,
            node_count: Some(node_count),
            score: None,
            fallback: false,
        }
    }

    /// Approximate match from the normalized text matcher.
    pub fn approximate(span: Span, fallback: bool) -> Self {
        Self {
            span,
            mode: MatchMode::TextApproximate,
            node_count: None,
            score: None,
            fallback,
        }
    }

    /// Approximate match from the fuzzy matcher.
    pub fn fuzzy(span: Span, score: f64) -> Self {
        Self {
            span,
            mode: MatchMode::Fuzzy,
            node_count: None,
            score: Some(score),
            fallback: false,
        }
    }

    /// Whether the span may be off by some characters.
    pub fn is_approximate(&self) -> bool {
        self.mode != MatchMode::Structural
    }

    /// Short confidence label.
    pub fn label(&self) -> String {
        match self.mode {
            MatchMode::Structural => {
                format!("AST match, {} node(s)", self.node_count.unwrap_or(0))
            }
            MatchMode::TextApproximate if self.fallback => {
                "fallback text match (may be approximate)".to_string()
            }
            MatchMode::TextApproximate => "text match (may be approximate)".to_string(),
            MatchMode::Fuzzy => format!("fuzzy match, score {:.2}", self.score.unwrap_or(0.0)),
        }
    }

    /// Preview text: the matched code, what replaces it, and the confidence label.
    pub fn describe(&self, host: &str, replacement: &str, language_tag: &str) -> String {
        let matched = host.get(self.span.start..self.span.end).unwrap_or("");
        let replacement = if replacement.is_empty() {
            "<<DELETE>>"
        } else {
            replacement
        };
        format!(
            "```{lang}\n{matched}\n```\nWill be replaced with:\n```{lang}\n{replacement}\n```\n_{label}_",
            lang = language_tag,
            matched = matched,
            replacement = replacement,
            label = self.label(),
        )
    }
}

/// Find every occurrence of `find_snippet` in `host_text`.
///
/// Returns a [`crate::ReshapeError::Parse`] when a structural language's
/// find snippet does not parse. An empty or comment-only snippet yields no
/// matches. Results are sorted by start offset.
pub fn find_matches(
    host_text: &str,
    find_snippet: &str,
    language_tag: &str,
    options: &SearchOptions,
) -> Result<Vec<MatchResult>> {
    if find_snippet.trim().is_empty() {
        return Ok(Vec::new());
    }

    let structural = Language::from_tag(language_tag).filter(|language| language.supports_structural());

    let mut results = match structural {
        Some(language) => find_structural_or_fallback(host_text, find_snippet, language, options)?,
        None => TextSearch::new(language_tag)
            .fuzzy_threshold(options.fuzzy_threshold)
            .find(host_text, find_snippet),
    };

    results.sort_by_key(|result| result.span.start);
    log::info!(
        "Found {} match(es) for {} snippet",
        results.len(),
        language_tag
    );
    Ok(results)
}

fn find_structural_or_fallback(
    host_text: &str,
    find_snippet: &str,
    language: Language,
    options: &SearchOptions,
) -> Result<Vec<MatchResult>> {
    let pattern = parse_to_pattern(find_snippet, language)?;
    if pattern.is_empty() {
        log::debug!("Find snippet has no statements; nothing to search for");
        return Ok(Vec::new());
    }

    let host = parse_source(host_text, language, "host document")?;
    if let Some((row, column)) = host.first_error() {
        log::warn!(
            "Host document has syntax errors (first at line {}, column {}); searching anyway",
            row + 1,
            column + 1
        );
    }

    let node_count = pattern.len();
    let mut results: Vec<MatchResult> = find_structural(&pattern, &host, options.ignore_identifiers)
        .into_iter()
        .map(|span| MatchResult::structural(span, node_count))
        .collect();

    if results.is_empty() {
        log::debug!("No structural matches; trying normalized text search");
        let fallback = TextSearch::new(language.as_str())
            .fallback(true)
            .find(host_text, find_snippet);
        for candidate in fallback {
            if !results.iter().any(|existing| existing.span == candidate.span) {
                results.push(candidate);
            }
        }
    }

    Ok(results)
}
