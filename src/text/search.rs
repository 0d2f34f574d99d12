//! Normalized substring search with approximate span recovery.

use super::mapper::{Anchors, RangeMapper};
use super::normalize_text;
use crate::ingest::Span;
use crate::matcher::MatchResult;

/// Text matcher for one language tag.
#[derive(Debug, Clone)]
pub struct TextSearch<'a> {
    language_tag: &'a str,
    fallback: bool,
    fuzzy_threshold: Option<f64>,
}

impl<'a> TextSearch<'a> {
    /// Direct (non-fallback) search without fuzzy matching.
    pub fn new(language_tag: &'a str) -> Self {
        Self {
            language_tag,
            fallback: false,
            fuzzy_threshold: None,
        }
    }

    /// Mark results as coming from a structural search that found nothing.
    ///
    /// Fuzzy search never runs in fallback mode.
    pub fn fallback(mut self, fallback: bool) -> Self {
        self.fallback = fallback;
        self
    }

    /// Enable fuzzy search with the given minimum score, used only when the
    /// exact normalized search finds nothing.
    pub fn fuzzy_threshold(mut self, threshold: Option<f64>) -> Self {
        self.fuzzy_threshold = threshold;
        self
    }

    /// Find every occurrence of `snippet` in `host`, ordered by position.
    pub fn find(&self, host: &str, snippet: &str) -> Vec<MatchResult> {
        let normalized_doc = normalize_text(host, self.language_tag);
        let target = normalize_text(snippet, self.language_tag);
        if target.is_empty() {
            return Vec::new();
        }

        let mapper = RangeMapper::new(host, normalized_doc.len());
        let mut spans: Vec<Span> = Vec::new();

        if let Some(anchors) = Anchors::from_snippet(snippet) {
            let mut offset = 0;
            while let Some(found) = normalized_doc.get(offset..).and_then(|rest| rest.find(&target)) {
                let index = offset + found;
                match mapper.map(index, &anchors) {
                    Some(span) => {
                        accept(&mut spans, span);
                    }
                    None => log::debug!("Dropped text match at normalized offset {}", index),
                }
                offset = index + normalized_doc[index..].chars().next().map_or(1, char::len_utf8);
            }
        }

        let mut results: Vec<MatchResult> = spans
            .iter()
            .map(|span| MatchResult::approximate(*span, self.fallback))
            .collect();

        if results.is_empty() && !self.fallback {
            if let Some(threshold) = self.fuzzy_threshold {
                results = fuzzy_search(&normalized_doc, &target, threshold, &mapper);
            }
        }

        results.sort_by_key(|result| result.span.start);
        log::debug!(
            "Text search ({}) found {} match(es)",
            self.language_tag,
            results.len()
        );
        results
    }
}

/// Normalized text search in direct mode.
pub fn find_approximate_matches(host_text: &str, find_snippet: &str, language_tag: &str) -> Vec<MatchResult> {
    TextSearch::new(language_tag).find(host_text, find_snippet)
}

/// Keep `span` unless it repeats or overlaps one already accepted.
fn accept(spans: &mut Vec<Span>, span: Span) -> bool {
    if spans.iter().any(|existing| *existing == span || existing.overlaps(&span)) {
        return false;
    }
    spans.push(span);
    true
}

/// Words of a normalized text with their byte offsets.
fn words(text: &str) -> Vec<(usize, &str)> {
    let mut found = Vec::new();
    let mut offset = 0;
    for word in text.split(' ') {
        if !word.is_empty() {
            found.push((offset, word));
        }
        offset += word.len() + 1;
    }
    found
}

fn fuzzy_search(normalized_doc: &str, target: &str, threshold: f64, mapper: &RangeMapper<'_>) -> Vec<MatchResult> {
    let doc_words = words(normalized_doc);
    let width = words(target).len();
    if width == 0 || width > doc_words.len() {
        return Vec::new();
    }

    let mut scored: Vec<(f64, usize)> = (0..=doc_words.len() - width)
        .filter_map(|i| {
            let (start, _) = doc_words[i];
            let (last_offset, last_word) = doc_words[i + width - 1];
            let window = normalized_doc.get(start..last_offset + last_word.len())?;
            let score = strsim::sorensen_dice(window, target);
            (score >= threshold).then_some((score, i))
        })
        .collect();

    scored.sort_by(|a, b| b.0.total_cmp(&a.0).then(a.1.cmp(&b.1)));

    let mut taken: Vec<usize> = Vec::new();
    let mut spans: Vec<Span> = Vec::new();
    let mut results = Vec::new();

    for (score, i) in scored {
        if taken.iter().any(|&other| i < other + width && other < i + width) {
            continue;
        }
        let window: Vec<&str> = doc_words[i..i + width].iter().map(|(_, word)| *word).collect();
        let Some(anchors) = Anchors::from_words(&window) else {
            continue;
        };
        if let Some(span) = mapper.map(doc_words[i].0, &anchors) {
            if accept(&mut spans, span) {
                taken.push(i);
                results.push(MatchResult::fuzzy(span, score));
            }
        }
    }

    results
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matcher::MatchMode;

    #[test]
    fn test_repeated_occurrences_stay_distinct() {
        let host = "a { color: red; }\nb { color: red; }\n";
        let results = find_approximate_matches(host, "color: red;", "css");
        assert_eq!(results.len(), 2);
        for result in &results {
            assert_eq!(&host[result.span.start..result.span.end], "color: red;");
            assert_eq!(result.mode, MatchMode::TextApproximate);
            assert!(!result.fallback);
        }
    }

    #[test]
    fn test_comments_in_host_are_skipped() {
        let host = "x {\n  margin: 0;\n  /* reset */\n  padding: 0;\n}";
        let results = find_approximate_matches(host, "margin: 0;\npadding: 0;", "css");
        assert_eq!(results.len(), 1);
        let span = results[0].span;
        assert_eq!(
            &host[span.start..span.end],
            "margin: 0;\n  /* reset */\n  padding: 0;"
        );
    }

    #[test]
    fn test_unlocatable_anchor_is_dropped() {
        // The snippet line never appears verbatim in the host.
        let host = "x { margin: 0; /* reset */ padding: 0; }";
        assert!(find_approximate_matches(host, "margin: 0; padding: 0;", "css").is_empty());
    }

    #[test]
    fn test_no_match() {
        assert!(find_approximate_matches("a { b: c; }", "d: e;", "css").is_empty());
    }

    #[test]
    fn test_fuzzy_only_when_enabled() {
        let host = "The quick brown fox jumps over the lazy dog";
        let snippet = "quick brown fax jumps";
        assert!(TextSearch::new("plaintext").find(host, snippet).is_empty());

        let results = TextSearch::new("plaintext")
            .fuzzy_threshold(Some(0.7))
            .find(host, snippet);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].mode, MatchMode::Fuzzy);
        assert_eq!(
            &host[results[0].span.start..results[0].span.end],
            "quick brown fox jumps"
        );
    }

    #[test]
    fn test_fallback_mode_skips_fuzzy() {
        let results = TextSearch::new("plaintext")
            .fallback(true)
            .fuzzy_threshold(Some(0.1))
            .find("alpha beta", "gamma");
        assert!(results.is_empty());
    }
}
