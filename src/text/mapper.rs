//! Approximate recovery of original offsets from normalized-text offsets.
//!
//! Normalization is lossy, so this is a heuristic. A uniform scale factor
//! projects the normalized offset into the original text, then literal
//! anchor lines taken from the find snippet pin down the start and end
//! within a window around that guess. A match whose start anchor is not in
//! the window is dropped rather than reported at a wrong place.

use super::floor_boundary;
use crate::ingest::Span;

/// Minimum search radius around the projected offset.
const MIN_RADIUS: usize = 200;

/// Slack added around the expected end of a multi-line match.
const END_SLACK: usize = 50;

/// Literal text used to locate a match in the original document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Anchors {
    first: String,
    last: String,
    expected_len: usize,
    single_line: bool,
}

impl Anchors {
    /// Anchors from the first and last non-blank lines of a find snippet.
    ///
    /// Returns `None` for a blank snippet.
    pub fn from_snippet(snippet: &str) -> Option<Self> {
        let trimmed = snippet.trim();
        let lines: Vec<&str> = trimmed
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .collect();

        let first = lines.first()?;
        let last = lines.last()?;
        Some(Self {
            first: first.to_string(),
            last: last.to_string(),
            expected_len: trimmed.len(),
            single_line: lines.len() == 1,
        })
    }

    /// Anchors from a window of normalized words: the first and last word.
    pub fn from_words(words: &[&str]) -> Option<Self> {
        let first = words.first()?;
        let last = words.last()?;
        Some(Self {
            first: first.to_string(),
            last: last.to_string(),
            expected_len: words.iter().map(|word| word.len()).sum::<usize>() + words.len() - 1,
            single_line: words.len() == 1,
        })
    }

    /// Start anchor.
    pub fn first(&self) -> &str {
        &self.first
    }

    /// End anchor.
    pub fn last(&self) -> &str {
        &self.last
    }

    /// Length of the snippet the anchors came from.
    pub fn expected_len(&self) -> usize {
        self.expected_len
    }
}

/// Maps normalized offsets of one document back into its original text.
#[derive(Debug, Clone, Copy)]
pub struct RangeMapper<'a> {
    original: &'a str,
    scale: f64,
}

impl<'a> RangeMapper<'a> {
    /// Mapper for `original`, whose normalized form is `normalized_len` bytes long.
    pub fn new(original: &'a str, normalized_len: usize) -> Self {
        let scale = if normalized_len == 0 {
            1.0
        } else {
            original.len() as f64 / normalized_len as f64
        };
        Self { original, scale }
    }

    /// Ratio of original to normalized length.
    pub fn scale_factor(&self) -> f64 {
        self.scale
    }

    /// Recover the original span of a match found at `normalized_offset`.
    ///
    /// This is not a plain first-hit/last-hit search. The start anchor is
    /// the occurrence nearest the projected offset, not the first one in
    /// the window, so neighbouring repeats map to distinct spans. A
    /// single-line snippet ends at its own anchor. A multi-line snippet
    /// looks for its last anchor only in a window sized from the expected
    /// length, searching from the right.
    pub fn map(&self, normalized_offset: usize, anchors: &Anchors) -> Option<Span> {
        let doc_len = self.original.len();
        let approx = ((normalized_offset as f64 * self.scale).round() as usize).min(doc_len);
        let radius = MIN_RADIUS.max(anchors.expected_len.saturating_mul(3));

        let window_start = floor_boundary(self.original, approx.saturating_sub(radius));
        let window_end = floor_boundary(self.original, approx.saturating_add(radius));
        let window = self.original.get(window_start..window_end)?;

        // Nearest occurrence to the projection, so close repeats stay distinct.
        let start = window
            .match_indices(anchors.first.as_str())
            .map(|(offset, _)| window_start + offset)
            .min_by_key(|candidate| candidate.abs_diff(approx))?;

        let end = if anchors.single_line {
            start + anchors.first.len()
        } else {
            self.find_end(start, radius, anchors)
                .unwrap_or(start + anchors.expected_len)
        };

        let end = floor_boundary(self.original, end.max(start));
        log::debug!(
            "Mapped normalized offset {} to {}..{} (scale {:.3})",
            normalized_offset,
            start,
            end,
            self.scale
        );
        Some(Span::new(start, end))
    }

    fn find_end(&self, start: usize, radius: usize, anchors: &Anchors) -> Option<usize> {
        let doc_len = self.original.len();
        let expected = anchors.expected_len;

        let skip = expected.saturating_sub(anchors.last.len() + END_SLACK);
        let scaled = (expected as f64 * self.scale).ceil() as usize;
        let reach = (expected.max(scaled) + END_SLACK).min(expected + radius);

        let from = floor_boundary(self.original, start + skip);
        let to = floor_boundary(self.original, (start + reach).min(doc_len));
        if from >= to {
            return None;
        }

        let region = self.original.get(from..to)?;
        region
            .rfind(anchors.last.as_str())
            .map(|offset| from + offset + anchors.last.len())
    }
}

/// One-shot form of [`RangeMapper::map`].
pub fn map_to_original(
    original: &str,
    normalized_len: usize,
    normalized_offset: usize,
    anchors: &Anchors,
) -> Option<Span> {
    RangeMapper::new(original, normalized_len).map(normalized_offset, anchors)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::text::normalize_text;

    fn map_first(original: &str, snippet: &str, tag: &str) -> Option<Span> {
        let normalized = normalize_text(original, tag);
        let target = normalize_text(snippet, tag);
        let offset = normalized.find(&target)?;
        let anchors = Anchors::from_snippet(snippet)?;
        map_to_original(original, normalized.len(), offset, &anchors)
    }

    #[test]
    fn test_anchor_lines() {
        let anchors = Anchors::from_snippet("\n  if (a) {\n\n    b();\n  }\n").expect("anchors");
        assert_eq!(anchors.first(), "if (a) {");
        assert_eq!(anchors.last(), "}");
        assert!(!anchors.single_line);
        assert!(Anchors::from_snippet(" \n\t").is_none());
    }

    #[test]
    fn test_nearest_start_anchor_wins() {
        let original = "x: 1;\nx: 1;\n";
        let normalized = normalize_text(original, "css");
        assert_eq!(normalized, "x: 1; x: 1;");
        let anchors = Anchors::from_snippet("x: 1;").expect("anchors");

        let first = map_to_original(original, normalized.len(), 0, &anchors);
        let second = map_to_original(original, normalized.len(), 6, &anchors);
        assert_eq!(first, Some(Span::new(0, 5)));
        assert_eq!(second, Some(Span::new(6, 11)));
    }

    #[test]
    fn test_single_line_span() {
        let span = map_first("body { color: red; }", "color: red;", "css").expect("span");
        assert_eq!(span, Span::new(7, 18));
    }

    #[test]
    fn test_multi_line_span_ends_at_last_anchor() {
        let original = "/* header */\nrule {\n    a: 1;\n    b: 2;\n}\n";
        let span = map_first(original, "a: 1;\nb: 2;", "css").expect("span");
        assert_eq!(&original[span.start..span.end], "a: 1;\n    b: 2;");
    }

    #[test]
    fn test_missing_anchor_drops_match() {
        let anchors = Anchors::from_snippet("absent").expect("anchors");
        assert_eq!(map_to_original("nothing to see", 14, 0, &anchors), None);
    }

    #[test]
    fn test_word_anchors() {
        let anchors = Anchors::from_words(&["a", "bb", "c"]).expect("anchors");
        assert_eq!(anchors.expected_len(), 6);
        assert_eq!(anchors.first(), "a");
        assert_eq!(anchors.last(), "c");
    }
}
