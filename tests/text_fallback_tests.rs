//! Integration tests for the normalized text matcher and its use as a fallback.

use reshape::text::{normalize_line_endings, TextSearch};
use reshape::{find_approximate_matches, find_matches, normalize_text, MatchMode, ReshapeError, SearchOptions, Span};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalization_is_whitespace_insensitive() {
        assert_eq!(normalize_text("  a,   b\n", "css"), normalize_text("a, b", "css"));
        assert_eq!(normalize_text("  a,   b\n", "css"), "a, b");
    }

    #[test]
    fn test_normalization_strips_comments_by_language() {
        assert_eq!(normalize_text("a /* x */ b // y\nc", "typescript"), "a b c");
        assert_eq!(normalize_text("x = 1  # note\ny = 2", "python"), "x = 1 y = 2");
        assert_eq!(normalize_text("<p><!-- hidden --> hi</p>", "html"), "<p> hi</p>");
        // No comment rules for an unknown tag.
        assert_eq!(normalize_text("a // b", "plaintext"), "a // b");
    }

    #[test]
    fn test_line_endings() {
        assert_eq!(normalize_line_endings("a\r\nb\rc\n", false), "a\nb\nc\n");
        assert_eq!(normalize_line_endings("  a\r\n", true), "a");
    }

    #[test]
    fn test_css_scenario() {
        let results = find_matches(
            "body { color: red; }",
            "color: red;",
            "css",
            &SearchOptions::default(),
        )
        .expect("Failed to search");

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].mode, MatchMode::TextApproximate);
        assert_eq!(results[0].span, Span::new(7, 18));
        assert!(!results[0].fallback);
    }

    #[test]
    fn test_structural_language_falls_back_to_text() {
        // `foo();` never appears as a standalone statement, but the text does.
        let host = "let x = foo();";
        let results = find_matches(host, "foo();", "typescript", &SearchOptions::default())
            .expect("Failed to search");

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].mode, MatchMode::TextApproximate);
        assert!(results[0].fallback);
        assert_eq!(&host[results[0].span.start..results[0].span.end], "foo();");
    }

    #[test]
    fn test_snippet_parse_error_is_reported() {
        let result = find_matches("foo();", "foo(((", "typescript", &SearchOptions::default());
        match result {
            Err(ReshapeError::Parse { origin, message }) => {
                assert_eq!(origin, "find snippet");
                assert!(message.contains("line 1"));
            }
            other => panic!("Expected parse error, got {:?}", other),
        }
    }

    #[test]
    fn test_comment_only_snippet_finds_nothing() {
        let results = find_matches("foo();", "// just a note", "typescript", &SearchOptions::default())
            .expect("Failed to search");
        assert!(results.is_empty());
    }

    #[test]
    fn test_multi_line_css_rule() {
        let host = "a {\n  color: red;\n}\n\nb {\n  color: red;\n  margin: 0;\n}\n";
        let results = find_approximate_matches(host, "color: red;\nmargin: 0;", "css");

        assert_eq!(results.len(), 1);
        let span = results[0].span;
        assert_eq!(&host[span.start..span.end], "color: red;\n  margin: 0;");
    }

    #[test]
    fn test_fuzzy_through_find_matches() {
        let host = "let total = price * quantity + shipping;";
        let options = SearchOptions {
            fuzzy_threshold: Some(0.6),
            ..SearchOptions::default()
        };

        // Structural languages never use fuzzy matching.
        let results = find_matches(host, "price * quantity + shiping", "typescript", &options)
            .expect("Failed to search");
        assert!(results.iter().all(|r| r.mode != MatchMode::Fuzzy));

        let results = find_matches(host, "price * quantity + shiping", "plaintext", &options)
            .expect("Failed to search");
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].mode, MatchMode::Fuzzy);
        assert!(results[0].score.unwrap_or(0.0) >= 0.6);
    }

    #[test]
    fn test_direct_search_is_not_marked_fallback() {
        let results = TextSearch::new("scss").find("$a: 1;\n$b: 2;\n", "$b: 2;");
        assert_eq!(results.len(), 1);
        assert!(!results[0].fallback);
        assert_eq!(results[0].span, Span::new(7, 13));
    }
}
