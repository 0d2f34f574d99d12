//! Normalized text matching.
//!
//! The fallback path for languages without a structural parser, and for
//! structural languages when the tree matcher finds nothing. Normalization
//! drops comments and collapses whitespace, which loses the offsets needed
//! for editing; [`mapper`] recovers approximate ones.

pub mod mapper;
pub mod search;

pub use crate::ingest::CommentStyle;
pub use mapper::{map_to_original, Anchors, RangeMapper};
pub use search::{find_approximate_matches, TextSearch};

use crate::ingest::Language;
use regex::Regex;
use std::borrow::Cow;
use std::sync::OnceLock;

/// Strip comments for `language_tag`, collapse whitespace runs to one space, then trim.
///
/// Unknown tags skip comment stripping. The result cannot be mapped back to
/// original offsets.
pub fn normalize_text(text: &str, language_tag: &str) -> String {
    let stripped = match Language::from_tag(language_tag).and_then(|language| language.comment_style()) {
        Some(style) => strip_comments(text, style),
        None => {
            log::debug!("No comment rules for language tag '{}'", language_tag);
            Cow::Borrowed(text)
        }
    };

    stripped.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Convert CRLF and lone CR line endings to LF, optionally trimming the result.
pub fn normalize_line_endings(text: &str, trim: bool) -> String {
    let unified = text.replace("\r\n", "\n").replace('\r', "\n");
    if trim {
        unified.trim().to_string()
    } else {
        unified
    }
}

fn strip_comments(text: &str, style: CommentStyle) -> Cow<'_, str> {
    match comment_regex(style) {
        Some(regex) => regex.replace_all(text, " "),
        None => Cow::Borrowed(text),
    }
}

fn comment_regex(style: CommentStyle) -> Option<&'static Regex> {
    static BLOCK_AND_LINE: OnceLock<Option<Regex>> = OnceLock::new();
    static BLOCK_ONLY: OnceLock<Option<Regex>> = OnceLock::new();
    static MARKUP: OnceLock<Option<Regex>> = OnceLock::new();
    static HASH: OnceLock<Option<Regex>> = OnceLock::new();

    let (cell, pattern) = match style {
        CommentStyle::BlockAndLine => (&BLOCK_AND_LINE, r"(?s:/\*.*?\*/)|//[^\n]*"),
        CommentStyle::BlockOnly => (&BLOCK_ONLY, r"(?s)/\*.*?\*/"),
        CommentStyle::Markup => (&MARKUP, r"(?s)<!--.*?-->"),
        CommentStyle::Hash => (&HASH, r"#[^\n]*"),
    };
    cell.get_or_init(|| Regex::new(pattern).ok()).as_ref()
}

/// Largest char boundary at or below `index`.
pub(crate) fn floor_boundary(text: &str, index: usize) -> usize {
    let mut index = index.min(text.len());
    while !text.is_char_boundary(index) {
        index -= 1;
    }
    index
}
