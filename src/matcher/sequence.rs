//! Sibling-run search over a host tree.
//!
//! Statement patterns are tried against every statement list in the host,
//! at any depth. Within one list matches are greedy, leftmost-first and
//! never overlap. Expression patterns are tried against every named node.

use super::equivalence::equivalent;
use crate::ingest::{Pattern, PatternMode, Span, Syntax, SyntaxTree};

/// Loop and labeled statements whose `body` may be a single braceless statement.
const SINGLE_BODY_KINDS: &[&str] = &[
    "for_statement",
    "for_in_statement",
    "while_statement",
    "do_statement",
    "with_statement",
    "labeled_statement",
];

/// Run a parsed pattern against a parsed host, dispatching on the pattern mode.
pub fn find_structural(pattern: &Pattern, host: &SyntaxTree, ignore_names_at_top: bool) -> Vec<Span> {
    let nodes = pattern.nodes();
    match pattern.mode() {
        PatternMode::Statements => find_sequences(&nodes, host.root(), ignore_names_at_top),
        PatternMode::Expression => match nodes.first() {
            Some(expression) => find_expressions(*expression, host.root(), ignore_names_at_top),
            None => Vec::new(),
        },
    }
}

/// Find every run of consecutive siblings equivalent to `pattern`.
///
/// Spans run from the start of the first sibling to the end of the last,
/// sorted by start offset. An empty pattern yields nothing.
pub fn find_sequences(pattern: &[Syntax<'_>], root: Syntax<'_>, ignore_names_at_top: bool) -> Vec<Span> {
    let mut spans = Vec::new();
    if pattern.is_empty() {
        return spans;
    }

    let mut stack = vec![root];
    while let Some(node) = stack.pop() {
        for siblings in statement_lists(node) {
            scan_siblings(&siblings, pattern, ignore_names_at_top, &mut spans);
        }

        let mut children = node.named_children();
        children.reverse();
        stack.extend(children);
    }

    spans.sort();
    spans.dedup();
    log::debug!(
        "Statement search with {} pattern node(s) found {} match(es)",
        pattern.len(),
        spans.len()
    );
    spans
}

/// Find every node equivalent to a single expression pattern.
///
/// A matched node is not searched again for nested occurrences.
pub fn find_expressions(pattern: Syntax<'_>, root: Syntax<'_>, ignore_names_at_top: bool) -> Vec<Span> {
    let mut spans = Vec::new();
    let mut stack = vec![root];

    while let Some(node) = stack.pop() {
        if equivalent(Some(node), Some(pattern), ignore_names_at_top) {
            spans.push(node.span());
            continue;
        }
        let mut children = node.named_children();
        children.reverse();
        stack.extend(children);
    }

    spans.sort();
    log::debug!("Expression search found {} match(es)", spans.len());
    spans
}

fn scan_siblings(
    siblings: &[Syntax<'_>],
    pattern: &[Syntax<'_>],
    ignore_names_at_top: bool,
    spans: &mut Vec<Span>,
) {
    let k = pattern.len();
    if k > siblings.len() {
        return;
    }

    let mut i = 0;
    while i + k <= siblings.len() {
        let matched = pattern
            .iter()
            .enumerate()
            .all(|(j, expected)| equivalent(Some(siblings[i + j]), Some(*expected), ignore_names_at_top));

        if matched {
            let span = Span::new(siblings[i].span().start, siblings[i + k - 1].span().end);
            log::debug!("Matched sibling run at {}..{}", span.start, span.end);
            spans.push(span);
            i += k;
        } else {
            i += 1;
        }
    }
}

/// Statement lists owned directly by `node`.
///
/// Braceless single-statement bodies count as one-element lists so a
/// one-statement pattern still finds them.
fn statement_lists<'t>(node: Syntax<'t>) -> Vec<Vec<Syntax<'t>>> {
    match node.grammar_kind() {
        "program" | "statement_block" | "class_body" => vec![node.named_children()],
        "switch_case" | "switch_default" => vec![node.field_all("body")],
        "if_statement" => braceless(node.field("consequence")),
        "else_clause" => braceless(node.first_named()),
        kind if SINGLE_BODY_KINDS.contains(&kind) => braceless(node.field("body")),
        _ => Vec::new(),
    }
}

fn braceless<'t>(body: Option<Syntax<'t>>) -> Vec<Vec<Syntax<'t>>> {
    match body {
        Some(statement) if statement.grammar_kind() != "statement_block" => vec![vec![statement]],
        _ => Vec::new(),
    }
}
