//! Tree-sitter adapter used by the structural matcher.
//!
//! [`Syntax`] wraps a `tree_sitter::Node` together with the text it was
//! parsed from, so nodes from two different parses (the find snippet and
//! the host document) can be compared side by side. Comments and
//! zero-width MISSING nodes never show up in child lists.

use super::Span;
use std::borrow::Cow;
use std::str::Chars;

/// Closed set of node kinds the equivalence relation distinguishes.
///
/// Kinds carrying a `&'static str` keep the grammar's own kind name so two
/// nodes of different grammar kinds never compare equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    /// Root of a parse.
    Program,
    /// Any identifier flavour (`identifier`, `property_identifier`, `type_identifier`, ...).
    Identifier,
    /// Quoted string literal.
    StringLiteral,
    /// Numeric literal.
    NumericLiteral,
    /// Regular expression literal.
    RegexLiteral,
    /// Template string without substitutions.
    TemplateLiteral,
    /// Payload-free keyword expression (`true`, `null`, `this`, ...).
    Keyword(&'static str),
    /// Anonymous token (punctuation, operator or keyword token).
    Token(&'static str),
    /// `variable_declarator`.
    VariableDeclaration,
    /// `lexical_declaration` / `variable_declaration` statement.
    VariableStatement,
    /// `export ...` wrapper.
    ExportStatement,
    /// Expression used as a statement.
    ExpressionStatement,
    /// Call expression.
    CallExpression,
    /// `new` expression.
    NewExpression,
    /// `a.b` / `a?.b`.
    PropertyAccess,
    /// `a[b]` / `a?.[b]`.
    ElementAccess,
    /// TypeScript required or optional parameter.
    Parameter,
    /// Functions, arrows, methods, constructors and accessors.
    FunctionLike(&'static str),
    /// `{ ... }` statement block.
    Block,
    /// `if` statement.
    IfStatement,
    /// Binary, assignment and compound assignment expressions.
    BinaryExpression,
    /// Prefix unary or prefix update expression.
    PrefixUnary,
    /// Postfix update expression.
    PostfixUnary,
    /// `( ... )` expression.
    Parenthesized,
    /// Everything else, compared child by child.
    Other(&'static str),
}

/// A node of a parsed tree plus the source text it indexes into.
#[derive(Clone, Copy)]
pub struct Syntax<'t> {
    node: tree_sitter::Node<'t>,
    source: &'t str,
}

impl<'t> std::fmt::Debug for Syntax<'t> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Syntax")
            .field("kind", &self.node.kind())
            .field("span", &self.span())
            .finish()
    }
}

impl<'t> Syntax<'t> {
    /// Wrap a tree-sitter node. `source` must be the text the tree was parsed from.
    pub fn new(node: tree_sitter::Node<'t>, source: &'t str) -> Self {
        Self { node, source }
    }

    /// The underlying tree-sitter node.
    pub fn raw(&self) -> tree_sitter::Node<'t> {
        self.node
    }

    /// Grammar kind name, e.g. `call_expression`.
    pub fn grammar_kind(&self) -> &'static str {
        self.node.kind()
    }

    /// Whether the node is a named grammar node (not an anonymous token).
    pub fn is_named(&self) -> bool {
        self.node.is_named()
    }

    /// Classified kind tag.
    pub fn kind(&self) -> NodeKind {
        classify(self.node)
    }

    /// Byte span in the owning text.
    pub fn span(&self) -> Span {
        Span::new(self.node.start_byte(), self.node.end_byte())
    }

    /// Source text covered by the node.
    pub fn text(&self) -> &'t str {
        self.source
            .get(self.node.start_byte()..self.node.end_byte())
            .unwrap_or("")
    }

    /// Literal payload compared by the equivalence relation.
    ///
    /// Quoted strings and template strings lose their delimiters and have
    /// their escape sequences decoded, so `"x"`, `'x'` and `'\x78'` carry the
    /// same payload. Numbers and regexes keep their raw text (`1`, `1.0` and
    /// `0x1` all differ).
    pub fn literal_text(&self) -> Cow<'t, str> {
        let text = self.text();
        match self.kind() {
            NodeKind::StringLiteral | NodeKind::TemplateLiteral if text.len() >= 2 => {
                unescape(text.get(1..text.len() - 1).unwrap_or(text))
            }
            _ => Cow::Borrowed(text),
        }
    }

    /// All non-trivia children in source order, anonymous tokens included.
    pub fn children(&self) -> Vec<Syntax<'t>> {
        let mut cursor = self.node.walk();
        self.node
            .children(&mut cursor)
            .filter(|child| !is_trivia(*child))
            .map(|child| Syntax::new(child, self.source))
            .collect()
    }

    /// Named non-trivia children in source order.
    pub fn named_children(&self) -> Vec<Syntax<'t>> {
        let mut cursor = self.node.walk();
        self.node
            .named_children(&mut cursor)
            .filter(|child| !is_trivia(*child))
            .map(|child| Syntax::new(child, self.source))
            .collect()
    }

    /// First named non-trivia child.
    pub fn first_named(&self) -> Option<Syntax<'t>> {
        self.named_children().into_iter().next()
    }

    /// Child stored under a grammar field.
    pub fn field(&self, name: &str) -> Option<Syntax<'t>> {
        self.node
            .child_by_field_name(name)
            .filter(|child| !is_trivia(*child))
            .map(|child| Syntax::new(child, self.source))
    }

    /// Every child stored under a repeated grammar field.
    pub fn field_all(&self, name: &str) -> Vec<Syntax<'t>> {
        let mut cursor = self.node.walk();
        self.node
            .children_by_field_name(name, &mut cursor)
            .filter(|child| !is_trivia(*child))
            .map(|child| Syntax::new(child, self.source))
            .collect()
    }

    /// Named children of the node stored under `name`, or an empty list.
    ///
    /// Used for list-shaped fields such as `arguments` or `parameters`.
    pub fn field_list(&self, name: &str) -> Vec<Syntax<'t>> {
        self.field(name)
            .map(|list| list.named_children())
            .unwrap_or_default()
    }

    /// Whether an anonymous token of the given text is a direct child.
    pub fn has_token(&self, token: &str) -> bool {
        self.children()
            .iter()
            .any(|child| !child.is_named() && child.grammar_kind() == token)
    }

    /// Direct children of the given grammar kind.
    pub fn children_of_kind(&self, kind: &str) -> Vec<Syntax<'t>> {
        self.children()
            .into_iter()
            .filter(|child| child.grammar_kind() == kind)
            .collect()
    }
}

/// Decode the escape sequences of a string or template body.
///
/// Line continuations vanish and surrogate pairs written as two `\u`
/// escapes combine into one character. A malformed escape keeps its
/// character without the backslash.
fn unescape(raw: &str) -> Cow<'_, str> {
    if !raw.contains('\\') {
        return Cow::Borrowed(raw);
    }

    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        let Some(escaped) = chars.next() else {
            out.push('\\');
            break;
        };
        match escaped {
            'n' => out.push('\n'),
            'r' => out.push('\r'),
            't' => out.push('\t'),
            'b' => out.push('\u{8}'),
            'f' => out.push('\u{c}'),
            'v' => out.push('\u{b}'),
            '0' => out.push('\0'),
            'x' => {
                let mut ahead = chars.clone();
                match hex_digits(&mut ahead, 2).and_then(char::from_u32) {
                    Some(decoded) => {
                        chars = ahead;
                        out.push(decoded);
                    }
                    None => out.push('x'),
                }
            }
            'u' => match unicode_escape(&mut chars) {
                Some(unit) => out.push(combine_surrogates(unit, &mut chars)),
                None => out.push('u'),
            },
            // Line continuations.
            '\r' => {
                if chars.clone().next() == Some('\n') {
                    chars.next();
                }
            }
            '\n' | '\u{2028}' | '\u{2029}' => {}
            other => out.push(other),
        }
    }
    Cow::Owned(out)
}

/// Exactly `count` hex digits.
fn hex_digits(chars: &mut Chars<'_>, count: usize) -> Option<u32> {
    let digits: String = chars.by_ref().take(count).collect();
    if digits.len() != count || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    u32::from_str_radix(&digits, 16).ok()
}

/// Body of a `\u` escape: `XXXX` or `{X...}`. Consumes nothing on failure.
fn unicode_escape(chars: &mut Chars<'_>) -> Option<u32> {
    let mut ahead = chars.clone();
    let value = if ahead.clone().next() == Some('{') {
        ahead.next();
        let digits: String = ahead.by_ref().take_while(|c| *c != '}').collect();
        if digits.is_empty() || digits.len() > 6 || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return None;
        }
        u32::from_str_radix(&digits, 16).ok()?
    } else {
        hex_digits(&mut ahead, 4)?
    };
    *chars = ahead;
    Some(value)
}

/// Turn a UTF-16 code unit into a char, pulling in a following `\u` low
/// surrogate when `unit` is a high one. Lone surrogates become U+FFFD.
fn combine_surrogates(unit: u32, chars: &mut Chars<'_>) -> char {
    let mut code = unit;
    if (0xD800..0xDC00).contains(&unit) {
        let mut ahead = chars.clone();
        if ahead.next() == Some('\\') && ahead.next() == Some('u') {
            if let Some(low) = unicode_escape(&mut ahead).filter(|low| (0xDC00..0xE000).contains(low)) {
                *chars = ahead;
                code = 0x10000 + ((unit - 0xD800) << 10) + (low - 0xDC00);
            }
        }
    }
    char::from_u32(code).unwrap_or('\u{FFFD}')
}

/// Comments and error-recovery placeholders carry no structure.
pub fn is_trivia(node: tree_sitter::Node<'_>) -> bool {
    matches!(node.kind(), "comment" | "html_comment") || node.is_missing()
}

fn classify(node: tree_sitter::Node<'_>) -> NodeKind {
    let kind = node.kind();
    if !node.is_named() {
        return NodeKind::Token(kind);
    }

    match kind {
        "program" => NodeKind::Program,
        "identifier"
        | "property_identifier"
        | "shorthand_property_identifier"
        | "shorthand_property_identifier_pattern"
        | "type_identifier"
        | "statement_identifier"
        | "private_property_identifier" => NodeKind::Identifier,
        "string" => NodeKind::StringLiteral,
        "number" => NodeKind::NumericLiteral,
        "regex" => NodeKind::RegexLiteral,
        "template_string" => {
            let mut cursor = node.walk();
            let has_substitution = node
                .named_children(&mut cursor)
                .any(|child| child.kind() == "template_substitution");
            if has_substitution {
                NodeKind::Other(kind)
            } else {
                NodeKind::TemplateLiteral
            }
        }
        "true" | "false" | "null" | "undefined" | "this" | "super" => NodeKind::Keyword(kind),
        "variable_declarator" => NodeKind::VariableDeclaration,
        "lexical_declaration" | "variable_declaration" => NodeKind::VariableStatement,
        "export_statement" => NodeKind::ExportStatement,
        "expression_statement" => NodeKind::ExpressionStatement,
        "call_expression" => NodeKind::CallExpression,
        "new_expression" => NodeKind::NewExpression,
        "member_expression" => NodeKind::PropertyAccess,
        "subscript_expression" => NodeKind::ElementAccess,
        "required_parameter" | "optional_parameter" => NodeKind::Parameter,
        "function_declaration"
        | "generator_function_declaration"
        | "function_expression"
        | "function"
        | "generator_function"
        | "arrow_function"
        | "method_definition" => NodeKind::FunctionLike(kind),
        "statement_block" => NodeKind::Block,
        "if_statement" => NodeKind::IfStatement,
        "binary_expression" | "assignment_expression" | "augmented_assignment_expression" => {
            NodeKind::BinaryExpression
        }
        "unary_expression" => NodeKind::PrefixUnary,
        "update_expression" => {
            // `x++` starts with the operand, `++x` with the operator token.
            match node.child(0) {
                Some(first) if first.is_named() => NodeKind::PostfixUnary,
                _ => NodeKind::PrefixUnary,
            }
        }
        "parenthesized_expression" => NodeKind::Parenthesized,
        _ => NodeKind::Other(kind),
    }
}

#[cfg(test)]
mod tests {
    use crate::ingest::detect::Language;
    use crate::ingest::{parse_source, NodeKind};

    #[test]
    fn test_classify_statements() {
        let tree = parse_source(
            "const a = 1;\nfoo(a);\nif (a) { a++; }\n",
            Language::TypeScript,
            "test",
        )
        .expect("parse");
        let kinds: Vec<NodeKind> = tree
            .root()
            .named_children()
            .iter()
            .map(|n| n.kind())
            .collect();
        assert_eq!(
            kinds,
            vec![
                NodeKind::VariableStatement,
                NodeKind::ExpressionStatement,
                NodeKind::IfStatement
            ]
        );
    }

    #[test]
    fn test_comments_are_trivia() {
        let tree = parse_source(
            "// leading\nfoo(); /* inline */ bar();\n",
            Language::JavaScript,
            "test",
        )
        .expect("parse");
        let statements = tree.root().named_children();
        assert_eq!(statements.len(), 2);
        assert_eq!(statements[0].text(), "foo();");
        assert_eq!(statements[1].text(), "bar();");
    }

    #[test]
    fn test_string_literal_payload_drops_quotes() {
        let tree = parse_source("'x';\n\"x\";\n", Language::TypeScript, "test").expect("parse");
        let statements = tree.root().named_children();
        let single = statements[0].first_named().expect("string");
        let double = statements[1].first_named().expect("string");
        assert_eq!(single.kind(), NodeKind::StringLiteral);
        assert_eq!(single.literal_text(), "x");
        assert_eq!(double.literal_text(), "x");
    }

    #[test]
    fn test_string_literal_payload_decodes_escapes() {
        let tree = parse_source(
            "'it\\'s';\n\"\\x41\\u0042\\u{43}\";\n'\\uD83D\\uDE00';\n`a\\\nb`;\n/a\\x41/;\n",
            Language::TypeScript,
            "test",
        )
        .expect("parse");
        let payloads: Vec<String> = tree
            .root()
            .named_children()
            .iter()
            .filter_map(|statement| statement.first_named())
            .map(|literal| literal.literal_text().into_owned())
            .collect();
        assert_eq!(payloads, vec!["it's", "ABC", "\u{1F600}", "ab", "/a\\x41/"]);
    }

    #[test]
    fn test_unescape_keeps_malformed_escapes() {
        assert_eq!(super::unescape("plain"), "plain");
        assert_eq!(super::unescape("\\q\\xZ1\\u{}"), "qxZ1u{}");
        assert_eq!(super::unescape("\\uD800!"), "\u{FFFD}!");
        assert_eq!(super::unescape("tab\\t\\0"), "tab\t\0");
    }

    #[test]
    fn test_update_expression_direction() {
        let tree = parse_source("x++;\n++x;\n", Language::JavaScript, "test").expect("parse");
        let statements = tree.root().named_children();
        let postfix = statements[0].first_named().expect("expr");
        let prefix = statements[1].first_named().expect("expr");
        assert_eq!(postfix.kind(), NodeKind::PostfixUnary);
        assert_eq!(prefix.kind(), NodeKind::PrefixUnary);
    }
}
