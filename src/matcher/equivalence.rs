//! Structural equivalence of two syntax nodes.
//!
//! Nodes may come from different parses (a find snippet and a host
//! document). Comparison is purely syntactic: no types, no scopes.
//!
//! The `ignore_names_here` flag only ever reaches the declared name of the
//! construct being compared (see [`declared_name`]); every other recursive
//! call passes `false`. Ignoring identifiers is therefore a single-level
//! effect and never leaks into parameters, bodies or nested declarations.

use crate::ingest::{NodeKind, Syntax};

/// Modifier keywords that tree-sitter emits as anonymous tokens.
const MODIFIER_TOKENS: &[&str] = &[
    "static", "async", "get", "set", "readonly", "declare", "abstract", "override", "accessor",
];

/// Structural equality of two optional nodes.
///
/// Two absent nodes are equal, one absent node never equals a present one.
/// Identifiers compare by text unless `ignore_names_here` is set, in which
/// case any identifier matches any identifier at this call only.
pub fn equivalent(a: Option<Syntax<'_>>, b: Option<Syntax<'_>>, ignore_names_here: bool) -> bool {
    match (a, b) {
        (None, None) => true,
        (Some(a), Some(b)) => nodes_equivalent(a, b, ignore_names_here),
        _ => false,
    }
}

/// Pairwise equivalence of two node lists. Lengths must match and names
/// are never ignored inside lists.
pub fn compare_node_arrays(a: &[Syntax<'_>], b: &[Syntax<'_>]) -> bool {
    a.len() == b.len()
        && a
            .iter()
            .zip(b.iter())
            .all(|(x, y)| nodes_equivalent(*x, *y, false))
}

/// Order-insensitive comparison of the modifier keywords attached to two nodes.
pub fn compare_modifiers(a: Syntax<'_>, b: Syntax<'_>) -> bool {
    modifiers(a) == modifiers(b)
}

fn nodes_equivalent(a: Syntax<'_>, b: Syntax<'_>, ignore_names_here: bool) -> bool {
    let kind = a.kind();
    if kind != b.kind() {
        return false;
    }

    match kind {
        NodeKind::Identifier => ignore_names_here || a.text() == b.text(),
        NodeKind::StringLiteral
        | NodeKind::NumericLiteral
        | NodeKind::RegexLiteral
        | NodeKind::TemplateLiteral => a.literal_text() == b.literal_text(),
        NodeKind::Keyword(_) | NodeKind::Token(_) => true,
        NodeKind::VariableDeclaration => variable_declarations(a, b, ignore_names_here),
        NodeKind::VariableStatement => variable_statements(a, b),
        NodeKind::ExportStatement => export_statements(a, b, ignore_names_here),
        NodeKind::ExpressionStatement | NodeKind::Parenthesized => {
            equivalent(a.first_named(), b.first_named(), false)
        }
        NodeKind::CallExpression => {
            field(a, b, "function")
                && compare_node_arrays(&a.field_list("type_arguments"), &b.field_list("type_arguments"))
                && optional_chain(a) == optional_chain(b)
                && compare_node_arrays(&call_arguments(a), &call_arguments(b))
        }
        NodeKind::NewExpression => {
            field(a, b, "constructor")
                && compare_node_arrays(&a.field_list("type_arguments"), &b.field_list("type_arguments"))
                && compare_node_arrays(&call_arguments(a), &call_arguments(b))
        }
        NodeKind::PropertyAccess => {
            field(a, b, "object")
                && field(a, b, "property")
                && optional_chain(a) == optional_chain(b)
        }
        NodeKind::ElementAccess => {
            field(a, b, "object") && field(a, b, "index") && optional_chain(a) == optional_chain(b)
        }
        NodeKind::Parameter => parameters(a, b),
        NodeKind::FunctionLike(_) => functions(a, b, ignore_names_here),
        NodeKind::Block => compare_node_arrays(&a.named_children(), &b.named_children()),
        NodeKind::IfStatement => {
            field(a, b, "condition")
                && field(a, b, "consequence")
                && equivalent(else_branch(a), else_branch(b), false)
        }
        NodeKind::BinaryExpression => {
            operator(a) == operator(b) && field(a, b, "left") && field(a, b, "right")
        }
        NodeKind::PrefixUnary | NodeKind::PostfixUnary => {
            operator(a) == operator(b) && field(a, b, "argument")
        }
        NodeKind::Program | NodeKind::Other(_) => children_equivalent(a, b),
    }
}

/// The one comparison that receives the caller's flag unchanged.
fn declared_name(a: Option<Syntax<'_>>, b: Option<Syntax<'_>>, ignore_names_here: bool) -> bool {
    equivalent(a, b, ignore_names_here)
}

fn field(a: Syntax<'_>, b: Syntax<'_>, name: &str) -> bool {
    equivalent(a.field(name), b.field(name), false)
}

fn variable_declarations(a: Syntax<'_>, b: Syntax<'_>, ignore_names_here: bool) -> bool {
    declared_name(a.field("name"), b.field("name"), ignore_names_here)
        && field(a, b, "type")
        && a.has_token("!") == b.has_token("!")
        && field(a, b, "value")
}

fn variable_statements(a: Syntax<'_>, b: Syntax<'_>) -> bool {
    decorators(a, b)
        && compare_modifiers(a, b)
        && declaration_flag(a) == declaration_flag(b)
        && compare_node_arrays(
            &a.children_of_kind("variable_declarator"),
            &b.children_of_kind("variable_declarator"),
        )
}

/// `var`, `let` or `const`: the leading keyword token of the statement.
fn declaration_flag(node: Syntax<'_>) -> Option<&'static str> {
    node.children()
        .into_iter()
        .next()
        .filter(|first| !first.is_named())
        .map(|first| first.grammar_kind())
}

fn export_statements(a: Syntax<'_>, b: Syntax<'_>, ignore_names_here: bool) -> bool {
    let (decl_a, decl_b) = (a.field("declaration"), b.field("declaration"));
    let (value_a, value_b) = (a.field("value"), b.field("value"));

    // Re-exports and export clauses have neither field.
    if decl_a.is_none() && decl_b.is_none() && value_a.is_none() && value_b.is_none() {
        return children_equivalent(a, b);
    }

    decorators(a, b)
        && a.has_token("default") == b.has_token("default")
        && equivalent(decl_a, decl_b, ignore_names_here)
        && equivalent(value_a, value_b, false)
}

fn parameters(a: Syntax<'_>, b: Syntax<'_>) -> bool {
    decorators(a, b)
        && compare_modifiers(a, b)
        && is_rest(a) == is_rest(b)
        && field(a, b, "pattern")
        && (a.grammar_kind() == "optional_parameter") == (b.grammar_kind() == "optional_parameter")
        && field(a, b, "type")
        && field(a, b, "value")
}

fn is_rest(node: Syntax<'_>) -> bool {
    node.field("pattern")
        .map(|pattern| pattern.grammar_kind() == "rest_pattern")
        .unwrap_or(false)
}

fn functions(a: Syntax<'_>, b: Syntax<'_>, ignore_names_here: bool) -> bool {
    decorators(a, b)
        && compare_modifiers(a, b)
        && a.has_token("*") == b.has_token("*")
        && declared_name(a.field("name"), b.field("name"), ignore_names_here)
        && compare_node_arrays(&a.field_list("type_parameters"), &b.field_list("type_parameters"))
        && compare_node_arrays(&parameter_list(a), &parameter_list(b))
        && field(a, b, "return_type")
        && field(a, b, "body")
}

/// Formal parameters, or the single unparenthesized parameter of an arrow.
fn parameter_list<'t>(node: Syntax<'t>) -> Vec<Syntax<'t>> {
    match node.field("parameters") {
        Some(list) => list.named_children(),
        None => node.field("parameter").into_iter().collect(),
    }
}

/// Call arguments. A tagged template's template string is its only argument.
fn call_arguments<'t>(node: Syntax<'t>) -> Vec<Syntax<'t>> {
    match node.field("arguments") {
        Some(args) if args.grammar_kind() == "arguments" => args.named_children(),
        Some(template) => vec![template],
        None => Vec::new(),
    }
}

fn optional_chain(node: Syntax<'_>) -> bool {
    node.field("optional_chain").is_some() || !node.children_of_kind("optional_chain").is_empty()
}

fn else_branch<'t>(node: Syntax<'t>) -> Option<Syntax<'t>> {
    node.field("alternative")
        .and_then(|clause| clause.first_named())
}

fn operator(node: Syntax<'_>) -> Option<&'static str> {
    if node.grammar_kind() == "assignment_expression" {
        return Some("=");
    }
    node.field("operator").map(|op| op.grammar_kind())
}

fn decorators(a: Syntax<'_>, b: Syntax<'_>) -> bool {
    compare_node_arrays(&a.children_of_kind("decorator"), &b.children_of_kind("decorator"))
}

fn modifiers(node: Syntax<'_>) -> Vec<String> {
    let mut found: Vec<String> = node
        .children()
        .into_iter()
        .filter_map(|child| match child.grammar_kind() {
            "accessibility_modifier" => Some(child.text().to_string()),
            "override_modifier" => Some("override".to_string()),
            kind if !child.is_named() && MODIFIER_TOKENS.contains(&kind) => Some(kind.to_string()),
            _ => None,
        })
        .collect();
    found.sort();
    found
}

/// Fallback for unmodeled kinds: same number of children, pairwise equal.
fn children_equivalent(a: Syntax<'_>, b: Syntax<'_>) -> bool {
    let (left, right) = (a.children(), b.children());

    // Named leaves fold their token text into the node itself.
    if left.is_empty() && right.is_empty() {
        return a.text() == b.text();
    }

    if a.grammar_kind() == "template_string" && template_chunks(a) != template_chunks(b) {
        return false;
    }

    compare_node_arrays(&left, &right)
}

/// Template text with every `${...}` substitution blanked out.
fn template_chunks(node: Syntax<'_>) -> String {
    let text = node.text();
    let base = node.span().start;
    let mut chunks = String::with_capacity(text.len());
    let mut cursor = 0;

    for substitution in node.children_of_kind("template_substitution") {
        let span = substitution.span();
        chunks.push_str(text.get(cursor..span.start - base).unwrap_or(""));
        chunks.push_str("${}");
        cursor = span.end - base;
    }
    chunks.push_str(text.get(cursor..).unwrap_or(""));
    chunks
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::{parse_source, Language, SyntaxTree};

    fn parse(code: &str) -> SyntaxTree {
        parse_source(code, Language::TypeScript, "test").expect("parse")
    }

    fn first_equal(a: &str, b: &str, ignore: bool) -> bool {
        let (ta, tb) = (parse(a), parse(b));
        equivalent(ta.root().first_named(), tb.root().first_named(), ignore)
    }

    #[test]
    fn test_absent_nodes() {
        let tree = parse("x;");
        assert!(equivalent(None, None, false));
        assert!(!equivalent(tree.root().first_named(), None, false));
        assert!(!equivalent(None, tree.root().first_named(), true));
    }

    #[test]
    fn test_whitespace_and_comments_do_not_matter() {
        assert!(first_equal("foo( a ,b );", "foo(a, /* note */ b);", false));
    }

    #[test]
    fn test_operators_must_match() {
        assert!(!first_equal("a + b;", "a - b;", false));
        assert!(!first_equal("x = 1;", "x += 1;", false));
        assert!(!first_equal("x++;", "++x;", false));
    }

    #[test]
    fn test_method_modifiers() {
        fn method(tree: &SyntaxTree) -> Option<Syntax<'_>> {
            tree.root()
                .first_named()
                .and_then(|class| class.field("body"))
                .and_then(|body| body.first_named())
        }
        let public = parse("class A { public static async run() {} }");
        let same = parse("class A { public static async run() {} }");
        let private = parse("class A { private static async run() {} }");
        let instance = parse("class A { public async run() {} }");

        assert!(method(&public).is_some());
        assert!(equivalent(method(&public), method(&same), false));
        assert!(!equivalent(method(&public), method(&private), false));
        assert!(!equivalent(method(&public), method(&instance), false));
    }

    #[test]
    fn test_var_let_const_differ() {
        assert!(!first_equal("let a = 1;", "const a = 1;", false));
        assert!(!first_equal("var a = 1;", "let a = 1;", false));
    }

    #[test]
    fn test_declared_variable_name_is_ignored_only_at_its_level() {
        let (a, b) = (parse("const a = 1;"), parse("const b = 1;"));
        fn declarator(tree: &SyntaxTree) -> Option<Syntax<'_>> {
            tree.root()
                .first_named()
                .and_then(|stmt| stmt.children_of_kind("variable_declarator").into_iter().next())
        }
        assert!(equivalent(declarator(&a), declarator(&b), true));
        assert!(!equivalent(declarator(&a), declarator(&b), false));
        // The statement passes `false` down to its declarators.
        assert!(!first_equal("const a = 1;", "const b = 1;", true));
    }

    #[test]
    fn test_template_text_outside_substitutions() {
        assert!(first_equal("`a ${x} b`;", "`a ${x} b`;", false));
        assert!(!first_equal("`a ${x} b`;", "`a ${x} c`;", false));
    }

    #[test]
    fn test_optional_chaining_marker() {
        assert!(!first_equal("a.b;", "a?.b;", false));
        assert!(!first_equal("a[0];", "a?.[0];", false));
    }
}
