//! Integration tests for structural node equivalence.
//!
//! These tests parse two snippets independently and compare their first
//! top-level nodes the way the matcher compares pattern and host nodes.

use reshape::equivalent;
use reshape::ingest::{parse_source, Language, SyntaxTree};

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(code: &str) -> SyntaxTree {
        parse_source(code, Language::TypeScript, "test").expect("Failed to parse snippet")
    }

    fn first_equal(a: &str, b: &str, ignore_names: bool) -> bool {
        let (left, right) = (parse(a), parse(b));
        equivalent(left.root().first_named(), right.root().first_named(), ignore_names)
    }

    #[test]
    fn test_reflexive_over_varied_constructs() {
        let samples = [
            "const total = items.reduce((sum, x) => sum + x, 0);",
            "function greet(name: string): string { return `hi ${name}`; }",
            "class Box<T> { private value?: T; get(): T | undefined { return this.value; } }",
            "if (a && !b) { run(); } else if (c) { stop(); } else { wait(); }",
            "for (let i = 0; i < 10; i++) total += i;",
            "export default async function* gen() { yield* other(); }",
            "const re = /ab+c/gi;",
            "switch (x) { case 1: a(); break; default: b(); }",
        ];
        for sample in samples {
            assert!(first_equal(sample, sample, false), "not reflexive: {}", sample);
        }
    }

    #[test]
    fn test_ignoring_names_reaches_only_the_declared_name() {
        assert!(first_equal(
            "function foo(a){ return bar(a); }",
            "function baz(a){ return bar(a); }",
            true
        ));
        assert!(!first_equal(
            "function foo(a){ return bar(a); }",
            "function baz(a){ return bar(a); }",
            false
        ));
        assert!(!first_equal(
            "function foo(a){ return bar(a); }",
            "function foo(a){ return qux(a); }",
            true
        ));
    }

    #[test]
    fn test_parameters_are_never_ignored() {
        assert!(!first_equal(
            "function foo(a){ return a; }",
            "function baz(b){ return b; }",
            true
        ));
    }

    #[test]
    fn test_literal_exactness() {
        assert!(!first_equal("f(1);", "f(1.0);", false));
        assert!(!first_equal("f(1);", "f(0x1);", false));
        assert!(first_equal("f(\"x\");", "f('x');", false));
        assert!(!first_equal("f(\"x\");", "f(\"y\");", false));
    }

    #[test]
    fn test_strings_compare_by_decoded_value() {
        assert!(first_equal("\"it's\";", "'it\\'s';", false));
        assert!(first_equal("\"\\x41\";", "\"A\";", false));
        assert!(first_equal("\"a\\\"b\";", "'a\"b';", false));
        assert!(first_equal("f('\\u{1F600}');", "f(\"\\uD83D\\uDE00\");", false));
        assert!(first_equal("`tab\\there`;", "`tab\there`;", false));
        assert!(!first_equal("\"\\n\";", "\"n\";", false));
    }

    #[test]
    fn test_formatting_and_comments_are_irrelevant() {
        assert!(first_equal(
            "if (ready) {\n    // go\n    start( 1,2 );\n}",
            "if (ready) { start(1, 2); }",
            false
        ));
    }

    #[test]
    fn test_exported_declaration_name_can_be_ignored() {
        assert!(first_equal(
            "export function load() { return 1; }",
            "export function save() { return 1; }",
            true
        ));
        assert!(!first_equal(
            "export function load() { return 1; }",
            "export default function load() { return 1; }",
            true
        ));
    }

    #[test]
    fn test_else_branch_must_agree() {
        assert!(!first_equal("if (a) b();", "if (a) b(); else c();", false));
        assert!(first_equal("if (a) b(); else c();", "if (a) b();\nelse c();", false));
    }

    #[test]
    fn test_argument_count_matters() {
        assert!(!first_equal("f(a);", "f(a, b);", false));
        assert!(!first_equal("new Map();", "new Map(entries);", false));
    }
}
