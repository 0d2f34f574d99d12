//! Language detection from file extensions and editor language tags.
//!
//! Table-driven language detection. No heuristics, no guessing.
//! Unknown extensions return None, never infer from content.

use std::path::Path;

/// Languages Reshape knows about.
///
/// Only the JavaScript family has a structural parser; every other
/// language is searched with the normalized text matcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Language {
    /// TypeScript (.ts, .mts, .cts)
    TypeScript,
    /// TypeScript with JSX (.tsx)
    TypeScriptReact,
    /// JavaScript (.js, .mjs, .cjs)
    JavaScript,
    /// JavaScript with JSX (.jsx)
    JavaScriptReact,
    /// CSS (.css)
    Css,
    /// Less (.less)
    Less,
    /// SCSS (.scss)
    Scss,
    /// JSON (.json)
    Json,
    /// JSON with comments (.jsonc)
    Jsonc,
    /// HTML (.html, .htm)
    Html,
    /// XML (.xml, .svg)
    Xml,
    /// Vue single-file components (.vue)
    Vue,
    /// Python (.py)
    Python,
    /// Ruby (.rb)
    Ruby,
    /// Shell scripts (.sh, .bash, .zsh)
    ShellScript,
    /// Perl (.pl, .pm)
    Perl,
    /// R (.r, .R)
    R,
    /// Java (.java)
    Java,
    /// C# (.cs)
    CSharp,
    /// PHP (.php)
    Php,
    /// Go (.go)
    Go,
    /// Rust (.rs)
    Rust,
    /// C (.c, .h)
    C,
    /// C++ (.cpp, .hpp, .cc, .cxx)
    Cpp,
}

/// How comments are written in a language, for the text normalizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommentStyle {
    /// `/* ... */` and `// ...`
    BlockAndLine,
    /// `/* ... */` only.
    BlockOnly,
    /// `<!-- ... -->`
    Markup,
    /// `# ...` to end of line.
    Hash,
}

impl Language {
    /// Editor language tag (VS Code language id).
    pub fn as_str(&self) -> &'static str {
        match self {
            Language::TypeScript => "typescript",
            Language::TypeScriptReact => "typescriptreact",
            Language::JavaScript => "javascript",
            Language::JavaScriptReact => "javascriptreact",
            Language::Css => "css",
            Language::Less => "less",
            Language::Scss => "scss",
            Language::Json => "json",
            Language::Jsonc => "jsonc",
            Language::Html => "html",
            Language::Xml => "xml",
            Language::Vue => "vue",
            Language::Python => "python",
            Language::Ruby => "ruby",
            Language::ShellScript => "shellscript",
            Language::Perl => "perl",
            Language::R => "r",
            Language::Java => "java",
            Language::CSharp => "csharp",
            Language::Php => "php",
            Language::Go => "go",
            Language::Rust => "rust",
            Language::C => "c",
            Language::Cpp => "cpp",
        }
    }

    /// Parse an editor language tag.
    pub fn from_tag(tag: &str) -> Option<Self> {
        let language = match tag {
            "typescript" => Language::TypeScript,
            "typescriptreact" => Language::TypeScriptReact,
            "javascript" => Language::JavaScript,
            "javascriptreact" => Language::JavaScriptReact,
            "css" => Language::Css,
            "less" => Language::Less,
            "scss" => Language::Scss,
            "json" => Language::Json,
            "jsonc" => Language::Jsonc,
            "html" => Language::Html,
            "xml" => Language::Xml,
            "vue" => Language::Vue,
            "python" => Language::Python,
            "ruby" => Language::Ruby,
            "shellscript" => Language::ShellScript,
            "perl" => Language::Perl,
            "r" => Language::R,
            "java" => Language::Java,
            "csharp" => Language::CSharp,
            "php" => Language::Php,
            "go" => Language::Go,
            "rust" => Language::Rust,
            "c" => Language::C,
            "cpp" => Language::Cpp,
            _ => return None,
        };
        Some(language)
    }

    /// Detect language from file path extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        detect_language(path)
    }

    /// Whether a tree-sitter grammar backs structural matching for this language.
    pub fn supports_structural(&self) -> bool {
        matches!(
            self,
            Language::TypeScript
                | Language::TypeScriptReact
                | Language::JavaScript
                | Language::JavaScriptReact
        )
    }

    /// Tree-sitter grammar for structural languages.
    pub fn tree_sitter_language(&self) -> Option<tree_sitter::Language> {
        match self {
            Language::TypeScript => Some(tree_sitter_typescript::language_typescript()),
            Language::TypeScriptReact => Some(tree_sitter_typescript::language_tsx()),
            Language::JavaScript | Language::JavaScriptReact => {
                Some(tree_sitter_javascript::language())
            }
            _ => None,
        }
    }

    /// Comment syntax stripped by the text normalizer.
    pub fn comment_style(&self) -> Option<CommentStyle> {
        match self {
            Language::Css
            | Language::Less
            | Language::Scss
            | Language::JavaScript
            | Language::JavaScriptReact
            | Language::TypeScript
            | Language::TypeScriptReact
            | Language::Jsonc
            | Language::Java
            | Language::CSharp
            | Language::Php
            | Language::Go
            | Language::Rust
            | Language::C
            | Language::Cpp => Some(CommentStyle::BlockAndLine),
            Language::Json => Some(CommentStyle::BlockOnly),
            Language::Html | Language::Xml | Language::Vue => Some(CommentStyle::Markup),
            Language::Python
            | Language::Ruby
            | Language::ShellScript
            | Language::Perl
            | Language::R => Some(CommentStyle::Hash),
        }
    }
}

/// Detect language from file path.
///
/// Uses table-driven extension mapping. Returns None for unknown extensions.
/// Never guesses or infers from file content.
///
/// # Examples
///
/// ```
/// # use reshape::ingest::detect::{detect_language, Language};
/// # use std::path::Path;
/// assert_eq!(detect_language(Path::new("app.ts")), Some(Language::TypeScript));
/// assert_eq!(detect_language(Path::new("style.css")), Some(Language::Css));
/// assert_eq!(detect_language(Path::new("file.txt")), None);
/// ```
pub fn detect_language(path: &Path) -> Option<Language> {
    let extension = path.extension()?.to_str()?;

    // Table-driven mapping (case-sensitive, except R)
    let language = match extension {
        "ts" | "mts" | "cts" => Language::TypeScript,
        "tsx" => Language::TypeScriptReact,
        "js" | "mjs" | "cjs" => Language::JavaScript,
        "jsx" => Language::JavaScriptReact,
        "css" => Language::Css,
        "less" => Language::Less,
        "scss" => Language::Scss,
        "json" => Language::Json,
        "jsonc" => Language::Jsonc,
        "html" | "htm" => Language::Html,
        "xml" | "svg" => Language::Xml,
        "vue" => Language::Vue,
        "py" => Language::Python,
        "rb" => Language::Ruby,
        "sh" | "bash" | "zsh" => Language::ShellScript,
        "pl" | "pm" => Language::Perl,
        "r" | "R" => Language::R,
        "java" => Language::Java,
        "cs" => Language::CSharp,
        "php" => Language::Php,
        "go" => Language::Go,
        "rs" => Language::Rust,
        "c" | "h" => Language::C,
        "cpp" | "hpp" | "cc" | "cxx" => Language::Cpp,
        _ => return None,
    };

    Some(language)
}
