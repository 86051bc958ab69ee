//! Per-language grammar table: dispatch, splittable node-kind taxonomy, and
//! import-node kinds used by the consecutive-import-grouping step.
//!
//! Table-driven by design (one `match` arm per grammar) rather than a class
//! hierarchy, per the design notes on dynamic language dispatch.

use tree_sitter::Language;

/// Supported syntax grammars. Any language not in this list routes to the
/// character-based fallback splitter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SyntaxGrammar {
    JavaScript,
    TypeScript,
    Tsx,
    Python,
    Java,
    C,
    Cpp,
    Go,
    Rust,
    CSharp,
    Ruby,
    Scala,
}

impl SyntaxGrammar {
    /// Resolve a grammar from a free-form language tag (file extension or
    /// declared language name). Returns `None` for unsupported languages,
    /// triggering the character fallback.
    pub fn from_tag(tag: &str) -> Option<Self> {
        let tag = tag.to_ascii_lowercase();
        Some(match tag.as_str() {
            "javascript" | "js" | "jsx" => SyntaxGrammar::JavaScript,
            "typescript" | "ts" => SyntaxGrammar::TypeScript,
            "tsx" => SyntaxGrammar::Tsx,
            "python" | "py" => SyntaxGrammar::Python,
            "java" => SyntaxGrammar::Java,
            "c" | "h" => SyntaxGrammar::C,
            "cpp" | "c++" | "cc" | "cxx" | "hpp" => SyntaxGrammar::Cpp,
            "go" => SyntaxGrammar::Go,
            "rust" | "rs" => SyntaxGrammar::Rust,
            "csharp" | "c#" | "cs" => SyntaxGrammar::CSharp,
            "ruby" | "rb" => SyntaxGrammar::Ruby,
            "scala" => SyntaxGrammar::Scala,
            _ => return None,
        })
    }

    /// The `tree-sitter` grammar for this language.
    pub fn tree_sitter_language(&self) -> Language {
        match self {
            SyntaxGrammar::JavaScript => tree_sitter_javascript::LANGUAGE.into(),
            SyntaxGrammar::TypeScript => tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into(),
            SyntaxGrammar::Tsx => tree_sitter_typescript::LANGUAGE_TSX.into(),
            SyntaxGrammar::Python => tree_sitter_python::LANGUAGE.into(),
            SyntaxGrammar::Java => tree_sitter_java::LANGUAGE.into(),
            SyntaxGrammar::C => tree_sitter_c::LANGUAGE.into(),
            SyntaxGrammar::Cpp => tree_sitter_cpp::LANGUAGE.into(),
            SyntaxGrammar::Go => tree_sitter_go::LANGUAGE.into(),
            SyntaxGrammar::Rust => tree_sitter_rust::LANGUAGE.into(),
            SyntaxGrammar::CSharp => tree_sitter_c_sharp::LANGUAGE.into(),
            SyntaxGrammar::Ruby => tree_sitter_ruby::LANGUAGE.into(),
            SyntaxGrammar::Scala => tree_sitter_scala::LANGUAGE.into(),
        }
    }

    /// Node kinds treated as chunk boundaries for this grammar.
    pub fn splittable_node_kinds(&self) -> &'static [&'static str] {
        match self {
            SyntaxGrammar::JavaScript => &[
                "import_statement",
                "function_declaration",
                "class_declaration",
                "method_definition",
                "arrow_function",
                "export_statement",
                "variable_declaration",
                "lexical_declaration",
            ],
            SyntaxGrammar::TypeScript | SyntaxGrammar::Tsx => &[
                "import_statement",
                "function_declaration",
                "class_declaration",
                "method_definition",
                "arrow_function",
                "export_statement",
                "variable_declaration",
                "lexical_declaration",
                "interface_declaration",
                "type_alias_declaration",
            ],
            SyntaxGrammar::Python => &[
                "import_statement",
                "import_from_statement",
                "function_definition",
                "class_definition",
                "decorated_definition",
                "assignment",
            ],
            SyntaxGrammar::Java => &[
                "method_declaration",
                "class_declaration",
                "interface_declaration",
                "constructor_declaration",
                "package_declaration",
                "import_declaration",
                "field_declaration",
                "local_variable_declaration",
            ],
            SyntaxGrammar::Go => &[
                "function_declaration",
                "method_declaration",
                "type_declaration",
                "var_declaration",
                "const_declaration",
                "import_declaration",
            ],
            SyntaxGrammar::Rust => &[
                "function_item",
                "impl_item",
                "struct_item",
                "enum_item",
                "trait_item",
                "mod_item",
                "use_declaration",
                "static_item",
                "const_item",
            ],
            SyntaxGrammar::C => &["function_definition", "declaration", "preproc_include"],
            SyntaxGrammar::Cpp => &[
                "function_definition",
                "class_specifier",
                "namespace_definition",
                "declaration",
                "preproc_include",
            ],
            SyntaxGrammar::CSharp => &[
                "method_declaration",
                "class_declaration",
                "interface_declaration",
                "struct_declaration",
                "enum_declaration",
                "using_directive",
            ],
            SyntaxGrammar::Ruby => &["method", "class", "module", "singleton_method"],
            SyntaxGrammar::Scala => &[
                "function_definition",
                "class_definition",
                "object_definition",
                "trait_definition",
                "import_declaration",
            ],
        }
    }

    /// Node kinds considered "import" nodes for the consecutive-import
    /// grouping step. Empty for grammars with no distinct import
    /// construct recognised here (e.g. Ruby's `require` is a method call,
    /// not a dedicated node kind).
    pub fn import_node_kinds(&self) -> &'static [&'static str] {
        match self {
            SyntaxGrammar::JavaScript | SyntaxGrammar::TypeScript | SyntaxGrammar::Tsx => {
                &["import_statement"]
            }
            SyntaxGrammar::Python => &["import_statement", "import_from_statement"],
            SyntaxGrammar::Java => &["import_declaration"],
            SyntaxGrammar::Go => &["import_declaration"],
            SyntaxGrammar::Rust => &["use_declaration"],
            SyntaxGrammar::C | SyntaxGrammar::Cpp => &["preproc_include"],
            SyntaxGrammar::CSharp => &["using_directive"],
            SyntaxGrammar::Ruby => &[],
            SyntaxGrammar::Scala => &["import_declaration"],
        }
    }

    pub fn is_import_kind(&self, kind: &str) -> bool {
        self.import_node_kinds().contains(&kind)
    }

    pub fn is_splittable_kind(&self, kind: &str) -> bool {
        self.splittable_node_kinds().contains(&kind)
    }
}
