//! Fixed lookup tables used by the query preprocessor (§4.3, glossary).
//!
//! All tables here are static data, not configuration; they encode the
//! preprocessor's deterministic rules and are not meant to be tuned at
//! runtime.

use once_cell::sync::Lazy;
use regex::Regex;

/// Whole-word abbreviation expansion table (rule 1).
pub static ABBREVIATIONS: &[(&str, &str)] = &[
    ("js", "javascript"),
    ("ts", "typescript"),
    ("py", "python"),
    ("fn", "function"),
    ("var", "variable"),
    ("api", "API"),
    ("db", "database"),
    ("auth", "authentication"),
    ("async", "asynchronous"),
    ("config", "configuration"),
    ("util", "utility"),
    ("req", "request"),
    ("res", "response"),
    ("err", "error"),
    ("ctx", "context"),
];

/// Conceptual mapping table (rule 2). Canonical keys per the glossary's
/// "Conceptual mapping table" entry.
pub static CONCEPT_TABLE: &[(&str, &[&str])] = &[
    ("error handling", &["try catch", "exception", "error", "throw", "stack trace"]),
    ("database connection", &["connection pool", "database client", "query", "transaction"]),
    ("configuration", &["config file", "environment variable", "settings", "options"]),
    ("authentication", &["login", "token", "session", "credentials", "oauth"]),
    ("async processing", &["promise", "future", "async await", "concurrency", "event loop"]),
    ("file system", &["read file", "write file", "directory", "path", "filesystem"]),
    ("logging", &["log message", "logger", "log level", "tracing"]),
    ("data processing", &["transform", "pipeline", "batch", "stream processing"]),
    ("web development", &["http request", "route handler", "rest api", "web server"]),
    ("machine learning", &["model", "training", "inference", "neural network"]),
    ("data visualization", &["chart", "plot", "graph", "dashboard"]),
    ("data analysis", &["statistics", "aggregation", "dataframe", "analysis"]),
    ("testing", &["unit test", "test case", "assertion", "mock"]),
    ("security", &["encryption", "sanitization", "vulnerability", "access control"]),
    ("performance optimization", &["profiling", "caching", "latency", "throughput"]),
    ("database optimization", &["index", "query plan", "query optimization", "schema"]),
];

/// Per-language detection regex (rule 4). Matched case-insensitively.
pub static LANGUAGE_PATTERNS: Lazy<Vec<(&'static str, Regex)>> = Lazy::new(|| {
    vec![
        ("python", Regex::new(r"(?i)(\bdef \w+\(|\bimport \w+|\bself\.\w+|\.py\b|\bpython\b|\belif\s)").unwrap()),
        ("javascript", Regex::new(r"(?i)(\bconst \w+\s*=|\blet \w+\s*=|=>|\.js\b|\bjavascript\b|\brequire\()").unwrap()),
        ("typescript", Regex::new(r"(?i)(\binterface \w+|: string\b|: number\b|\.ts\b|\btypescript\b)").unwrap()),
        ("java", Regex::new(r"(?i)(\bpublic class \w+|\bimport java\.|\.java\b|\bextends \w+|\bimplements \w+)").unwrap()),
        ("cpp", Regex::new(r"(?i)(#include\s*<|std::\w+|\.cpp\b|\.hpp\b|\bnamespace \w+)").unwrap()),
        ("go", Regex::new(r"(?i)(\bfunc \w+\(|\bpackage \w+|\.go\b|\bgoroutine\b|\bgolang\b)").unwrap()),
        ("rust", Regex::new(r"(?i)(\bfn \w+\(|\bimpl \w+|\.rs\b|\bcargo\b|\bstruct \w+)").unwrap()),
        ("php", Regex::new(r"(?i)(<\?php|\$this->\w+|\.php\b)").unwrap()),
        ("ruby", Regex::new(r#"(?i)(\battr_accessor\b|\.rb\b|\brequire ['"]|\bdef \w+\s*$)"#).unwrap()),
        ("swift", Regex::new(r"(?i)(\bfunc \w+\(|\bguard let\b|\.swift\b|\bimport swift\b)").unwrap()),
        ("kotlin", Regex::new(r"(?i)(\bfun \w+\(|\bval \w+\s*=|\.kt\b|\bkotlin\b)").unwrap()),
        ("scala", Regex::new(r"(?i)(\bobject \w+|\bcase class\b|\.scala\b)").unwrap()),
        ("csharp", Regex::new(r"(?i)(\bpublic class \w+|\busing System\b|\.cs\b|\bnamespace \w+)").unwrap()),
    ]
});

/// File extensions recognised by the filename detection regexes (rule 5).
pub static FILENAME_EXTENSIONS: &[&str] = &[
    "ts", "tsx", "js", "jsx", "py", "java", "cpp", "c", "h", "hpp", "cs", "go", "rs", "php", "rb",
    "swift", "kt", "scala", "m", "mm", "md", "markdown", "json", "yaml", "yml", "toml",
];

fn extension_alternation() -> String {
    FILENAME_EXTENSIONS.join("|")
}

/// Three filename-detection regexes, tried in order: path-with-dirs,
/// single-dir/filename.ext, bare filename.ext.
pub static FILENAME_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    let ext = extension_alternation();
    vec![
        Regex::new(&format!(r"(?i)\b[\w./-]+/[\w.-]+\.(?:{ext})\b")).unwrap(),
        Regex::new(&format!(r"(?i)\b[\w-]+/[\w.-]+\.(?:{ext})\b")).unwrap(),
        Regex::new(&format!(r"(?i)\b[\w.-]+\.(?:{ext})\b")).unwrap(),
    ]
});

/// Implementation-focus trigger phrases (rule 6a).
pub static IMPLEMENTATION_PHRASES: &[&str] = &["how to", "implement", "create", "build", "write"];

/// Implementation-focus code-signature regex (rule 6b).
pub static IMPLEMENTATION_SIGNATURE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(async|def|class|function)\s+\w+").unwrap());

/// Keywords used by variant-selection priority (c).
pub static STRUCTURAL_KEYWORDS: &[&str] = &["function", "class", "method", "implementation", "definition"];

/// Keywords used by variant-selection priority (d).
pub static DOMAIN_KEYWORDS: &[&str] =
    &["javascript", "python", "typescript", "authentication", "configuration", "database"];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn abbreviations_cover_the_fixed_set() {
        assert_eq!(ABBREVIATIONS.len(), 15);
        assert!(ABBREVIATIONS.iter().any(|(k, v)| *k == "js" && *v == "javascript"));
        assert!(ABBREVIATIONS.iter().any(|(k, v)| *k == "api" && *v == "API"));
    }

    #[test]
    fn concept_table_has_all_canonical_keys() {
        let keys: Vec<&str> = CONCEPT_TABLE.iter().map(|(k, _)| *k).collect();
        for expected in [
            "error handling",
            "database connection",
            "configuration",
            "authentication",
            "async processing",
            "file system",
            "logging",
            "data processing",
            "web development",
            "machine learning",
            "data visualization",
            "data analysis",
            "testing",
            "security",
            "performance optimization",
            "database optimization",
        ] {
            assert!(keys.contains(&expected), "missing concept key {expected}");
        }
    }

    #[test]
    fn language_patterns_cover_thirteen_languages() {
        assert_eq!(LANGUAGE_PATTERNS.len(), 13);
    }

    #[test]
    fn rust_language_pattern_matches_fn_keyword() {
        let (_, re) = LANGUAGE_PATTERNS.iter().find(|(n, _)| *n == "rust").unwrap();
        assert!(re.is_match("fn main() {}"));
    }

    #[test]
    fn filename_pattern_matches_bare_filename() {
        assert!(FILENAME_PATTERNS[2].is_match("see main.rs for details"));
    }

    #[test]
    fn implementation_signature_matches_function_def() {
        assert!(IMPLEMENTATION_SIGNATURE.is_match("async def handler(x)"));
        assert!(!IMPLEMENTATION_SIGNATURE.is_match("just a sentence"));
    }
}
