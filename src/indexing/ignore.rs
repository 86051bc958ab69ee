//! Ignore-pattern composition for the indexer (§4.7).
//!
//! Sources are merged in a fixed order: built-in defaults, every
//! `.*ignore` file in the codebase root, a global
//! `~/.context/.contextignore`, and the caller-supplied patterns
//! (`IndexingConfig::custom_ignore_patterns`, itself sourced from
//! `CUSTOM_IGNORE_PATTERNS` by `IndexingConfig::from_env`; this module
//! only owns the on-disk and built-in sources, so that env var has one
//! reader). Patterns follow gitignore semantics via the `ignore` crate.

use std::fs;
use std::path::Path;

use ignore::gitignore::{Gitignore, GitignoreBuilder};

/// Built-in default patterns: VCS metadata, build outputs, IDE state,
/// caches, logs, temp files, env files, minified/bundled artefacts and
/// source maps.
pub const BUILTIN_DEFAULTS: &[&str] = &[
    // VCS metadata
    "**/.git/**",
    "**/.svn/**",
    "**/.hg/**",
    // build outputs
    "**/dist/**",
    "**/build/**",
    "**/target/**",
    "**/out/**",
    // IDE state
    "**/.vscode/**",
    "**/.idea/**",
    // caches
    "**/node_modules/**",
    "**/__pycache__/**",
    "**/.pytest_cache/**",
    "**/.mypy_cache/**",
    "**/.cache/**",
    // logs and temp
    "**/*.log",
    "**/*.tmp",
    "**/tmp/**",
    // env files
    "**/.env",
    "**/.env.*",
    // minified / bundled artefacts and source maps
    "**/*.min.js",
    "**/*.min.css",
    "**/*.bundle.js",
    "**/*.map",
];

/// Compiled, effective ignore set for one codebase. Cheap to clone-check
/// against (immutable after construction); callers cache one per
/// codebase.
pub struct IgnoreSet {
    matcher: Gitignore,
}

impl IgnoreSet {
    /// Build the effective ignore set for `codebase_root`, layering in
    /// `caller_patterns` supplied by the indexing caller on top of the
    /// built-in, on-disk, and environment sources.
    pub fn build(codebase_root: &Path, caller_patterns: &[String]) -> Self {
        let mut builder = GitignoreBuilder::new(codebase_root);

        for pattern in BUILTIN_DEFAULTS {
            let _ = builder.add_line(None, pattern);
        }

        if let Ok(entries) = fs::read_dir(codebase_root) {
            for entry in entries.flatten() {
                let name = entry.file_name();
                let name = name.to_string_lossy();
                if name.starts_with('.') && name.ends_with("ignore") {
                    if let Some(err) = builder.add(entry.path()) {
                        tracing::warn!(error = %err, file = %name, "failed to parse ignore file");
                    }
                }
            }
        }

        if let Some(home) = dirs::home_dir() {
            let global = home.join(".context").join(".contextignore");
            if global.exists() {
                if let Some(err) = builder.add(&global) {
                    tracing::warn!(error = %err, path = %global.display(), "failed to parse global contextignore");
                }
            }
        }

        for pattern in caller_patterns {
            let _ = builder.add_line(None, pattern);
        }

        let matcher = builder
            .build()
            .unwrap_or_else(|_| GitignoreBuilder::new(codebase_root).build().expect("empty builder always compiles"));

        Self { matcher }
    }

    /// True iff any effective pattern matches the POSIX-normalised
    /// relative path.
    pub fn is_ignored(&self, relative_path: &str, is_dir: bool) -> bool {
        self.matcher.matched(relative_path, is_dir).is_ignore()
    }
}

/// Default supported extensions (§4.7), dot-prefixed.
pub const DEFAULT_EXTENSIONS: &[&str] = &[
    ".ts", ".tsx", ".js", ".jsx", ".py", ".java", ".cpp", ".c", ".h", ".hpp", ".cs", ".go", ".rs",
    ".php", ".rb", ".swift", ".kt", ".scala", ".m", ".mm", ".md", ".markdown", ".ipynb",
];

/// Merge the default extension set with caller- and environment-provided
/// extensions, de-duplicated and dot-prefixed.
pub fn effective_extensions(custom: &[String]) -> Vec<String> {
    let mut out: Vec<String> = DEFAULT_EXTENSIONS.iter().map(|s| s.to_string()).collect();
    for ext in custom {
        let normalized = if ext.starts_with('.') { ext.clone() } else { format!(".{ext}") };
        if !out.contains(&normalized) {
            out.push(normalized);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn builtin_defaults_are_ignored() {
        let dir = tempdir().unwrap();
        let set = IgnoreSet::build(dir.path(), &[]);
        assert!(set.is_ignored("node_modules/pkg/index.js", false));
        assert!(set.is_ignored(".git/HEAD", false));
        assert!(set.is_ignored("build/out.o", false));
    }

    #[test]
    fn ordinary_source_file_is_not_ignored() {
        let dir = tempdir().unwrap();
        let set = IgnoreSet::build(dir.path(), &[]);
        assert!(!set.is_ignored("src/main.rs", false));
    }

    #[test]
    fn caller_patterns_extend_the_set() {
        let dir = tempdir().unwrap();
        let set = IgnoreSet::build(dir.path(), &["vendor/**".to_string()]);
        assert!(set.is_ignored("vendor/lib.rs", false));
    }

    #[test]
    fn local_ignore_file_is_picked_up() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join(".contextignore"), "secrets/**\n").unwrap();
        let set = IgnoreSet::build(dir.path(), &[]);
        assert!(set.is_ignored("secrets/key.pem", false));
    }

    #[test]
    fn effective_extensions_includes_defaults_and_custom_deduped() {
        let exts = effective_extensions(&["rs".to_string(), ".rs".to_string(), "proto".to_string()]);
        assert!(exts.contains(&".rs".to_string()));
        assert!(exts.contains(&".proto".to_string()));
        assert_eq!(exts.iter().filter(|e| *e == ".rs").count(), 1);
    }
}
