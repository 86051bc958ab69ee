//! Core data types shared across components.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// A contiguous region of a source file produced by the chunker.
///
/// Invariant: `start_line <= end_line`. `content` equals the byte range in
/// the original file, modulo the post-processing rules in the chunker
/// (refinement, dedup, overlap).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeChunk {
    pub content: String,
    pub start_line: i32,
    pub end_line: i32,
    pub language: String,
    pub file_path: String,
}

impl CodeChunk {
    /// Wrap the chunk's content in a fenced block annotated with its file
    /// path, for callers preparing text for an embedding provider.
    pub fn embedding_content(&self) -> String {
        wrap_content_for_embedding(&self.file_path, &self.content)
    }
}

/// Wrap content with filepath context for embedding.
pub fn wrap_content_for_embedding(file_path: &str, content: &str) -> String {
    format!("```{file_path}\n{content}\n```")
}

/// A chunk as stored in the vector store, with its dense embedding.
///
/// `id` is derived deterministically from `(relative_path, start_line,
/// end_line, content)` so an unchanged chunk re-indexes to the same
/// identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorDocument {
    pub id: String,
    pub content: String,
    pub vector: Vec<f32>,
    pub relative_path: String,
    pub start_line: i32,
    pub end_line: i32,
    pub file_extension: String,
    pub metadata: VectorDocumentMetadata,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VectorDocumentMetadata {
    pub language: String,
    pub codebase_path: String,
    pub chunk_index: i32,
}

impl VectorDocument {
    /// Compute the deterministic document id for a chunk at a given
    /// position within its codebase.
    pub fn compute_id(relative_path: &str, start_line: i32, end_line: i32, content: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(relative_path.as_bytes());
        hasher.update(b"\0");
        hasher.update(start_line.to_le_bytes());
        hasher.update(b"\0");
        hasher.update(end_line.to_le_bytes());
        hasher.update(b"\0");
        hasher.update(content.as_bytes());
        format!("{:x}", hasher.finalize())
    }
}

/// Result returned to callers of `Retriever::search`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub content: String,
    pub relative_path: String,
    pub start_line: i32,
    pub end_line: i32,
    pub language: String,
    /// Higher is better.
    pub score: f32,
}

/// Candidate expansion term produced by the PRF engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpansionTerm {
    pub term: String,
    pub score: f32,
    pub frequency: u32,
    pub document_count: u32,
    pub source: ExpansionTermSource,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpansionTermSource {
    Tfidf,
    Frequency,
    Context,
}

/// Output of the PRF engine (C5).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PRFResult {
    pub original_query: String,
    pub expanded_query: String,
    pub expansion_terms: Vec<ExpansionTerm>,
    pub documents_analyzed: usize,
    pub reasoning: String,
    pub processing_time_ms: u64,
}

/// Output of the query preprocessor (C3).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreprocessingResult {
    pub original_query: String,
    pub normalized_query: String,
    /// Deduplicated, insertion-ordered, bounded by `max_variants`.
    pub expanded_terms: Vec<String>,
    /// Tags of the form `filename:<path>` or `language:<tag>`.
    pub detected_patterns: Vec<String>,
    pub reasoning: String,
}

/// Map a relative or absolute file path to a language tag by extension,
/// for callers (the Indexer) that only have a path, not a declared
/// language. Falls back to the bare extension, or `"text"` for paths
/// with none; `Chunker::chunk` degrades to the fallback splitter for any
/// tag `SyntaxGrammar` does not recognise.
pub fn detect_language_from_extension(path: &str) -> String {
    match std::path::Path::new(path).extension().and_then(|e| e.to_str()) {
        Some(ext) => ext.to_ascii_lowercase(),
        None => "text".to_string(),
    }
}

/// Compute the SHA-256 hash (lowercase hex) of `trim(content)`, used as the
/// embedding cache key.
pub fn content_hash(content: &str) -> String {
    let trimmed = content.trim();
    let mut hasher = Sha256::new();
    hasher.update(trimmed.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Truncated SHA-256 hex digest (first `len` hex chars), used for
/// codebase-identifier and collection-name derivation. See DESIGN.md for
/// why this substitutes for an MD5-based scheme.
pub fn short_hash(input: &str, len: usize) -> String {
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    let full = format!("{:x}", hasher.finalize());
    full[..len.min(full.len())].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedding_content_wraps_with_path() {
        let chunk = CodeChunk {
            content: "fn main() {}".to_string(),
            start_line: 1,
            end_line: 1,
            language: "rust".to_string(),
            file_path: "src/main.rs".to_string(),
        };
        let wrapped = chunk.embedding_content();
        assert_eq!(wrapped, "```src/main.rs\nfn main() {}\n```");
    }

    #[test]
    fn compute_id_stable_for_identical_inputs() {
        let a = VectorDocument::compute_id("src/lib.rs", 1, 3, "fn a() {}");
        let b = VectorDocument::compute_id("src/lib.rs", 1, 3, "fn a() {}");
        assert_eq!(a, b);
    }

    #[test]
    fn compute_id_differs_on_content_change() {
        let a = VectorDocument::compute_id("src/lib.rs", 1, 3, "fn a() {}");
        let b = VectorDocument::compute_id("src/lib.rs", 1, 3, "fn b() {}");
        assert_ne!(a, b);
    }

    #[test]
    fn content_hash_ignores_surrounding_whitespace() {
        assert_eq!(content_hash("  fn a() {}  "), content_hash("fn a() {}"));
    }

    #[test]
    fn content_hash_is_full_sha256_hex() {
        assert_eq!(content_hash("x").len(), 64);
    }

    #[test]
    fn short_hash_is_deterministic_and_truncated() {
        let h1 = short_hash("/home/user/project", 8);
        let h2 = short_hash("/home/user/project", 8);
        assert_eq!(h1, h2);
        assert_eq!(h1.len(), 8);
    }
}
