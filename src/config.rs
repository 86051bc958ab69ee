//! Aggregate configuration for the retrieval pipeline.
//!
//! Defaults match the values named throughout spec §4; `from_env` overlays
//! the environment variables listed in spec §6 on top of those defaults.
//! This module does not parse process arguments or perform any
//! process-level configuration loading; that remains the embedding
//! binary's responsibility.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{RetrievalErr, Result};

fn env_bool(key: &str, default: bool) -> bool {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<bool>().ok())
        .unwrap_or(default)
}

fn env_usize(key: &str, default: usize) -> usize {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<usize>().ok())
        .unwrap_or(default)
}

fn env_u64(key: &str, default: u64) -> u64 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .unwrap_or(default)
}

fn env_list(key: &str) -> Vec<String> {
    std::env::var(key)
        .ok()
        .map(|v| {
            v.split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect()
        })
        .unwrap_or_default()
}

/// Chunker configuration (§4.1).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkingConfig {
    /// Upper bound on emitted chunk length, in characters.
    pub chunk_size: usize,
    /// Character count prepended from the previous chunk; 0 disables
    /// overlap. See DESIGN.md for the characters-vs-lines resolution.
    pub chunk_overlap: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: 512,
            chunk_overlap: 0,
        }
    }
}

/// EmbeddingCache configuration (§4.2, §6).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    pub max_age_days: u64,
    pub max_size_mb: u64,
    pub cleanup_interval_hours: u64,
    pub cleanup_enabled: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_age_days: 7,
            max_size_mb: 500,
            cleanup_interval_hours: 24,
            cleanup_enabled: true,
        }
    }
}

impl CacheConfig {
    pub fn from_env() -> Self {
        let d = Self::default();
        Self {
            max_age_days: env_u64("CACHE_MAX_AGE_DAYS", d.max_age_days),
            max_size_mb: env_u64("CACHE_MAX_SIZE_MB", d.max_size_mb),
            cleanup_interval_hours: env_u64(
                "CACHE_CLEANUP_INTERVAL_HOURS",
                d.cleanup_interval_hours,
            ),
            cleanup_enabled: env_bool("CACHE_CLEANUP_ENABLED", d.cleanup_enabled),
        }
    }
}

/// QueryPreprocessor stage toggles (§4.3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreprocessorConfig {
    pub abbreviation_expansion: bool,
    pub conceptual_mapping: bool,
    pub case_splitting: bool,
    pub filename_detection: bool,
    pub language_detection: bool,
    pub implementation_focus: bool,
    pub max_variants: usize,
}

impl Default for PreprocessorConfig {
    fn default() -> Self {
        Self {
            abbreviation_expansion: true,
            conceptual_mapping: true,
            case_splitting: true,
            filename_detection: true,
            language_detection: true,
            implementation_focus: true,
            max_variants: 20,
        }
    }
}

/// PRFEngine configuration (§4.5).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PRFConfig {
    pub enabled: bool,
    pub top_k: usize,
    pub expansion_terms: usize,
    pub min_term_freq: u32,
    pub original_weight: f32,
    pub code_tokens: bool,
    pub min_term_length: usize,
    pub stop_words: HashSet<String>,
}

impl Default for PRFConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            top_k: 7,
            expansion_terms: 8,
            min_term_freq: 2,
            original_weight: 0.7,
            code_tokens: true,
            min_term_length: 3,
            stop_words: default_prf_stop_words(),
        }
    }
}

fn default_prf_stop_words() -> HashSet<String> {
    [
        "the", "a", "an", "is", "are", "was", "were", "be", "been", "being", "to", "of", "in",
        "on", "at", "for", "with", "and", "or", "but", "not", "this", "that", "these", "those",
        "it", "its", "as", "by", "from", "how", "what", "when", "where", "why", "which", "who",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

/// Reranker configuration (§6).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RerankerConfig {
    pub enabled: bool,
}

impl Default for RerankerConfig {
    fn default() -> Self {
        Self { enabled: false }
    }
}

/// Indexer configuration (§4.7).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexingConfig {
    pub hybrid_mode: bool,
    pub embedding_batch_size: usize,
    pub chunk_limit: usize,
    pub custom_extensions: Vec<String>,
    pub custom_ignore_patterns: Vec<String>,
}

impl Default for IndexingConfig {
    fn default() -> Self {
        Self {
            hybrid_mode: true,
            embedding_batch_size: 100,
            chunk_limit: 450_000,
            custom_extensions: Vec::new(),
            custom_ignore_patterns: Vec::new(),
        }
    }
}

impl IndexingConfig {
    pub fn from_env() -> Self {
        let d = Self::default();
        Self {
            hybrid_mode: env_bool("HYBRID_MODE", d.hybrid_mode),
            embedding_batch_size: env_usize("EMBEDDING_BATCH_SIZE", d.embedding_batch_size),
            chunk_limit: d.chunk_limit,
            custom_extensions: env_list("CUSTOM_EXTENSIONS"),
            custom_ignore_patterns: env_list("CUSTOM_IGNORE_PATTERNS"),
        }
    }
}

/// Top-level configuration aggregate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    pub chunking: ChunkingConfig,
    pub cache: CacheConfig,
    pub preprocessor: PreprocessorConfig,
    pub prf: PRFConfig,
    pub reranker: RerankerConfig,
    pub indexing: IndexingConfig,
    pub data_dir: PathBuf,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            chunking: ChunkingConfig::default(),
            cache: CacheConfig::default(),
            preprocessor: PreprocessorConfig::default(),
            prf: PRFConfig::default(),
            reranker: RerankerConfig::default(),
            indexing: IndexingConfig::default(),
            data_dir: default_data_dir(),
        }
    }
}

fn default_data_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".context")
}

impl RetrievalConfig {
    /// Build a configuration overlaying the environment variables named in
    /// spec §6 on top of the defaults.
    pub fn from_env() -> Self {
        Self {
            chunking: ChunkingConfig::default(),
            cache: CacheConfig::from_env(),
            preprocessor: PreprocessorConfig::default(),
            prf: PRFConfig::default(),
            reranker: RerankerConfig::default(),
            indexing: IndexingConfig::from_env(),
            data_dir: default_data_dir(),
        }
    }

    /// Load a TOML config file, falling back to `from_env` defaults for
    /// any field the file omits (via `#[serde(default)]`-style merging:
    /// here, by parsing the file directly so omitted fields simply keep
    /// Rust's `Default` per struct).
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        toml::from_str(&text).map_err(|e| RetrievalErr::ConfigParseError {
            path: path.to_path_buf(),
            cause: e.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_spec() {
        let cfg = RetrievalConfig::default();
        assert_eq!(cfg.cache.max_age_days, 7);
        assert_eq!(cfg.cache.max_size_mb, 500);
        assert_eq!(cfg.cache.cleanup_interval_hours, 24);
        assert!(cfg.cache.cleanup_enabled);
        assert!(cfg.indexing.hybrid_mode);
        assert_eq!(cfg.indexing.embedding_batch_size, 100);
        assert_eq!(cfg.prf.top_k, 7);
        assert_eq!(cfg.prf.expansion_terms, 8);
        assert_eq!(cfg.prf.min_term_freq, 2);
        assert!((cfg.prf.original_weight - 0.7).abs() < f32::EPSILON);
        assert_eq!(cfg.preprocessor.max_variants, 20);
    }

    #[test]
    fn env_list_parses_comma_separated_values() {
        assert_eq!(
            env_list("CODEX_RETRIEVAL_TEST_NONEXISTENT_VAR"),
            Vec::<String>::new()
        );
    }

    #[test]
    fn load_rejects_malformed_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        std::fs::write(&path, "not = [valid").unwrap();
        let err = RetrievalConfig::load(&path).unwrap_err();
        assert!(matches!(err, RetrievalErr::ConfigParseError { .. }));
    }
}
