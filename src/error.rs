//! Crate-wide error type.

use std::path::PathBuf;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, RetrievalErr>;

/// Errors surfaced by the retrieval pipeline.
///
/// Most failure modes described in the design (parser errors, cache-open
/// failures, reranker failures) are handled locally and never reach this
/// type; see each component's module docs for its degradation policy.
#[derive(Debug, thiserror::Error)]
pub enum RetrievalErr {
    /// Empty or malformed input (empty PRF query, chunk with no file path).
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Retrieval was attempted against a collection that does not exist.
    #[error("collection not indexed: {0}")]
    NotIndexed(String),

    /// The embedding provider, vector store, reranker, or PRF engine failed
    /// in a way that could not be locally absorbed.
    #[error("external collaborator failed: {0}")]
    ExternalFailure(String),

    /// Indexing stopped because it hit the configured chunk ceiling.
    #[error("resource limit reached: {0}")]
    ResourceLimit(String),

    /// Parser could not produce a root node. Always absorbed internally by
    /// the chunker's fallback path; never returned from a public function.
    #[error("parse failure: {0}")]
    ParseFailure(String),

    /// The embedding cache's backing store could not be opened. Always
    /// absorbed internally; the cache degrades to a no-op.
    #[error("cache unavailable: {0}")]
    CacheUnavailable(String),

    /// A configuration field failed validation.
    #[error("config error in field `{field}`: {cause}")]
    ConfigError { field: String, cause: String },

    /// A configuration file could not be parsed.
    #[error("failed to parse config at {path}: {cause}")]
    ConfigParseError { path: PathBuf, cause: String },

    /// A SQLite operation failed.
    #[error("sqlite error at {path}: {cause}")]
    SqliteError { path: PathBuf, cause: String },

    /// Filesystem I/O failure.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization failure.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl RetrievalErr {
    pub fn sqlite_error(path: &std::path::Path, cause: impl std::fmt::Display) -> Self {
        RetrievalErr::SqliteError {
            path: path.to_path_buf(),
            cause: cause.to_string(),
        }
    }

    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        RetrievalErr::InvalidArgument(msg.into())
    }

    pub fn external(msg: impl std::fmt::Display) -> Self {
        RetrievalErr::ExternalFailure(msg.to_string())
    }
}

impl From<rusqlite::Error> for RetrievalErr {
    fn from(e: rusqlite::Error) -> Self {
        RetrievalErr::SqliteError {
            path: PathBuf::new(),
            cause: e.to_string(),
        }
    }
}
