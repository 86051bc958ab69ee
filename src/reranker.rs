//! Cross-encoder reranker collaborator (§6), optional.
//!
//! Initialisation is expected to be lazy and idempotent: the Retriever
//! may call `initialize` from multiple concurrent queries, and an
//! implementation backed by an in-process model should guard its load
//! behind a one-shot so only the first caller pays the cost (§5, "a
//! single in-process model instance, lazily initialised under a
//! one-shot guard").

use async_trait::async_trait;

use crate::error::Result;
use crate::types::SearchResult;

#[async_trait]
pub trait Reranker: Send + Sync {
    /// Idempotent; safe to call before every use.
    async fn initialize(&self) -> Result<()>;

    /// Re-score and reorder `results` against `query`, truncating to
    /// `top_k`. Callers fall back to the pre-rerank ordering on error.
    async fn rerank(&self, query: &str, results: &[SearchResult], top_k: usize) -> Result<Vec<SearchResult>>;

    fn is_enabled(&self) -> bool;
}
