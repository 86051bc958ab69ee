//! External embedding-provider interface (spec §6).
//!
//! The retrieval pipeline never generates vectors itself; callers supply an
//! implementation of this trait (a remote API client, a local model runner,
//! or a test double). Errors from the underlying provider are wrapped as
//! [`RetrievalErr::ExternalFailure`] at call sites.

use async_trait::async_trait;

use crate::error::Result;

/// An embedding backend the retrieval pipeline calls out to.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Embed a single piece of text.
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Embed a batch of texts; implementations are expected to batch more
    /// efficiently than repeated calls to `embed`.
    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>>;

    /// The dimensionality of vectors this provider returns.
    fn detect_dimension(&self) -> usize;

    /// A stable identifier for this provider/model, used in log lines and
    /// collection metadata.
    fn name(&self) -> &str;
}
