//! Vector store collaborator (§6).
//!
//! The retrieval core never persists vectors itself; it drives whatever
//! store implementation the embedding binary wires in. This module only
//! declares the contract and the request/response shapes the Indexer and
//! Retriever build against.

use async_trait::async_trait;

use crate::error::Result;
use crate::types::{SearchResult, VectorDocument};

/// One leg of a hybrid search request (§4.8 step 3): a dense `vector`
/// search against `anns_field`, or a sparse text search against
/// `sparse_vector` using `data` as raw query text.
#[derive(Debug, Clone)]
pub struct AnnsRequest {
    pub data: AnnsData,
    pub anns_field: String,
    pub limit: usize,
}

#[derive(Debug, Clone)]
pub enum AnnsData {
    Dense(Vec<f32>),
    Sparse(String),
}

/// Reciprocal-rank-fusion parameters for a hybrid search call.
#[derive(Debug, Clone)]
pub struct RerankSpec {
    pub strategy: String,
    pub k: u32,
}

impl Default for RerankSpec {
    fn default() -> Self {
        Self { strategy: "rrf".to_string(), k: 100 }
    }
}

#[derive(Debug, Clone, Default)]
pub struct HybridSearchParams {
    pub rerank: RerankSpec,
    pub limit: usize,
    pub filter_expr: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct DenseSearchParams {
    pub top_k: usize,
    pub threshold: f32,
    pub filter_expr: Option<String>,
}

/// A row returned by `query`, keyed by the requested output fields.
pub type Row = std::collections::HashMap<String, String>;

/// Vector store contract (§6). Implementations own schema creation,
/// sparse-vector derivation for `insert_hybrid`, and fusion for
/// `hybrid_search`.
#[async_trait]
pub trait VectorStore: Send + Sync {
    async fn has_collection(&self, name: &str) -> Result<bool>;

    async fn create_collection(&self, name: &str, dimension: usize, description: &str) -> Result<()>;

    async fn create_hybrid_collection(&self, name: &str, dimension: usize, description: &str) -> Result<()>;

    async fn drop_collection(&self, name: &str) -> Result<()>;

    async fn insert(&self, name: &str, documents: &[VectorDocument]) -> Result<()>;

    /// Same payload shape as `insert`; the store derives the sparse
    /// representation from each document's `content`.
    async fn insert_hybrid(&self, name: &str, documents: &[VectorDocument]) -> Result<()>;

    async fn search(&self, name: &str, vector: &[f32], params: DenseSearchParams) -> Result<Vec<SearchResult>>;

    async fn hybrid_search(
        &self,
        name: &str,
        requests: &[AnnsRequest],
        params: HybridSearchParams,
    ) -> Result<Vec<SearchResult>>;

    async fn query(
        &self,
        name: &str,
        filter_expr: &str,
        output_fields: &[String],
        limit: Option<usize>,
    ) -> Result<Vec<Row>>;

    async fn delete(&self, name: &str, ids: &[String]) -> Result<()>;
}
