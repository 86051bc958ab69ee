//! Code-aware semantic search and retrieval pipeline.
//!
//! Syntax-aware chunking, a content-addressed embedding cache, rule-based
//! query preprocessing, TF-IDF pseudo-relevance feedback, gitignore-aware
//! incremental indexing, and hybrid dense+sparse retrieval, composed
//! behind external embedding-provider, vector-store and reranker
//! collaborators (see `store`, `reranker`, `embeddings::EmbeddingProvider`).
//!
//! ## Components
//!
//! | Component | Module |
//! |---|---|
//! | Chunker (C1) | [`chunking`] |
//! | EmbeddingCache (C2) | [`embeddings`] |
//! | QueryPreprocessor (C3) | [`query`] |
//! | TFIDF (C4) | [`tfidf`] |
//! | PRFEngine (C5) | [`prf`] |
//! | SnapshotSynchronizer (C6) | [`snapshot`] |
//! | Indexer (C7) | [`indexing`] |
//! | Retriever (C8) | [`retriever`] |

pub mod chunking;
pub mod config;
pub mod embeddings;
pub mod error;
pub mod indexing;
pub mod prf;
pub mod query;
pub mod reranker;
pub mod retriever;
pub mod snapshot;
pub mod store;
pub mod tfidf;
pub mod types;

pub use chunking::Chunker;
pub use config::RetrievalConfig;
pub use embeddings::{EmbeddingCache, EmbeddingProvider};
pub use error::{Result, RetrievalErr};
pub use indexing::{IndexProgress, IndexReport, IndexStatus, Indexer};
pub use prf::PRFEngine;
pub use reranker::Reranker;
pub use retriever::Retriever;
pub use snapshot::SnapshotSynchronizer;
pub use store::VectorStore;
pub use types::{CodeChunk, SearchResult, VectorDocument};
