//! C8: the Retriever (§4.8).
//!
//! Mediates the preprocessor, embedding provider, vector store, optional
//! reranker and optional PRF engine into one `search`/`search_with_prf`
//! surface.

use std::path::Path;
use std::sync::Arc;

use futures::future::try_join_all;

use crate::config::RetrievalConfig;
use crate::embeddings::EmbeddingProvider;
use crate::error::{Result, RetrievalErr};
use crate::indexing::collection_name;
use crate::prf::PRFEngine;
use crate::query::{preprocess, select_multi, select_single};
use crate::reranker::Reranker;
use crate::store::{AnnsData, AnnsRequest, DenseSearchParams, HybridSearchParams, RerankSpec, VectorStore};
use crate::types::SearchResult;

pub struct Retriever {
    store: Arc<dyn VectorStore>,
    embedder: Arc<dyn EmbeddingProvider>,
    reranker: Option<Arc<dyn Reranker>>,
    prf: PRFEngine,
    config: RetrievalConfig,
}

impl Retriever {
    pub fn new(
        store: Arc<dyn VectorStore>,
        embedder: Arc<dyn EmbeddingProvider>,
        reranker: Option<Arc<dyn Reranker>>,
        config: RetrievalConfig,
    ) -> Self {
        let prf = PRFEngine::new(config.prf.clone());
        Self { store, embedder, reranker, prf, config }
    }

    fn collection_for(&self, codebase_path: &Path) -> String {
        collection_name(codebase_path, self.config.indexing.hybrid_mode)
    }

    async fn reranker_enabled(&self) -> bool {
        if !self.config.reranker.enabled {
            return false;
        }
        match &self.reranker {
            Some(r) if r.is_enabled() => {
                if r.initialize().await.is_err() {
                    tracing::warn!("reranker initialization failed, disabling for this search");
                    return false;
                }
                true
            }
            _ => false,
        }
    }

    /// `search(codebase_path, query, top_k, threshold, filter_expr) →
    /// ordered SearchResult list` (§4.8). Fails with `NotIndexed` if the
    /// collection does not exist.
    ///
    /// Multi-query mode fans the selected variants out to the store and
    /// merges the results, rather than selecting several variants and
    /// then only ever issuing the primary one (see DESIGN.md).
    pub async fn search(
        &self,
        codebase_path: &Path,
        query: &str,
        top_k: usize,
        threshold: f32,
        filter_expr: Option<&str>,
    ) -> Result<Vec<SearchResult>> {
        let collection = self.collection_for(codebase_path);
        if !self.store.has_collection(&collection).await? {
            return Err(RetrievalErr::NotIndexed(collection));
        }

        let preprocessed = preprocess(query, &self.config.preprocessor);

        let is_multi_query = preprocessed.expanded_terms.len() >= 2 && !preprocessed.detected_patterns.is_empty();
        let variants: Vec<String> = if is_multi_query {
            select_multi(&preprocessed, 3)
        } else {
            vec![select_single(&preprocessed)]
        };
        let primary = variants.first().cloned().unwrap_or_else(|| preprocessed.normalized_query.clone());

        let reranking = self.reranker_enabled().await;
        let per_request_limit = if reranking { (top_k * 2).min(50) } else { top_k };

        let variant_searches = variants
            .iter()
            .map(|variant| self.search_variant(&collection, variant, per_request_limit, threshold, filter_expr));
        let per_variant = try_join_all(variant_searches).await?;

        let mut results = if per_variant.len() == 1 {
            per_variant.into_iter().next().unwrap_or_default()
        } else {
            fan_out_merge(per_variant, per_request_limit)
        };

        if reranking && !results.is_empty() {
            if let Some(reranker) = &self.reranker {
                match reranker.rerank(&primary, &results, top_k).await {
                    Ok(reranked) => results = reranked,
                    Err(e) => {
                        tracing::warn!(error = %e, "reranker failed, returning fused list");
                        results.truncate(top_k);
                    }
                }
            }
        } else {
            results.truncate(top_k);
        }

        Ok(results)
    }

    /// Issue one variant against the store (hybrid dense+sparse, or dense
    /// only), per §4.8's per-request construction.
    async fn search_variant(
        &self,
        collection: &str,
        variant: &str,
        limit: usize,
        threshold: f32,
        filter_expr: Option<&str>,
    ) -> Result<Vec<SearchResult>> {
        let vector = self.embedder.embed(variant).await?;

        if self.config.indexing.hybrid_mode {
            let requests = vec![
                AnnsRequest { data: AnnsData::Dense(vector), anns_field: "vector".to_string(), limit },
                AnnsRequest { data: AnnsData::Sparse(variant.to_string()), anns_field: "sparse_vector".to_string(), limit },
            ];
            let params = HybridSearchParams {
                rerank: RerankSpec { strategy: "rrf".to_string(), k: 100 },
                limit,
                filter_expr: filter_expr.map(str::to_string),
            };
            self.store.hybrid_search(collection, &requests, params).await
        } else {
            let params = DenseSearchParams { top_k: limit, threshold, filter_expr: filter_expr.map(str::to_string) };
            self.store.search(collection, &vector, params).await
        }
    }

    /// `search_with_prf(...)` (§4.8): a widened first pass, PRF
    /// expansion, and (if the expansion is non-trivial) a second pass
    /// merged ahead of the first, deduplicated by
    /// `(relative_path, start_line, end_line)`.
    pub async fn search_with_prf(
        &self,
        codebase_path: &Path,
        query: &str,
        top_k: usize,
        threshold: f32,
        filter_expr: Option<&str>,
    ) -> Result<Vec<SearchResult>> {
        let widened_top_k = (top_k * 2).max(12);
        let widened_threshold = threshold * 0.8;

        let first_pass = self.search(codebase_path, query, widened_top_k, widened_threshold, filter_expr).await?;
        if first_pass.is_empty() {
            return Ok(Vec::new());
        }

        let expansion = match self.prf.expand(query, &first_pass) {
            Ok(result) if result.expanded_query.trim() != query.trim() => result,
            _ => {
                let mut truncated = first_pass;
                truncated.truncate(top_k);
                return Ok(truncated);
            }
        };

        let expansion_pass = match self.search(codebase_path, &expansion.expanded_query, top_k, threshold, filter_expr).await {
            Ok(results) => results,
            Err(e) => {
                tracing::warn!(error = %e, "prf expansion-pass search failed, falling back to first-pass results");
                let mut truncated = first_pass;
                truncated.truncate(top_k);
                return Ok(truncated);
            }
        };

        Ok(merge_dedup(expansion_pass, first_pass, top_k))
    }
}

/// Merge per-variant result lists (multi-query fan-out): dedup by
/// `(relative_path, start_line, end_line)` keeping the highest score seen
/// across variants, then rank by score descending and truncate to `limit`.
fn fan_out_merge(per_variant: Vec<Vec<SearchResult>>, limit: usize) -> Vec<SearchResult> {
    let mut best: std::collections::HashMap<(String, i32, i32), SearchResult> = std::collections::HashMap::new();
    for results in per_variant {
        for result in results {
            let key = (result.relative_path.clone(), result.start_line, result.end_line);
            match best.get(&key) {
                Some(existing) if existing.score >= result.score => {}
                _ => {
                    best.insert(key, result);
                }
            }
        }
    }
    let mut merged: Vec<SearchResult> = best.into_values().collect();
    merged.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
    merged.truncate(limit);
    merged
}

fn merge_dedup(primary: Vec<SearchResult>, secondary: Vec<SearchResult>, top_k: usize) -> Vec<SearchResult> {
    let mut seen = std::collections::HashSet::new();
    let mut merged = Vec::new();
    for result in primary.into_iter().chain(secondary.into_iter()) {
        let key = (result.relative_path.clone(), result.start_line, result.end_line);
        if seen.insert(key) {
            merged.push(result);
        }
        if merged.len() >= top_k {
            break;
        }
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(path: &str, start: i32, end: i32, score: f32) -> SearchResult {
        SearchResult {
            content: "x".to_string(),
            relative_path: path.to_string(),
            start_line: start,
            end_line: end,
            language: "rust".to_string(),
            score,
        }
    }

    #[test]
    fn merge_dedup_prefers_expansion_pass_entries() {
        let expansion = vec![result("a.rs", 1, 5, 0.9)];
        let first = vec![result("a.rs", 1, 5, 0.5), result("b.rs", 1, 2, 0.4)];
        let merged = merge_dedup(expansion, first, 10);
        assert_eq!(merged.len(), 2);
        assert!((merged[0].score - 0.9).abs() < f32::EPSILON);
        assert_eq!(merged[1].relative_path, "b.rs");
    }

    #[test]
    fn fan_out_merge_keeps_best_score_across_variants() {
        let variant_a = vec![result("a.rs", 1, 5, 0.4)];
        let variant_b = vec![result("a.rs", 1, 5, 0.9), result("b.rs", 1, 2, 0.3)];
        let merged = fan_out_merge(vec![variant_a, variant_b], 10);
        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].relative_path, "a.rs");
        assert!((merged[0].score - 0.9).abs() < f32::EPSILON);
    }

    #[test]
    fn fan_out_merge_truncates_to_limit() {
        let variant_a = vec![result("a.rs", 1, 2, 1.0), result("b.rs", 1, 2, 0.9)];
        let variant_b = vec![result("c.rs", 1, 2, 0.8)];
        let merged = fan_out_merge(vec![variant_a, variant_b], 2);
        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].relative_path, "a.rs");
        assert_eq!(merged[1].relative_path, "b.rs");
    }

    #[test]
    fn merge_dedup_truncates_to_top_k() {
        let expansion = vec![result("a.rs", 1, 2, 1.0), result("b.rs", 1, 2, 0.9)];
        let first = vec![result("c.rs", 1, 2, 0.8)];
        let merged = merge_dedup(expansion, first, 1);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].relative_path, "a.rs");
    }
}
