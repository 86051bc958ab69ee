//! C7: the indexing pipeline (§4.7).
//!
//! Coordinates the Chunker, EmbeddingCache, an embedding provider, the
//! SnapshotSynchronizer and a VectorStore through one codebase indexing
//! run. File walking is this module's job; ignore/extension filtering is
//! delegated to [`crate::indexing::ignore::IgnoreSet`].

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use walkdir::WalkDir;

use crate::chunking::Chunker;
use crate::config::{IndexingConfig, RetrievalConfig};
use crate::embeddings::{EmbeddingCache, EmbeddingProvider};
use crate::error::Result;
use crate::indexing::ignore::{effective_extensions, IgnoreSet};
use crate::snapshot::{codebase_identifier, SnapshotSynchronizer};
use crate::store::VectorStore;
use crate::types::{content_hash, detect_language_from_extension, CodeChunk, VectorDocument, VectorDocumentMetadata};

/// Outcome of one indexing invocation (§4.7 step 4).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexStatus {
    Completed,
    LimitReached,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexPhase {
    Preparing,
    Processing,
}

/// Progress callback payload (§4.7 step 5).
#[derive(Debug, Clone)]
pub struct IndexProgress {
    pub phase: IndexPhase,
    pub current: usize,
    pub total: usize,
    pub percentage: f32,
}

#[derive(Debug, Clone)]
pub struct IndexReport {
    pub status: IndexStatus,
    pub files_processed: usize,
    pub chunks_indexed: usize,
    pub files_failed: usize,
}

/// A chunk waiting in the embedding buffer, alongside the bookkeeping
/// needed to turn it into a `VectorDocument` once its batch flushes.
struct PendingChunk {
    chunk: CodeChunk,
    hash: String,
    chunk_index: i32,
}

/// The C7 pipeline. Holds no per-codebase state; construct per run or
/// reuse across codebases freely.
pub struct Indexer {
    store: Arc<dyn VectorStore>,
    embedder: Arc<dyn EmbeddingProvider>,
    cache: Arc<EmbeddingCache>,
    indexing: IndexingConfig,
    chunker: Chunker,
    data_dir: std::path::PathBuf,
}

/// Derive the store collection name for a codebase (§4.7): prefix
/// `hybrid_code_chunks` or `code_chunks` plus the truncated content hash
/// of its absolute path.
pub fn collection_name(codebase_path: &Path, hybrid_mode: bool) -> String {
    let prefix = if hybrid_mode { "hybrid_code_chunks" } else { "code_chunks" };
    format!("{prefix}_{}", codebase_identifier(codebase_path))
}

impl Indexer {
    pub fn new(
        store: Arc<dyn VectorStore>,
        embedder: Arc<dyn EmbeddingProvider>,
        cache: Arc<EmbeddingCache>,
        config: &RetrievalConfig,
    ) -> Self {
        Self {
            store,
            embedder,
            cache,
            indexing: config.indexing.clone(),
            chunker: Chunker::with_overlap(config.chunking.chunk_size, config.chunking.chunk_overlap),
            data_dir: config.data_dir.clone(),
        }
    }

    /// Run a full or incremental index of `codebase_path`, reporting
    /// progress through `on_progress`. Cancellation is cooperative: the
    /// in-flight batch completes, no further batch is scheduled, and the
    /// snapshot is committed only if the whole run completed.
    pub async fn index(
        &self,
        codebase_path: &Path,
        force_reindex: bool,
        cancel: &CancellationToken,
        mut on_progress: impl FnMut(IndexProgress),
    ) -> Result<IndexReport> {
        on_progress(IndexProgress { phase: IndexPhase::Preparing, current: 0, total: 0, percentage: 0.0 });

        let collection = collection_name(codebase_path, self.indexing.hybrid_mode);
        let exists = self.store.has_collection(&collection).await?;
        if force_reindex && exists {
            self.store.drop_collection(&collection).await?;
        }
        if force_reindex || !exists {
            let dimension = self.embedder.detect_dimension();
            if self.indexing.hybrid_mode {
                self.store.create_hybrid_collection(&collection, dimension, "code chunks").await?;
            } else {
                self.store.create_collection(&collection, dimension, "code chunks").await?;
            }
        }

        let ignore_set = IgnoreSet::build(codebase_path, &self.indexing.custom_ignore_patterns);
        let extensions = effective_extensions(&self.indexing.custom_extensions);

        let mut current_files: HashMap<String, String> = HashMap::new();
        let mut ordered_paths: Vec<(String, std::path::PathBuf)> = Vec::new();
        for entry in WalkDir::new(codebase_path).into_iter().filter_map(|e| e.ok()) {
            let path = entry.path();
            let relative = match path.strip_prefix(codebase_path) {
                Ok(r) => r.to_string_lossy().replace('\\', "/"),
                Err(_) => continue,
            };
            if relative.is_empty() {
                continue;
            }
            if ignore_set.is_ignored(&relative, entry.file_type().is_dir()) {
                continue;
            }
            if entry.file_type().is_dir() {
                continue;
            }
            let has_extension = extensions.iter().any(|ext| relative.ends_with(ext.as_str()));
            if !has_extension {
                continue;
            }
            match std::fs::read_to_string(path) {
                Ok(content) => {
                    current_files.insert(relative.clone(), content_hash(&content));
                    ordered_paths.push((relative, path.to_path_buf()));
                }
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "failed to read file during indexing, skipping");
                }
            }
        }

        let mut synchronizer = SnapshotSynchronizer::new(codebase_path, &self.data_dir);
        synchronizer.initialize()?;
        let changes = synchronizer.check_for_changes(&current_files);

        let mut to_remove = changes.removed.clone();
        to_remove.extend(changes.modified.iter().cloned());
        for path in &to_remove {
            self.delete_file(&collection, path).await?;
        }

        let mut to_process: Vec<(String, std::path::PathBuf)> = ordered_paths
            .into_iter()
            .filter(|(rel, _)| changes.added.contains(rel) || changes.modified.contains(rel))
            .collect();
        to_process.sort_by(|a, b| a.0.cmp(&b.0));

        let total = to_process.len();
        let batch_size = self.indexing.embedding_batch_size.max(1);
        let mut files_processed = 0usize;
        let mut files_failed = 0usize;
        let mut chunks_indexed = 0usize;
        let mut status = IndexStatus::Completed;
        let mut buffer: Vec<PendingChunk> = Vec::with_capacity(batch_size);

        for (relative, path) in &to_process {
            if cancel.is_cancelled() {
                // Cancellation reuses LimitReached: the two-variant status
                // enum has no separate Cancelled case, and both mean "the
                // run stopped before covering every file".
                status = IndexStatus::LimitReached;
                break;
            }
            if chunks_indexed >= self.indexing.chunk_limit {
                status = IndexStatus::LimitReached;
                break;
            }

            let content = match std::fs::read_to_string(path) {
                Ok(c) => c,
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "failed to re-read file, skipping");
                    files_failed += 1;
                    continue;
                }
            };
            let language = detect_language_from_extension(relative);
            let mut chunks = self.chunker.chunk(&content, &language, relative);
            if chunks.len() + chunks_indexed > self.indexing.chunk_limit {
                let remaining = self.indexing.chunk_limit.saturating_sub(chunks_indexed);
                chunks.truncate(remaining);
            }
            chunks_indexed += chunks.len();

            for (i, chunk) in chunks.into_iter().enumerate() {
                let hash = content_hash(&chunk.content);
                buffer.push(PendingChunk { chunk, hash, chunk_index: i as i32 });
                if buffer.len() >= batch_size {
                    self.flush_batch(&collection, codebase_path, &mut buffer).await?;
                }
            }

            files_processed += 1;
            let percentage = 10.0 + 90.0 * (files_processed as f32 / total.max(1) as f32);
            on_progress(IndexProgress {
                phase: IndexPhase::Processing,
                current: files_processed,
                total,
                percentage: percentage.min(100.0),
            });

            if chunks_indexed >= self.indexing.chunk_limit {
                status = IndexStatus::LimitReached;
                break;
            }
        }

        if !buffer.is_empty() {
            self.flush_batch(&collection, codebase_path, &mut buffer).await?;
        }

        if status == IndexStatus::Completed {
            synchronizer.update_state(current_files);
            synchronizer.commit()?;
        }

        Ok(IndexReport { status, files_processed, chunks_indexed, files_failed })
    }

    /// Drain `buffer`: look embeddings up in the cache, embed the misses
    /// in one batch call, write them back to the cache, and insert the
    /// resulting documents into the store. The buffer unit is chunks, per
    /// §4.7 step 3, not files, so `embedding_batch_size` bounds the size
    /// of every `embed_batch` call regardless of how large a single file
    /// is.
    async fn flush_batch(&self, collection: &str, codebase_path: &Path, buffer: &mut Vec<PendingChunk>) -> Result<()> {
        if buffer.is_empty() {
            return Ok(());
        }

        let hashes: Vec<String> = buffer.iter().map(|p| p.hash.clone()).collect();
        let mut vectors: HashMap<String, Vec<f32>> = self.cache.get_many(&hashes).into_iter().collect();

        let mut miss_indices = Vec::new();
        let mut miss_texts = Vec::new();
        for (i, pending) in buffer.iter().enumerate() {
            if !vectors.contains_key(&pending.hash) {
                miss_indices.push(i);
                miss_texts.push(pending.chunk.embedding_content());
            }
        }

        if !miss_texts.is_empty() {
            let text_refs: Vec<&str> = miss_texts.iter().map(|s| s.as_str()).collect();
            let embedded = self.embedder.embed_batch(&text_refs).await?;
            let mut to_cache = Vec::new();
            for (idx, vector) in miss_indices.iter().zip(embedded.into_iter()) {
                let hash = hashes[*idx].clone();
                to_cache.push((hash.clone(), vector.clone()));
                vectors.insert(hash, vector);
            }
            self.cache.set_many(&to_cache)?;
        }

        let mut docs = Vec::with_capacity(buffer.len());
        for pending in buffer.iter() {
            let Some(vector) = vectors.get(&pending.hash) else { continue };
            let chunk = &pending.chunk;
            let doc = VectorDocument {
                id: VectorDocument::compute_id(&chunk.file_path, chunk.start_line, chunk.end_line, &chunk.content),
                content: chunk.content.clone(),
                vector: vector.clone(),
                relative_path: chunk.file_path.clone(),
                start_line: chunk.start_line,
                end_line: chunk.end_line,
                file_extension: Path::new(&chunk.file_path)
                    .extension()
                    .map(|e| e.to_string_lossy().to_string())
                    .unwrap_or_default(),
                metadata: VectorDocumentMetadata {
                    language: chunk.language.clone(),
                    codebase_path: codebase_path.to_string_lossy().to_string(),
                    chunk_index: pending.chunk_index,
                },
            };
            docs.push(doc);
        }

        if !docs.is_empty() {
            if self.indexing.hybrid_mode {
                self.store.insert_hybrid(collection, &docs).await?;
            } else {
                self.store.insert(collection, &docs).await?;
            }
        }

        buffer.clear();
        Ok(())
    }

    /// Delete every document for `relative_path` from `collection`
    /// (§4.7, "Per-file delete"). Backslashes are doubled so the filter
    /// expression survives store-side escaping.
    pub async fn delete_file(&self, collection: &str, relative_path: &str) -> Result<()> {
        let escaped = relative_path.replace('\\', "\\\\").replace('"', "\\\"");
        let filter_expr = format!("relative_path == \"{escaped}\"");
        let rows = self
            .store
            .query(collection, &filter_expr, &["id".to_string()], None)
            .await?;
        let ids: Vec<String> = rows.into_iter().filter_map(|row| row.get("id").cloned()).collect();
        if !ids.is_empty() {
            self.store.delete(collection, &ids).await?;
        }
        Ok(())
    }
}
