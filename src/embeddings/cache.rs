//! Content-addressed embedding cache (C2).
//!
//! Keyed purely by content hash, no artifact/model scoping, since the
//! spec models one collection as bound to one embedding provider for its
//! lifetime. Backed by SQLite; opening the cache never fails the caller:
//! if the store can't be created, the cache degrades to a no-op pass
//! through and callers simply recompute embeddings every time.

use std::path::Path;
use std::sync::Mutex;

use rusqlite::Connection;
use rusqlite::params;
use tracing::warn;

use crate::error::{RetrievalErr, Result};

/// Aggregate counters surfaced to callers/log lines.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub total_entries: i64,
    pub size_bytes: i64,
    pub oldest_ts: Option<i64>,
    pub newest_ts: Option<i64>,
}

enum Backing {
    Sqlite(Mutex<Connection>),
    Disabled,
}

/// SQLite-backed cache mapping content hash to dense vector.
pub struct EmbeddingCache {
    backing: Backing,
}

impl EmbeddingCache {
    /// Open or create a cache at `path`. Returns a degraded (disabled)
    /// cache rather than an error if the underlying store can't be
    /// opened; the cache is a performance optimization, not a
    /// correctness requirement.
    pub fn open(path: &Path) -> Self {
        match Self::open_strict(path) {
            Ok(cache) => cache,
            Err(e) => {
                warn!(error = %e, path = %path.display(), "embedding cache unavailable, degrading to no-op");
                Self { backing: Backing::Disabled }
            }
        }
    }

    /// Open a cache, surfacing errors instead of degrading. Used by
    /// callers that want to fail fast (e.g. explicit cache inspection
    /// tooling) rather than silently disable caching.
    pub fn open_strict(path: &Path) -> Result<Self> {
        let conn = Connection::open(path).map_err(|e| RetrievalErr::sqlite_error(path, e))?;

        conn.execute_batch(
            "PRAGMA journal_mode=WAL;
             CREATE TABLE IF NOT EXISTS embeddings (
                 content_hash TEXT PRIMARY KEY,
                 embedding BLOB NOT NULL,
                 dimension INTEGER NOT NULL,
                 created_at INTEGER NOT NULL DEFAULT (strftime('%s', 'now'))
             );
             CREATE INDEX IF NOT EXISTS idx_embeddings_created_at ON embeddings(created_at);",
        )
        .map_err(|e| RetrievalErr::sqlite_error(path, e))?;

        Ok(Self {
            backing: Backing::Sqlite(Mutex::new(conn)),
        })
    }

    /// An in-memory cache, mainly for tests.
    pub fn open_in_memory() -> Self {
        let conn = Connection::open_in_memory().expect("in-memory sqlite open cannot fail");
        conn.execute_batch(
            "CREATE TABLE embeddings (
                 content_hash TEXT PRIMARY KEY,
                 embedding BLOB NOT NULL,
                 dimension INTEGER NOT NULL,
                 created_at INTEGER NOT NULL DEFAULT (strftime('%s', 'now'))
             );",
        )
        .expect("schema creation cannot fail on a fresh in-memory db");
        Self {
            backing: Backing::Sqlite(Mutex::new(conn)),
        }
    }

    pub fn get(&self, content_hash: &str) -> Option<Vec<f32>> {
        let Backing::Sqlite(conn) = &self.backing else {
            return None;
        };
        let conn = conn.lock().ok()?;
        conn.query_row(
            "SELECT embedding FROM embeddings WHERE content_hash = ?",
            params![content_hash],
            |row| {
                let bytes: Vec<u8> = row.get(0)?;
                Ok(bytes_to_f32_vec(&bytes))
            },
        )
        .ok()
    }

    pub fn get_many(&self, content_hashes: &[String]) -> Vec<(String, Vec<f32>)> {
        let Backing::Sqlite(conn) = &self.backing else {
            return Vec::new();
        };
        let Ok(conn) = conn.lock() else {
            return Vec::new();
        };
        let mut out = Vec::new();
        for hash in content_hashes {
            if let Ok(embedding) = conn.query_row(
                "SELECT embedding FROM embeddings WHERE content_hash = ?",
                params![hash],
                |row| {
                    let bytes: Vec<u8> = row.get(0)?;
                    Ok(bytes_to_f32_vec(&bytes))
                },
            ) {
                out.push((hash.clone(), embedding));
            }
        }
        out
    }

    pub fn set(&self, content_hash: &str, embedding: &[f32]) -> Result<()> {
        let Backing::Sqlite(conn) = &self.backing else {
            return Ok(());
        };
        let conn = conn.lock().map_err(|_| RetrievalErr::CacheUnavailable("mutex poisoned".into()))?;
        let bytes = f32_vec_to_bytes(embedding);
        conn.execute(
            "INSERT OR REPLACE INTO embeddings (content_hash, embedding, dimension) VALUES (?, ?, ?)",
            params![content_hash, bytes, embedding.len() as i64],
        )
        .map_err(|e| RetrievalErr::CacheUnavailable(e.to_string()))?;
        Ok(())
    }

    pub fn set_many(&self, entries: &[(String, Vec<f32>)]) -> Result<()> {
        let Backing::Sqlite(conn) = &self.backing else {
            return Ok(());
        };
        let mut conn = conn.lock().map_err(|_| RetrievalErr::CacheUnavailable("mutex poisoned".into()))?;
        let tx = conn.transaction().map_err(|e| RetrievalErr::CacheUnavailable(e.to_string()))?;
        for (hash, embedding) in entries {
            let bytes = f32_vec_to_bytes(embedding);
            tx.execute(
                "INSERT OR REPLACE INTO embeddings (content_hash, embedding, dimension) VALUES (?, ?, ?)",
                params![hash, bytes, embedding.len() as i64],
            )
            .map_err(|e| RetrievalErr::CacheUnavailable(e.to_string()))?;
        }
        tx.commit().map_err(|e| RetrievalErr::CacheUnavailable(e.to_string()))?;
        Ok(())
    }

    pub fn stats(&self) -> CacheStats {
        let Backing::Sqlite(conn) = &self.backing else {
            return CacheStats::default();
        };
        let Ok(conn) = conn.lock() else {
            return CacheStats::default();
        };
        let total_entries: i64 = conn
            .query_row("SELECT COUNT(*) FROM embeddings", [], |r| r.get(0))
            .unwrap_or(0);
        let size_bytes: i64 = conn
            .query_row("SELECT COALESCE(SUM(LENGTH(embedding)), 0) FROM embeddings", [], |r| r.get(0))
            .unwrap_or(0);
        let (oldest_ts, newest_ts): (Option<i64>, Option<i64>) = conn
            .query_row("SELECT MIN(created_at), MAX(created_at) FROM embeddings", [], |r| {
                Ok((r.get(0)?, r.get(1)?))
            })
            .unwrap_or((None, None));
        CacheStats { total_entries, size_bytes, oldest_ts, newest_ts }
    }

    /// Unified cleanup entry point (§4.2): evict entries older than
    /// `max_age_days` and return the number of rows removed. Size-bounded
    /// eviction is a distinct bound (`cleanup_by_size`); periodic
    /// maintenance callers run both.
    pub fn cleanup(&self, max_age_days: u64) -> Result<i64> {
        self.cleanup_by_age(max_age_days)
    }

    /// Close the underlying connection explicitly, surfacing any
    /// close-time error instead of letting `Drop` discard it silently.
    /// A disabled (no-op) cache closes trivially.
    pub fn close(self) -> Result<()> {
        if let Backing::Sqlite(conn) = self.backing {
            let conn = conn.into_inner().map_err(|_| RetrievalErr::CacheUnavailable("mutex poisoned".into()))?;
            conn.close().map_err(|(_, e)| RetrievalErr::CacheUnavailable(e.to_string()))?;
        }
        Ok(())
    }

    /// Evict entries older than `max_age_days`. Returns the number of
    /// rows removed.
    pub fn cleanup_by_age(&self, max_age_days: u64) -> Result<i64> {
        let Backing::Sqlite(conn) = &self.backing else {
            return Ok(0);
        };
        let conn = conn.lock().map_err(|_| RetrievalErr::CacheUnavailable("mutex poisoned".into()))?;
        let max_age_secs = (max_age_days.saturating_mul(86_400)) as i64;
        let removed = conn
            .execute(
                "DELETE FROM embeddings WHERE created_at < (strftime('%s','now') - ?)",
                params![max_age_secs],
            )
            .map_err(|e| RetrievalErr::CacheUnavailable(e.to_string()))?;
        Ok(removed as i64)
    }

    /// Evict the oldest `fraction` of entries (by `created_at`) once the
    /// cache exceeds `max_size_bytes`. A no-op if under the limit.
    pub fn cleanup_by_size(&self, max_size_bytes: i64, fraction: f64) -> Result<i64> {
        let Backing::Sqlite(conn) = &self.backing else {
            return Ok(0);
        };
        let conn = conn.lock().map_err(|_| RetrievalErr::CacheUnavailable("mutex poisoned".into()))?;

        let size: i64 = conn
            .query_row("SELECT COALESCE(SUM(LENGTH(embedding)), 0) FROM embeddings", [], |r| r.get(0))
            .map_err(|e| RetrievalErr::CacheUnavailable(e.to_string()))?;
        if size <= max_size_bytes {
            return Ok(0);
        }

        let total: i64 = conn
            .query_row("SELECT COUNT(*) FROM embeddings", [], |r| r.get(0))
            .map_err(|e| RetrievalErr::CacheUnavailable(e.to_string()))?;
        let to_remove = ((total as f64) * fraction).ceil() as i64;
        if to_remove <= 0 {
            return Ok(0);
        }

        let removed = conn
            .execute(
                "DELETE FROM embeddings WHERE content_hash IN (
                     SELECT content_hash FROM embeddings ORDER BY created_at ASC LIMIT ?
                 )",
                params![to_remove],
            )
            .map_err(|e| RetrievalErr::CacheUnavailable(e.to_string()))?;
        Ok(removed as i64)
    }

    pub fn is_enabled(&self) -> bool {
        matches!(self.backing, Backing::Sqlite(_))
    }
}

fn bytes_to_f32_vec(bytes: &[u8]) -> Vec<f32> {
    bytes
        .chunks_exact(4)
        .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect()
}

fn f32_vec_to_bytes(floats: &[f32]) -> Vec<u8> {
    floats.iter().flat_map(|f| f.to_le_bytes()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_then_get_round_trips() {
        let cache = EmbeddingCache::open_in_memory();
        cache.set("hash1", &[0.1, 0.2, 0.3]).unwrap();
        let got = cache.get("hash1").unwrap();
        assert_eq!(got.len(), 3);
        assert!((got[0] - 0.1).abs() < 1e-6);
    }

    #[test]
    fn get_missing_returns_none() {
        let cache = EmbeddingCache::open_in_memory();
        assert!(cache.get("missing").is_none());
    }

    #[test]
    fn set_many_and_get_many() {
        let cache = EmbeddingCache::open_in_memory();
        let entries = vec![
            ("a".to_string(), vec![1.0, 2.0]),
            ("b".to_string(), vec![3.0, 4.0]),
        ];
        cache.set_many(&entries).unwrap();
        let got = cache.get_many(&["a".to_string(), "missing".to_string(), "b".to_string()]);
        assert_eq!(got.len(), 2);
    }

    #[test]
    fn stats_reflect_inserted_entries() {
        let cache = EmbeddingCache::open_in_memory();
        assert_eq!(cache.stats().total_entries, 0);
        cache.set("a", &[1.0, 2.0]).unwrap();
        let stats = cache.stats();
        assert_eq!(stats.total_entries, 1);
        assert!(stats.oldest_ts.is_some());
        assert_eq!(stats.oldest_ts, stats.newest_ts);
    }

    #[test]
    fn disabled_cache_is_a_harmless_no_op() {
        let cache = EmbeddingCache {
            backing: Backing::Disabled,
        };
        assert!(!cache.is_enabled());
        assert!(cache.get("anything").is_none());
        assert!(cache.set("anything", &[1.0]).is_ok());
        assert_eq!(cache.stats(), CacheStats::default());
    }

    #[test]
    fn open_on_unwritable_path_degrades_instead_of_panicking() {
        let cache = EmbeddingCache::open(Path::new("/nonexistent-dir-xyz/cache.db"));
        assert!(!cache.is_enabled());
    }

    #[test]
    fn byte_conversion_round_trips() {
        let original = vec![0.25_f32, -1.5, 0.0, 3.75];
        let bytes = f32_vec_to_bytes(&original);
        let back = bytes_to_f32_vec(&bytes);
        assert_eq!(original, back);
    }

    #[test]
    fn cleanup_by_size_removes_oldest_fraction() {
        let cache = EmbeddingCache::open_in_memory();
        for i in 0..10 {
            cache.set(&format!("h{i}"), &vec![0.0_f32; 100]).unwrap();
        }
        let removed = cache.cleanup_by_size(1, 0.1).unwrap();
        assert!(removed >= 1);
        assert!(cache.stats().total_entries < 10);
    }

    #[test]
    fn cleanup_is_an_alias_for_age_based_eviction() {
        let cache = EmbeddingCache::open_in_memory();
        cache.set("a", &[1.0]).unwrap();
        if let Backing::Sqlite(conn) = &cache.backing {
            conn.lock()
                .unwrap()
                .execute("UPDATE embeddings SET created_at = created_at - 1000000", [])
                .unwrap();
        }
        let removed = cache.cleanup(1).unwrap();
        assert_eq!(removed, 1);
        assert_eq!(cache.stats().total_entries, 0);
    }

    #[test]
    fn close_consumes_a_disabled_cache_without_error() {
        let cache = EmbeddingCache { backing: Backing::Disabled };
        assert!(cache.close().is_ok());
    }

    #[test]
    fn close_consumes_an_enabled_cache_without_error() {
        let cache = EmbeddingCache::open_in_memory();
        assert!(cache.close().is_ok());
    }
}
