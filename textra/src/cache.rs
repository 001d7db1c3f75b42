use std::collections::HashMap;
use std::future::Future;
use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex};

use lru::LruCache;

use crate::error::Result;
use crate::models::OcrOutcome;

/// Content-hash-keyed memo of OCR results.
///
/// Bounded by an LRU eviction policy; a hit refreshes recency. Failures are
/// never cached. Concurrent misses for the same hash are collapsed onto one
/// in-flight computation: later callers wait on a per-key guard and re-read
/// the cache once the first caller finishes, so identical concurrent uploads
/// cost at most one provider call.
#[derive(Clone)]
pub struct ResultCache {
    inner: Arc<CacheInner>,
}

struct CacheInner {
    entries: Mutex<LruCache<String, OcrOutcome>>,
    inflight: tokio::sync::Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
}

impl ResultCache {
    pub fn new(capacity: usize) -> Self {
        let entries = LruCache::new(
            NonZeroUsize::new(capacity).expect("cache capacity must be non-zero"),
        );
        Self {
            inner: Arc::new(CacheInner {
                entries: Mutex::new(entries),
                inflight: tokio::sync::Mutex::new(HashMap::new()),
            }),
        }
    }

    /// Returns the cached result for `hash` if present, refreshing its
    /// recency.
    pub fn get(&self, hash: &str) -> Option<OcrOutcome> {
        let mut entries = self.inner.entries.lock().unwrap();
        entries.get(hash).cloned()
    }

    /// Number of stored entries. Never exceeds capacity.
    pub fn len(&self) -> usize {
        self.inner.entries.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the cached result for `hash`, or runs `compute` and stores
    /// its output. A compute error propagates to the caller and leaves the
    /// cache unchanged for that hash.
    pub async fn get_or_compute<F, Fut>(&self, hash: &str, compute: F) -> Result<OcrOutcome>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<OcrOutcome>>,
    {
        if let Some(cached) = self.get(hash) {
            return Ok(cached);
        }

        let guard = {
            let mut inflight = self.inner.inflight.lock().await;
            inflight
                .entry(hash.to_string())
                .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(())))
                .clone()
        };

        // Only one task per hash computes at a time; the rest queue here.
        let _held = guard.lock().await;

        // A peer may have populated the entry while we waited.
        if let Some(cached) = self.get(hash) {
            return Ok(cached);
        }

        let result = compute().await;

        if let Ok(outcome) = &result {
            let mut entries = self.inner.entries.lock().unwrap();
            entries.put(hash.to_string(), outcome.clone());
        }

        let mut inflight = self.inner.inflight.lock().await;
        inflight.remove(hash);

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TextraError;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn outcome(text: &str) -> OcrOutcome {
        OcrOutcome {
            text: text.to_string(),
            confidence: 0.9,
        }
    }

    #[tokio::test]
    async fn test_miss_computes_and_stores() {
        let cache = ResultCache::new(10);
        let calls = AtomicUsize::new(0);

        let result = cache
            .get_or_compute("abc", || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(outcome("first"))
            })
            .await
            .unwrap();

        assert_eq!(result.text, "first");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test]
    async fn test_hit_skips_compute() {
        let cache = ResultCache::new(10);
        cache
            .get_or_compute("abc", || async { Ok(outcome("stored")) })
            .await
            .unwrap();

        let result = cache
            .get_or_compute("abc", || async {
                panic!("compute must not run on a cache hit")
            })
            .await
            .unwrap();

        assert_eq!(result.text, "stored");
    }

    #[tokio::test]
    async fn test_failures_are_not_cached() {
        let cache = ResultCache::new(10);

        let err = cache
            .get_or_compute("abc", || async {
                Err(TextraError::Provider("boom".to_string()))
            })
            .await
            .unwrap_err();
        assert!(matches!(err, TextraError::Provider(_)));
        assert_eq!(cache.len(), 0);

        // A later call for the same hash computes again and can succeed.
        let result = cache
            .get_or_compute("abc", || async { Ok(outcome("recovered")) })
            .await
            .unwrap();
        assert_eq!(result.text, "recovered");
    }

    #[tokio::test]
    async fn test_lru_eviction_at_capacity() {
        let cache = ResultCache::new(2);

        for key in ["a", "b", "c"] {
            cache
                .get_or_compute(key, || async { Ok(outcome(key)) })
                .await
                .unwrap();
        }

        assert_eq!(cache.len(), 2);
        assert!(cache.get("a").is_none(), "oldest entry should be evicted");
        assert!(cache.get("b").is_some());
        assert!(cache.get("c").is_some());
    }

    #[tokio::test]
    async fn test_recently_accessed_entries_survive_eviction() {
        let cache = ResultCache::new(2);

        cache
            .get_or_compute("a", || async { Ok(outcome("a")) })
            .await
            .unwrap();
        cache
            .get_or_compute("b", || async { Ok(outcome("b")) })
            .await
            .unwrap();

        // Touch "a" so "b" becomes least recently used.
        assert!(cache.get("a").is_some());

        cache
            .get_or_compute("c", || async { Ok(outcome("c")) })
            .await
            .unwrap();

        assert!(cache.get("a").is_some());
        assert!(cache.get("b").is_none());
        assert!(cache.get("c").is_some());
    }

    #[tokio::test]
    async fn test_concurrent_misses_share_one_computation() {
        let cache = ResultCache::new(10);
        let calls = Arc::new(AtomicUsize::new(0));

        let tasks: Vec<_> = (0..8)
            .map(|_| {
                let cache = cache.clone();
                let calls = calls.clone();
                tokio::spawn(async move {
                    cache
                        .get_or_compute("same-hash", || async move {
                            calls.fetch_add(1, Ordering::SeqCst);
                            // Hold the computation open so peers pile up.
                            tokio::time::sleep(std::time::Duration::from_millis(50)).await;
                            Ok(outcome("shared"))
                        })
                        .await
                })
            })
            .collect();

        for task in tasks {
            let result = task.await.unwrap().unwrap();
            assert_eq!(result.text, "shared");
        }

        assert_eq!(
            calls.load(Ordering::SeqCst),
            1,
            "concurrent identical misses must collapse to one provider call"
        );
    }
}
