/*!
 * Punctuation request caching.
 *
 * Records which sentence spans have already been sent to the language
 * model so the same span is never requested twice while a request is
 * pending or after it succeeded. Entries are removed again after a failed
 * request so a later attempt can go through.
 */

use std::collections::HashSet;
use std::sync::Arc;
use parking_lot::RwLock;
use log::debug;

/// Sentence span key: first and last word index, inclusive
pub type SpanKey = (usize, usize);

/// Set of sentence spans already claimed for punctuation
///
/// Clones share the same underlying set.
#[derive(Debug, Default)]
pub struct PunctuationCache {
    /// Internal cache storage
    spans: Arc<RwLock<HashSet<SpanKey>>>,

    /// Lookups that found the span already claimed
    hits: Arc<RwLock<usize>>,

    /// Lookups that claimed a new span
    misses: Arc<RwLock<usize>>,
}

impl PunctuationCache {
    /// Create an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim `key`. Returns false when it was already claimed.
    pub fn try_insert(&self, key: SpanKey) -> bool {
        let inserted = self.spans.write().insert(key);
        if inserted {
            *self.misses.write() += 1;
            debug!("Claimed sentence span {:?}", key);
        } else {
            *self.hits.write() += 1;
            debug!("Sentence span {:?} already processed", key);
        }
        inserted
    }

    /// Whether `key` is currently claimed
    pub fn contains(&self, key: SpanKey) -> bool {
        self.spans.read().contains(&key)
    }

    /// Release `key` so it can be requested again
    pub fn remove(&self, key: SpanKey) -> bool {
        let removed = self.spans.write().remove(&key);
        if removed {
            debug!("Released sentence span {:?}", key);
        }
        removed
    }

    /// Get cache statistics as (hits, misses, hit rate)
    pub fn stats(&self) -> (usize, usize, f64) {
        let hits = *self.hits.read();
        let misses = *self.misses.read();
        let total = hits + misses;

        let hit_rate = if total > 0 {
            hits as f64 / total as f64
        } else {
            0.0
        };

        (hits, misses, hit_rate)
    }

    /// Clear the cache
    pub fn clear(&self) {
        self.spans.write().clear();
        *self.hits.write() = 0;
        *self.misses.write() = 0;
        debug!("Punctuation cache cleared");
    }

    /// Get the number of claimed spans
    pub fn len(&self) -> usize {
        self.spans.read().len()
    }

    /// Check if the cache is empty
    pub fn is_empty(&self) -> bool {
        self.spans.read().is_empty()
    }
}

impl Clone for PunctuationCache {
    fn clone(&self) -> Self {
        Self {
            spans: self.spans.clone(),
            hits: self.hits.clone(),
            misses: self.misses.clone(),
        }
    }
}
