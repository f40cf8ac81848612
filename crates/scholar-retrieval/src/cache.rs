//! Bounded in-process caches keyed by the normalized query string.
//! Process-local; staleness between ingestion runs is acceptable.

use moka::sync::Cache;

/// Canonical cache key: trimmed and lowercased.
pub fn normalize_query(query: &str) -> String {
    query.trim().to_lowercase()
}

/// Bounded LRU-style cache over normalized query keys.
pub struct QueryCache<V: Clone + Send + Sync + 'static> {
    cache: Cache<String, V>,
}

impl<V: Clone + Send + Sync + 'static> QueryCache<V> {
    pub fn new(max_entries: u64) -> Self {
        QueryCache {
            cache: Cache::builder().max_capacity(max_entries).build(),
        }
    }

    pub fn get(&self, query: &str) -> Option<V> {
        self.cache.get(&normalize_query(query))
    }

    pub fn put(&self, query: &str, value: V) {
        self.cache.insert(normalize_query(query), value);
    }

    pub fn len(&self) -> u64 {
        self.cache.entry_count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_are_normalized() {
        let cache: QueryCache<Vec<f32>> = QueryCache::new(10);
        cache.put("  Describe Each Course  ", vec![1.0]);
        assert_eq!(cache.get("describe each course"), Some(vec![1.0]));
        assert_eq!(cache.get("different query"), None);
    }

    #[test]
    fn normalize_trims_and_lowercases() {
        assert_eq!(normalize_query("  What IS this "), "what is this");
    }
}
