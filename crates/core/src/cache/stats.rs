//! Cache statistics.

use serde::Serialize;

/// Running counters kept by the cache manager.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct Counters {
    pub cache_hits: u64,
    pub cache_misses: u64,
    pub file_reads: u64,
    pub yaml_parses: u64,
}

/// Point-in-time statistics snapshot.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheStats {
    pub cache_hits: u64,
    pub cache_misses: u64,
    pub file_reads: u64,
    pub yaml_parses: u64,
    /// `hits / (hits + misses)`, zero before any lookup.
    pub hit_ratio: f64,
    pub tasks_cached: usize,
    pub notes_cached: usize,
    /// Entries in the content cache.
    pub files_cached: usize,
}

impl CacheStats {
    pub(crate) fn from_counters(
        counters: Counters,
        tasks_cached: usize,
        notes_cached: usize,
        files_cached: usize,
    ) -> Self {
        let total = counters.cache_hits + counters.cache_misses;
        let hit_ratio =
            if total > 0 { counters.cache_hits as f64 / total as f64 } else { 0.0 };
        Self {
            cache_hits: counters.cache_hits,
            cache_misses: counters.cache_misses,
            file_reads: counters.file_reads,
            yaml_parses: counters.yaml_parses,
            hit_ratio,
            tasks_cached,
            notes_cached,
            files_cached,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hit_ratio() {
        let empty = CacheStats::from_counters(Counters::default(), 0, 0, 0);
        assert_eq!(empty.hit_ratio, 0.0);

        let counters = Counters { cache_hits: 3, cache_misses: 1, ..Default::default() };
        let stats = CacheStats::from_counters(counters, 1, 2, 3);
        assert_eq!(stats.hit_ratio, 0.75);
    }

    #[test]
    fn test_serializes_camel_case() {
        let stats = CacheStats::from_counters(Counters::default(), 1, 0, 1);
        let json = serde_json::to_value(&stats).unwrap();
        assert_eq!(json["tasksCached"], 1);
        assert!(json.get("hitRatio").is_some());
    }
}
