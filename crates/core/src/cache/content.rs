//! Raw file text cache with TTL expiry and a size bound.

use std::collections::HashMap;
use std::time::Duration;

use tokio::time::Instant;

#[derive(Debug, Clone)]
struct ContentEntry {
    content: String,
    stored_at: Instant,
    /// Insertion order, breaks ties between equal timestamps.
    seq: u64,
}

#[derive(Debug)]
pub struct ContentCache {
    entries: HashMap<String, ContentEntry>,
    ttl: Duration,
    capacity: usize,
    next_seq: u64,
}

impl ContentCache {
    pub fn new(ttl: Duration, capacity: usize) -> Self {
        Self { entries: HashMap::new(), ttl, capacity, next_seq: 0 }
    }

    /// Cached text for `path` if it was stored less than one TTL ago.
    pub fn get_fresh(&self, path: &str, now: Instant) -> Option<String> {
        self.entries
            .get(path)
            .filter(|e| now.saturating_duration_since(e.stored_at) < self.ttl)
            .map(|e| e.content.clone())
    }

    /// Store text for `path`, then evict the oldest entries beyond capacity.
    pub fn insert(&mut self, path: &str, content: String, now: Instant) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.entries.insert(path.to_string(), ContentEntry { content, stored_at: now, seq });
        self.evict();
    }

    fn evict(&mut self) {
        if self.entries.len() <= self.capacity {
            return;
        }
        let mut by_age: Vec<(Instant, u64, String)> = self
            .entries
            .iter()
            .map(|(path, e)| (e.stored_at, e.seq, path.clone()))
            .collect();
        by_age.sort();

        let excess = self.entries.len() - self.capacity;
        for (_, _, path) in by_age.into_iter().take(excess) {
            self.entries.remove(&path);
        }
        tracing::debug!("Evicted {} content cache entries", excess);
    }

    pub fn remove(&mut self, path: &str) -> bool {
        self.entries.remove(path).is_some()
    }

    pub fn contains(&self, path: &str) -> bool {
        self.entries.contains_key(path)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Apply new limits. A smaller capacity evicts immediately.
    pub fn reconfigure(&mut self, ttl: Duration, capacity: usize) {
        self.ttl = ttl;
        self.capacity = capacity;
        self.evict();
    }
}
