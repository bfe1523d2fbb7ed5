//! Parsed frontmatter cache.
//!
//! Entries expire after a TTL. Expired entries are purged lazily whenever a
//! new document is parsed; there is no background sweep.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;

use crate::frontmatter::{self, Frontmatter};

#[derive(Debug)]
struct DocumentEntry {
    /// YAML text the document was parsed from.
    source: String,
    document: Arc<Frontmatter>,
    parsed_at: Instant,
}

/// Result of [`DocumentCache::extract`].
#[derive(Debug, Clone)]
pub enum Extracted {
    /// No delimited frontmatter block.
    Missing,
    /// A block exists but its YAML does not parse.
    Invalid,
    Cached(Arc<Frontmatter>),
    Parsed(Arc<Frontmatter>),
}

impl Extracted {
    pub fn document(&self) -> Option<Arc<Frontmatter>> {
        match self {
            Self::Cached(doc) | Self::Parsed(doc) => Some(doc.clone()),
            Self::Missing | Self::Invalid => None,
        }
    }

    pub fn is_invalid(&self) -> bool {
        matches!(self, Self::Invalid)
    }
}

#[derive(Debug)]
pub struct DocumentCache {
    entries: HashMap<String, DocumentEntry>,
    ttl: Duration,
}

impl DocumentCache {
    pub fn new(ttl: Duration) -> Self {
        Self { entries: HashMap::new(), ttl }
    }

    /// Extract the frontmatter of `content`, caching the parse under `key`.
    ///
    /// A cached entry is only reused while fresh and while the YAML block
    /// is unchanged. Content without a delimited block yields no document
    /// and is not an error. Parse failures are logged.
    pub fn extract(&mut self, content: &str, key: &str, now: Instant) -> Extracted {
        let Some((yaml, _)) = frontmatter::split(content) else {
            return Extracted::Missing;
        };

        if let Some(entry) = self.entries.get(key)
            && entry.source == yaml
            && now.saturating_duration_since(entry.parsed_at) < self.ttl
        {
            return Extracted::Cached(entry.document.clone());
        }

        let document = match frontmatter::parse_yaml(yaml) {
            Ok(fm) => Arc::new(fm),
            Err(e) => {
                tracing::warn!("Failed to parse frontmatter for {}: {}", key, e);
                return Extracted::Invalid;
            }
        };

        self.entries.insert(
            key.to_string(),
            DocumentEntry { source: yaml.to_string(), document: document.clone(), parsed_at: now },
        );
        self.purge_expired(now);

        Extracted::Parsed(document)
    }

    fn purge_expired(&mut self, now: Instant) {
        let ttl = self.ttl;
        self.entries.retain(|_, e| now.saturating_duration_since(e.parsed_at) <= ttl);
    }

    pub fn remove(&mut self, key: &str) -> bool {
        self.entries.remove(key).is_some()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
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

    pub fn set_ttl(&mut self, ttl: Duration) {
        self.ttl = ttl;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOC: &str = "---\ntitle: One\n---\nbody";

    #[test]
    fn test_second_extract_is_served_from_cache() {
        let mut cache = DocumentCache::new(Duration::from_secs(300));
        let now = Instant::now();

        let first = cache.extract(DOC, "a.md", now);
        let second = cache.extract(DOC, "a.md", now + Duration::from_secs(10));

        assert!(matches!(first, Extracted::Parsed(_)));
        assert!(matches!(second, Extracted::Cached(_)));
        assert_eq!(second.document().unwrap().get_str("title").as_deref(), Some("One"));
    }

    #[test]
    fn test_changed_yaml_is_reparsed() {
        let mut cache = DocumentCache::new(Duration::from_secs(300));
        let now = Instant::now();
        cache.extract(DOC, "a.md", now);

        let changed = cache.extract("---\ntitle: Two\n---\n", "a.md", now);
        assert!(matches!(changed, Extracted::Parsed(_)));
        assert_eq!(changed.document().unwrap().get_str("title").as_deref(), Some("Two"));
    }

    #[test]
    fn test_expired_entries_purged_on_next_parse() {
        let mut cache = DocumentCache::new(Duration::from_secs(300));
        let t0 = Instant::now();
        cache.extract(DOC, "a.md", t0);

        let later = t0 + Duration::from_secs(301);
        // Touching nothing leaves the stale entry in place.
        assert!(cache.contains("a.md"));
        cache.extract("---\nx: 1\n---\n", "b.md", later);
        assert!(!cache.contains("a.md"));
        assert!(cache.contains("b.md"));
    }

    #[test]
    fn test_missing_or_invalid_frontmatter() {
        let mut cache = DocumentCache::new(Duration::from_secs(300));
        let now = Instant::now();

        assert!(matches!(cache.extract("# just text", "a.md", now), Extracted::Missing));

        let bad = cache.extract("---\nkey: [unclosed\n---\n", "b.md", now);
        assert!(bad.is_invalid());
        assert!(bad.document().is_none());
        assert!(cache.is_empty());
    }
}
