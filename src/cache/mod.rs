pub mod entry;
pub use entry::{CacheEntry, generate_validator};

pub mod metrics;
pub use metrics::{CacheMetrics, MetricsSnapshot};

pub mod policy;
pub use policy::is_cacheable;

pub mod stats;
pub use stats::{CacheEntrySummary, CacheStats};

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;

/// In-memory edge store plus its counters.
///
/// The store is unbounded and has no background sweeper: an expired entry
/// stays in the map until a later miss overwrites it or the cache is purged.
#[derive(Debug)]
pub struct EdgeCache {
    entries: RwLock<HashMap<String, Arc<CacheEntry>>>,
    metrics: CacheMetrics,
    ttl: Duration,
}

impl EdgeCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            metrics: CacheMetrics::default(),
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn metrics(&self) -> &CacheMetrics {
        &self.metrics
    }

    /// Returns the entry for `key` if it is still fresh, recording a hit.
    /// Absent and expired entries are both recorded as a miss.
    pub fn lookup(&self, key: &str) -> Option<Arc<CacheEntry>> {
        self.lookup_at(key, Utc::now())
    }

    pub fn lookup_at(&self, key: &str, now: DateTime<Utc>) -> Option<Arc<CacheEntry>> {
        let entry = self.entries.read().get(key).cloned();

        match entry {
            Some(entry) if entry.is_fresh_at(now) => {
                self.metrics.record_hit();
                Some(entry)
            }
            Some(_) => {
                tracing::trace!("Entry for {} expired, treating as miss", key);
                self.metrics.record_miss();
                None
            }
            None => {
                self.metrics.record_miss();
                None
            }
        }
    }

    /// Raw read without freshness check or metrics.
    pub fn peek(&self, key: &str) -> Option<Arc<CacheEntry>> {
        self.entries.read().get(key).cloned()
    }

    /// Builds a fresh entry stamped with the current time and stores it,
    /// replacing whatever was under `key`.
    pub fn store(&self, key: &str, body: Bytes, content_type: &str) -> Arc<CacheEntry> {
        let entry = CacheEntry::new(
            key.to_string(),
            body,
            content_type.to_string(),
            Utc::now(),
            self.ttl,
        );
        self.put(entry)
    }

    pub fn put(&self, entry: CacheEntry) -> Arc<CacheEntry> {
        let entry = Arc::new(entry);
        self.entries
            .write()
            .insert(entry.key.clone(), Arc::clone(&entry));
        entry
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drops every entry and returns how many were removed. Counters are kept.
    pub fn purge(&self) -> usize {
        let mut entries = self.entries.write();
        let cleared = entries.len();
        entries.clear();

        tracing::info!("Cache purged: {} items cleared", cleared);
        cleared
    }

    pub fn stats(&self) -> CacheStats {
        let mut entries: Vec<Arc<CacheEntry>> = self.entries.read().values().cloned().collect();
        entries.sort_by(|a, b| a.key.cmp(&b.key));

        CacheStats::new(self.metrics.snapshot(), &entries)
    }
}
