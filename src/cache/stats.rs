use std::sync::Arc;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;

use super::{CacheEntry, metrics::MetricsSnapshot};

/// Body of `GET /__cache-stats`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheStats {
    pub requests: u64,
    pub hits: u64,
    pub misses: u64,
    pub bypasses: u64,
    pub cached_items: usize,
    pub hit_rate: String,
    pub entries: Vec<CacheEntrySummary>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheEntrySummary {
    pub url: String,
    pub size: usize,
    pub content_type: String,
    pub cached_at: String,
    pub expires_at: String,
}

impl CacheStats {
    pub fn new(metrics: MetricsSnapshot, entries: &[Arc<CacheEntry>]) -> Self {
        Self {
            requests: metrics.requests,
            hits: metrics.hits,
            misses: metrics.misses,
            bypasses: metrics.bypasses,
            cached_items: entries.len(),
            hit_rate: format_hit_rate(metrics.hit_rate()),
            entries: entries
                .iter()
                .map(|entry| CacheEntrySummary::from(&**entry))
                .collect(),
        }
    }
}

impl From<&CacheEntry> for CacheEntrySummary {
    fn from(entry: &CacheEntry) -> Self {
        Self {
            url: entry.key.clone(),
            size: entry.size(),
            content_type: entry.content_type.clone(),
            cached_at: iso8601(entry.cached_at),
            expires_at: iso8601(entry.expires_at),
        }
    }
}

/// Ratio rendered as a percentage with two decimals, e.g. `"66.67%"`.
pub fn format_hit_rate(ratio: f64) -> String {
    format!("{:.2}%", ratio * 100.0)
}

fn iso8601(timestamp: DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Millis, true)
}
