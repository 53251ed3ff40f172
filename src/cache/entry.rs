use std::time::Duration;

use bytes::Bytes;
use chrono::{DateTime, TimeDelta, Utc};
use md5::{Digest, Md5};

/// A stored representation. Never mutated after insertion: a refresh replaces
/// the whole entry under the same key.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub key: String,
    pub body: Bytes,
    pub content_type: String,
    pub validator: String,
    pub cached_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl CacheEntry {
    pub fn new(
        key: String,
        body: Bytes,
        content_type: String,
        cached_at: DateTime<Utc>,
        ttl: Duration,
    ) -> Self {
        let validator = generate_validator(&body);
        let expires_at = TimeDelta::from_std(ttl)
            .ok()
            .and_then(|ttl| cached_at.checked_add_signed(ttl))
            .unwrap_or(DateTime::<Utc>::MAX_UTC);

        Self {
            key,
            body,
            content_type,
            validator,
            cached_at,
            expires_at,
        }
    }

    pub fn is_fresh_at(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }

    pub fn size(&self) -> usize {
        self.body.len()
    }
}

/// Lowercase hex MD5 of the body, used as the ETag.
pub fn generate_validator(body: &[u8]) -> String {
    let digest = Md5::digest(body);
    format!("{digest:x}")
}
