//! TTL-keyed blob store backing tool calls.
//!
//! Entries expire lazily: an expired entry is purged as a side effect of the
//! first read past its deadline, there is no background sweep. Concurrent
//! readers and writers from independent turns are supported; a write race on
//! the same key resolves last-writer-wins.

use dashmap::DashMap;
use sha2::{Digest, Sha256};
use std::time::{Duration, Instant};
use tracing::debug;

struct CacheEntry {
    content: String,
    expires_at: Instant,
}

/// In-memory response cache shared across turns.
#[derive(Default)]
pub struct ResponseCache {
    entries: DashMap<String, CacheEntry>,
}

impl ResponseCache {
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }

    /// Look up a key. An entry whose deadline has passed is treated as
    /// absent and removed before returning.
    pub fn get(&self, key: &str) -> Option<String> {
        let hit = {
            let entry = self.entries.get(key)?;
            if Instant::now() < entry.expires_at {
                Some(entry.content.clone())
            } else {
                None
            }
        };
        if hit.is_none() {
            debug!(target: "cache", key = %key, "Purging expired entry");
            self.entries.remove(key);
        }
        hit
    }

    pub fn put(&self, key: &str, content: &str, ttl: Duration) {
        self.entries.insert(
            key.to_string(),
            CacheEntry {
                content: content.to_string(),
                expires_at: Instant::now() + ttl,
            },
        );
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Derive a stable cache key from a tool name and its query.
///
/// The query is lowercased and whitespace-normalized first so repeated
/// spellings of the same lookup share an entry.
pub fn cache_key(tool: &str, query: &str) -> String {
    let normalized = query
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase();

    let mut hasher = Sha256::new();
    hasher.update(tool.as_bytes());
    hasher.update(b":");
    hasher.update(normalized.as_bytes());
    hex::encode(hasher.finalize())
}
