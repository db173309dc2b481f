//! In-memory session store on a sharded concurrent map.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use tokio::time::Instant;
use tracing::debug;

use tokengate_core::error::AppError;
use tokengate_core::result::AppResult;
use tokengate_core::traits::store::{RecordFields, SessionStore};

/// A stored record and its optional deadline.
#[derive(Debug, Clone)]
struct MemoryEntry {
    fields: RecordFields,
    expires_at: Option<Instant>,
}

impl MemoryEntry {
    fn is_live(&self, now: Instant) -> bool {
        self.expires_at.is_none_or(|deadline| now < deadline)
    }
}

/// In-memory session store.
///
/// Deadlines are measured on the tokio clock, so paused-time tests can
/// advance past a TTL deterministically. Expired entries are invisible to
/// every operation and purged when touched.
#[derive(Debug, Clone, Default)]
pub struct MemorySessionStore {
    /// Key → record.
    entries: Arc<DashMap<String, MemoryEntry>>,
    /// Set once the store has been closed.
    closed: Arc<AtomicBool>,
}

impl MemorySessionStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live records.
    pub fn len(&self) -> usize {
        let now = Instant::now();
        self.entries.iter().filter(|e| e.value().is_live(now)).count()
    }

    /// Returns `true` when no live record is stored.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn ensure_open(&self) -> AppResult<()> {
        if self.closed.load(Ordering::Acquire) {
            return Err(AppError::backend_unavailable("In-memory store is closed"));
        }
        Ok(())
    }

    /// Drop `key` if its deadline has passed.
    fn purge_expired(&self, key: &str, now: Instant) {
        if self
            .entries
            .remove_if(key, |_, entry| !entry.is_live(now))
            .is_some()
        {
            debug!("Purged expired record");
        }
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn exists(&self, key: &str) -> AppResult<bool> {
        self.ensure_open()?;
        let now = Instant::now();
        self.purge_expired(key, now);
        Ok(self.entries.contains_key(key))
    }

    async fn write(&self, key: &str, fields: &RecordFields) -> AppResult<()> {
        self.ensure_open()?;
        if fields.is_empty() {
            return Err(AppError::validation("Cannot write a record without fields"));
        }
        let now = Instant::now();
        match self.entries.entry(key.to_string()) {
            Entry::Occupied(mut occupied) if occupied.get().is_live(now) => {
                // Like HSET: merge fields, keep the existing deadline.
                occupied
                    .get_mut()
                    .fields
                    .extend(fields.iter().map(|(k, v)| (k.clone(), v.clone())));
            }
            Entry::Occupied(mut occupied) => {
                occupied.insert(MemoryEntry {
                    fields: fields.clone(),
                    expires_at: None,
                });
            }
            Entry::Vacant(vacant) => {
                vacant.insert(MemoryEntry {
                    fields: fields.clone(),
                    expires_at: None,
                });
            }
        }
        Ok(())
    }

    async fn set_expiry(&self, key: &str, ttl: Duration) -> AppResult<bool> {
        self.ensure_open()?;
        let now = Instant::now();
        self.purge_expired(key, now);
        match self.entries.get_mut(key) {
            Some(mut entry) => {
                entry.expires_at = Some(now + ttl);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn read(&self, key: &str) -> AppResult<Option<RecordFields>> {
        self.ensure_open()?;
        let now = Instant::now();
        let fields = self
            .entries
            .get(key)
            .filter(|entry| entry.is_live(now))
            .map(|entry| entry.fields.clone());
        if fields.is_none() {
            self.purge_expired(key, now);
        }
        Ok(fields)
    }

    async fn delete(&self, key: &str) -> AppResult<bool> {
        self.ensure_open()?;
        let now = Instant::now();
        Ok(self
            .entries
            .remove(key)
            .is_some_and(|(_, entry)| entry.is_live(now)))
    }

    async fn write_if_absent(
        &self,
        key: &str,
        fields: &RecordFields,
        ttl: Duration,
    ) -> AppResult<bool> {
        self.ensure_open()?;
        if fields.is_empty() {
            return Err(AppError::validation("Cannot write a record without fields"));
        }
        let now = Instant::now();
        let entry = MemoryEntry {
            fields: fields.clone(),
            expires_at: Some(now + ttl),
        };

        // The shard lock is held for the whole match, so the check and the
        // insert cannot interleave with another writer on the same key.
        match self.entries.entry(key.to_string()) {
            Entry::Occupied(occupied) if occupied.get().is_live(now) => Ok(false),
            Entry::Occupied(mut occupied) => {
                occupied.insert(entry);
                Ok(true)
            }
            Entry::Vacant(vacant) => {
                vacant.insert(entry);
                Ok(true)
            }
        }
    }

    async fn health_check(&self) -> AppResult<bool> {
        self.ensure_open()?;
        Ok(true)
    }

    async fn close(&self) -> AppResult<()> {
        self.closed.store(true, Ordering::Release);
        self.entries.clear();
        Ok(())
    }
}
