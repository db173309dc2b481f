//! Session lifecycle manager: write-once insert, lookup and delete.
//!
//! A token is either absent or active. `insert` is the only transition out
//! of absent; `delete` or the store's native expiry are the only ways back.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use tokengate_core::config::session::SessionConfig;
use tokengate_core::error::AppError;
use tokengate_core::result::AppResult;
use tokengate_core::traits::store::SessionStore;
use tokengate_store::keys;

use crate::record::{SessionIdentity, SessionRecord, validate_token};

/// Owns the token → identity mapping in the session store.
///
/// No other component writes session keys.
#[derive(Debug, Clone)]
pub struct SessionCache {
    /// Backend primitives.
    store: Arc<dyn SessionStore>,
    /// Fixed session lifetime from insertion.
    ttl: Duration,
}

impl SessionCache {
    /// Creates a session cache over `store`.
    pub fn new(store: Arc<dyn SessionStore>, config: &SessionConfig) -> Self {
        Self {
            store,
            ttl: config.ttl(),
        }
    }

    /// Fixed session lifetime.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Registers a new session.
    ///
    /// The record and its expiry are written by one conditional primitive,
    /// so concurrent inserts of the same token see exactly one winner and
    /// no record is ever left without a TTL.
    ///
    /// # Errors
    ///
    /// `Conflict` if the token is already active, `Validation` for a malformed
    /// token, `BackendUnavailable` if the store cannot be reached.
    pub async fn insert(&self, token: &str, user_id: i64, username: &str) -> AppResult<()> {
        let record = SessionRecord::new(token, user_id, username)?;
        let key = keys::session_by_token(&record.token);

        let written = self
            .store
            .write_if_absent(&key, &record.identity.to_fields(), self.ttl)
            .await?;

        if !written {
            warn!(user_id, "Session insert refused: token already active");
            return Err(AppError::conflict("Token is already bound to an active session"));
        }

        info!(user_id, ttl_seconds = self.ttl.as_secs(), "Session created");
        Ok(())
    }

    /// Resolves a token to its identity.
    ///
    /// Never-inserted, deleted, and expired tokens all return `Ok(None)`.
    /// The read is a single round trip and does not extend the TTL.
    pub async fn lookup(&self, token: &str) -> AppResult<Option<SessionIdentity>> {
        validate_token(token)?;
        let key = keys::session_by_token(token);

        match self.store.read(&key).await? {
            Some(fields) => {
                let identity = SessionIdentity::from_fields(&fields)?;
                debug!(user_id = identity.user_id, "Session resolved");
                Ok(Some(identity))
            }
            None => {
                debug!("Session lookup missed");
                Ok(None)
            }
        }
    }

    /// Removes a session. Deleting an absent token succeeds.
    ///
    /// Returns whether an active session was removed.
    pub async fn delete(&self, token: &str) -> AppResult<bool> {
        validate_token(token)?;
        let key = keys::session_by_token(token);

        let removed = self.store.delete(&key).await?;
        if removed {
            info!("Session deleted");
        } else {
            debug!("Session delete on absent token");
        }
        Ok(removed)
    }

    /// Check that the backing store is reachable.
    pub async fn health_check(&self) -> AppResult<bool> {
        self.store.health_check().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokengate_core::error::ErrorKind;
    use tokengate_store::memory::MemorySessionStore;

    fn make_cache(ttl_seconds: u64) -> (SessionCache, MemorySessionStore) {
        let store = MemorySessionStore::new();
        let config = SessionConfig { ttl_seconds };
        (SessionCache::new(Arc::new(store.clone()), &config), store)
    }

    fn alice() -> SessionIdentity {
        SessionIdentity {
            user_id: 42,
            username: "alice".to_string(),
        }
    }

    #[tokio::test]
    async fn test_insert_then_lookup() {
        let (cache, _) = make_cache(86_400);
        cache.insert("abc", 42, "alice").await.unwrap();
        assert_eq!(cache.lookup("abc").await.unwrap(), Some(alice()));
    }

    #[tokio::test]
    async fn test_second_insert_conflicts_and_keeps_first() {
        let (cache, _) = make_cache(86_400);
        cache.insert("abc", 42, "alice").await.unwrap();

        let err = cache.insert("abc", 7, "mallory").await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Conflict);
        assert_eq!(cache.lookup("abc").await.unwrap(), Some(alice()));
    }

    #[tokio::test]
    async fn test_delete_then_lookup_is_absent() {
        let (cache, _) = make_cache(86_400);
        cache.insert("abc", 42, "alice").await.unwrap();
        assert!(cache.delete("abc").await.unwrap());
        assert_eq!(cache.lookup("abc").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_delete_absent_is_success() {
        let (cache, _) = make_cache(86_400);
        assert!(!cache.delete("never-inserted").await.unwrap());
    }

    #[tokio::test]
    async fn test_lookup_never_inserted() {
        let (cache, _) = make_cache(86_400);
        assert_eq!(cache.lookup("xyz").await.unwrap(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_lookup_after_ttl_is_absent() {
        let (cache, _) = make_cache(86_400);
        cache.insert("abc", 42, "alice").await.unwrap();

        tokio::time::advance(Duration::from_secs(86_399)).await;
        assert_eq!(cache.lookup("abc").await.unwrap(), Some(alice()));

        tokio::time::advance(Duration::from_secs(1)).await;
        assert_eq!(cache.lookup("abc").await.unwrap(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_lookup_does_not_slide_expiry() {
        let (cache, _) = make_cache(100);
        cache.insert("abc", 42, "alice").await.unwrap();

        for _ in 0..9 {
            tokio::time::advance(Duration::from_secs(10)).await;
            assert!(cache.lookup("abc").await.unwrap().is_some());
        }
        tokio::time::advance(Duration::from_secs(10)).await;
        assert_eq!(cache.lookup("abc").await.unwrap(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_token_reusable_after_expiry() {
        let (cache, _) = make_cache(60);
        cache.insert("abc", 42, "alice").await.unwrap();
        tokio::time::advance(Duration::from_secs(61)).await;
        cache.insert("abc", 43, "bob").await.unwrap();
        assert_eq!(cache.lookup("abc").await.unwrap().unwrap().user_id, 43);
    }

    #[tokio::test]
    async fn test_concurrent_inserts_have_one_winner() {
        let (cache, _) = make_cache(86_400);

        let attempts = (0..16).map(|i| {
            let cache = cache.clone();
            tokio::spawn(async move { cache.insert("race", i, &format!("user{i}")).await })
        });
        let results = futures::future::join_all(attempts).await;

        let mut winners = 0;
        let mut conflicts = 0;
        for result in results {
            match result.unwrap() {
                Ok(()) => winners += 1,
                Err(e) => {
                    assert_eq!(e.kind, ErrorKind::Conflict);
                    conflicts += 1;
                }
            }
        }
        assert_eq!(winners, 1);
        assert_eq!(conflicts, 15);
    }

    #[tokio::test]
    async fn test_invalid_tokens_rejected() {
        let (cache, store) = make_cache(86_400);
        assert_eq!(
            cache.insert("", 1, "alice").await.unwrap_err().kind,
            ErrorKind::Validation
        );
        assert_eq!(
            cache.lookup("has space").await.unwrap_err().kind,
            ErrorKind::Validation
        );
        assert_eq!(
            cache.delete("").await.unwrap_err().kind,
            ErrorKind::Validation
        );
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_backend_failure_is_not_absent() {
        let (cache, store) = make_cache(86_400);
        cache.insert("abc", 42, "alice").await.unwrap();
        store.close().await.unwrap();

        let err = cache.lookup("abc").await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::BackendUnavailable);
        let err = cache.insert("def", 1, "bob").await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::BackendUnavailable);
    }

    #[tokio::test]
    async fn test_corrupt_record_is_internal_error() {
        let (cache, store) = make_cache(86_400);
        let mut fields = tokengate_core::traits::store::RecordFields::new();
        fields.insert("user_id".to_string(), "not-a-number".to_string());
        fields.insert("username".to_string(), "ghost".to_string());
        store.write("session:bad", &fields).await.unwrap();

        let err = cache.lookup("bad").await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Internal);
    }
}
