//! Session store trait for pluggable key-value backends.

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;

use crate::result::AppResult;

/// Named fields of a structured record (one hash per key).
pub type RecordFields = BTreeMap<String, String>;

/// Atomic primitives over a TTL-capable key-value backend.
///
/// Implementations own no business logic. Backend and transport failures
/// must be reported as `ErrorKind::BackendUnavailable`; they are never
/// folded into `false` or `None`. No operation retries internally.
#[async_trait]
pub trait SessionStore: Send + Sync + std::fmt::Debug + 'static {
    /// Returns `true` iff a live record is currently stored under `key`.
    async fn exists(&self, key: &str) -> AppResult<bool>;

    /// Creates or overwrites the named fields of the record under `key`.
    async fn write(&self, key: &str, fields: &RecordFields) -> AppResult<()>;

    /// Attaches or refreshes a TTL. Returns `false` if the key is missing.
    async fn set_expiry(&self, key: &str, ttl: Duration) -> AppResult<bool>;

    /// Reads the full record in a single round trip. `None` if absent or expired.
    async fn read(&self, key: &str) -> AppResult<Option<RecordFields>>;

    /// Removes a record. Returns `true` if a live record was removed.
    async fn delete(&self, key: &str) -> AppResult<bool>;

    /// Writes `fields` with `ttl` only if no live record exists under `key`.
    ///
    /// The existence check, the write and the expiry form one unit: either
    /// all take effect or none do. Returns `false` if the key was taken.
    async fn write_if_absent(
        &self,
        key: &str,
        fields: &RecordFields,
        ttl: Duration,
    ) -> AppResult<bool>;

    /// Check that the backend is reachable.
    async fn health_check(&self) -> AppResult<bool>;

    /// Release the backend connection. Later calls fail as unavailable.
    async fn close(&self) -> AppResult<()>;
}
