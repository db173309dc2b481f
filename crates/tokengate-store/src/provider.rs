//! Store manager that dispatches to the configured backend.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{info, warn};

use tokengate_core::config::store::StoreConfig;
use tokengate_core::error::AppError;
use tokengate_core::result::AppResult;
use tokengate_core::traits::store::{RecordFields, SessionStore};

/// Store manager that wraps the configured session store backend.
///
/// Every call is bounded by the configured operation timeout; a call that
/// does not finish in time is reported as `BackendUnavailable`, never as
/// an absent record.
#[derive(Debug, Clone)]
pub struct StoreManager {
    /// The inner store backend.
    inner: Arc<dyn SessionStore>,
    /// Upper bound for each backend call.
    operation_timeout: Duration,
}

impl StoreManager {
    /// Open the backend selected by configuration.
    pub async fn connect(config: &StoreConfig) -> AppResult<Self> {
        let inner: Arc<dyn SessionStore> = match config.provider.as_str() {
            #[cfg(feature = "redis-backend")]
            "redis" => {
                info!("Initializing Redis session store");
                let client =
                    crate::redis::RedisClient::connect(&config.redis, config.connect_timeout())
                        .await?;
                Arc::new(crate::redis::RedisSessionStore::new(client))
            }
            #[cfg(feature = "memory")]
            "memory" => {
                info!("Initializing in-memory session store");
                Arc::new(crate::memory::MemorySessionStore::new())
            }
            other => {
                return Err(AppError::configuration(format!(
                    "Unknown store provider: '{other}'. Supported: memory, redis"
                )));
            }
        };

        Ok(Self {
            inner,
            operation_timeout: config.operation_timeout(),
        })
    }

    /// Create a store manager from an existing backend (for testing).
    pub fn from_store(store: Arc<dyn SessionStore>, operation_timeout: Duration) -> Self {
        Self {
            inner: store,
            operation_timeout,
        }
    }

    async fn bounded<T>(
        &self,
        operation: &'static str,
        call: impl Future<Output = AppResult<T>>,
    ) -> AppResult<T> {
        match tokio::time::timeout(self.operation_timeout, call).await {
            Ok(result) => result,
            Err(_) => {
                warn!(
                    operation,
                    timeout_ms = self.operation_timeout.as_millis() as u64,
                    "Session store call timed out"
                );
                Err(AppError::backend_unavailable(format!(
                    "Session store {operation} timed out"
                )))
            }
        }
    }
}

#[async_trait]
impl SessionStore for StoreManager {
    async fn exists(&self, key: &str) -> AppResult<bool> {
        self.bounded("exists", self.inner.exists(key)).await
    }

    async fn write(&self, key: &str, fields: &RecordFields) -> AppResult<()> {
        self.bounded("write", self.inner.write(key, fields)).await
    }

    async fn set_expiry(&self, key: &str, ttl: Duration) -> AppResult<bool> {
        self.bounded("set_expiry", self.inner.set_expiry(key, ttl))
            .await
    }

    async fn read(&self, key: &str) -> AppResult<Option<RecordFields>> {
        self.bounded("read", self.inner.read(key)).await
    }

    async fn delete(&self, key: &str) -> AppResult<bool> {
        self.bounded("delete", self.inner.delete(key)).await
    }

    async fn write_if_absent(
        &self,
        key: &str,
        fields: &RecordFields,
        ttl: Duration,
    ) -> AppResult<bool> {
        self.bounded(
            "write_if_absent",
            self.inner.write_if_absent(key, fields, ttl),
        )
        .await
    }

    async fn health_check(&self) -> AppResult<bool> {
        self.bounded("health_check", self.inner.health_check())
            .await
    }

    async fn close(&self) -> AppResult<()> {
        self.inner.close().await
    }
}
