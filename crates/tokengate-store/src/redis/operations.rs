//! Redis session store implementation.
//!
//! Records are Redis hashes; expiry is the key's native TTL.

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use redis::{AsyncCommands, Script};
use tracing::debug;

use tokengate_core::error::{AppError, ErrorKind};
use tokengate_core::result::AppResult;
use tokengate_core::traits::store::{RecordFields, SessionStore};

use super::client::RedisClient;

/// Lua script for the atomic conditional write.
///
/// KEYS[1] = record key
/// ARGV[1] = ttl in milliseconds
/// ARGV[2..] = field, value, field, value, ...
///
/// Returns:
///   1 = written with expiry
///   0 = key already present, nothing changed
const WRITE_IF_ABSENT_SCRIPT: &str = r#"
    if redis.call('EXISTS', KEYS[1]) == 1 then
        return 0
    end
    redis.call('HSET', KEYS[1], unpack(ARGV, 2))
    redis.call('PEXPIRE', KEYS[1], ARGV[1])
    return 1
"#;

/// Redis-backed session store.
#[derive(Debug, Clone)]
pub struct RedisSessionStore {
    /// Redis client.
    client: RedisClient,
    /// Conditional write script (cached by SHA on the server).
    write_if_absent: Script,
}

impl RedisSessionStore {
    /// Create a new Redis session store.
    pub fn new(client: RedisClient) -> Self {
        Self {
            client,
            write_if_absent: Script::new(WRITE_IF_ABSENT_SCRIPT),
        }
    }

    /// Map a Redis error to an AppError.
    ///
    /// Transport failures become `BackendUnavailable`; anything the server
    /// answered (wrong type, script error) is `Internal`.
    fn map_err(e: redis::RedisError) -> AppError {
        let kind = if e.is_io_error()
            || e.is_timeout()
            || e.is_connection_dropped()
            || e.is_connection_refusal()
        {
            ErrorKind::BackendUnavailable
        } else {
            ErrorKind::Internal
        };
        AppError::with_source(kind, format!("Redis error: {e}"), e)
    }
}

#[async_trait]
impl SessionStore for RedisSessionStore {
    async fn exists(&self, key: &str) -> AppResult<bool> {
        let full_key = self.client.prefixed_key(key);
        let mut conn = self.client.conn_mut()?;
        let result: bool = conn.exists(&full_key).await.map_err(Self::map_err)?;
        Ok(result)
    }

    async fn write(&self, key: &str, fields: &RecordFields) -> AppResult<()> {
        if fields.is_empty() {
            return Err(AppError::validation("Cannot write a record without fields"));
        }
        let full_key = self.client.prefixed_key(key);
        let mut conn = self.client.conn_mut()?;

        let mut cmd = redis::cmd("HSET");
        cmd.arg(&full_key);
        for (field, value) in fields {
            cmd.arg(field).arg(value);
        }
        let _: i64 = cmd.query_async(&mut conn).await.map_err(Self::map_err)?;
        Ok(())
    }

    async fn set_expiry(&self, key: &str, ttl: Duration) -> AppResult<bool> {
        let full_key = self.client.prefixed_key(key);
        let mut conn = self.client.conn_mut()?;
        let result: bool = conn
            .pexpire(&full_key, ttl.as_millis() as i64)
            .await
            .map_err(Self::map_err)?;
        Ok(result)
    }

    async fn read(&self, key: &str) -> AppResult<Option<RecordFields>> {
        let full_key = self.client.prefixed_key(key);
        let mut conn = self.client.conn_mut()?;

        // HGETALL answers an empty hash for a missing or expired key, so a
        // single round trip both checks existence and fetches.
        let fields: BTreeMap<String, String> =
            conn.hgetall(&full_key).await.map_err(Self::map_err)?;

        if fields.is_empty() {
            Ok(None)
        } else {
            Ok(Some(fields))
        }
    }

    async fn delete(&self, key: &str) -> AppResult<bool> {
        let full_key = self.client.prefixed_key(key);
        let mut conn = self.client.conn_mut()?;
        let removed: i64 = conn.del(&full_key).await.map_err(Self::map_err)?;
        Ok(removed > 0)
    }

    async fn write_if_absent(
        &self,
        key: &str,
        fields: &RecordFields,
        ttl: Duration,
    ) -> AppResult<bool> {
        if fields.is_empty() {
            return Err(AppError::validation("Cannot write a record without fields"));
        }
        let full_key = self.client.prefixed_key(key);
        let mut conn = self.client.conn_mut()?;

        let mut invocation = self.write_if_absent.key(&full_key);
        invocation.arg(ttl.as_millis() as u64);
        for (field, value) in fields {
            invocation.arg(field).arg(value);
        }

        let written: i64 = invocation
            .invoke_async(&mut conn)
            .await
            .map_err(Self::map_err)?;

        debug!(written = written == 1, "Conditional session write");
        Ok(written == 1)
    }

    async fn health_check(&self) -> AppResult<bool> {
        let mut conn = self.client.conn_mut()?;
        let pong: String = redis::cmd("PING")
            .query_async(&mut conn)
            .await
            .map_err(Self::map_err)?;
        Ok(pong == "PONG")
    }

    async fn close(&self) -> AppResult<()> {
        self.client.close();
        Ok(())
    }
}
