//! Gateway upstream configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Where the gateway resolves sessions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionBackend {
    /// Call a separately deployed cache service over RPC.
    #[default]
    Remote,
    /// Open the session store in-process.
    Embedded,
}

impl std::fmt::Display for SessionBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionBackend::Remote => write!(f, "remote"),
            SessionBackend::Embedded => write!(f, "embedded"),
        }
    }
}

/// Gateway configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// Session resolution mode.
    #[serde(default)]
    pub session_backend: SessionBackend,
    /// Base URL of the cache service (remote mode).
    #[serde(default = "default_cache_service_url")]
    pub cache_service_url: String,
    /// Base URL of the identity service.
    #[serde(default = "default_identity_url")]
    pub identity_url: String,
    /// Upper bound for each upstream call, in milliseconds.
    #[serde(default = "default_upstream_timeout")]
    pub upstream_timeout_ms: u64,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            session_backend: SessionBackend::default(),
            cache_service_url: default_cache_service_url(),
            identity_url: default_identity_url(),
            upstream_timeout_ms: default_upstream_timeout(),
        }
    }
}

impl GatewayConfig {
    /// Upstream timeout as a `Duration`.
    pub fn upstream_timeout(&self) -> Duration {
        Duration::from_millis(self.upstream_timeout_ms)
    }
}

fn default_cache_service_url() -> String {
    "http://localhost:50053".to_string()
}

fn default_identity_url() -> String {
    "http://localhost:50051".to_string()
}

fn default_upstream_timeout() -> u64 {
    2000
}
