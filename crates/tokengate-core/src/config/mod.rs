//! Application configuration schemas.
//!
//! All configuration structs are deserialized from TOML files via the
//! `config` crate. Each sub-module represents a logical configuration
//! section. Every field has a default, so an empty configuration is valid.

pub mod app;
pub mod gateway;
pub mod logging;
pub mod session;
pub mod store;

use serde::{Deserialize, Serialize};

use self::app::ServerConfig;
use self::gateway::GatewayConfig;
use self::logging::LoggingConfig;
use self::session::SessionConfig;
use self::store::StoreConfig;

use crate::error::AppError;

pub use self::gateway::SessionBackend;
pub use self::store::RedisStoreConfig;

/// Root application configuration.
///
/// This struct is the top-level deserialization target for the merged
/// TOML configuration files (default.toml + environment overlay).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// HTTP listener settings.
    #[serde(default)]
    pub server: ServerConfig,
    /// Session store backend settings.
    #[serde(default)]
    pub store: StoreConfig,
    /// Session lifecycle settings.
    #[serde(default)]
    pub session: SessionConfig,
    /// Gateway upstream settings.
    #[serde(default)]
    pub gateway: GatewayConfig,
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from TOML files.
    ///
    /// Merges the default configuration with an environment-specific overlay
    /// and environment variables prefixed with `TOKENGATE__`.
    pub fn load(env: &str) -> Result<Self, AppError> {
        Self::load_from("config", env)
    }

    /// Load configuration from an explicit directory.
    pub fn load_from(dir: &str, env: &str) -> Result<Self, AppError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name(&format!("{dir}/default")).required(false))
            .add_source(config::File::with_name(&format!("{dir}/{env}")).required(false))
            .add_source(
                config::Environment::with_prefix("TOKENGATE")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| AppError::configuration(format!("Failed to build config: {e}")))?;

        config
            .try_deserialize()
            .map_err(|e| AppError::configuration(format!("Failed to deserialize config: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_files_yield_defaults() {
        let config = AppConfig::load_from("does-not-exist", "test").unwrap();
        assert_eq!(config.session.ttl_seconds, 86_400);
        assert_eq!(config.store.provider, "memory");
        assert_eq!(config.gateway.session_backend, SessionBackend::Remote);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let toml = r#"
            [store]
            provider = "redis"

            [store.redis]
            url = "redis://cache:6379"

            [session]
            ttl_seconds = 60
        "#;
        let config: AppConfig = config::Config::builder()
            .add_source(config::File::from_str(toml, config::FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(config.store.provider, "redis");
        assert_eq!(config.store.redis.url, "redis://cache:6379");
        assert_eq!(config.store.redis.key_prefix, "tokengate:");
        assert_eq!(config.session.ttl_seconds, 60);
        assert_eq!(config.server.port, 8080);
    }
}
