//! Application state shared across all handlers and middleware.

use std::sync::Arc;

use tokengate_core::config::AppConfig;
use tokengate_facade::SessionFacade;

use crate::identity::IdentityProvider;
use crate::middleware::auth::AuthGate;

/// Application state containing all shared dependencies.
///
/// Passed to every Axum handler via `State<AppState>`.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Application configuration
    pub config: Arc<AppConfig>,
    /// Session facade (remote cache service or in-process)
    pub sessions: Arc<dyn SessionFacade>,
    /// Credential verification
    pub identity: Arc<dyn IdentityProvider>,
    /// Per-request session check
    pub gate: AuthGate,
}

impl AppState {
    pub fn new(
        config: AppConfig,
        sessions: Arc<dyn SessionFacade>,
        identity: Arc<dyn IdentityProvider>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            gate: AuthGate::new(Arc::clone(&sessions)),
            sessions,
            identity,
        }
    }
}
