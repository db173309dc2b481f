//! Application builder: wires router, middleware and state into an Axum app.

use std::future::Future;
use std::sync::Arc;

use axum::Router;
use tracing::info;

use tokengate_core::config::{AppConfig, SessionBackend};
use tokengate_core::error::{AppError, ErrorKind};
use tokengate_core::result::AppResult;
use tokengate_core::traits::store::SessionStore;
use tokengate_facade::{CacheFacade, RemoteCacheFacade, SessionFacade};
use tokengate_session::SessionCache;
use tokengate_store::StoreManager;

use crate::identity::HttpIdentityProvider;
use crate::router::build_router;
use crate::state::AppState;

/// Builds the complete Axum application.
pub fn build_app(state: AppState) -> Router {
    build_router(state)
}

/// Runs the gateway until `shutdown` resolves.
///
/// In embedded mode the session store is opened here and closed once the
/// server has drained.
pub async fn run_gateway<F>(config: AppConfig, shutdown: F) -> AppResult<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    info!(
        session_backend = %config.gateway.session_backend,
        "Starting TokenGate gateway"
    );

    let (sessions, store): (Arc<dyn SessionFacade>, Option<StoreManager>) =
        match config.gateway.session_backend {
            SessionBackend::Remote => {
                info!(url = %config.gateway.cache_service_url, "Using remote cache service");
                let remote = RemoteCacheFacade::new(
                    config.gateway.cache_service_url.clone(),
                    config.gateway.upstream_timeout(),
                )?;
                (Arc::new(remote), None)
            }
            SessionBackend::Embedded => {
                info!(provider = %config.store.provider, "Opening embedded session store");
                let store = StoreManager::connect(&config.store).await?;
                let cache = SessionCache::new(Arc::new(store.clone()), &config.session);
                (Arc::new(CacheFacade::new(Arc::new(cache))), Some(store))
            }
        };

    let identity = Arc::new(HttpIdentityProvider::new(
        &config.gateway.identity_url,
        config.gateway.upstream_timeout(),
    )?);

    let addr = config.server.bind_address();
    let app = build_app(AppState::new(config, sessions, identity));

    let listener = tokio::net::TcpListener::bind(&addr).await.map_err(|e| {
        AppError::with_source(ErrorKind::Internal, format!("Failed to bind {addr}"), e)
    })?;
    info!(address = %addr, "Gateway listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Internal, "Gateway server error", e))?;

    if let Some(store) = store {
        store.close().await?;
    }
    info!("Gateway stopped");
    Ok(())
}
