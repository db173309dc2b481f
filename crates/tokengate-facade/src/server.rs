//! HTTP/JSON transport for the session facade.

use std::future::Future;
use std::sync::Arc;

use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tower_http::trace::TraceLayer;
use tracing::info;

use tokengate_core::config::AppConfig;
use tokengate_core::error::{AppError, ErrorKind};
use tokengate_core::result::AppResult;
use tokengate_core::traits::store::SessionStore;
use tokengate_session::SessionCache;
use tokengate_store::StoreManager;

use crate::dto::{
    DeleteRequest, DeleteResponse, FacadeError, FacadeErrorCode, FacadeOutcome, InsertRequest,
    InsertResponse, LookupRequest, LookupResponse,
};
use crate::service::{CacheFacade, SessionFacade};

/// Route paths, shared with the client.
pub mod routes {
    pub const INSERT: &str = "/rpc/v1/sessions/insert";
    pub const LOOKUP: &str = "/rpc/v1/sessions/lookup";
    pub const DELETE: &str = "/rpc/v1/sessions/delete";
    pub const HEALTH: &str = "/health";
}

/// Health probe body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// HTTP status for a response. The body is authoritative; the status
/// mirrors it for intermediaries.
pub fn status_for(outcome: &impl FacadeOutcome) -> StatusCode {
    match outcome.code() {
        None => StatusCode::OK,
        Some(FacadeErrorCode::Conflict) => StatusCode::CONFLICT,
        Some(FacadeErrorCode::NotFound) => StatusCode::NOT_FOUND,
        Some(FacadeErrorCode::BackendUnavailable) => StatusCode::SERVICE_UNAVAILABLE,
        Some(FacadeErrorCode::InvalidInput) => StatusCode::BAD_REQUEST,
        Some(FacadeErrorCode::Internal) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn respond<T: FacadeOutcome + Serialize>(outcome: T) -> Response {
    (status_for(&outcome), Json(outcome)).into_response()
}

fn rejected(rejection: &JsonRejection) -> FacadeError {
    FacadeError::invalid_input(rejection.body_text())
}

/// Build the RPC router over an in-process facade.
pub fn rpc_router(facade: Arc<CacheFacade>) -> Router {
    Router::new()
        .route(routes::INSERT, post(insert))
        .route(routes::LOOKUP, post(lookup))
        .route(routes::DELETE, post(delete))
        .route(routes::HEALTH, get(health))
        .layer(TraceLayer::new_for_http())
        .with_state(facade)
}

/// Runs the cache service until `shutdown` resolves, then closes the store.
///
/// The store is opened (and pinged) before the listener is bound, so an
/// unreachable backend fails startup.
pub async fn run_cache_service<F>(config: AppConfig, shutdown: F) -> AppResult<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    info!(provider = %config.store.provider, "Starting TokenGate cache service");

    let store = StoreManager::connect(&config.store).await?;
    let cache = SessionCache::new(Arc::new(store.clone()), &config.session);
    info!(ttl_seconds = cache.ttl().as_secs(), "Session cache ready");
    let app = rpc_router(Arc::new(CacheFacade::new(Arc::new(cache))));

    let addr = config.server.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr).await.map_err(|e| {
        AppError::with_source(ErrorKind::Internal, format!("Failed to bind {addr}"), e)
    })?;
    info!(address = %addr, "Cache service listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Internal, "Cache service error", e))?;

    store.close().await?;
    info!("Cache service stopped");
    Ok(())
}

/// POST /rpc/v1/sessions/insert
async fn insert(
    State(facade): State<Arc<CacheFacade>>,
    payload: Result<Json<InsertRequest>, JsonRejection>,
) -> Response {
    let outcome = match payload {
        Ok(Json(request)) => match facade.insert(request).await {
            Ok(response) => response,
            Err(e) => InsertResponse::failed(FacadeError::from(&e)),
        },
        Err(rejection) => InsertResponse::failed(rejected(&rejection)),
    };
    respond(outcome)
}

/// POST /rpc/v1/sessions/lookup
async fn lookup(
    State(facade): State<Arc<CacheFacade>>,
    payload: Result<Json<LookupRequest>, JsonRejection>,
) -> Response {
    let outcome = match payload {
        Ok(Json(request)) => match facade.lookup(request).await {
            Ok(response) => response,
            Err(e) => LookupResponse::failed(FacadeError::from(&e)),
        },
        Err(rejection) => LookupResponse::failed(rejected(&rejection)),
    };
    respond(outcome)
}

/// POST /rpc/v1/sessions/delete
async fn delete(
    State(facade): State<Arc<CacheFacade>>,
    payload: Result<Json<DeleteRequest>, JsonRejection>,
) -> Response {
    let outcome = match payload {
        Ok(Json(request)) => match facade.delete(request).await {
            Ok(response) => response,
            Err(e) => DeleteResponse::failed(FacadeError::from(&e)),
        },
        Err(rejection) => DeleteResponse::failed(rejected(&rejection)),
    };
    respond(outcome)
}

/// GET /health
async fn health(State(facade): State<Arc<CacheFacade>>) -> (StatusCode, Json<HealthResponse>) {
    let healthy = facade.health_check().await.unwrap_or(false);
    let (status, label) = if healthy {
        (StatusCode::OK, "ok")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "unavailable")
    };
    (
        status,
        Json(HealthResponse {
            status: label.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mirrors_outcome() {
        assert_eq!(status_for(&InsertResponse::ok()), StatusCode::OK);
        assert_eq!(
            status_for(&LookupResponse::failed(FacadeError::not_found())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_for(&InsertResponse::failed(FacadeError::new(
                FacadeErrorCode::Conflict,
                "taken"
            ))),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status_for(&DeleteResponse::failed(FacadeError::new(
                FacadeErrorCode::BackendUnavailable,
                "down"
            ))),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }
}
