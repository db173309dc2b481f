//! The facade contract and its in-process implementation.

use std::fmt::Debug;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, error, warn};

use tokengate_core::error::{AppError, ErrorKind};
use tokengate_core::result::AppResult;
use tokengate_session::SessionCache;

use crate::dto::{
    DeleteRequest, DeleteResponse, FacadeError, InsertRequest, InsertResponse, LookupRequest,
    LookupResponse,
};

/// Session operations as seen by a remote caller.
///
/// `Ok` always carries a response whose `success` flag is authoritative.
/// `Err` is reserved for failing to reach the facade at all, and is always
/// [`ErrorKind::UpstreamUnavailable`].
#[async_trait]
pub trait SessionFacade: Send + Sync + Debug + 'static {
    /// Register a session.
    async fn insert(&self, request: InsertRequest) -> AppResult<InsertResponse>;

    /// Resolve a token.
    async fn lookup(&self, request: LookupRequest) -> AppResult<LookupResponse>;

    /// Remove a session.
    async fn delete(&self, request: DeleteRequest) -> AppResult<DeleteResponse>;

    /// Whether the facade and its store can currently answer.
    async fn health_check(&self) -> AppResult<bool>;
}

/// Translates [`SessionCache`] outcomes into facade responses.
#[derive(Debug, Clone)]
pub struct CacheFacade {
    cache: Arc<SessionCache>,
}

impl CacheFacade {
    pub fn new(cache: Arc<SessionCache>) -> Self {
        Self { cache }
    }

    /// The underlying session cache.
    pub fn cache(&self) -> &Arc<SessionCache> {
        &self.cache
    }
}

fn log_failure(operation: &'static str, err: &AppError) {
    match err.kind {
        ErrorKind::Conflict | ErrorKind::Validation => {
            debug!(operation, kind = %err.kind, "Session request refused")
        }
        ErrorKind::BackendUnavailable => {
            warn!(operation, error = %err, "Session store unavailable")
        }
        _ => error!(operation, error = %err, "Session request failed"),
    }
}

#[async_trait]
impl SessionFacade for CacheFacade {
    async fn insert(&self, request: InsertRequest) -> AppResult<InsertResponse> {
        let response = match self
            .cache
            .insert(&request.token, request.user_id, &request.username)
            .await
        {
            Ok(()) => InsertResponse::ok(),
            Err(e) => {
                log_failure("insert", &e);
                InsertResponse::failed(FacadeError::from(&e))
            }
        };
        Ok(response)
    }

    async fn lookup(&self, request: LookupRequest) -> AppResult<LookupResponse> {
        let response = match self.cache.lookup(&request.token).await {
            Ok(Some(identity)) => LookupResponse::found(identity.user_id, identity.username),
            Ok(None) => LookupResponse::failed(FacadeError::not_found()),
            Err(e) => {
                log_failure("lookup", &e);
                LookupResponse::failed(FacadeError::from(&e))
            }
        };
        Ok(response)
    }

    async fn delete(&self, request: DeleteRequest) -> AppResult<DeleteResponse> {
        let response = match self.cache.delete(&request.token).await {
            Ok(_) => DeleteResponse::ok(),
            Err(e) => {
                log_failure("delete", &e);
                DeleteResponse::failed(FacadeError::from(&e))
            }
        };
        Ok(response)
    }

    async fn health_check(&self) -> AppResult<bool> {
        match self.cache.health_check().await {
            Ok(healthy) => Ok(healthy),
            Err(e) => {
                warn!(error = %e, "Session store health check failed");
                Ok(false)
            }
        }
    }
}
