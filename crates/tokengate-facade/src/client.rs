//! HTTP client for a remote cache facade.

use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use tokengate_core::error::{AppError, ErrorKind};
use tokengate_core::result::AppResult;

use crate::dto::{
    DeleteRequest, DeleteResponse, InsertRequest, InsertResponse, LookupRequest, LookupResponse,
};
use crate::server::routes;
use crate::service::SessionFacade;

/// Calls a cache service over HTTP/JSON.
///
/// Any failure to obtain a decodable response (refused connection, timeout,
/// malformed body) is `UpstreamUnavailable`. A decoded response is returned
/// as-is regardless of HTTP status.
#[derive(Debug, Clone)]
pub struct RemoteCacheFacade {
    http: reqwest::Client,
    base_url: String,
}

impl RemoteCacheFacade {
    /// Create a client for the service at `base_url`.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> AppResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout)
            .build()
            .map_err(|e| {
                AppError::with_source(ErrorKind::Configuration, "Failed to build RPC client", e)
            })?;
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Ok(Self { http, base_url })
    }

    /// Base URL of the remote service.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn call<Req, Resp>(&self, path: &'static str, request: &Req) -> AppResult<Resp>
    where
        Req: Serialize + Sync,
        Resp: DeserializeOwned,
    {
        let url = format!("{}{}", self.base_url, path);
        let response = self
            .http
            .post(&url)
            .json(request)
            .send()
            .await
            .map_err(|e| {
                warn!(path, error = %e, "Cache service unreachable");
                AppError::with_source(
                    ErrorKind::UpstreamUnavailable,
                    "Cache service unreachable",
                    e,
                )
            })?;

        let status = response.status();
        debug!(path, status = status.as_u16(), "Cache service replied");

        response.json::<Resp>().await.map_err(|e| {
            warn!(path, status = status.as_u16(), error = %e, "Undecodable cache service reply");
            AppError::with_source(
                ErrorKind::UpstreamUnavailable,
                "Cache service returned an undecodable response",
                e,
            )
        })
    }
}

#[async_trait]
impl SessionFacade for RemoteCacheFacade {
    async fn insert(&self, request: InsertRequest) -> AppResult<InsertResponse> {
        self.call(routes::INSERT, &request).await
    }

    async fn lookup(&self, request: LookupRequest) -> AppResult<LookupResponse> {
        self.call(routes::LOOKUP, &request).await
    }

    async fn delete(&self, request: DeleteRequest) -> AppResult<DeleteResponse> {
        self.call(routes::DELETE, &request).await
    }

    async fn health_check(&self) -> AppResult<bool> {
        let url = format!("{}{}", self.base_url, routes::HEALTH);
        let response = self.http.get(&url).send().await.map_err(|e| {
            AppError::with_source(
                ErrorKind::UpstreamUnavailable,
                "Cache service unreachable",
                e,
            )
        })?;
        Ok(response.status().is_success())
    }
}
