//! Identity service client: verifies credentials and issues tokens.

use std::fmt::Debug;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::warn;

use tokengate_core::error::{AppError, ErrorKind};
use tokengate_core::result::AppResult;

/// A successful credential check.
#[derive(Clone, Serialize, Deserialize)]
pub struct LoginGrant {
    /// Authenticated principal.
    pub user_id: i64,
    /// Freshly issued bearer token.
    pub access_token: String,
}

impl Debug for LoginGrant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginGrant")
            .field("user_id", &self.user_id)
            .field("access_token", &"<redacted>")
            .finish()
    }
}

/// Verifies a username and password.
#[async_trait]
pub trait IdentityProvider: Send + Sync + Debug + 'static {
    /// Check credentials and issue a token.
    ///
    /// # Errors
    ///
    /// `Authentication` for rejected credentials, `UpstreamUnavailable` when
    /// the identity service cannot be reached.
    async fn login(&self, username: &str, password: &str) -> AppResult<LoginGrant>;
}

#[derive(Serialize)]
struct Credentials<'a> {
    username: &'a str,
    password: &'a str,
}

/// `IdentityProvider` backed by an HTTP identity service.
#[derive(Debug, Clone)]
pub struct HttpIdentityProvider {
    http: reqwest::Client,
    login_url: String,
}

impl HttpIdentityProvider {
    pub fn new(base_url: &str, timeout: Duration) -> AppResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| {
                AppError::with_source(
                    ErrorKind::Configuration,
                    "Failed to build identity client",
                    e,
                )
            })?;
        Ok(Self {
            http,
            login_url: format!("{}/login", base_url.trim_end_matches('/')),
        })
    }
}

#[async_trait]
impl IdentityProvider for HttpIdentityProvider {
    async fn login(&self, username: &str, password: &str) -> AppResult<LoginGrant> {
        let response = self
            .http
            .post(&self.login_url)
            .json(&Credentials { username, password })
            .send()
            .await
            .map_err(|e| {
                warn!(error = %e, "Identity service unreachable");
                AppError::with_source(
                    ErrorKind::UpstreamUnavailable,
                    "Identity service unreachable",
                    e,
                )
            })?;

        match response.status() {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN | StatusCode::NOT_FOUND => {
                return Err(AppError::authentication("Invalid username or password"));
            }
            status if !status.is_success() => {
                warn!(status = status.as_u16(), "Identity service error");
                return Err(AppError::upstream_unavailable(format!(
                    "Identity service returned {status}"
                )));
            }
            _ => {}
        }

        response.json::<LoginGrant>().await.map_err(|e| {
            AppError::with_source(
                ErrorKind::UpstreamUnavailable,
                "Identity service returned an undecodable response",
                e,
            )
        })
    }
}
