//! Session gate: resolves the bearer token on every protected request.
//!
//! Rejections happen before the downstream handler runs. On success the
//! resolved [`RequestContext`] is attached to the request extensions and read
//! back through the [`AuthUser`](crate::extractors::AuthUser) extractor.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Request, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use tracing::{debug, error, warn};

use tokengate_core::context::RequestContext;
use tokengate_facade::SessionFacade;
use tokengate_facade::dto::{FacadeErrorCode, FacadeOutcome, LookupRequest};

use crate::error::ApiErrorResponse;
use crate::state::AppState;

/// Why a request was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateRejection {
    /// No credential on the request.
    MissingCredential,
    /// The token does not resolve to an active session.
    Unauthenticated,
    /// The session could not be checked right now.
    UpstreamUnavailable,
}

impl GateRejection {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::MissingCredential | Self::Unauthenticated => StatusCode::UNAUTHORIZED,
            Self::UpstreamUnavailable => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

impl IntoResponse for GateRejection {
    fn into_response(self) -> Response {
        let body = match self {
            Self::MissingCredential => {
                ApiErrorResponse::new("UNAUTHORIZED", "Missing Authorization header")
            }
            Self::Unauthenticated => {
                ApiErrorResponse::new("UNAUTHORIZED", "Invalid or expired session")
            }
            Self::UpstreamUnavailable => ApiErrorResponse::new(
                "SERVICE_UNAVAILABLE",
                "Session service temporarily unavailable",
            ),
        };
        (self.status(), Json(body)).into_response()
    }
}

/// Pull the token out of the `Authorization` header.
///
/// Accepts both `Bearer <token>` (scheme matched case-insensitively) and a
/// bare token. Blank values and a lone scheme count as missing.
pub fn extract_credential(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?.trim();
    let token = match value.split_once(char::is_whitespace) {
        Some((scheme, rest)) if scheme.eq_ignore_ascii_case("bearer") => rest.trim(),
        None if value.eq_ignore_ascii_case("bearer") => "",
        _ => value,
    };
    (!token.is_empty()).then_some(token)
}

/// Resolves credentials against the session facade.
#[derive(Debug, Clone)]
pub struct AuthGate {
    sessions: Arc<dyn SessionFacade>,
}

impl AuthGate {
    pub fn new(sessions: Arc<dyn SessionFacade>) -> Self {
        Self { sessions }
    }

    /// Decide whether the request may proceed.
    ///
    /// Fails closed: anything other than a successful lookup rejects. Only an
    /// unreachable facade or a store outage maps to `UpstreamUnavailable`;
    /// every other failure is `Unauthenticated`.
    pub async fn authenticate(&self, headers: &HeaderMap) -> Result<RequestContext, GateRejection> {
        let token = extract_credential(headers).ok_or(GateRejection::MissingCredential)?;

        let response = self
            .sessions
            .lookup(LookupRequest {
                token: token.to_string(),
            })
            .await
            .map_err(|e| {
                warn!(error = %e, "Session lookup failed");
                GateRejection::UpstreamUnavailable
            })?;

        if response.success {
            debug!(user_id = response.user_id, "Request authenticated");
            return Ok(RequestContext::new(response.user_id, response.username));
        }

        match response.code() {
            Some(FacadeErrorCode::BackendUnavailable) => {
                warn!("Session store unavailable, rejecting request");
                Err(GateRejection::UpstreamUnavailable)
            }
            Some(FacadeErrorCode::Internal) => {
                error!("Session lookup returned an internal error");
                Err(GateRejection::Unauthenticated)
            }
            _ => Err(GateRejection::Unauthenticated),
        }
    }
}

/// Middleware guarding every route it wraps.
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    match state.gate.authenticate(request.headers()).await {
        Ok(context) => {
            request.extensions_mut().insert(context);
            next.run(request).await
        }
        Err(rejection) => rejection.into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn test_extract_bearer_and_raw() {
        assert_eq!(extract_credential(&headers("Bearer abc")), Some("abc"));
        assert_eq!(extract_credential(&headers("abc")), Some("abc"));
        assert_eq!(extract_credential(&headers("Bearer  ")), None);
        assert_eq!(extract_credential(&headers("bearer abc")), Some("abc"));
        assert_eq!(extract_credential(&headers("BEARER\tabc")), Some("abc"));
        assert_eq!(extract_credential(&headers("Bearer")), None);
        assert_eq!(extract_credential(&headers("bearer")), None);
        assert_eq!(extract_credential(&headers("   ")), None);
        assert_eq!(extract_credential(&HeaderMap::new()), None);
    }

    #[test]
    fn test_rejection_statuses() {
        assert_eq!(
            GateRejection::MissingCredential.status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            GateRejection::Unauthenticated.status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            GateRejection::UpstreamUnavailable.status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }
}
