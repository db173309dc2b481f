//! `AuthUser` extractor: reads the context attached by the session gate.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use tokengate_core::context::RequestContext;

use crate::middleware::auth::GateRejection;

/// Authenticated caller, available in handlers behind `require_auth`.
#[derive(Debug, Clone)]
pub struct AuthUser(pub RequestContext);

impl AuthUser {
    /// Returns the inner `RequestContext`.
    pub fn context(&self) -> &RequestContext {
        &self.0
    }
}

impl std::ops::Deref for AuthUser {
    type Target = RequestContext;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = GateRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        // Routes outside the gate never carry a context.
        parts
            .extensions
            .get::<RequestContext>()
            .cloned()
            .map(AuthUser)
            .ok_or(GateRejection::MissingCredential)
    }
}
