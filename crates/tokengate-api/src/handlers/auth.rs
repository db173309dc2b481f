//! Auth handlers: login, logout, me.

use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::HeaderMap;
use tracing::{info, warn};
use validator::Validate;

use tokengate_core::error::AppError;
use tokengate_facade::dto::{DeleteRequest, FacadeError, InsertRequest};

use crate::dto::request::LoginRequest;
use crate::dto::response::{ApiResponse, LoginResponse, MeResponse, MessageResponse};
use crate::error::ApiError;
use crate::extractors::AuthUser;
use crate::middleware::auth::extract_credential;
use crate::state::AppState;

/// Error for a facade call whose `success` flag is unset. The flag decides;
/// a refusal that carries no typed error is internal.
fn refused(error: Option<FacadeError>) -> AppError {
    error
        .map(AppError::from)
        .unwrap_or_else(|| AppError::internal("Session service refused without a reason"))
}

/// POST /api/auth/login
///
/// Verifies credentials with the identity service and registers the issued
/// token. A token that is already active is a conflict; the caller has to
/// log in again for a fresh one.
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<LoginResponse>>, ApiError> {
    let Json(req) = payload.map_err(|e| AppError::validation(e.body_text()))?;
    req.validate()
        .map_err(|e| AppError::validation(format!("Invalid login request: {e}")))?;

    let grant = state.identity.login(&req.username, &req.password).await?;

    let response = state
        .sessions
        .insert(InsertRequest {
            token: grant.access_token.clone(),
            user_id: grant.user_id,
            username: req.username.clone(),
        })
        .await?;

    if !response.success {
        let err = refused(response.error);
        warn!(user_id = grant.user_id, kind = %err.kind, "Session registration failed");
        return Err(err.into());
    }

    info!(user_id = grant.user_id, "User logged in");
    Ok(Json(ApiResponse::ok(LoginResponse {
        access_token: grant.access_token,
    })))
}

/// POST /api/auth/logout
pub async fn logout(
    State(state): State<AppState>,
    auth: AuthUser,
    headers: HeaderMap,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    let token = extract_credential(&headers)
        .ok_or_else(|| AppError::authentication("Missing Authorization header"))?;

    let response = state
        .sessions
        .delete(DeleteRequest {
            token: token.to_string(),
        })
        .await?;

    if !response.success {
        let err = refused(response.error);
        warn!(user_id = auth.user_id, kind = %err.kind, "Session removal failed");
        return Err(err.into());
    }

    info!(user_id = auth.user_id, "User logged out");
    Ok(Json(ApiResponse::ok(MessageResponse {
        message: "Logged out successfully".to_string(),
    })))
}

/// GET /api/auth/me
pub async fn me(auth: AuthUser) -> Json<ApiResponse<MeResponse>> {
    Json(ApiResponse::ok(MeResponse {
        user_id: auth.user_id,
        username: auth.username.clone(),
    }))
}
