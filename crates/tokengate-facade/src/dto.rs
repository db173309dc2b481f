//! Wire types for the session RPC.
//!
//! Every response carries a `success` flag and, on failure, a typed
//! [`FacadeError`]. Callers must check the flag; a delivered response is
//! never an implicit success.

use serde::{Deserialize, Serialize};

use tokengate_core::error::{AppError, ErrorKind};

/// Register a session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InsertRequest {
    /// Bearer token to bind.
    pub token: String,
    /// Principal ID.
    pub user_id: i64,
    /// Principal login name.
    pub username: String,
}

/// Resolve a token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LookupRequest {
    pub token: String,
}

/// Remove a session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteRequest {
    pub token: String,
}

/// Machine-readable failure category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FacadeErrorCode {
    /// Token already bound to an active session.
    Conflict,
    /// Token not bound (never inserted, deleted or expired).
    NotFound,
    /// The session store could not answer.
    BackendUnavailable,
    /// Malformed request.
    InvalidInput,
    /// Anything else.
    Internal,
}

impl std::fmt::Display for FacadeErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Conflict => write!(f, "CONFLICT"),
            Self::NotFound => write!(f, "NOT_FOUND"),
            Self::BackendUnavailable => write!(f, "BACKEND_UNAVAILABLE"),
            Self::InvalidInput => write!(f, "INVALID_INPUT"),
            Self::Internal => write!(f, "INTERNAL"),
        }
    }
}

/// Typed failure carried in a response body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FacadeError {
    pub code: FacadeErrorCode,
    pub message: String,
}

impl FacadeError {
    pub fn new(code: FacadeErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// The failure for a token with no active session.
    pub fn not_found() -> Self {
        Self::new(FacadeErrorCode::NotFound, "Session not found")
    }

    /// Malformed request body or token.
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::new(FacadeErrorCode::InvalidInput, message)
    }
}

impl From<&AppError> for FacadeError {
    fn from(err: &AppError) -> Self {
        match err.kind {
            ErrorKind::Conflict => Self::new(FacadeErrorCode::Conflict, err.message.clone()),
            ErrorKind::NotFound => Self::new(FacadeErrorCode::NotFound, err.message.clone()),
            ErrorKind::Validation => Self::invalid_input(err.message.clone()),
            ErrorKind::BackendUnavailable => Self::new(
                FacadeErrorCode::BackendUnavailable,
                "Session store unavailable",
            ),
            _ => Self::new(FacadeErrorCode::Internal, "Internal error"),
        }
    }
}

impl From<FacadeError> for AppError {
    fn from(err: FacadeError) -> Self {
        let kind = match err.code {
            FacadeErrorCode::Conflict => ErrorKind::Conflict,
            FacadeErrorCode::NotFound => ErrorKind::NotFound,
            FacadeErrorCode::BackendUnavailable => ErrorKind::BackendUnavailable,
            FacadeErrorCode::InvalidInput => ErrorKind::Validation,
            FacadeErrorCode::Internal => ErrorKind::Internal,
        };
        AppError::new(kind, err.message)
    }
}

/// Outcome of an insert.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InsertResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<FacadeError>,
}

impl InsertResponse {
    pub fn ok() -> Self {
        Self {
            success: true,
            error: None,
        }
    }

    pub fn failed(error: FacadeError) -> Self {
        Self {
            success: false,
            error: Some(error),
        }
    }
}

/// Outcome of a lookup. `user_id` and `username` are zero-valued unless
/// `success` is set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LookupResponse {
    pub success: bool,
    #[serde(default)]
    pub user_id: i64,
    #[serde(default)]
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<FacadeError>,
}

impl LookupResponse {
    pub fn found(user_id: i64, username: impl Into<String>) -> Self {
        Self {
            success: true,
            user_id,
            username: username.into(),
            error: None,
        }
    }

    pub fn failed(error: FacadeError) -> Self {
        Self {
            success: false,
            user_id: 0,
            username: String::new(),
            error: Some(error),
        }
    }
}

/// Outcome of a delete.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<FacadeError>,
}

impl DeleteResponse {
    pub fn ok() -> Self {
        Self {
            success: true,
            error: None,
        }
    }

    pub fn failed(error: FacadeError) -> Self {
        Self {
            success: false,
            error: Some(error),
        }
    }
}

/// Common view over the three response types.
pub trait FacadeOutcome {
    /// The failure carried by this response, if any.
    fn error(&self) -> Option<&FacadeError>;

    /// Failure code, if any.
    fn code(&self) -> Option<FacadeErrorCode> {
        self.error().map(|e| e.code)
    }
}

impl FacadeOutcome for InsertResponse {
    fn error(&self) -> Option<&FacadeError> {
        self.error.as_ref()
    }
}

impl FacadeOutcome for LookupResponse {
    fn error(&self) -> Option<&FacadeError> {
        self.error.as_ref()
    }
}

impl FacadeOutcome for DeleteResponse {
    fn error(&self) -> Option<&FacadeError> {
        self.error.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_wire_names() {
        let json = serde_json::to_string(&FacadeErrorCode::BackendUnavailable).unwrap();
        assert_eq!(json, "\"BACKEND_UNAVAILABLE\"");
        let code: FacadeErrorCode = serde_json::from_str("\"INVALID_INPUT\"").unwrap();
        assert_eq!(code, FacadeErrorCode::InvalidInput);
    }

    #[test]
    fn test_lookup_miss_shape() {
        let body = serde_json::to_value(LookupResponse::failed(FacadeError::not_found())).unwrap();
        assert_eq!(body["success"], false);
        assert_eq!(body["user_id"], 0);
        assert_eq!(body["username"], "");
        assert_eq!(body["error"]["code"], "NOT_FOUND");
    }

    #[test]
    fn test_success_omits_error() {
        let body = serde_json::to_value(InsertResponse::ok()).unwrap();
        assert_eq!(body, serde_json::json!({ "success": true }));
    }

    #[test]
    fn test_backend_detail_not_forwarded() {
        let err = AppError::backend_unavailable("Connection refused by 10.0.0.7:6379");
        let mapped = FacadeError::from(&err);
        assert_eq!(mapped.code, FacadeErrorCode::BackendUnavailable);
        assert!(!mapped.message.contains("10.0.0.7"));
    }

    #[test]
    fn test_validation_maps_to_invalid_input() {
        let err = AppError::validation("Token must not be empty");
        assert_eq!(FacadeError::from(&err).code, FacadeErrorCode::InvalidInput);
        let err = AppError::internal("corrupt record");
        assert_eq!(FacadeError::from(&err).code, FacadeErrorCode::Internal);
    }
}
