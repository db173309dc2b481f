//! Session record and its stored representation.

use serde::{Deserialize, Serialize};

use tokengate_core::error::AppError;
use tokengate_core::result::AppResult;
use tokengate_core::traits::store::RecordFields;
use tokengate_store::keys::{FIELD_USER_ID, FIELD_USERNAME};

/// Upper bound on token length accepted as a store key.
pub const MAX_TOKEN_LEN: usize = 4096;

/// The identity a session token resolves to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionIdentity {
    /// Numeric ID of the authenticated principal.
    pub user_id: i64,
    /// Login name recorded at insert time.
    pub username: String,
}

impl SessionIdentity {
    /// Encode as store fields.
    pub fn to_fields(&self) -> RecordFields {
        let mut fields = RecordFields::new();
        fields.insert(FIELD_USER_ID.to_string(), self.user_id.to_string());
        fields.insert(FIELD_USERNAME.to_string(), self.username.clone());
        fields
    }

    /// Decode from store fields. A record missing either field or carrying a
    /// non-numeric user ID is corrupt.
    pub fn from_fields(fields: &RecordFields) -> AppResult<Self> {
        let user_id = fields
            .get(FIELD_USER_ID)
            .ok_or_else(|| AppError::internal("Session record has no user_id field"))?
            .parse::<i64>()
            .map_err(|e| AppError::internal(format!("Session record has invalid user_id: {e}")))?;
        let username = fields
            .get(FIELD_USERNAME)
            .ok_or_else(|| AppError::internal("Session record has no username field"))?
            .clone();
        Ok(Self { user_id, username })
    }
}

/// A token bound to an identity.
///
/// The token is a bearer credential: `Debug` output redacts it.
#[derive(Clone, PartialEq, Eq)]
pub struct SessionRecord {
    /// Opaque bearer token, the record key.
    pub token: String,
    /// The identity the token resolves to.
    pub identity: SessionIdentity,
}

impl SessionRecord {
    /// Build a record after validating the token.
    pub fn new(token: impl Into<String>, user_id: i64, username: impl Into<String>) -> AppResult<Self> {
        let token = token.into();
        validate_token(&token)?;
        Ok(Self {
            token,
            identity: SessionIdentity {
                user_id,
                username: username.into(),
            },
        })
    }
}

impl std::fmt::Debug for SessionRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionRecord")
            .field("token", &"<redacted>")
            .field("identity", &self.identity)
            .finish()
    }
}

/// Reject tokens that cannot be a valid store key.
pub fn validate_token(token: &str) -> AppResult<()> {
    if token.is_empty() {
        return Err(AppError::validation("Token must not be empty"));
    }
    if token.len() > MAX_TOKEN_LEN {
        return Err(AppError::validation(format!(
            "Token exceeds {MAX_TOKEN_LEN} bytes"
        )));
    }
    if token.chars().any(|c| c.is_whitespace() || c.is_control()) {
        return Err(AppError::validation(
            "Token must not contain whitespace or control characters",
        ));
    }
    Ok(())
}
