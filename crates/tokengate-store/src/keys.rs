//! Key builders for every record TokenGate keeps in the store.
//!
//! The backend adds its configured prefix on top of these keys.

/// Store key for the session bound to a bearer token.
pub fn session_by_token(token: &str) -> String {
    format!("session:{token}")
}

/// Field holding the numeric user ID of a session record.
pub const FIELD_USER_ID: &str = "user_id";

/// Field holding the username of a session record.
pub const FIELD_USERNAME: &str = "username";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_key() {
        assert_eq!(session_by_token("abc"), "session:abc");
    }
}
