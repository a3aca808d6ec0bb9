//! Signed-in identity
//!
//! The identity provider owns sign-in; this crate only carries the result.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An authenticated user session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// User identifier used in membership lookups
    pub user_id: String,

    /// Bearer token sent to the data API
    pub token: String,

    /// When the session was established
    pub started_at: DateTime<Utc>,
}

impl Session {
    pub fn new(user_id: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            token: token.into(),
            started_at: Utc::now(),
        }
    }

    /// Value for the `Authorization` header
    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bearer_header() {
        let session = Session::new("42", "abc.def");
        assert_eq!(session.bearer(), "Bearer abc.def");
    }

    #[test]
    fn test_session_from_identity_provider_payload() {
        let session: Session = serde_json::from_value(serde_json::json!({
            "user_id": "42",
            "token": "t1",
            "started_at": "2026-01-01T00:00:00Z"
        }))
        .unwrap();
        assert_eq!(session.user_id, "42");
        assert_eq!(session.bearer(), "Bearer t1");
    }
}
