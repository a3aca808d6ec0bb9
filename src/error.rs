//! Error types for commune access

use thiserror::Error;

use crate::role::Role;

/// Result type for commune access operations
pub type Result<T> = std::result::Result<T, AccessError>;

/// Commune access error types
///
/// `NotAuthenticated` and `InsufficientRole` are expected denials. The
/// remaining variants are exceptional failures the consuming view must
/// catch and present.
#[derive(Error, Debug)]
pub enum AccessError {
    /// No session is present
    #[error("Not authenticated")]
    NotAuthenticated,

    /// Session present but the role is below the minimum
    #[error("Insufficient role: {required} required, have {actual}")]
    InsufficientRole { required: Role, actual: Role },

    /// Membership lookup failed; access could not be verified
    #[error("Unable to verify access: {0}")]
    MembershipFetchFailed(String),

    /// List data could not be loaded
    #[error("Failed to fetch lists: {0}")]
    ListFetchFailed(String),

    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Data API returned an error status
    #[error("Server error {status}: {message}")]
    Server { status: u16, message: String },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl AccessError {
    /// Whether this is an expected denial rather than a failure
    pub fn is_denial(&self) -> bool {
        matches!(
            self,
            AccessError::NotAuthenticated | AccessError::InsufficientRole { .. }
        )
    }
}
