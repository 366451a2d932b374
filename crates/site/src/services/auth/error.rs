//! Authentication error types.

use thiserror::Error;

/// Errors that can occur during authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Invalid email format.
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] gamepadtest_core::EmailError),

    /// Wrong email or password.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// The refresh token was rejected; the user must sign in again.
    #[error("session expired")]
    SessionExpired,

    /// The auth service refused the request with a user-facing reason
    /// (weak password, address already registered, signups disabled).
    #[error("{message}")]
    Rejected { status: u16, message: String },

    /// The auth service failed on its side.
    #[error("auth service error: {status} - {message}")]
    Upstream { status: u16, message: String },

    /// HTTP request failed.
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The response body did not match the expected shape.
    #[error("decode error: {0}")]
    Decode(String),

    /// The client could not be configured.
    #[error("configuration error: {0}")]
    Config(String),
}

impl AuthError {
    /// Whether the caller, not the service, is at fault.
    #[must_use]
    pub const fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidEmail(_)
                | Self::InvalidCredentials
                | Self::SessionExpired
                | Self::Rejected { .. }
        )
    }
}
