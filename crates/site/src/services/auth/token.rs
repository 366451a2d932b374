//! Access token verification.
//!
//! The auth service signs access tokens with HS256 using the project's JWT
//! secret. Verification happens locally; no request leaves the site.

use chrono::{DateTime, TimeZone, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use thiserror::Error;

use gamepadtest_core::Email;

/// Clock skew tolerated on `exp`, in seconds.
const EXPIRY_LEEWAY_SECS: u64 = 30;

/// Role and audience the auth service assigns to signed-in users.
const AUTHENTICATED: &str = "authenticated";

/// Why a token was rejected.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenError {
    #[error("token is malformed")]
    Malformed,
    #[error("unsupported algorithm")]
    UnsupportedAlgorithm,
    #[error("signature mismatch")]
    BadSignature,
    #[error("token expired")]
    Expired,
    #[error("token audience is not authenticated")]
    WrongAudience,
    #[error("token role is not authenticated")]
    WrongRole,
    #[error("token has no usable email")]
    MissingEmail,
}

impl From<jsonwebtoken::errors::Error> for TokenError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        match err.kind() {
            ErrorKind::InvalidSignature => Self::BadSignature,
            ErrorKind::InvalidAlgorithm => Self::UnsupportedAlgorithm,
            ErrorKind::ExpiredSignature => Self::Expired,
            ErrorKind::InvalidAudience => Self::WrongAudience,
            _ => Self::Malformed,
        }
    }
}

/// Claims of a verified token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedToken {
    pub subject: String,
    pub email: Email,
    pub expires_at: DateTime<Utc>,
}

#[derive(Deserialize)]
struct Claims {
    #[serde(default)]
    sub: String,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    role: Option<String>,
    exp: i64,
}

/// Verifies HS256 access tokens.
#[derive(Clone)]
pub struct TokenVerifier {
    key: DecodingKey,
    validation: Validation,
}

impl TokenVerifier {
    #[must_use]
    pub fn new(secret: &SecretString) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = EXPIRY_LEEWAY_SECS;
        validation.set_audience(&[AUTHENTICATED]);

        Self {
            key: DecodingKey::from_secret(secret.expose_secret().as_bytes()),
            validation,
        }
    }

    /// Verify a compact JWT against the current time.
    ///
    /// # Errors
    ///
    /// Returns a [`TokenError`] when the token does not decode, is not HS256,
    /// fails the signature, expiry or audience checks, or lacks the
    /// `authenticated` role or an email.
    pub fn verify(&self, token: &str) -> Result<VerifiedToken, TokenError> {
        let claims = decode::<Claims>(token, &self.key, &self.validation)?.claims;

        if claims.role.as_deref() != Some(AUTHENTICATED) {
            return Err(TokenError::WrongRole);
        }
        let email = claims
            .email
            .as_deref()
            .and_then(|e| Email::parse(e).ok())
            .ok_or(TokenError::MissingEmail)?;
        let expires_at = Utc
            .timestamp_opt(claims.exp, 0)
            .single()
            .ok_or(TokenError::Malformed)?;

        Ok(VerifiedToken {
            subject: claims.sub,
            email,
            expires_at,
        })
    }
}
