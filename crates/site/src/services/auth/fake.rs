//! Scripted [`AuthApi`] for unit tests.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::{Duration, Utc};
use secrecy::{ExposeSecret, SecretString};

use gamepadtest_core::Email;

use super::{AuthApi, AuthError, AuthSession, AuthUser, SignUpOutcome};

pub struct FakeAuthApi {
    password: String,
    ttl: Duration,
    issued: AtomicUsize,
    pub refresh_fails: AtomicBool,
    pub sign_out_fails: AtomicBool,
    pub confirm_signups: AtomicBool,
    pub sign_outs: AtomicUsize,
}

impl FakeAuthApi {
    pub fn new(password: &str) -> Self {
        Self {
            password: password.to_owned(),
            ttl: Duration::hours(1),
            issued: AtomicUsize::new(0),
            refresh_fails: AtomicBool::new(false),
            sign_out_fails: AtomicBool::new(false),
            confirm_signups: AtomicBool::new(false),
            sign_outs: AtomicUsize::new(0),
        }
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn session(&self, email: &str, ttl: Duration) -> AuthSession {
        let n = self.issued.fetch_add(1, Ordering::SeqCst);
        AuthSession {
            access_token: format!("access-{n}"),
            refresh_token: format!("refresh-{email}"),
            expires_at: Utc::now() + ttl,
            user: AuthUser {
                id: format!("user-{email}"),
                email: Some(email.to_owned()),
            },
        }
    }
}

#[async_trait]
impl AuthApi for FakeAuthApi {
    async fn password_grant(
        &self,
        email: &Email,
        password: &SecretString,
    ) -> Result<AuthSession, AuthError> {
        if password.expose_secret() != self.password {
            return Err(AuthError::InvalidCredentials);
        }
        Ok(self.session(email.as_str(), self.ttl))
    }

    async fn refresh(&self, refresh_token: &str) -> Result<AuthSession, AuthError> {
        if self.refresh_fails.load(Ordering::SeqCst) {
            return Err(AuthError::SessionExpired);
        }
        let email = refresh_token.trim_start_matches("refresh-");
        Ok(self.session(email, Duration::hours(1)))
    }

    async fn sign_up(
        &self,
        email: &Email,
        _password: &SecretString,
    ) -> Result<SignUpOutcome, AuthError> {
        if self.confirm_signups.load(Ordering::SeqCst) {
            return Ok(SignUpOutcome::ConfirmationPending(AuthUser {
                id: format!("user-{email}"),
                email: Some(email.to_string()),
            }));
        }
        Ok(SignUpOutcome::Session(self.session(email.as_str(), self.ttl)))
    }

    async fn sign_out(&self, _access_token: &str) -> Result<(), AuthError> {
        self.sign_outs.fetch_add(1, Ordering::SeqCst);
        if self.sign_out_fails.load(Ordering::SeqCst) {
            return Err(AuthError::Upstream {
                status: 503,
                message: "unavailable".to_owned(),
            });
        }
        Ok(())
    }
}
