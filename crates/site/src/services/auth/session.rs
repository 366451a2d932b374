//! Stateful auth client holding the current session.
//!
//! Plays the part a browser auth client plays for a single-page admin: it
//! keeps at most one [`AuthSession`], refreshes it when it has expired and
//! broadcasts every change to subscribers.

use std::sync::Arc;

use chrono::Utc;
use secrecy::SecretString;
use tokio::sync::{Mutex, broadcast};
use tracing::{info, instrument, warn};

use gamepadtest_core::Email;

use super::{AuthApi, AuthError, AuthSession, SignUpOutcome};

const EVENT_CAPACITY: usize = 16;

/// A change to the signed-in session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthChangeEvent {
    SignedIn(AuthSession),
    TokenRefreshed(AuthSession),
    SignedOut,
}

impl AuthChangeEvent {
    /// The session after the change, if any.
    #[must_use]
    pub const fn session(&self) -> Option<&AuthSession> {
        match self {
            Self::SignedIn(session) | Self::TokenRefreshed(session) => Some(session),
            Self::SignedOut => None,
        }
    }
}

/// Receives [`AuthChangeEvent`]s until dropped.
pub struct AuthSubscription {
    receiver: broadcast::Receiver<AuthChangeEvent>,
}

impl AuthSubscription {
    /// Wait for the next change.
    ///
    /// Returns `None` once the client is gone. Events missed by a slow
    /// subscriber are skipped; the next one still reflects the latest state.
    pub async fn recv(&mut self) -> Option<AuthChangeEvent> {
        loop {
            match self.receiver.recv().await {
                Ok(event) => return Some(event),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(skipped, "Auth subscriber lagged");
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}

/// Auth client with a local session.
pub struct SessionClient {
    api: Arc<dyn AuthApi>,
    session: Mutex<Option<AuthSession>>,
    events: broadcast::Sender<AuthChangeEvent>,
}

impl SessionClient {
    /// Create a signed-out client.
    #[must_use]
    pub fn new(api: Arc<dyn AuthApi>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            api,
            session: Mutex::new(None),
            events,
        }
    }

    /// Adopt an existing session (e.g. tokens passed on the command line).
    pub async fn set_session(&self, session: AuthSession) {
        *self.session.lock().await = Some(session.clone());
        self.emit(AuthChangeEvent::SignedIn(session));
    }

    /// Current session, refreshed first if it has expired.
    ///
    /// A failed refresh clears the session and emits `SignedOut`.
    #[instrument(skip(self))]
    pub async fn get_session(&self) -> Option<AuthSession> {
        let mut current = self.session.lock().await;
        let session = current.clone()?;
        if !session.is_expired_at(Utc::now()) {
            return Some(session);
        }

        match self.api.refresh(&session.refresh_token).await {
            Ok(fresh) => {
                *current = Some(fresh.clone());
                self.emit(AuthChangeEvent::TokenRefreshed(fresh.clone()));
                Some(fresh)
            }
            Err(e) => {
                warn!(error = %e, "Session refresh failed, signing out");
                *current = None;
                self.emit(AuthChangeEvent::SignedOut);
                None
            }
        }
    }

    /// Sign in with email and password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidEmail` for a malformed address and any
    /// error from the auth service; the local session is left untouched.
    #[instrument(skip(self, password))]
    pub async fn sign_in_with_password(
        &self,
        email: &str,
        password: &SecretString,
    ) -> Result<AuthSession, AuthError> {
        let email = Email::parse(email)?;
        let session = self.api.password_grant(&email, password).await?;

        *self.session.lock().await = Some(session.clone());
        info!(email = %email, "Signed in");
        self.emit(AuthChangeEvent::SignedIn(session.clone()));
        Ok(session)
    }

    /// Register a new account.
    ///
    /// When the service returns a session right away the client signs in.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidEmail` for a malformed address and any
    /// error from the auth service.
    #[instrument(skip(self, password))]
    pub async fn sign_up(
        &self,
        email: &str,
        password: &SecretString,
    ) -> Result<SignUpOutcome, AuthError> {
        let email = Email::parse(email)?;
        let outcome = self.api.sign_up(&email, password).await?;

        if let SignUpOutcome::Session(session) = &outcome {
            *self.session.lock().await = Some(session.clone());
            self.emit(AuthChangeEvent::SignedIn(session.clone()));
        }
        Ok(outcome)
    }

    /// Sign out locally and revoke the session remotely.
    ///
    /// The local session is always cleared and `SignedOut` always emitted; a
    /// failed revocation is only logged.
    #[instrument(skip(self))]
    pub async fn sign_out(&self) {
        let previous = self.session.lock().await.take();

        if let Some(session) = previous
            && let Err(e) = self.api.sign_out(&session.access_token).await
        {
            warn!(error = %e, "Remote sign-out failed");
        }

        self.emit(AuthChangeEvent::SignedOut);
    }

    /// Subscribe to session changes.
    #[must_use]
    pub fn on_auth_state_change(&self) -> AuthSubscription {
        AuthSubscription {
            receiver: self.events.subscribe(),
        }
    }

    fn emit(&self, event: AuthChangeEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }
}
