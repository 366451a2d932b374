//! Admin sign-in state for interactive clients.
//!
//! [`AdminAuth`] owns a listener task that follows the [`SessionClient`]'s
//! change notifications and the current session's expiry, and publishes the
//! result as an [`AdminAuthState`] over a `watch` channel.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use secrecy::SecretString;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, instrument};

use super::{AuthChangeEvent, AuthError, AuthSession, AuthSubscription, SessionClient, SignUpOutcome};

/// What the admin UI knows about the current user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdminAuthState {
    /// The initial session check has not finished.
    Loading,
    Authenticated { email: String },
    Anonymous,
}

impl AdminAuthState {
    /// A session without a usable email counts as signed out.
    fn from_session(session: Option<&AuthSession>) -> Self {
        session
            .and_then(AuthSession::email)
            .map_or(Self::Anonymous, |email| Self::Authenticated {
                email: email.into_inner(),
            })
    }

    #[must_use]
    pub const fn is_logged_in(&self) -> bool {
        matches!(self, Self::Authenticated { .. })
    }

    #[must_use]
    pub fn admin_email(&self) -> Option<&str> {
        match self {
            Self::Authenticated { email } => Some(email),
            Self::Loading | Self::Anonymous => None,
        }
    }
}

/// Admin auth context.
///
/// Dropping it stops the listener and unsubscribes from the client.
pub struct AdminAuth {
    client: Arc<SessionClient>,
    state: Arc<watch::Sender<AdminAuthState>>,
    listener: JoinHandle<()>,
}

impl AdminAuth {
    /// Start in `Loading` and check for an existing session.
    ///
    /// Must be called inside a Tokio runtime.
    #[must_use]
    pub fn new(client: Arc<SessionClient>) -> Self {
        let (sender, _) = watch::channel(AdminAuthState::Loading);
        let state = Arc::new(sender);

        // Subscribe before the initial check so no change is missed.
        let subscription = client.on_auth_state_change();
        let listener = tokio::spawn(listen(Arc::clone(&client), Arc::clone(&state), subscription));

        Self {
            client,
            state,
            listener,
        }
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> AdminAuthState {
        self.state.borrow().clone()
    }

    /// Receiver that sees every future state.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<AdminAuthState> {
        self.state.subscribe()
    }

    /// Wait until the initial check has settled.
    pub async fn ready(&self) -> AdminAuthState {
        let mut receiver = self.state.subscribe();
        match receiver
            .wait_for(|state| *state != AdminAuthState::Loading)
            .await
        {
            Ok(state) => state.clone(),
            Err(_) => self.state(),
        }
    }

    /// The client this context drives.
    #[must_use]
    pub fn client(&self) -> &Arc<SessionClient> {
        &self.client
    }

    /// Sign in with email and password.
    ///
    /// # Errors
    ///
    /// Returns the client's error for display; the state is unchanged.
    #[instrument(skip(self, password))]
    pub async fn login(&self, email: &str, password: &SecretString) -> Result<AuthSession, AuthError> {
        let session = self.client.sign_in_with_password(email, password).await?;
        self.state
            .send_replace(AdminAuthState::from_session(Some(&session)));
        Ok(session)
    }

    /// Register a new account.
    ///
    /// A signup awaiting email confirmation leaves the state unchanged.
    ///
    /// # Errors
    ///
    /// Returns the client's error for display; the state is unchanged.
    #[instrument(skip(self, password))]
    pub async fn signup(
        &self,
        email: &str,
        password: &SecretString,
    ) -> Result<SignUpOutcome, AuthError> {
        let outcome = self.client.sign_up(email, password).await?;
        if let SignUpOutcome::Session(session) = &outcome {
            self.state
                .send_replace(AdminAuthState::from_session(Some(session)));
        }
        Ok(outcome)
    }

    /// Sign out. Always ends `Anonymous`.
    #[instrument(skip(self))]
    pub async fn logout(&self) {
        self.client.sign_out().await;
        self.state.send_replace(AdminAuthState::Anonymous);
    }
}

impl Drop for AdminAuth {
    fn drop(&mut self) {
        self.listener.abort();
    }
}

async fn listen(
    client: Arc<SessionClient>,
    state: Arc<watch::Sender<AdminAuthState>>,
    mut subscription: AuthSubscription,
) {
    let initial = client.get_session();
    tokio::pin!(initial);
    let mut initial_pending = true;
    let mut expires_at: Option<DateTime<Utc>> = None;

    loop {
        tokio::select! {
            session = &mut initial, if initial_pending => {
                initial_pending = false;
                let applied = state.send_if_modified(|current| {
                    if *current != AdminAuthState::Loading {
                        return false;
                    }
                    *current = AdminAuthState::from_session(session.as_ref());
                    true
                });
                if applied {
                    expires_at = session.map(|s| s.expires_at);
                }
            }
            event = subscription.recv() => {
                let Some(event) = event else { break };
                debug!(?event, "Auth state changed");
                expires_at = event.session().map(|s| s.expires_at);
                state.send_replace(AdminAuthState::from_session(event.session()));
            }
            () = sleep_until(expires_at) => {
                // Refreshes (TokenRefreshed) or clears (SignedOut); the state
                // change arrives through the subscription.
                expires_at = client.get_session().await.map(|s| s.expires_at);
            }
        }
    }
}

async fn sleep_until(deadline: Option<DateTime<Utc>>) {
    match deadline {
        Some(at) => {
            let wait = (at - Utc::now()).to_std().unwrap_or_default();
            tokio::time::sleep(wait).await;
        }
        None => std::future::pending().await,
    }
}
