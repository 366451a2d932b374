//! Admin authentication.
//!
//! The hosted auth service issues and refreshes sessions; this module wraps
//! it for two audiences:
//!
//! - the server, which verifies bearer tokens ([`TokenVerifier`]) and asks the
//!   auth endpoints to sign users in ([`AuthApi`])
//! - interactive clients, which keep a session ([`SessionClient`]) and follow
//!   the admin sign-in state ([`AdminAuth`])

mod api;
mod context;
mod error;
#[cfg(test)]
mod fake;
mod session;
mod token;

pub use api::{AuthApi, AuthSession, AuthUser, GoTrueApi, SignUpOutcome};
pub use context::{AdminAuth, AdminAuthState};
pub use error::AuthError;
pub use session::{AuthChangeEvent, AuthSubscription, SessionClient};
pub use token::{TokenError, TokenVerifier, VerifiedToken};
