//! Services backed by the hosted project.
//!
//! - `auth` - Admin sign-in, session tracking and token verification

pub mod auth;
