//! GamepadTest Core - Shared types library.
//!
//! This crate provides the types shared by the GamepadTest components:
//! - `site` - Public site, blog API and server-side rendering
//! - `cli` - Admin command-line client
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no HTTP
//! clients. Row storage and authentication live in the `site` crate.
//!
//! # Modules
//!
//! - [`types`] - Blog entity, payloads, slugs, emails and typed IDs

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
