//! Core types for GamepadTest.
//!
//! This module provides type-safe wrappers for the blog domain.

pub mod blog;
pub mod email;
pub mod id;
pub mod slug;
pub mod status;

pub use blog::{AdminUser, Blog, BlogDraft, BlogPatch, DEFAULT_AUTHOR_ID, DraftError, NewBlog};
pub use email::{Email, EmailError};
pub use id::*;
pub use slug::{Slug, SlugError};
pub use status::Visibility;
