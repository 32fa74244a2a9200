//! CRM Core - Shared types library.
//!
//! This crate provides the types shared by every CRM component:
//! - `server` - The HTTP/JSON API and live notification channel
//! - `cli` - Command-line tools for migrations and user bootstrap
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no database access,
//! no HTTP clients. Database encoding is available behind the `postgres`
//! feature.
//!
//! # Modules
//!
//! - [`types`] - Newtype IDs, the validated [`Email`] and the caller [`Role`]

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
