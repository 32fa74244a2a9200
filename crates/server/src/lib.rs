//! CRM API server library.
//!
//! Multi-tenant CRM backend: bearer-authenticated CRUD over customers,
//! tasks, deals, reports and notifications. Every query is scoped by the
//! caller's identity through [`policy`]; qualifying mutations notify the
//! affected user through [`services::Notifier`] and the live `/socket`
//! channel.
//!
//! The binary lives in `main.rs`; the library is shared with `crm-cli`.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod events;
pub mod middleware;
pub mod models;
pub mod policy;
pub mod routes;
pub mod services;
pub mod state;

pub use config::CrmConfig;
pub use error::AppError;
pub use state::AppState;
