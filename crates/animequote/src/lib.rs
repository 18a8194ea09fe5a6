//! Anime Quotes API server.
//!
//! Serves random anime quotes over HTTP behind a request-governance stack:
//!
//! - settings cache backed by a durable store, editable through the admin API
//! - per-client rate limits on three tiers (global, public API, admin)
//! - brute-force lockout on the admin authentication path
//! - a minute-resolution scheduler for maintenance tasks

// Re-export shared types and adapter traits from animequote-types
pub use animequote_types::auth_adapter;
pub use animequote_types::error;
pub use animequote_types::meta_adapter;
pub use animequote_types::types;

pub use animequote_core::rate_limit;
pub use animequote_core::scheduler;
pub use animequote_core::settings;

// Local modules
pub mod admin;
pub mod app;
pub mod bootstrap;
pub mod handler;
pub mod prelude;
pub mod quote;
pub mod routes;
pub mod tasks;

pub use crate::app::{App, AppBuilder};

// vim: ts=4
