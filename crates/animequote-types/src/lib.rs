//! Shared types, adapter traits, and core utilities for the Anime Quotes API.
//!
//! This crate contains the foundational types that are shared between the
//! server crate and all adapter implementations. Extracting these into a
//! separate crate allows adapter crates to compile in parallel with the
//! governance modules.

pub mod auth_adapter;
pub mod error;
pub mod meta_adapter;
pub mod prelude;
pub mod types;

// vim: ts=4
