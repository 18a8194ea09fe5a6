//! Rate Limiting Module
//!
//! Per-tier fixed-window request limits keyed by client identity.
//!
//! Tiers:
//! - Global: wraps every route
//! - Api: wraps the public API
//! - Admin: wraps administrative routes

pub mod error;
pub mod extractors;
pub mod limiter;
pub mod middleware;

pub use error::RateLimitError;
pub use extractors::{client_identity, client_identity_from_parts};
pub use limiter::{FixedWindowLimiter, RateLimitManager, RateLimitTier, RateLimiterStats};
pub use middleware::RateLimitLayer;

// vim: ts=4
