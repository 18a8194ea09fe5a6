//! Request governance for the Anime Quotes API.
//!
//! Settings cache, per-tier rate limiting, the brute-force guard, the cron
//! scheduler, and the middlewares that apply them to incoming requests.

#![deny(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![forbid(unsafe_code)]

pub mod app;
pub mod brute_force;
pub mod middleware;
pub mod prelude;
pub mod rate_limit;
pub mod route_auth;
pub mod scheduler;
pub mod settings;

pub use app::{App, AppBuilderOpts, AppState};
pub use brute_force::BruteForceGuard;
pub use rate_limit::{RateLimitLayer, RateLimitManager, RateLimitTier};
pub use scheduler::Scheduler;
pub use settings::SettingsService;

// vim: ts=4
