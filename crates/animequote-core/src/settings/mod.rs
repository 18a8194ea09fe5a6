//! Settings subsystem: defaults, snapshot cache, and derived configuration

pub mod config;
pub mod definitions;
pub mod memory;
pub mod service;
pub mod snapshot;

pub use config::{
	ConnectionLimitConfig, CorsConfig, RateLimitConfig, RequestLimitConfig, SecurityHeaderConfig,
	TierConfig,
};
pub use definitions::{SettingDefinition, default_settings};
pub use service::{ImportReport, SettingExport, SettingsOverview, SettingsService, UpdateOutcome};
pub use snapshot::SettingsSnapshot;

// vim: ts=4
