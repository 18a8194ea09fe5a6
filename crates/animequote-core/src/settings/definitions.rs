//! Default settings set
//!
//! Seeded into the durable store on first run. Seeding only inserts keys
//! that do not exist yet, so administrator changes survive restarts.

use animequote_types::meta_adapter::{SettingKind, SettingRow};

use super::snapshot::validate_value;
use crate::prelude::*;

pub const CATEGORY_CORS: &str = "cors";
pub const CATEGORY_RATE_LIMITING: &str = "rate_limiting";
pub const CATEGORY_REQUEST_LIMITS: &str = "request_limits";
pub const CATEGORY_CONNECTION_LIMITS: &str = "connection_limits";
pub const CATEGORY_SECURITY: &str = "security";

/// Display order of the known categories
pub const CATEGORIES: [&str; 5] = [
	CATEGORY_CORS,
	CATEGORY_RATE_LIMITING,
	CATEGORY_REQUEST_LIMITS,
	CATEGORY_CONNECTION_LIMITS,
	CATEGORY_SECURITY,
];

pub const DEFAULT_CSP: &str = "default-src 'self'; script-src 'self' 'unsafe-inline'; style-src 'self' 'unsafe-inline'; img-src 'self' data:; font-src 'self'; connect-src 'self'";

/// Definition of a setting with its default value
#[derive(Debug, Clone)]
pub struct SettingDefinition {
	pub key: &'static str,
	pub kind: SettingKind,
	pub category: &'static str,
	pub description: &'static str,
	pub default: String,
	pub requires_reload: bool,
}

impl SettingDefinition {
	pub fn builder(key: &'static str) -> SettingDefinitionBuilder {
		SettingDefinitionBuilder::new(key)
	}

	/// Row to insert when seeding the store
	pub fn to_row(&self, updated_at: Timestamp) -> SettingRow {
		SettingRow {
			key: self.key.into(),
			value: self.default.as_str().into(),
			kind: self.kind,
			category: self.category.into(),
			description: self.description.into(),
			requires_reload: self.requires_reload,
			updated_at,
		}
	}
}

pub struct SettingDefinitionBuilder {
	key: &'static str,
	kind: SettingKind,
	category: &'static str,
	description: &'static str,
	default: Option<String>,
	requires_reload: bool,
}

impl SettingDefinitionBuilder {
	pub fn new(key: &'static str) -> Self {
		Self {
			key,
			kind: SettingKind::String,
			category: "general",
			description: "",
			default: None,
			requires_reload: false,
		}
	}

	pub fn category(mut self, category: &'static str) -> Self {
		self.category = category;
		self
	}

	pub fn description(mut self, description: &'static str) -> Self {
		self.description = description;
		self
	}

	pub fn string(mut self, value: &str) -> Self {
		self.kind = SettingKind::String;
		self.default = Some(value.to_string());
		self
	}

	pub fn int(mut self, value: i64) -> Self {
		self.kind = SettingKind::Int;
		self.default = Some(value.to_string());
		self
	}

	pub fn bool(mut self, value: bool) -> Self {
		self.kind = SettingKind::Bool;
		self.default = Some(value.to_string());
		self
	}

	pub fn string_list(mut self, values: &[&str]) -> Self {
		self.kind = SettingKind::Json;
		self.default = serde_json::to_string(values).ok();
		self
	}

	pub fn requires_reload(mut self, requires_reload: bool) -> Self {
		self.requires_reload = requires_reload;
		self
	}

	pub fn build(self) -> ClResult<SettingDefinition> {
		let Some(default) = self.default else {
			return Err(Error::ConfigError(format!("Setting {} has no default", self.key)));
		};
		validate_value(self.kind, &default)?;

		Ok(SettingDefinition {
			key: self.key,
			kind: self.kind,
			category: self.category,
			description: self.description,
			default,
			requires_reload: self.requires_reload,
		})
	}
}

/// Builds the full default settings set
pub fn default_settings() -> ClResult<Vec<SettingDefinition>> {
	let mut defs = Vec::with_capacity(32);

	// CORS
	defs.push(
		SettingDefinition::builder("cors_enabled")
			.category(CATEGORY_CORS)
			.description("Enable CORS headers")
			.bool(true)
			.build()?,
	);
	defs.push(
		SettingDefinition::builder("cors_allowed_origins")
			.category(CATEGORY_CORS)
			.description("Allowed origins (use * for all)")
			.string_list(&["*"])
			.build()?,
	);
	defs.push(
		SettingDefinition::builder("cors_allowed_methods")
			.category(CATEGORY_CORS)
			.description("Allowed HTTP methods")
			.string_list(&["GET", "POST", "PUT", "DELETE", "OPTIONS"])
			.build()?,
	);
	defs.push(
		SettingDefinition::builder("cors_allowed_headers")
			.category(CATEGORY_CORS)
			.description("Allowed request headers")
			.string_list(&["Content-Type", "Authorization"])
			.build()?,
	);
	defs.push(
		SettingDefinition::builder("cors_allow_credentials")
			.category(CATEGORY_CORS)
			.description("Allow credentials in CORS requests")
			.bool(false)
			.build()?,
	);
	defs.push(
		SettingDefinition::builder("cors_max_age")
			.category(CATEGORY_CORS)
			.description("Preflight cache duration in seconds")
			.int(3600)
			.build()?,
	);

	// Rate limiting
	defs.push(
		SettingDefinition::builder("rate_limit_enabled")
			.category(CATEGORY_RATE_LIMITING)
			.description("Enable rate limiting")
			.bool(true)
			.requires_reload(true)
			.build()?,
	);
	let tiers = [
		("rate_limit_global_rps", "Global requests per second", 100),
		("rate_limit_global_burst", "Global burst size", 200),
		("rate_limit_api_rps", "API requests per second", 50),
		("rate_limit_api_burst", "API burst size", 100),
		("rate_limit_admin_rps", "Admin requests per second", 10),
		("rate_limit_admin_burst", "Admin burst size", 20),
	];
	for (key, description, value) in tiers {
		defs.push(
			SettingDefinition::builder(key)
				.category(CATEGORY_RATE_LIMITING)
				.description(description)
				.int(value)
				.requires_reload(true)
				.build()?,
		);
	}

	// Request limits
	defs.push(
		SettingDefinition::builder("request_timeout")
			.category(CATEGORY_REQUEST_LIMITS)
			.description("Maximum request duration in seconds")
			.int(60)
			.requires_reload(true)
			.build()?,
	);
	defs.push(
		SettingDefinition::builder("request_max_body_size")
			.category(CATEGORY_REQUEST_LIMITS)
			.description("Maximum request body size in bytes")
			.int(10 * 1024 * 1024)
			.requires_reload(true)
			.build()?,
	);
	defs.push(
		SettingDefinition::builder("request_max_header_size")
			.category(CATEGORY_REQUEST_LIMITS)
			.description("Maximum request header size in bytes")
			.int(1024 * 1024)
			.requires_reload(true)
			.build()?,
	);

	// Connection limits
	defs.push(
		SettingDefinition::builder("connection_max_concurrent")
			.category(CATEGORY_CONNECTION_LIMITS)
			.description("Maximum concurrent requests")
			.int(1000)
			.requires_reload(true)
			.build()?,
	);
	defs.push(
		SettingDefinition::builder("connection_idle_timeout")
			.category(CATEGORY_CONNECTION_LIMITS)
			.description("Idle connection timeout in seconds")
			.int(120)
			.requires_reload(true)
			.build()?,
	);
	defs.push(
		SettingDefinition::builder("connection_read_timeout")
			.category(CATEGORY_CONNECTION_LIMITS)
			.description("Read timeout in seconds")
			.int(10)
			.requires_reload(true)
			.build()?,
	);
	defs.push(
		SettingDefinition::builder("connection_write_timeout")
			.category(CATEGORY_CONNECTION_LIMITS)
			.description("Write timeout in seconds")
			.int(10)
			.requires_reload(true)
			.build()?,
	);

	// Security headers
	let security_strings = [
		("security_frame_options", "X-Frame-Options header", "DENY"),
		("security_content_type_options", "X-Content-Type-Options header", "nosniff"),
		("security_xss_protection", "X-XSS-Protection header", "1; mode=block"),
		("security_referrer_policy", "Referrer-Policy header", "strict-origin-when-cross-origin"),
		(
			"security_permissions_policy",
			"Permissions-Policy header",
			"geolocation=(), microphone=(), camera=()",
		),
	];
	for (key, description, value) in security_strings {
		defs.push(
			SettingDefinition::builder(key)
				.category(CATEGORY_SECURITY)
				.description(description)
				.string(value)
				.build()?,
		);
	}
	defs.push(
		SettingDefinition::builder("security_csp_enabled")
			.category(CATEGORY_SECURITY)
			.description("Enable Content-Security-Policy")
			.bool(true)
			.build()?,
	);
	defs.push(
		SettingDefinition::builder("security_csp")
			.category(CATEGORY_SECURITY)
			.description("Content-Security-Policy header value")
			.string(DEFAULT_CSP)
			.build()?,
	);
	defs.push(
		SettingDefinition::builder("security_hsts_enabled")
			.category(CATEGORY_SECURITY)
			.description("Enable HSTS (HTTPS only)")
			.bool(true)
			.build()?,
	);
	defs.push(
		SettingDefinition::builder("security_hsts_max_age")
			.category(CATEGORY_SECURITY)
			.description("HSTS max-age in seconds")
			.int(31_536_000)
			.build()?,
	);
	defs.push(
		SettingDefinition::builder("security_hsts_include_subdomains")
			.category(CATEGORY_SECURITY)
			.description("Include subdomains in HSTS")
			.bool(true)
			.build()?,
	);

	Ok(defs)
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::collections::HashSet;

	#[test]
	fn test_defaults_are_valid_and_unique() {
		let defs = default_settings().unwrap();
		let keys: HashSet<_> = defs.iter().map(|d| d.key).collect();
		assert_eq!(keys.len(), defs.len());
		assert!(defs.iter().all(|d| CATEGORIES.contains(&d.category)));
	}

	#[test]
	fn test_reload_flag_by_category() {
		for def in default_settings().unwrap() {
			let expected = matches!(
				def.category,
				CATEGORY_RATE_LIMITING | CATEGORY_REQUEST_LIMITS | CATEGORY_CONNECTION_LIMITS
			);
			assert_eq!(def.requires_reload, expected, "{}", def.key);
		}
	}

	#[test]
	fn test_builder_requires_default() {
		assert!(SettingDefinition::builder("x").build().is_err());
	}
}

// vim: ts=4
