//! Structured configuration derived from the settings snapshot

use std::time::Duration;

use super::definitions::DEFAULT_CSP;
use super::snapshot::SettingsSnapshot;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorsConfig {
	pub enabled: bool,
	pub allowed_origins: Vec<String>,
	pub allowed_methods: Vec<String>,
	pub allowed_headers: Vec<String>,
	pub allow_credentials: bool,
	pub max_age: i64,
}

/// Budget of a single rate-limit tier
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TierConfig {
	pub budget: u32,
	pub window: Duration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitConfig {
	pub enabled: bool,
	pub global: TierConfig,
	pub api: TierConfig,
	pub admin: TierConfig,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecurityHeaderConfig {
	pub frame_options: String,
	pub content_type_options: String,
	pub xss_protection: String,
	pub referrer_policy: String,
	pub permissions_policy: String,
	pub csp_enabled: bool,
	pub csp: String,
	pub hsts_enabled: bool,
	pub hsts_max_age: i64,
	pub hsts_include_subdomains: bool,
}

impl SecurityHeaderConfig {
	/// Strict-Transport-Security header value
	pub fn hsts_value(&self) -> String {
		if self.hsts_include_subdomains {
			format!("max-age={}; includeSubDomains", self.hsts_max_age)
		} else {
			format!("max-age={}", self.hsts_max_age)
		}
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestLimitConfig {
	pub timeout: Duration,
	pub max_body_size: usize,
	pub max_header_size: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectionLimitConfig {
	pub max_concurrent: usize,
	pub idle_timeout: Duration,
	pub read_timeout: Duration,
	pub write_timeout: Duration,
}

const RATE_LIMIT_WINDOW: Duration = Duration::from_secs(1);

fn positive_secs(value: i64, default: u64) -> Duration {
	Duration::from_secs(u64::try_from(value).ok().filter(|v| *v > 0).unwrap_or(default))
}

fn positive_usize(value: i64, default: usize) -> usize {
	usize::try_from(value).ok().filter(|v| *v > 0).unwrap_or(default)
}

impl SettingsSnapshot {
	pub fn cors_config(&self) -> CorsConfig {
		CorsConfig {
			enabled: self.get_bool("cors_enabled", true),
			allowed_origins: self.get_string_list("cors_allowed_origins", &["*"]),
			allowed_methods: self.get_string_list(
				"cors_allowed_methods",
				&["GET", "POST", "PUT", "DELETE", "OPTIONS"],
			),
			allowed_headers: self
				.get_string_list("cors_allowed_headers", &["Content-Type", "Authorization"]),
			allow_credentials: self.get_bool("cors_allow_credentials", false),
			max_age: self.get_int("cors_max_age", 3600),
		}
	}

	pub fn rate_limit_config(&self) -> RateLimitConfig {
		let tier = |key: &str, default: u32| TierConfig {
			budget: u32::try_from(self.get_int(key, i64::from(default))).unwrap_or(default),
			window: RATE_LIMIT_WINDOW,
		};

		RateLimitConfig {
			enabled: self.get_bool("rate_limit_enabled", true),
			global: tier("rate_limit_global_rps", 100),
			api: tier("rate_limit_api_rps", 50),
			admin: tier("rate_limit_admin_rps", 10),
		}
	}

	pub fn security_header_config(&self) -> SecurityHeaderConfig {
		SecurityHeaderConfig {
			frame_options: self.get_string("security_frame_options", "DENY"),
			content_type_options: self.get_string("security_content_type_options", "nosniff"),
			xss_protection: self.get_string("security_xss_protection", "1; mode=block"),
			referrer_policy: self
				.get_string("security_referrer_policy", "strict-origin-when-cross-origin"),
			permissions_policy: self.get_string(
				"security_permissions_policy",
				"geolocation=(), microphone=(), camera=()",
			),
			csp_enabled: self.get_bool("security_csp_enabled", true),
			csp: self.get_string("security_csp", DEFAULT_CSP),
			hsts_enabled: self.get_bool("security_hsts_enabled", true),
			hsts_max_age: self.get_int("security_hsts_max_age", 31_536_000),
			hsts_include_subdomains: self.get_bool("security_hsts_include_subdomains", true),
		}
	}

	pub fn request_limit_config(&self) -> RequestLimitConfig {
		RequestLimitConfig {
			timeout: positive_secs(self.get_int("request_timeout", 60), 60),
			max_body_size: positive_usize(
				self.get_int("request_max_body_size", 10 * 1024 * 1024),
				10 * 1024 * 1024,
			),
			max_header_size: positive_usize(
				self.get_int("request_max_header_size", 1024 * 1024),
				1024 * 1024,
			),
		}
	}

	pub fn connection_limit_config(&self) -> ConnectionLimitConfig {
		ConnectionLimitConfig {
			max_concurrent: positive_usize(self.get_int("connection_max_concurrent", 1000), 1000),
			idle_timeout: positive_secs(self.get_int("connection_idle_timeout", 120), 120),
			read_timeout: positive_secs(self.get_int("connection_read_timeout", 10), 10),
			write_timeout: positive_secs(self.get_int("connection_write_timeout", 10), 10),
		}
	}
}


// vim: ts=4
