//! Rate Limiting Error Types
//!
//! Governance rejections rendered as terminal HTTP responses.

use std::time::Duration;

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use super::limiter::RateLimitTier;

/// Rate limit error types
#[derive(Debug)]
pub enum RateLimitError {
	/// Request budget of a tier exhausted for the current window
	RateLimited {
		/// Which tier triggered the limit
		tier: RateLimitTier,
		/// Time until the window resets
		retry_after: Duration,
	},
	/// Too many failed authentication attempts
	LockedOut {
		/// Remaining lockout duration
		retry_after: Duration,
	},
}

impl std::fmt::Display for RateLimitError {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			RateLimitError::RateLimited { tier, retry_after } => {
				write!(f, "Rate limited at {} tier, retry after {:?}", tier, retry_after)
			}
			RateLimitError::LockedOut { retry_after } => {
				write!(f, "Locked out after failed attempts, retry after {:?}", retry_after)
			}
		}
	}
}

impl std::error::Error for RateLimitError {}

/// Retry hint in whole seconds, never zero
fn retry_secs(retry_after: Duration) -> u64 {
	let secs = retry_after.as_secs() + u64::from(retry_after.subsec_nanos() > 0);
	secs.max(1)
}

impl IntoResponse for RateLimitError {
	fn into_response(self) -> Response {
		let (body, retry, tier) = match self {
			RateLimitError::RateLimited { tier, retry_after } => {
				let retry = retry_secs(retry_after);
				let body = serde_json::json!({
					"error": {
						"code": "E-RATE-LIMITED",
						"message": "Too many requests. Please slow down.",
						"details": {
							"tier": tier.as_str(),
							"retryAfter": retry
						}
					}
				});
				(body, retry, Some(tier))
			}
			RateLimitError::LockedOut { retry_after } => {
				let retry = retry_secs(retry_after);
				let body = serde_json::json!({
					"error": {
						"code": "E-AUTH-LOCKED",
						"message": "Too many failed attempts. Please try again later.",
						"details": {
							"retryAfter": retry
						}
					}
				});
				(body, retry, None)
			}
		};

		let mut response = (StatusCode::TOO_MANY_REQUESTS, Json(body)).into_response();

		if let Ok(val) = retry.to_string().parse() {
			response.headers_mut().insert("Retry-After", val);
		}
		if let Some(tier) = tier
			&& let Ok(val) = tier.as_str().parse()
		{
			response.headers_mut().insert("X-RateLimit-Tier", val);
		}

		response
	}
}


// vim: ts=4
