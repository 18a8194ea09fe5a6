//! Admin authentication middleware with brute-force protection.
//!
//! The token comes from `Authorization: Bearer <token>` or, when that header
//! is absent, from the `admin_token` cookie. Every authentication failure is
//! counted against the client identity; a locked-out identity is rejected
//! before its credentials are looked at.

use axum::{
	body::Body,
	extract::State,
	http::{HeaderMap, Request, header},
	middleware::Next,
	response::{IntoResponse, Response},
};

use crate::prelude::*;
use crate::rate_limit::{RateLimitError, client_identity};

pub const ADMIN_TOKEN_COOKIE: &str = "admin_token";

#[derive(Debug, PartialEq, Eq)]
enum TokenSource<'a> {
	Token(&'a str),
	Malformed,
	Missing,
}

fn cookie_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
	headers
		.get_all(header::COOKIE)
		.iter()
		.filter_map(|h| h.to_str().ok())
		.flat_map(|h| h.split(';'))
		.filter_map(|pair| pair.trim().split_once('='))
		.find(|(key, _)| *key == name)
		.map(|(_, value)| value.trim())
}

fn extract_token(headers: &HeaderMap) -> TokenSource<'_> {
	if let Some(auth_header) = headers.get(header::AUTHORIZATION) {
		let Ok(auth_header) = auth_header.to_str() else {
			return TokenSource::Malformed;
		};
		return match auth_header.split_once(' ') {
			Some(("Bearer", token)) if !token.trim().is_empty() => TokenSource::Token(token.trim()),
			_ => TokenSource::Malformed,
		};
	}

	match cookie_value(headers, ADMIN_TOKEN_COOKIE) {
		Some(token) if !token.is_empty() => TokenSource::Token(token),
		_ => TokenSource::Missing,
	}
}

fn reject(app: &App, identity: &str, reason: &str) -> Response {
	let failures = app.brute_force.record_failure(identity);
	info!("Admin authentication failed for {}: {} ({} failures)", identity, reason, failures);
	Error::Unauthorized.into_response()
}

/// Guards administrative routes
pub async fn require_admin(State(app): State<App>, req: Request<Body>, next: Next) -> Response {
	let identity = client_identity(&req);

	if let Some(retry_after) = app.brute_force.blocked_for(&identity) {
		debug!("Admin request from locked out identity {}", identity);
		return RateLimitError::LockedOut { retry_after }.into_response();
	}

	let token = match extract_token(req.headers()) {
		TokenSource::Token(token) => token,
		TokenSource::Malformed => return reject(&app, &identity, "malformed authorization header"),
		TokenSource::Missing => return reject(&app, &identity, "missing token"),
	};

	match app.auth_adapter.validate_token(token).await {
		Ok(true) => {
			app.brute_force.record_success(&identity);
			next.run(req).await
		}
		Ok(false) => reject(&app, &identity, "invalid token"),
		Err(err) => {
			warn!("Token validation failed: {}", err);
			Error::Internal("token validation failed".into()).into_response()
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use axum::http::HeaderValue;

	fn headers(pairs: &[(header::HeaderName, &str)]) -> HeaderMap {
		let mut map = HeaderMap::new();
		for (name, value) in pairs {
			map.append(name.clone(), HeaderValue::from_str(value).unwrap());
		}
		map
	}

	#[test]
	fn test_bearer_token() {
		let h = headers(&[(header::AUTHORIZATION, "Bearer abc123")]);
		assert_eq!(extract_token(&h), TokenSource::Token("abc123"));
	}

	#[test]
	fn test_malformed_header_does_not_fall_back_to_cookie() {
		for value in ["abc123", "Basic abc123", "Bearer ", "bearer abc"] {
			let h = headers(&[
				(header::AUTHORIZATION, value),
				(header::COOKIE, "admin_token=fromcookie"),
			]);
			assert_eq!(extract_token(&h), TokenSource::Malformed, "{}", value);
		}
	}

	#[test]
	fn test_cookie_fallback() {
		let h = headers(&[(header::COOKIE, "theme=dark; admin_token=tok42")]);
		assert_eq!(extract_token(&h), TokenSource::Token("tok42"));

		let h = headers(&[(header::COOKIE, "theme=dark"), (header::COOKIE, "admin_token=second")]);
		assert_eq!(extract_token(&h), TokenSource::Token("second"));
	}

	#[test]
	fn test_missing_token() {
		assert_eq!(extract_token(&HeaderMap::new()), TokenSource::Missing);
		let h = headers(&[(header::COOKIE, "admin_token=")]);
		assert_eq!(extract_token(&h), TokenSource::Missing);
	}
}

// vim: ts=4
