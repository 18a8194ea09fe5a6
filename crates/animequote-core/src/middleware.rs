//! Governance middlewares
//!
//! Each stage either forwards the request or terminates it with a status.
//! Settings-driven stages read the current settings snapshot per request,
//! so admin changes apply without a restart.

use std::any::Any;

use axum::{
	body::Body,
	extract::State,
	http::{HeaderMap, HeaderName, HeaderValue, Method, Request, StatusCode, header},
	middleware::Next,
	response::{IntoResponse, Response},
};
use http_body_util::Limited;

use crate::prelude::*;
use crate::settings::{CorsConfig, SecurityHeaderConfig};

fn set_header(headers: &mut HeaderMap, name: HeaderName, value: &str) {
	match HeaderValue::from_str(value) {
		Ok(value) => {
			headers.insert(name, value);
		}
		Err(_) => debug!("Skipping invalid {} header value: {:?}", name, value),
	}
}

/// True if the request arrived over TLS, directly or behind a proxy
fn is_secure<B>(req: &Request<B>) -> bool {
	req.uri().scheme_str() == Some("https")
		|| req
			.headers()
			.get("x-forwarded-proto")
			.and_then(|h| h.to_str().ok())
			.is_some_and(|proto| proto.trim().eq_ignore_ascii_case("https"))
}

fn apply_security_headers(headers: &mut HeaderMap, config: &SecurityHeaderConfig, secure: bool) {
	set_header(headers, header::X_FRAME_OPTIONS, &config.frame_options);
	set_header(headers, header::X_CONTENT_TYPE_OPTIONS, &config.content_type_options);
	set_header(headers, header::X_XSS_PROTECTION, &config.xss_protection);
	set_header(headers, header::REFERRER_POLICY, &config.referrer_policy);
	set_header(headers, HeaderName::from_static("permissions-policy"), &config.permissions_policy);

	if config.csp_enabled && !config.csp.is_empty() {
		set_header(headers, header::CONTENT_SECURITY_POLICY, &config.csp);
	}
	if secure && config.hsts_enabled {
		set_header(headers, header::STRICT_TRANSPORT_SECURITY, &config.hsts_value());
	}
}

/// Adds the configured security headers to every response
pub async fn security_headers(State(app): State<App>, req: Request<Body>, next: Next) -> Response {
	let config = app.settings.security_header_config();
	let secure = is_secure(&req);

	let mut res = next.run(req).await;
	apply_security_headers(res.headers_mut(), &config, secure);
	res
}

/// Value of `Access-Control-Allow-Origin` for a request origin, if allowed
fn allowed_origin(config: &CorsConfig, origin: Option<&str>) -> Option<String> {
	config.allowed_origins.iter().find_map(|allowed| {
		if allowed == "*" {
			Some("*".to_string())
		} else if origin == Some(allowed.as_str()) {
			Some(allowed.clone())
		} else {
			None
		}
	})
}

fn apply_cors_headers(headers: &mut HeaderMap, config: &CorsConfig, allow_origin: &str) {
	set_header(headers, header::ACCESS_CONTROL_ALLOW_ORIGIN, allow_origin);
	set_header(headers, header::ACCESS_CONTROL_ALLOW_METHODS, &config.allowed_methods.join(", "));
	set_header(headers, header::ACCESS_CONTROL_ALLOW_HEADERS, &config.allowed_headers.join(", "));
	if config.allow_credentials {
		headers.insert(header::ACCESS_CONTROL_ALLOW_CREDENTIALS, HeaderValue::from_static("true"));
	}
	headers.insert(header::ACCESS_CONTROL_MAX_AGE, HeaderValue::from(config.max_age));
}

/// CORS handling. Preflight requests are answered here.
pub async fn cors(State(app): State<App>, req: Request<Body>, next: Next) -> Response {
	let config = app.settings.cors_config();
	if !config.enabled {
		return next.run(req).await;
	}

	let origin = req.headers().get(header::ORIGIN).and_then(|h| h.to_str().ok());
	let allow_origin = allowed_origin(&config, origin);

	let mut res = if req.method() == Method::OPTIONS {
		StatusCode::OK.into_response()
	} else {
		next.run(req).await
	};

	if let Some(allow_origin) = allow_origin {
		apply_cors_headers(res.headers_mut(), &config, &allow_origin);
	}
	res
}

/// Rejects oversized bodies. Requests without a length get a capped body.
pub async fn body_limit(
	State(app): State<App>,
	req: Request<Body>,
	next: Next,
) -> ClResult<Response> {
	let max = app.settings.request_limit_config().max_body_size;

	let declared = req
		.headers()
		.get(header::CONTENT_LENGTH)
		.and_then(|h| h.to_str().ok())
		.and_then(|s| s.parse::<u64>().ok());
	if declared.is_some_and(|len| len > max as u64) {
		debug!("Rejecting body of {:?} bytes (max {})", declared, max);
		return Err(Error::PayloadTooLarge);
	}

	let req = req.map(|body| Body::new(Limited::new(body, max)));
	Ok(next.run(req).await)
}

/// Concurrency throttle: rejects with 503 when no permit is available
pub async fn throttle(State(app): State<App>, req: Request<Body>, next: Next) -> ClResult<Response> {
	let Ok(_permit) = app.request_permits.clone().try_acquire_owned() else {
		info!("Too many concurrent requests, rejecting {} {}", req.method(), req.uri());
		return Err(Error::ServiceUnavailable("Too many concurrent requests".into()));
	};

	Ok(next.run(req).await)
}

/// Terminates requests that run longer than the configured timeout
pub async fn request_timeout(
	State(app): State<App>,
	req: Request<Body>,
	next: Next,
) -> ClResult<Response> {
	let timeout = app.settings.request_limit_config().timeout;
	let method = req.method().clone();
	let uri = req.uri().clone();

	match tokio::time::timeout(timeout, next.run(req)).await {
		Ok(res) => Ok(res),
		Err(_) => {
			info!("Request timeout after {:?}: {} {}", timeout, method, uri);
			Err(Error::Timeout)
		}
	}
}

/// Response for a panic caught by `CatchPanicLayer`
pub fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response<Body> {
	let details = if let Some(s) = err.downcast_ref::<String>() {
		s.as_str()
	} else if let Some(s) = err.downcast_ref::<&str>() {
		s
	} else {
		"unknown panic"
	};
	error!("Panic recovered: {}", details);

	let body = serde_json::json!({
		"error": {
			"code": "E-INTERNAL",
			"message": "Internal server error",
		}
	});
	(StatusCode::INTERNAL_SERVER_ERROR, axum::Json(body)).into_response()
}

#[cfg(test)]
mod tests {
	use super::*;

	fn cors_config(origins: &[&str]) -> CorsConfig {
		CorsConfig {
			enabled: true,
			allowed_origins: origins.iter().map(|s| s.to_string()).collect(),
			allowed_methods: vec!["GET".into(), "POST".into()],
			allowed_headers: vec!["Content-Type".into()],
			allow_credentials: true,
			max_age: 600,
		}
	}

	#[test]
	fn test_allowed_origin() {
		let wildcard = cors_config(&["*"]);
		assert_eq!(allowed_origin(&wildcard, None).as_deref(), Some("*"));
		assert_eq!(allowed_origin(&wildcard, Some("https://a.example")).as_deref(), Some("*"));

		let exact = cors_config(&["https://a.example", "https://b.example"]);
		assert_eq!(
			allowed_origin(&exact, Some("https://b.example")).as_deref(),
			Some("https://b.example")
		);
		assert_eq!(allowed_origin(&exact, Some("https://c.example")), None);
		assert_eq!(allowed_origin(&exact, None), None);
	}

	#[test]
	fn test_cors_headers() {
		let config = cors_config(&["*"]);
		let mut headers = HeaderMap::new();
		apply_cors_headers(&mut headers, &config, "*");

		assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
		assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_METHODS], "GET, POST");
		assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_HEADERS], "Content-Type");
		assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_CREDENTIALS], "true");
		assert_eq!(headers[header::ACCESS_CONTROL_MAX_AGE], "600");
	}

	fn security_config() -> SecurityHeaderConfig {
		SecurityHeaderConfig {
			frame_options: "DENY".into(),
			content_type_options: "nosniff".into(),
			xss_protection: "1; mode=block".into(),
			referrer_policy: "no-referrer".into(),
			permissions_policy: "camera=()".into(),
			csp_enabled: true,
			csp: "default-src 'self'".into(),
			hsts_enabled: true,
			hsts_max_age: 100,
			hsts_include_subdomains: false,
		}
	}

	#[test]
	fn test_hsts_only_when_secure() {
		let config = security_config();

		let mut plain = HeaderMap::new();
		apply_security_headers(&mut plain, &config, false);
		assert_eq!(plain[header::X_FRAME_OPTIONS], "DENY");
		assert_eq!(plain[header::CONTENT_SECURITY_POLICY], "default-src 'self'");
		assert!(plain.get(header::STRICT_TRANSPORT_SECURITY).is_none());

		let mut secure = HeaderMap::new();
		apply_security_headers(&mut secure, &config, true);
		assert_eq!(secure[header::STRICT_TRANSPORT_SECURITY], "max-age=100");
	}

	#[test]
	fn test_csp_skipped_when_disabled_or_empty() {
		let mut config = security_config();
		config.csp = String::new();
		let mut headers = HeaderMap::new();
		apply_security_headers(&mut headers, &config, false);
		assert!(headers.get(header::CONTENT_SECURITY_POLICY).is_none());

		let mut config = security_config();
		config.csp_enabled = false;
		let mut headers = HeaderMap::new();
		apply_security_headers(&mut headers, &config, false);
		assert!(headers.get(header::CONTENT_SECURITY_POLICY).is_none());
	}

	#[test]
	fn test_is_secure() {
		let req = Request::builder()
			.uri("/x")
			.header("X-Forwarded-Proto", "HTTPS")
			.body(())
			.unwrap();
		assert!(is_secure(&req));

		let req = Request::builder().uri("/x").body(()).unwrap();
		assert!(!is_secure(&req));

		let req = Request::builder().uri("https://a.example/x").body(()).unwrap();
		assert!(is_secure(&req));
	}

	#[test]
	fn test_panic_response() {
		let res = handle_panic(Box::new("boom"));
		assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
	}
}

// vim: ts=4
