//! Request governance stages observed over HTTP

mod common;

use std::time::Duration;

use axum::body::Body;
use axum::http::{StatusCode, header};
use axum::{Router, middleware, routing::get as get_route};
use tower_http::catch_panic::CatchPanicLayer;

use animequote_core::middleware::{handle_panic, request_timeout};

use common::*;

#[tokio::test]
async fn test_security_headers_on_every_response() {
	let (_app, router) = build_app().await;

	let res = get(&router, "/healthz", "10.0.0.1").await;
	let headers = res.headers();
	assert_eq!(headers["x-frame-options"], "DENY");
	assert_eq!(headers["x-content-type-options"], "nosniff");
	assert!(headers.contains_key("content-security-policy"));
	assert!(!headers.contains_key("strict-transport-security"));

	// Not found responses get them too
	let res = get(&router, "/nope", "10.0.0.1").await;
	assert_eq!(res.status(), StatusCode::NOT_FOUND);
	assert_eq!(res.headers()["x-frame-options"], "DENY");
}

#[tokio::test]
async fn test_hsts_behind_tls_proxy() {
	let (_app, router) = build_app().await;

	let req = request("GET", "/healthz", "10.0.0.1")
		.header("x-forwarded-proto", "https")
		.body(Body::empty())
		.unwrap();
	let res = send(&router, req).await;
	let hsts = res.headers()["strict-transport-security"].to_str().unwrap();
	assert!(hsts.starts_with("max-age=31536000"));
}

#[tokio::test]
async fn test_cors_preflight_short_circuits() {
	let (_app, router) = build_app().await;

	let req = request("OPTIONS", "/api/v1/random", "10.0.0.1")
		.header(header::ORIGIN, "https://example.com")
		.header("access-control-request-method", "GET")
		.body(Body::empty())
		.unwrap();
	let res = send(&router, req).await;
	assert_eq!(res.status(), StatusCode::OK);
	assert_eq!(res.headers()["access-control-allow-origin"], "*");
	assert!(res.headers().contains_key("access-control-allow-methods"));
	assert_eq!(res.headers()["access-control-max-age"], "3600");
}

#[tokio::test]
async fn test_cors_origin_list_from_settings() {
	let (app, router) = build_app().await;
	app.settings
		.update("cors_allowed_origins", r#"["https://anime.example"]"#)
		.await
		.unwrap();

	let req = request("GET", "/api/v1/random", "10.0.0.1")
		.header(header::ORIGIN, "https://anime.example")
		.body(Body::empty())
		.unwrap();
	let res = send(&router, req).await;
	assert_eq!(res.headers()["access-control-allow-origin"], "https://anime.example");

	let req = request("GET", "/api/v1/random", "10.0.0.1")
		.header(header::ORIGIN, "https://evil.example")
		.body(Body::empty())
		.unwrap();
	let res = send(&router, req).await;
	assert_eq!(res.status(), StatusCode::OK);
	assert!(!res.headers().contains_key("access-control-allow-origin"));
}

#[tokio::test]
async fn test_api_tier_rate_limit() {
	let (app, router) = build_app().await;
	app.settings.update("rate_limit_api_rps", "2").await.unwrap();

	for _ in 0..2 {
		let res = get(&router, "/api/v1/random", "10.0.0.7").await;
		assert_eq!(res.status(), StatusCode::OK);
	}

	let res = get(&router, "/api/v1/random", "10.0.0.7").await;
	assert_eq!(res.status(), StatusCode::TOO_MANY_REQUESTS);
	assert_eq!(res.headers()["x-ratelimit-tier"], "api");
	assert!(res.headers().contains_key("retry-after"));
	// Governance headers still apply to rejections
	assert_eq!(res.headers()["x-frame-options"], "DENY");

	// Other clients and other tiers are unaffected
	let res = get(&router, "/api/v1/random", "10.0.0.8").await;
	assert_eq!(res.status(), StatusCode::OK);
	let res = get(&router, "/healthz", "10.0.0.7").await;
	assert_eq!(res.status(), StatusCode::OK);

	assert!(app.rate_limiter.stats().total_rejected >= 1);
}

#[tokio::test]
async fn test_rate_limit_disabled() {
	let (app, router) = build_app().await;
	app.settings.update("rate_limit_api_rps", "1").await.unwrap();
	app.settings.update("rate_limit_enabled", "false").await.unwrap();

	for _ in 0..5 {
		let res = get(&router, "/api/v1/random", "10.0.0.9").await;
		assert_eq!(res.status(), StatusCode::OK);
	}
}

#[tokio::test]
async fn test_oversized_body_rejected() {
	let (app, router) = build_app().await;
	app.settings.update("request_max_body_size", "16").await.unwrap();

	let body = r#"{"security_frame_options":"SAMEORIGIN"}"#;
	let req = admin_request("PUT", "/api/v1/admin/settings", "10.0.0.1")
		.header(header::CONTENT_TYPE, "application/json")
		.header(header::CONTENT_LENGTH, body.len())
		.body(Body::from(body))
		.unwrap();
	let res = send(&router, req).await;
	assert_eq!(res.status(), StatusCode::PAYLOAD_TOO_LARGE);
	assert_eq!(body_json(res).await["error"]["code"], "E-PAYLOAD-TOO-LARGE");

	// Nothing was written
	assert_eq!(app.settings.get("security_frame_options").as_deref(), Some("DENY"));
}

#[tokio::test]
async fn test_lockout_after_failed_admin_attempts() {
	let (app, router) = build_app().await;
	let client = "192.0.2.50";

	for _ in 0..5 {
		let req = request("GET", "/api/v1/admin/settings", client)
			.header(header::AUTHORIZATION, "Bearer wrong")
			.body(Body::empty())
			.unwrap();
		assert_eq!(send(&router, req).await.status(), StatusCode::UNAUTHORIZED);
	}
	assert_eq!(app.brute_force.failure_count(client), Some(5));

	// Even the right token is refused while locked out
	let res = admin_get(&router, "/api/v1/admin/settings", client).await;
	assert_eq!(res.status(), StatusCode::TOO_MANY_REQUESTS);
	assert!(res.headers().contains_key("retry-after"));
	assert_eq!(body_json(res).await["error"]["code"], "E-AUTH-LOCKED");

	// Login is locked out as well
	let req = login_request(client, ADMIN_USER, ADMIN_PASSWORD);
	assert_eq!(send(&router, req).await.status(), StatusCode::TOO_MANY_REQUESTS);

	// Another client is unaffected
	let res = admin_get(&router, "/api/v1/admin/settings", "192.0.2.51").await;
	assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_success_clears_failures() {
	let (app, router) = build_app().await;
	let client = "192.0.2.60";

	for _ in 0..3 {
		let req = request("GET", "/api/v1/admin/stats", client).body(Body::empty()).unwrap();
		assert_eq!(send(&router, req).await.status(), StatusCode::UNAUTHORIZED);
	}
	assert_eq!(app.brute_force.failure_count(client), Some(3));

	let res = admin_get(&router, "/api/v1/admin/stats", client).await;
	assert_eq!(res.status(), StatusCode::OK);
	assert_eq!(app.brute_force.failure_count(client), None);
}

#[tokio::test]
async fn test_validation_outage_is_not_a_failure() {
	let (app, router) = build_app_with(StaticAuthAdapter::broken()).await;
	let client = "192.0.2.70";

	let res = admin_get(&router, "/api/v1/admin/settings", client).await;
	assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
	assert_eq!(app.brute_force.failure_count(client), None);
}

#[tokio::test]
async fn test_saturated_server_returns_503() {
	let (app, router) = build_app().await;

	let available = app.request_permits.available_permits();
	let held = app.request_permits.clone().try_acquire_many_owned(available as u32).unwrap();

	let res = get(&router, "/api/v1/random", "192.0.2.80").await;
	assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE);
	assert_eq!(body_json(res).await["error"]["code"], "E-UNAVAILABLE");

	drop(held);
	let res = get(&router, "/api/v1/random", "192.0.2.80").await;
	assert_eq!(res.status(), StatusCode::OK);
}

async fn slow_handler() -> &'static str {
	tokio::time::sleep(Duration::from_secs(5)).await;
	"done"
}

#[tokio::test(start_paused = true)]
async fn test_slow_request_times_out() {
	let (app, _router) = build_app().await;
	app.settings.update("request_timeout", "1").await.unwrap();

	let router = Router::new()
		.route("/slow", get_route(slow_handler))
		.layer(middleware::from_fn_with_state(app.clone(), request_timeout));

	let res = get(&router, "/slow", "192.0.2.81").await;
	assert_eq!(res.status(), StatusCode::REQUEST_TIMEOUT);
	assert_eq!(body_json(res).await["error"]["code"], "E-TIMEOUT");

	app.settings.update("request_timeout", "10").await.unwrap();
	let res = get(&router, "/slow", "192.0.2.81").await;
	assert_eq!(res.status(), StatusCode::OK);
	assert_eq!(body_text(res).await, "done");
}

#[allow(clippy::panic)]
async fn panicking_handler() -> &'static str {
	panic!("handler blew up")
}

#[tokio::test]
async fn test_panicking_handler_returns_500() {
	let router = Router::new()
		.route("/boom", get_route(panicking_handler))
		.layer(CatchPanicLayer::custom(handle_panic));

	let res = get(&router, "/boom", "192.0.2.82").await;
	assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
	let json = body_json(res).await;
	assert_eq!(json["error"]["code"], "E-INTERNAL");
	assert_eq!(json["error"]["message"], "Internal server error");

	// The server keeps serving after a panic
	let res = get(&router, "/boom", "192.0.2.82").await;
	assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

// vim: ts=4
