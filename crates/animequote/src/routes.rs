//! Router composition
//!
//! Global governance stages, outermost first: panic containment, security
//! headers, CORS, body-size cap, concurrency throttle, global rate limit,
//! request timeout, request logging.

use std::sync::Arc;

use axum::{
	Extension, Router, middleware,
	routing::{get, post},
};
use tower_http::{catch_panic::CatchPanicLayer, trace::TraceLayer};

use animequote_core::middleware::{
	body_limit, cors, handle_panic, request_timeout, security_headers, throttle,
};
use animequote_core::route_auth::require_admin;
use animequote_core::{RateLimitLayer, RateLimitTier};

use crate::prelude::*;
use crate::quote::QuoteStore;
use crate::{admin, handler};

fn rate_limit(app: &App, tier: RateLimitTier) -> RateLimitLayer {
	RateLimitLayer::new(app.rate_limiter.clone(), app.settings.clone(), tier)
}

fn init_api(app: &App) -> Router<App> {
	Router::new()
		.route("/api/v1/random", get(handler::get_random))
		.route("/api/v1/random.txt", get(handler::get_random_text))
		.route("/api/v1/quotes", get(handler::get_quotes))
		.route("/api/v1/quotes.txt", get(handler::get_quotes_text))
		.route("/api/v1/health", get(handler::get_health))
		.route("/api/v1/stats", get(handler::get_stats))
		.layer(rate_limit(app, RateLimitTier::Api))
}

fn init_admin(app: &App) -> Router<App> {
	let protected_router = Router::new()
		.route("/api/v1/admin/settings", get(admin::get_settings).put(admin::put_settings))
		.route("/api/v1/admin/settings/category/{category}", get(admin::get_settings_by_category))
		.route("/api/v1/admin/settings/reset", post(admin::post_settings_reset))
		.route("/api/v1/admin/settings/export", get(admin::get_settings_export))
		.route("/api/v1/admin/settings/import", post(admin::post_settings_import))
		.route("/api/v1/admin/stats", get(admin::get_stats))
		.route("/api/v1/admin/quotes", get(admin::get_quotes))
		.route("/api/v1/admin/token/rotate", post(admin::post_token_rotate))
		.route_layer(middleware::from_fn_with_state(app.clone(), require_admin));

	Router::new()
		.route("/api/v1/admin/login", post(admin::post_login))
		.merge(protected_router)
		.layer(rate_limit(app, RateLimitTier::Admin))
}

pub fn init(app: App, quotes: Arc<QuoteStore>) -> Router {
	Router::new()
		.route("/healthz", get(handler::get_healthz))
		.merge(init_api(&app))
		.merge(init_admin(&app))
		.layer(Extension(quotes))
		.layer(TraceLayer::new_for_http())
		.layer(middleware::from_fn_with_state(app.clone(), request_timeout))
		.layer(rate_limit(&app, RateLimitTier::Global))
		.layer(middleware::from_fn_with_state(app.clone(), throttle))
		.layer(middleware::from_fn_with_state(app.clone(), body_limit))
		.layer(middleware::from_fn_with_state(app.clone(), cors))
		.layer(middleware::from_fn_with_state(app.clone(), security_headers))
		.layer(CatchPanicLayer::custom(handle_panic))
		.with_state(app)
}

// vim: ts=4
