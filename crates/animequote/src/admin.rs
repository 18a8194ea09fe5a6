//! Administrative API: login, settings management, and server statistics

use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
	Extension, Json,
	extract::{ConnectInfo, Path, State},
	http::{Extensions, HeaderMap, HeaderValue, header},
	response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};

use animequote_core::rate_limit::{RateLimitError, RateLimiterStats, client_identity_from_parts};
use animequote_core::route_auth::ADMIN_TOKEN_COOKIE;
use animequote_core::settings::SettingExport;
use animequote_core::settings::definitions::CATEGORIES;
use animequote_types::meta_adapter::SettingRow;

use crate::prelude::*;
use crate::quote::{Quote, QuoteStore};

pub const EXPORT_FILENAME: &str = "anime-settings.json";

/// Renders a duration the way operators read it: `3h25m7s`
pub fn format_uptime(uptime: std::time::Duration) -> String {
	let secs = uptime.as_secs();
	let (hours, minutes, seconds) = (secs / 3600, (secs % 3600) / 60, secs % 60);
	if hours > 0 {
		format!("{}h{}m{}s", hours, minutes, seconds)
	} else if minutes > 0 {
		format!("{}m{}s", minutes, seconds)
	} else {
		format!("{}s", seconds)
	}
}

// Login
//*******

#[derive(Deserialize)]
pub struct LoginRequest {
	pub username: String,
	pub password: String,
}

#[derive(Serialize)]
pub struct LoginResponse {
	pub success: bool,
	pub token: Box<str>,
}

/// POST /api/v1/admin/login - exchanges credentials for the admin token
pub async fn post_login(
	State(app): State<App>,
	headers: HeaderMap,
	extensions: Extensions,
	Json(login): Json<LoginRequest>,
) -> ClResult<Response> {
	let peer = extensions.get::<ConnectInfo<SocketAddr>>().map(|ci| ci.0);
	let identity = client_identity_from_parts(&headers, peer);

	if let Some(retry_after) = app.brute_force.blocked_for(&identity) {
		debug!("Login attempt from locked out identity {}", identity);
		return Ok(RateLimitError::LockedOut { retry_after }.into_response());
	}

	let Some(token) = app.auth_adapter.authenticate_admin(&login.username, &login.password).await?
	else {
		let failures = app.brute_force.record_failure(&identity);
		info!("Failed login for {} from {} ({} failures)", login.username, identity, failures);
		return Err(Error::Unauthorized);
	};

	app.brute_force.record_success(&identity);
	info!("Admin {} logged in from {}", login.username, identity);

	token_response(token)
}

/// JSON body with the token, plus the session cookie carrying it
fn token_response(token: Box<str>) -> ClResult<Response> {
	let cookie = format!("{}={}; HttpOnly; SameSite=Strict; Path=/", ADMIN_TOKEN_COOKIE, token);
	let cookie = HeaderValue::from_str(&cookie)
		.map_err(|_| Error::Internal("invalid token characters".into()))?;
	let mut res = Json(LoginResponse { success: true, token }).into_response();
	res.headers_mut().insert(header::SET_COOKIE, cookie);
	Ok(res)
}

/// POST /api/v1/admin/token/rotate - replaces the admin token; the old one stops working
pub async fn post_token_rotate(State(app): State<App>) -> ClResult<Response> {
	let token = app.auth_adapter.rotate_token(&app.opts.admin_user).await?;
	info!("Admin token rotated for {}", app.opts.admin_user);
	token_response(token)
}

// Settings
//**********

#[derive(Serialize)]
pub struct SettingsResponse {
	pub settings: BTreeMap<Box<str>, Vec<SettingRow>>,
	pub categories: Vec<Box<str>>,
}

/// GET /api/v1/admin/settings
pub async fn get_settings(State(app): State<App>) -> ClResult<Json<SettingsResponse>> {
	let overview = app.settings.list_grouped().await?;
	Ok(Json(SettingsResponse { settings: overview.settings, categories: overview.categories }))
}

#[derive(Serialize)]
pub struct CategoryResponse {
	pub category: String,
	pub settings: Vec<SettingRow>,
}

/// GET /api/v1/admin/settings/category/{category}
pub async fn get_settings_by_category(
	State(app): State<App>,
	Path(category): Path<String>,
) -> ClResult<Json<CategoryResponse>> {
	let settings = app.settings.list_by_category(&category).await?;
	if settings.is_empty() && !CATEGORIES.contains(&category.as_str()) {
		return Err(Error::NotFound);
	}
	Ok(Json(CategoryResponse { category, settings }))
}

#[derive(Serialize)]
pub struct UpdateSettingsResponse {
	pub success: bool,
	pub message: &'static str,
	pub requires_reload: bool,
	pub updated_count: usize,
}

/// PUT /api/v1/admin/settings - bulk update from a key to value map
pub async fn put_settings(
	State(app): State<App>,
	Json(changes): Json<BTreeMap<String, String>>,
) -> ClResult<Json<UpdateSettingsResponse>> {
	let outcome = app.settings.update_many(&changes).await?;
	if outcome.requires_reload {
		info!("Updated settings take full effect after a restart");
	}

	Ok(Json(UpdateSettingsResponse {
		success: true,
		message: "Settings updated successfully",
		requires_reload: outcome.requires_reload,
		updated_count: outcome.updated_count,
	}))
}

#[derive(Serialize)]
pub struct MessageResponse {
	pub success: bool,
	pub message: &'static str,
}

/// POST /api/v1/admin/settings/reset
pub async fn post_settings_reset(State(app): State<App>) -> ClResult<Json<MessageResponse>> {
	app.settings.reset_to_defaults().await?;
	Ok(Json(MessageResponse { success: true, message: "Settings reset to defaults successfully" }))
}

/// GET /api/v1/admin/settings/export - downloadable settings document
pub async fn get_settings_export(State(app): State<App>) -> ClResult<Response> {
	let export: BTreeMap<Box<str>, SettingExport> = app.settings.export().await?;
	let disposition = format!("attachment; filename={}", EXPORT_FILENAME);

	Ok(([(header::CONTENT_DISPOSITION, disposition)], Json(export)).into_response())
}

#[derive(Serialize)]
pub struct ImportResponse {
	pub success: bool,
	pub message: &'static str,
	pub imported_count: usize,
	pub skipped: Vec<Box<str>>,
}

/// POST /api/v1/admin/settings/import - accepts an export document
pub async fn post_settings_import(
	State(app): State<App>,
	Json(document): Json<BTreeMap<String, serde_json::Value>>,
) -> ClResult<Json<ImportResponse>> {
	let mut skipped: Vec<Box<str>> = Vec::new();
	let mut entries = BTreeMap::new();
	for (key, entry) in document {
		match entry.get("value") {
			Some(serde_json::Value::String(value)) => {
				entries.insert(key, value.clone());
			}
			_ => {
				debug!("Import entry {} has no string value", key);
				skipped.push(key.into());
			}
		}
	}

	let report = app.settings.import(&entries).await?;
	skipped.extend(report.skipped);

	Ok(Json(ImportResponse {
		success: true,
		message: "Settings imported successfully",
		imported_count: report.imported,
		skipped,
	}))
}

// Stats
//*******

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminStatsResponse {
	pub total_quotes: usize,
	pub uptime: String,
	pub version: &'static str,
	pub server_address: Box<str>,
	pub rate_limiter: RateLimiterStats,
	pub tracked_auth_failures: usize,
	pub scheduled_tasks: Vec<Box<str>>,
}

/// GET /api/v1/admin/stats
pub async fn get_stats(
	State(app): State<App>,
	Extension(quotes): Extension<Arc<QuoteStore>>,
) -> Json<AdminStatsResponse> {
	Json(AdminStatsResponse {
		total_quotes: quotes.len().await,
		uptime: format_uptime(app.uptime()),
		version: animequote_core::app::VERSION,
		server_address: app.opts.listen.clone(),
		rate_limiter: app.rate_limiter.stats(),
		tracked_auth_failures: app.brute_force.len(),
		scheduled_tasks: app.scheduler.task_names(),
	})
}

/// GET /api/v1/admin/quotes - the full loaded dataset
pub async fn get_quotes(Extension(quotes): Extension<Arc<QuoteStore>>) -> Json<Vec<Quote>> {
	Json(quotes.all().await.as_ref().clone())
}


// vim: ts=4
