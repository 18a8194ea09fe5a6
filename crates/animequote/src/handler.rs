//! Public quote endpoints

use std::sync::Arc;

use axum::{Extension, Json, extract::State};
use serde::Serialize;

use crate::admin::format_uptime;
use crate::prelude::*;
use crate::quote::{Quote, QuoteStore};

/// GET /api/v1/random
pub async fn get_random(Extension(quotes): Extension<Arc<QuoteStore>>) -> ClResult<Json<Quote>> {
	quotes.random().await.map(Json).ok_or(Error::NotFound)
}

/// GET /api/v1/random.txt
pub async fn get_random_text(Extension(quotes): Extension<Arc<QuoteStore>>) -> ClResult<String> {
	let quote = quotes.random().await.ok_or(Error::NotFound)?;
	Ok(format!("{}\n", quote))
}

/// GET /api/v1/quotes
pub async fn get_quotes(Extension(quotes): Extension<Arc<QuoteStore>>) -> Json<Vec<Quote>> {
	Json(quotes.all().await.as_ref().clone())
}

/// GET /api/v1/quotes.txt
pub async fn get_quotes_text(Extension(quotes): Extension<Arc<QuoteStore>>) -> String {
	quotes.all().await.iter().map(|q| format!("{}\n\n", q)).collect()
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
	pub status: &'static str,
	pub timestamp: String,
	pub total_quotes: usize,
	pub uptime: String,
	pub version: &'static str,
}

/// GET /api/v1/health
pub async fn get_health(
	State(app): State<App>,
	Extension(quotes): Extension<Arc<QuoteStore>>,
) -> Json<HealthResponse> {
	Json(HealthResponse {
		status: "healthy",
		timestamp: chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Secs, true),
		total_quotes: quotes.len().await,
		uptime: format_uptime(app.uptime()),
		version: animequote_core::app::VERSION,
	})
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsResponse {
	pub total_quotes: usize,
	pub uptime: String,
	pub platform: String,
}

/// GET /api/v1/stats
pub async fn get_stats(
	State(app): State<App>,
	Extension(quotes): Extension<Arc<QuoteStore>>,
) -> Json<StatsResponse> {
	Json(StatsResponse {
		total_quotes: quotes.len().await,
		uptime: format_uptime(app.uptime()),
		platform: format!("{}/{}", std::env::consts::OS, std::env::consts::ARCH),
	})
}

/// GET /healthz - liveness probe
pub async fn get_healthz() -> &'static str {
	"OK"
}

// vim: ts=4
