//! Rate Limiting Middleware
//!
//! Tower middleware layer applying one rate-limit tier to Axum routes. The
//! tier budget is read from the settings snapshot on every request.

use std::sync::Arc;
use std::task::{Context, Poll};

use axum::body::Body;
use axum::response::IntoResponse;
use futures::future::BoxFuture;
use hyper::Request;
use tower::{Layer, Service};

use super::extractors::client_identity;
use super::limiter::{RateLimitManager, RateLimitTier};
use crate::settings::SettingsService;

/// Rate limit middleware layer
#[derive(Clone)]
pub struct RateLimitLayer {
	manager: Arc<RateLimitManager>,
	settings: Arc<SettingsService>,
	tier: RateLimitTier,
}

impl RateLimitLayer {
	/// Create a new rate limit layer
	pub fn new(
		manager: Arc<RateLimitManager>,
		settings: Arc<SettingsService>,
		tier: RateLimitTier,
	) -> Self {
		Self { manager, settings, tier }
	}
}

impl<S> Layer<S> for RateLimitLayer {
	type Service = RateLimitService<S>;

	fn layer(&self, inner: S) -> Self::Service {
		RateLimitService {
			inner,
			manager: self.manager.clone(),
			settings: self.settings.clone(),
			tier: self.tier,
		}
	}
}

/// Rate limit middleware service
#[derive(Clone)]
pub struct RateLimitService<S> {
	inner: S,
	manager: Arc<RateLimitManager>,
	settings: Arc<SettingsService>,
	tier: RateLimitTier,
}

impl<S> Service<Request<Body>> for RateLimitService<S>
where
	S: Service<Request<Body>, Response = axum::response::Response> + Clone + Send + 'static,
	S::Future: Send + 'static,
{
	type Response = S::Response;
	type Error = S::Error;
	type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

	fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
		self.inner.poll_ready(cx)
	}

	fn call(&mut self, req: Request<Body>) -> Self::Future {
		let manager = self.manager.clone();
		let settings = self.settings.clone();
		let tier = self.tier;
		// Take the service that was driven to readiness
		let clone = self.inner.clone();
		let mut inner = std::mem::replace(&mut self.inner, clone);

		Box::pin(async move {
			let config = settings.rate_limit_config();
			if config.enabled {
				let tier_config = match tier {
					RateLimitTier::Global => config.global,
					RateLimitTier::Api => config.api,
					RateLimitTier::Admin => config.admin,
				};
				let identity = client_identity(&req);
				if let Err(error) = manager.check(tier, &identity, &tier_config) {
					return Ok(error.into_response());
				}
			}

			inner.call(req).await
		})
	}
}

// vim: ts=4
