//! Rate Limit Manager
//!
//! Fixed-window counters keyed by `(tier, identity)`. A bucket's window
//! starts at the first request seen after the previous window expired, so
//! windows are not aligned across identities. Up to twice the budget can
//! pass across a window seam; that burst is accepted.
//!
//! Each tier keeps its buckets in an LRU bounded by `max_tracked`, and
//! `sweep_expired` drops buckets whose window has elapsed.

use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use lru::LruCache;
use parking_lot::Mutex;
use serde::Serialize;

use super::error::RateLimitError;
use crate::prelude::*;
use crate::settings::TierConfig;

/// Default number of identities tracked per tier
pub const DEFAULT_MAX_TRACKED: NonZeroUsize = match NonZeroUsize::new(10_000) {
	Some(v) => v,
	None => unreachable!(),
};

/// Rate-limiting scope
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RateLimitTier {
	Global,
	Api,
	Admin,
}

impl RateLimitTier {
	pub fn as_str(&self) -> &'static str {
		match self {
			RateLimitTier::Global => "global",
			RateLimitTier::Api => "api",
			RateLimitTier::Admin => "admin",
		}
	}
}

impl std::fmt::Display for RateLimitTier {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.write_str(self.as_str())
	}
}

#[derive(Debug, Clone, Copy)]
struct Bucket {
	window_start: Instant,
	window: Duration,
	count: u32,
}

impl Bucket {
	fn expired(&self, now: Instant) -> bool {
		now.saturating_duration_since(self.window_start) >= self.window
	}
}

/// Fixed-window limiter for a single tier
pub struct FixedWindowLimiter {
	buckets: Mutex<LruCache<Box<str>, Bucket>>,
}

impl FixedWindowLimiter {
	pub fn new(max_tracked: NonZeroUsize) -> Self {
		Self { buckets: Mutex::new(LruCache::new(max_tracked)) }
	}

	/// Counts one request. Returns the remaining budget, or the time until
	/// the window resets when the budget is exhausted.
	pub fn check_at(
		&self,
		identity: &str,
		config: &TierConfig,
		now: Instant,
	) -> Result<u32, Duration> {
		let mut buckets = self.buckets.lock();
		let bucket = buckets.get_or_insert_mut(identity.into(), || Bucket {
			window_start: now,
			window: config.window,
			count: 0,
		});

		if bucket.expired(now) {
			bucket.window_start = now;
			bucket.window = config.window;
			bucket.count = 0;
		}

		if bucket.count >= config.budget {
			let elapsed = now.saturating_duration_since(bucket.window_start);
			return Err(bucket.window.saturating_sub(elapsed));
		}

		bucket.count += 1;
		Ok(config.budget - bucket.count)
	}

	/// Current request count of an identity, if tracked
	pub fn count(&self, identity: &str) -> Option<u32> {
		self.buckets.lock().peek(identity).map(|b| b.count)
	}

	/// Removes buckets whose window elapsed. Returns the number removed.
	pub fn sweep_expired(&self, now: Instant) -> usize {
		let mut buckets = self.buckets.lock();
		let expired: Vec<Box<str>> =
			buckets.iter().filter(|(_, b)| b.expired(now)).map(|(k, _)| k.clone()).collect();
		for key in &expired {
			buckets.pop(key);
		}
		expired.len()
	}

	pub fn len(&self) -> usize {
		self.buckets.lock().len()
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}
}

/// Rate limiter statistics
#[derive(Debug, Clone, Copy, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RateLimiterStats {
	pub total_allowed: u64,
	pub total_rejected: u64,
	pub tracked_global: usize,
	pub tracked_api: usize,
	pub tracked_admin: usize,
}

/// Rate limit manager holding the three tiers
pub struct RateLimitManager {
	global: FixedWindowLimiter,
	api: FixedWindowLimiter,
	admin: FixedWindowLimiter,
	total_allowed: AtomicU64,
	total_rejected: AtomicU64,
}

impl RateLimitManager {
	pub fn new(max_tracked: NonZeroUsize) -> Self {
		Self {
			global: FixedWindowLimiter::new(max_tracked),
			api: FixedWindowLimiter::new(max_tracked),
			admin: FixedWindowLimiter::new(max_tracked),
			total_allowed: AtomicU64::new(0),
			total_rejected: AtomicU64::new(0),
		}
	}

	fn limiter(&self, tier: RateLimitTier) -> &FixedWindowLimiter {
		match tier {
			RateLimitTier::Global => &self.global,
			RateLimitTier::Api => &self.api,
			RateLimitTier::Admin => &self.admin,
		}
	}

	/// Check if a request from `identity` is allowed on `tier`
	pub fn check(
		&self,
		tier: RateLimitTier,
		identity: &str,
		config: &TierConfig,
	) -> Result<(), RateLimitError> {
		self.check_at(tier, identity, config, Instant::now())
	}

	pub fn check_at(
		&self,
		tier: RateLimitTier,
		identity: &str,
		config: &TierConfig,
		now: Instant,
	) -> Result<(), RateLimitError> {
		match self.limiter(tier).check_at(identity, config, now) {
			Ok(_remaining) => {
				self.total_allowed.fetch_add(1, Ordering::Relaxed);
				Ok(())
			}
			Err(retry_after) => {
				self.total_rejected.fetch_add(1, Ordering::Relaxed);
				debug!("Rate limited: tier={} identity={}", tier, identity);
				Err(RateLimitError::RateLimited { tier, retry_after })
			}
		}
	}

	/// Current request count of an identity on a tier
	pub fn count(&self, tier: RateLimitTier, identity: &str) -> Option<u32> {
		self.limiter(tier).count(identity)
	}

	/// Drops expired buckets on every tier
	pub fn sweep_expired(&self) -> usize {
		let now = Instant::now();
		self.global.sweep_expired(now) + self.api.sweep_expired(now) + self.admin.sweep_expired(now)
	}

	pub fn stats(&self) -> RateLimiterStats {
		RateLimiterStats {
			total_allowed: self.total_allowed.load(Ordering::Relaxed),
			total_rejected: self.total_rejected.load(Ordering::Relaxed),
			tracked_global: self.global.len(),
			tracked_api: self.api.len(),
			tracked_admin: self.admin.len(),
		}
	}
}

impl Default for RateLimitManager {
	fn default() -> Self {
		Self::new(DEFAULT_MAX_TRACKED)
	}
}


// vim: ts=4
