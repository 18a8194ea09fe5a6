//! Brute-force guard for the administrative authentication path.
//!
//! Counts failed attempts per client identity. Five failures within the
//! lockout window block further attempts until the window has passed since
//! the last failure. A record older than the window is treated as expired:
//! the next failure restarts the count at one.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tokio::time::Instant;

use crate::prelude::*;

/// Failures that trigger a lockout
pub const MAX_FAILED_ATTEMPTS: u32 = 5;
/// How long failures are remembered after the last one
pub const LOCKOUT_WINDOW: Duration = Duration::from_secs(15 * 60);
/// Interval of the background sweep
pub const SWEEP_INTERVAL: Duration = Duration::from_secs(5 * 60);

#[derive(Debug, Clone, Copy)]
struct FailureRecord {
	count: u32,
	last_attempt: Instant,
}

#[derive(Debug)]
pub struct BruteForceGuard {
	records: Mutex<HashMap<Box<str>, FailureRecord>>,
	threshold: u32,
	window: Duration,
}

impl Default for BruteForceGuard {
	fn default() -> Self {
		Self::new(MAX_FAILED_ATTEMPTS, LOCKOUT_WINDOW)
	}
}

impl BruteForceGuard {
	pub fn new(threshold: u32, window: Duration) -> Self {
		Self { records: Mutex::new(HashMap::new()), threshold, window }
	}

	fn expired(&self, record: &FailureRecord, now: Instant) -> bool {
		now.saturating_duration_since(record.last_attempt) > self.window
	}

	pub fn is_blocked(&self, identity: &str) -> bool {
		self.is_blocked_at(identity, Instant::now())
	}

	pub fn is_blocked_at(&self, identity: &str, now: Instant) -> bool {
		self.blocked_for_at(identity, now).is_some()
	}

	/// Remaining lockout if the identity is blocked
	pub fn blocked_for(&self, identity: &str) -> Option<Duration> {
		self.blocked_for_at(identity, Instant::now())
	}

	pub fn blocked_for_at(&self, identity: &str, now: Instant) -> Option<Duration> {
		let records = self.records.lock();
		let record = records.get(identity)?;
		if self.expired(record, now) || record.count < self.threshold {
			return None;
		}
		let elapsed = now.saturating_duration_since(record.last_attempt);
		Some(self.window.saturating_sub(elapsed))
	}

	/// Records a failed attempt and returns the current failure count
	pub fn record_failure(&self, identity: &str) -> u32 {
		self.record_failure_at(identity, Instant::now())
	}

	pub fn record_failure_at(&self, identity: &str, now: Instant) -> u32 {
		let mut records = self.records.lock();
		let count = match records.get_mut(identity) {
			Some(record) if !self.expired(record, now) => {
				record.count = record.count.saturating_add(1);
				record.last_attempt = now;
				record.count
			}
			Some(record) => {
				*record = FailureRecord { count: 1, last_attempt: now };
				1
			}
			None => {
				records.insert(identity.into(), FailureRecord { count: 1, last_attempt: now });
				1
			}
		};
		if count >= self.threshold {
			info!("Brute-force lockout active for {} ({} failures)", identity, count);
		}
		count
	}

	/// Clears the record of an identity after successful authentication
	pub fn record_success(&self, identity: &str) {
		self.records.lock().remove(identity);
	}

	/// Current failure count, expired records included
	pub fn failure_count(&self, identity: &str) -> Option<u32> {
		self.records.lock().get(identity).map(|r| r.count)
	}

	/// Removes expired records. Returns the number removed.
	pub fn sweep_expired(&self) -> usize {
		self.sweep_expired_at(Instant::now())
	}

	pub fn sweep_expired_at(&self, now: Instant) -> usize {
		let mut records = self.records.lock();
		let before = records.len();
		records.retain(|_, record| !self.expired(record, now));
		before - records.len()
	}

	pub fn len(&self) -> usize {
		self.records.lock().len()
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	/// Spawns the periodic sweep loop
	pub fn spawn_sweeper(self: &Arc<Self>, interval: Duration) -> JoinHandle<()> {
		let guard = Arc::clone(self);
		tokio::spawn(async move {
			let mut ticker = tokio::time::interval(interval);
			// The first tick completes immediately
			ticker.tick().await;
			loop {
				ticker.tick().await;
				let removed = guard.sweep_expired();
				if removed > 0 {
					debug!("Brute-force sweep removed {} expired records", removed);
				}
			}
		})
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_blocks_after_threshold() {
		let guard = BruteForceGuard::default();
		let now = Instant::now();

		for i in 1..=4 {
			assert_eq!(guard.record_failure_at("x", now), i);
			assert!(!guard.is_blocked_at("x", now));
		}
		guard.record_failure_at("x", now);
		assert!(guard.is_blocked_at("x", now));
		assert!(!guard.is_blocked_at("y", now));
	}

	#[test]
	fn test_success_clears_record() {
		let guard = BruteForceGuard::default();
		let now = Instant::now();

		for _ in 0..4 {
			guard.record_failure_at("x", now);
		}
		guard.record_success("x");
		assert_eq!(guard.failure_count("x"), None);
		assert_eq!(guard.record_failure_at("x", now), 1);
	}

	#[test]
	fn test_expired_record_restarts_at_one() {
		let guard = BruteForceGuard::default();
		let start = Instant::now();

		for _ in 0..5 {
			guard.record_failure_at("x", start);
		}
		let later = start + LOCKOUT_WINDOW + Duration::from_secs(1);
		assert!(!guard.is_blocked_at("x", later));
		assert_eq!(guard.record_failure_at("x", later), 1);
		assert!(!guard.is_blocked_at("x", later));
	}

	#[test]
	fn test_lockout_slides_with_last_attempt() {
		let guard = BruteForceGuard::default();
		let start = Instant::now();

		for i in 0..5 {
			guard.record_failure_at("x", start + Duration::from_secs(i * 60));
		}
		let last = start + Duration::from_secs(4 * 60);
		let remaining = guard.blocked_for_at("x", last + Duration::from_secs(60)).unwrap();
		assert_eq!(remaining, LOCKOUT_WINDOW - Duration::from_secs(60));
		// Window counts from the last failure, not the first
		assert!(guard.is_blocked_at("x", start + LOCKOUT_WINDOW + Duration::from_secs(60)));
	}

	#[test]
	fn test_sweep_removes_only_expired() {
		let guard = BruteForceGuard::default();
		let start = Instant::now();

		guard.record_failure_at("old", start);
		guard.record_failure_at("new", start + Duration::from_secs(600));

		let removed = guard.sweep_expired_at(start + LOCKOUT_WINDOW + Duration::from_secs(1));
		assert_eq!(removed, 1);
		assert_eq!(guard.failure_count("old"), None);
		assert_eq!(guard.failure_count("new"), Some(1));
	}

	#[tokio::test(start_paused = true)]
	async fn test_sweeper_runs_periodically() {
		let guard = Arc::new(BruteForceGuard::new(5, Duration::from_secs(1)));
		guard.record_failure("x");

		let handle = guard.spawn_sweeper(Duration::from_secs(5));
		tokio::time::sleep(Duration::from_secs(6)).await;

		assert!(guard.is_empty());
		handle.abort();
	}
}

// vim: ts=4
