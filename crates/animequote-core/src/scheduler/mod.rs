//! Scheduler subsystem. Runs named maintenance tasks on cron specifications.
//!
//! The loop wakes at every minute boundary (local time) and dispatches each
//! task whose specification matches that minute onto its own tokio task, so
//! a slow or hung task never delays the others. Task failures are logged
//! together with the run duration and do not stop the scheduler.

pub mod cron;

use std::fmt::Debug;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, DurationRound, Local, TimeZone};
use futures::future::BoxFuture;
use parking_lot::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::prelude::*;
pub use cron::{CronField, CronSpec};

type TaskFn = Arc<dyn Fn() -> BoxFuture<'static, ClResult<()>> + Send + Sync>;

/// A registered task
pub struct ScheduledTask {
	name: Box<str>,
	spec: CronSpec,
	action: TaskFn,
}

impl ScheduledTask {
	pub fn name(&self) -> &str {
		&self.name
	}

	pub fn spec(&self) -> &CronSpec {
		&self.spec
	}
}

impl Debug for ScheduledTask {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("ScheduledTask")
			.field("name", &self.name)
			.field("spec", &self.spec.as_str())
			.finish()
	}
}

#[derive(Debug)]
struct RunningLoop {
	cancel: CancellationToken,
	handle: JoinHandle<()>,
}

#[derive(Debug, Default)]
pub struct Scheduler {
	tasks: RwLock<Vec<Arc<ScheduledTask>>>,
	running: Mutex<Option<RunningLoop>>,
}

impl Scheduler {
	pub fn new() -> Arc<Self> {
		Arc::new(Self::default())
	}

	/// Registers a task. Fails on a malformed specification or a duplicate name.
	pub fn add_task<F, Fut>(&self, name: &str, spec: &str, action: F) -> ClResult<()>
	where
		F: Fn() -> Fut + Send + Sync + 'static,
		Fut: Future<Output = ClResult<()>> + Send + 'static,
	{
		let spec = CronSpec::parse(spec)?;
		let mut tasks = self.tasks.write();
		if tasks.iter().any(|t| &*t.name == name) {
			return Err(Error::ValidationError(format!("task {} is already registered", name)));
		}
		info!("Scheduled task {} ({})", name, spec);
		let action: TaskFn = Arc::new(move || Box::pin(action()));
		tasks.push(Arc::new(ScheduledTask { name: name.into(), spec, action }));
		Ok(())
	}

	pub fn task_names(&self) -> Vec<Box<str>> {
		self.tasks.read().iter().map(|t| t.name.clone()).collect()
	}

	pub fn is_running(&self) -> bool {
		self.running.lock().is_some()
	}

	/// Starts the scheduling loop. A second call while running is a no-op.
	pub fn start(self: &Arc<Self>) {
		let mut running = self.running.lock();
		if running.is_some() {
			debug!("Scheduler already running");
			return;
		}

		let cancel = CancellationToken::new();
		let scheduler = Arc::clone(self);
		let token = cancel.clone();
		let handle = tokio::spawn(async move {
			let mut last_tick: Option<DateTime<Local>> = None;
			loop {
				let now = Local::now();
				let (target, delay) = next_tick(&now, last_tick.as_ref());
				tokio::select! {
					biased;
					() = token.cancelled() => break,
					() = tokio::time::sleep(delay) => {}
				}
				scheduler.tick(&target);
				last_tick = Some(target);
			}
			debug!("Scheduler loop exited");
		});

		*running = Some(RunningLoop { cancel, handle });
		info!("Scheduler started with {} tasks", self.tasks.read().len());
	}

	/// Stops the loop and waits for it to exit. Tasks already dispatched
	/// keep running. Calling it while stopped is a no-op.
	pub async fn stop(&self) {
		let running = self.running.lock().take();
		let Some(running) = running else {
			return;
		};
		running.cancel.cancel();
		if let Err(err) = running.handle.await {
			warn!("Scheduler loop ended abnormally: {}", err);
		}
		info!("Scheduler stopped");
	}

	/// Dispatches every task due at `time`. Returns the number dispatched.
	pub fn tick<Tz: TimeZone>(&self, time: &DateTime<Tz>) -> usize {
		let due: Vec<Arc<ScheduledTask>> =
			self.tasks.read().iter().filter(|t| t.spec.matches(time)).cloned().collect();

		for task in &due {
			let task = Arc::clone(task);
			tokio::spawn(async move {
				debug!("Running task {}", task.name);
				let started = std::time::Instant::now();
				let res = (task.action)().await;
				let elapsed = started.elapsed();
				match res {
					Ok(()) => info!("Task {} finished in {:?}", task.name, elapsed),
					Err(err) => warn!("Task {} failed after {:?}: {}", task.name, elapsed, err),
				}
			});
		}
		due.len()
	}
}

/// Next minute boundary after `now` and the delay until it
fn next_minute(now: &DateTime<Local>) -> (DateTime<Local>, Duration) {
	let minute = chrono::TimeDelta::minutes(1);
	let target = now
		.duration_trunc(minute)
		.ok()
		.and_then(|t| t.checked_add_signed(minute))
		.unwrap_or_else(|| *now + minute);
	let delay = (target - *now).to_std().unwrap_or(Duration::from_secs(60));
	(target, delay)
}

/// Next minute to evaluate, never at or before the last evaluated one
fn next_tick(now: &DateTime<Local>, last: Option<&DateTime<Local>>) -> (DateTime<Local>, Duration) {
	let (target, delay) = next_minute(now);
	match last {
		Some(last) if target <= *last => {
			let target = *last + chrono::TimeDelta::minutes(1);
			let delay = (target - *now).to_std().unwrap_or(Duration::ZERO);
			(target, delay)
		}
		_ => (target, delay),
	}
}


// vim: ts=4
