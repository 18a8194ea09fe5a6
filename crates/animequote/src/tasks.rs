//! Built-in maintenance tasks

use std::sync::Arc;

use crate::prelude::*;
use crate::quote::DatasetRefresher;

pub const SETTINGS_RESYNC: &str = "settings_resync";
pub const RATE_LIMIT_SWEEP: &str = "rate_limit_sweep";
pub const DATASET_REFRESH: &str = "dataset_refresh";

/// Registers the maintenance tasks on the app scheduler
pub fn register(app: &App, refresher: Option<Arc<dyn DatasetRefresher>>) -> ClResult<()> {
	// Hourly resync picks up changes written to the store by other processes
	let settings = app.settings.clone();
	app.scheduler.add_task(SETTINGS_RESYNC, "0 * * * *", move || {
		let settings = settings.clone();
		async move {
			let count = settings.reload().await?;
			debug!("Settings resynced ({} keys)", count);
			Ok(())
		}
	})?;

	let rate_limiter = app.rate_limiter.clone();
	app.scheduler.add_task(RATE_LIMIT_SWEEP, "*/5 * * * *", move || {
		let rate_limiter = rate_limiter.clone();
		async move {
			let removed = rate_limiter.sweep_expired();
			if removed > 0 {
				debug!("Rate limit sweep removed {} buckets", removed);
			}
			Ok(())
		}
	})?;

	match refresher {
		Some(refresher) => {
			// Sundays at 03:00
			app.scheduler.add_task(DATASET_REFRESH, "0 3 * * 0", move || {
				let refresher = refresher.clone();
				async move { refresher.refresh().await.map(|_| ()) }
			})?;
		}
		None => debug!("No dataset refresher configured, skipping {}", DATASET_REFRESH),
	}

	Ok(())
}

// vim: ts=4
