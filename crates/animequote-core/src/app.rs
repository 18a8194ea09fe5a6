//! App state type

use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use tokio::sync::Semaphore;

use animequote_types::auth_adapter::AuthAdapter;
use animequote_types::meta_adapter::MetaAdapter;

use crate::brute_force::BruteForceGuard;
use crate::rate_limit::RateLimitManager;
use crate::scheduler::Scheduler;
use crate::settings::SettingsService;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub struct AppState {
	pub opts: AppBuilderOpts,

	pub auth_adapter: Arc<dyn AuthAdapter>,
	pub meta_adapter: Arc<dyn MetaAdapter>,

	// Governance
	pub settings: Arc<SettingsService>,
	pub rate_limiter: Arc<RateLimitManager>,
	pub brute_force: Arc<BruteForceGuard>,
	pub scheduler: Arc<Scheduler>,

	/// Concurrency throttle, sized once at startup
	pub request_permits: Arc<Semaphore>,
	pub started_at: Instant,
}

impl AppState {
	pub fn uptime(&self) -> std::time::Duration {
		self.started_at.elapsed()
	}
}

pub type App = Arc<AppState>;

#[derive(Debug)]
pub struct AppBuilderOpts {
	pub listen: Box<str>,
	pub data_dir: Box<Path>,
	pub admin_user: Box<str>,
	/// Initial admin password; a random one is generated when unset
	pub admin_password: Option<Box<str>>,
	pub quotes_file: Option<Box<Path>>,
}

impl Default for AppBuilderOpts {
	fn default() -> Self {
		Self {
			listen: "127.0.0.1:8080".into(),
			data_dir: Path::new("./data").into(),
			admin_user: "admin".into(),
			admin_password: None,
			quotes_file: None,
		}
	}
}

// vim: ts=4
