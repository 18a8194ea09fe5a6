//! App builder - constructs and runs the Anime Quotes server

use std::{future::Future, net::SocketAddr, path::Path, pin::Pin, sync::Arc, time::Instant};

use axum::Router;
use tokio::sync::Semaphore;

use crate::auth_adapter::AuthAdapter;
use crate::meta_adapter::MetaAdapter;
use crate::prelude::*;
use crate::quote::{DatasetRefresher, QuoteFileRefresher, QuoteStore};
use crate::settings::{SettingsService, default_settings};
use crate::{bootstrap, routes, tasks};
pub use animequote_core::app::{App, AppBuilderOpts, AppState, VERSION};
use animequote_core::brute_force::{BruteForceGuard, SWEEP_INTERVAL};
use animequote_core::rate_limit::RateLimitManager;
use animequote_core::scheduler::Scheduler;

/// Type alias for async initialization callbacks
type InitCallback =
	Box<dyn FnOnce(App) -> Pin<Box<dyn Future<Output = ClResult<()>> + Send>> + Send>;

pub struct AppBuilder {
	opts: AppBuilderOpts,
	auth_adapter: Option<Arc<dyn AuthAdapter>>,
	meta_adapter: Option<Arc<dyn MetaAdapter>>,
	dataset_refresher: Option<Arc<dyn DatasetRefresher>>,
	on_init: Vec<InitCallback>,
}

impl AppBuilder {
	pub fn new() -> Self {
		// Tests build several apps in one process; only the first install wins
		let _ = tracing_subscriber::fmt()
			.with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
			.with_target(false)
			.try_init();
		AppBuilder {
			opts: AppBuilderOpts::default(),
			auth_adapter: None,
			meta_adapter: None,
			dataset_refresher: None,
			on_init: Vec::new(),
		}
	}

	// Opts
	pub fn listen(&mut self, listen: impl Into<Box<str>>) -> &mut Self {
		self.opts.listen = listen.into();
		self
	}
	pub fn data_dir(&mut self, data_dir: impl Into<Box<Path>>) -> &mut Self {
		self.opts.data_dir = data_dir.into();
		self
	}
	pub fn admin_user(&mut self, admin_user: impl Into<Box<str>>) -> &mut Self {
		self.opts.admin_user = admin_user.into();
		self
	}
	pub fn admin_password(&mut self, admin_password: impl Into<Box<str>>) -> &mut Self {
		self.opts.admin_password = Some(admin_password.into());
		self
	}
	pub fn quotes_file(&mut self, quotes_file: impl Into<Box<Path>>) -> &mut Self {
		self.opts.quotes_file = Some(quotes_file.into());
		self
	}

	// Adapters
	pub fn auth_adapter(&mut self, auth_adapter: Arc<dyn AuthAdapter>) -> &mut Self {
		self.auth_adapter = Some(auth_adapter);
		self
	}
	pub fn meta_adapter(&mut self, meta_adapter: Arc<dyn MetaAdapter>) -> &mut Self {
		self.meta_adapter = Some(meta_adapter);
		self
	}

	/// Overrides the source used by the weekly dataset refresh. Without one,
	/// the refresh re-reads the quotes file if one is configured.
	pub fn dataset_refresher(&mut self, refresher: Arc<dyn DatasetRefresher>) -> &mut Self {
		self.dataset_refresher = Some(refresher);
		self
	}

	/// Register an async initialization callback that runs after App is created
	/// but before the scheduler starts. Use this to register extra tasks.
	pub fn on_init<F, Fut>(&mut self, f: F) -> &mut Self
	where
		F: FnOnce(App) -> Fut + Send + 'static,
		Fut: Future<Output = ClResult<()>> + Send + 'static,
	{
		self.on_init.push(Box::new(move |app| Box::pin(f(app))));
		self
	}

	/// Initializes every subsystem and composes the router without serving it
	pub async fn build(self) -> ClResult<(App, Router)> {
		let Some(auth_adapter) = self.auth_adapter else {
			error!("FATAL: No auth adapter configured");
			return Err(Error::Internal("No auth adapter configured".to_string()));
		};
		let Some(meta_adapter) = self.meta_adapter else {
			error!("FATAL: No meta adapter configured");
			return Err(Error::Internal("No meta adapter configured".to_string()));
		};

		let settings = Arc::new(SettingsService::new(meta_adapter.clone(), default_settings()?));
		settings.init().await.inspect_err(|err| {
			error!("FATAL: Settings initialization failed: {}", err);
		})?;
		info!("Settings subsystem initialized");

		let quotes = match &self.opts.quotes_file {
			Some(path) => Arc::new(QuoteStore::from_file(path).await.inspect_err(|err| {
				error!("FATAL: Cannot load quotes from {}: {}", path.display(), err);
			})?),
			None => Arc::new(QuoteStore::embedded()?),
		};
		info!("Loaded {} quotes", quotes.len().await);

		let dataset_refresher = self.dataset_refresher.or_else(|| {
			self.opts.quotes_file.as_ref().map(|path| {
				Arc::new(QuoteFileRefresher::new(quotes.clone(), path.clone()))
					as Arc<dyn DatasetRefresher>
			})
		});

		let max_concurrent = settings.connection_limit_config().max_concurrent;
		info!("Concurrency throttle: {} requests", max_concurrent);

		let app: App = Arc::new(AppState {
			opts: self.opts,
			auth_adapter,
			meta_adapter,
			settings,
			rate_limiter: Arc::new(RateLimitManager::default()),
			brute_force: Arc::new(BruteForceGuard::default()),
			scheduler: Scheduler::new(),
			request_permits: Arc::new(Semaphore::new(max_concurrent)),
			started_at: Instant::now(),
		});

		tasks::register(&app, dataset_refresher)?;

		// Run custom init callbacks
		for callback in self.on_init {
			callback(app.clone()).await?;
		}

		let router = routes::init(app.clone(), quotes);
		Ok((app, router))
	}

	pub async fn run(self) -> ClResult<()> {
		info!("    _          _                 ___              _");
		info!("   / \\   _ __ (_)_ __ ___   ___ / _ \\ _   _  ___ | |_ ___  ___");
		info!("  / _ \\ | '_ \\| | '_ ` _ \\ / _ \\ | | | | | |/ _ \\| __/ _ \\/ __|");
		info!(" / ___ \\| | | | | | | | | |  __/ |_| | |_| | (_) | ||  __/\\__ \\");
		info!("/_/   \\_\\_| |_|_|_| |_| |_|\\___|\\__\\_\\\\__,_|\\___/ \\__\\___||___/");
		info!("V{}", VERSION);
		info!("");

		let (app, router) = self.build().await?;

		bootstrap::ensure_admin(&app).await.inspect_err(|err| {
			error!("FATAL: Admin bootstrap failed: {}", err);
		})?;

		let sweeper = app.brute_force.spawn_sweeper(SWEEP_INTERVAL);
		app.scheduler.start();

		let listener = tokio::net::TcpListener::bind(app.opts.listen.as_ref()).await.map_err(|err| {
			error!("FATAL: Cannot listen on {}: {}", app.opts.listen, err);
			err
		})?;
		info!("Listening on http://{}", app.opts.listen);

		let res = axum::serve(listener, router.into_make_service_with_connect_info::<SocketAddr>())
			.with_graceful_shutdown(shutdown_signal())
			.await;

		info!("Shutting down");
		app.scheduler.stop().await;
		sweeper.abort();

		res.map_err(Error::from)
	}
}

impl Default for AppBuilder {
	fn default() -> Self {
		Self::new()
	}
}

async fn shutdown_signal() {
	if let Err(err) = tokio::signal::ctrl_c().await {
		warn!("Cannot listen for shutdown signal: {}", err);
		std::future::pending::<()>().await;
	}
}

// vim: ts=4
