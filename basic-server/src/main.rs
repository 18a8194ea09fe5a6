use std::{env, path::PathBuf, process::ExitCode, sync::Arc};

use animequote::AppBuilder;
use animequote_auth_adapter_sqlite::AuthAdapterSqlite;
use animequote_meta_adapter_sqlite::MetaAdapterSqlite;

const DB_FILE: &str = "anime.db";

pub struct Config {
	pub listen: String,
	pub data_dir: PathBuf,
	pub admin_user: String,
	pub admin_password: Option<String>,
	pub quotes_file: Option<PathBuf>,
}

impl Config {
	fn from_env() -> Self {
		Config {
			listen: env::var("LISTEN").unwrap_or_else(|_| "127.0.0.1:8080".to_string()),
			data_dir: PathBuf::from(env::var("DATA_DIR").unwrap_or_else(|_| "./data".to_string())),
			admin_user: env::var("ADMIN_USER").unwrap_or_else(|_| "admin".to_string()),
			admin_password: env::var("ADMIN_PASSWORD").ok().filter(|s| !s.is_empty()),
			quotes_file: env::var("QUOTES_FILE").ok().filter(|s| !s.is_empty()).map(PathBuf::from),
		}
	}
}

#[tokio::main]
async fn main() -> ExitCode {
	let config = Config::from_env();

	let mut builder = AppBuilder::new();
	let db_path = config.data_dir.join(DB_FILE);

	let auth_adapter = match AuthAdapterSqlite::new(&db_path).await {
		Ok(adapter) => adapter,
		Err(err) => {
			tracing::error!("FATAL: Cannot open auth database {}: {}", db_path.display(), err);
			return ExitCode::FAILURE;
		}
	};
	let meta_adapter = match MetaAdapterSqlite::new(&db_path).await {
		Ok(adapter) => adapter,
		Err(err) => {
			tracing::error!("FATAL: Cannot open settings database {}: {}", db_path.display(), err);
			return ExitCode::FAILURE;
		}
	};

	builder
		.listen(config.listen)
		.data_dir(config.data_dir)
		.admin_user(config.admin_user)
		.auth_adapter(Arc::new(auth_adapter))
		.meta_adapter(Arc::new(meta_adapter));
	if let Some(password) = config.admin_password {
		builder.admin_password(password);
	}
	if let Some(quotes_file) = config.quotes_file {
		builder.quotes_file(quotes_file);
	}

	match builder.run().await {
		Ok(()) => ExitCode::SUCCESS,
		Err(err) => {
			tracing::error!("Server stopped: {}", err);
			ExitCode::FAILURE
		}
	}
}

// vim: ts=4
