//! SQLite implementation of the administrative credential store

use std::path::Path;

use async_trait::async_trait;
use sqlx::sqlite::{self, SqlitePool};

use animequote_types::auth_adapter::{AdminUser, AuthAdapter};
use animequote_types::prelude::*;

mod admin;
mod crypto;
mod schema;

#[derive(Debug)]
pub struct AuthAdapterSqlite {
	db: SqlitePool,
}

impl AuthAdapterSqlite {
	/// Opens (or creates) the database file at `path`
	pub async fn new(path: impl AsRef<Path>) -> ClResult<Self> {
		if let Some(dir) = path.as_ref().parent().filter(|dir| !dir.as_os_str().is_empty()) {
			tokio::fs::create_dir_all(dir).await?;
		}

		let opts = sqlite::SqliteConnectOptions::new()
			.filename(path.as_ref())
			.create_if_missing(true)
			.journal_mode(sqlite::SqliteJournalMode::Wal);
		let db = sqlite::SqlitePoolOptions::new()
			.max_connections(5)
			.connect_with(opts)
			.await
			.inspect_err(|err| warn!("DB: {:#?}", err))
			.map_err(|_| Error::DbError)?;

		schema::init_db(&db)
			.await
			.inspect_err(|err| warn!("DB: {:#?}", err))
			.map_err(|_| Error::DbError)?;

		Ok(Self { db })
	}
}

#[async_trait]
impl AuthAdapter for AuthAdapterSqlite {
	async fn validate_token(&self, token: &str) -> ClResult<bool> {
		if token.is_empty() {
			return Ok(false);
		}
		Ok(admin::count_token(&self.db, token).await? > 0)
	}

	async fn read_admin(&self, username: &str) -> ClResult<Option<AdminUser>> {
		admin::read(&self.db, username).await
	}

	async fn create_admin(&self, username: &str, password: &str) -> ClResult<AdminUser> {
		admin::create(&self.db, username, password).await
	}

	async fn authenticate_admin(&self, username: &str, password: &str) -> ClResult<Option<Box<str>>> {
		admin::authenticate(&self.db, username, password).await
	}

	async fn rotate_token(&self, username: &str) -> ClResult<Box<str>> {
		admin::rotate_token(&self.db, username).await
	}
}

// vim: ts=4
