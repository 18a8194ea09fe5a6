//! SQLite implementation of the durable settings store

use std::{collections::HashMap, path::Path};

use async_trait::async_trait;
use sqlx::sqlite::{self, SqlitePool};

use animequote_types::meta_adapter::{MetaAdapter, SettingRow};
use animequote_types::prelude::*;

mod schema;
mod setting;

#[derive(Debug)]
pub struct MetaAdapterSqlite {
	db: SqlitePool,
}

impl MetaAdapterSqlite {
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
impl MetaAdapter for MetaAdapterSqlite {
	async fn read_setting(&self, key: &str) -> ClResult<Option<Box<str>>> {
		setting::read(&self.db, key).await
	}

	async fn read_setting_row(&self, key: &str) -> ClResult<Option<SettingRow>> {
		setting::read_row(&self.db, key).await
	}

	async fn update_setting(&self, key: &str, value: &str) -> ClResult<()> {
		setting::update(&self.db, key, value).await
	}

	async fn update_settings(&self, changes: &[(&str, &str)]) -> ClResult<()> {
		setting::update_many(&self.db, changes).await
	}

	async fn list_settings(&self) -> ClResult<HashMap<Box<str>, Box<str>>> {
		setting::list(&self.db).await
	}

	async fn list_setting_rows(&self) -> ClResult<Vec<SettingRow>> {
		setting::list_rows(&self.db).await
	}

	async fn list_settings_by_category(&self, category: &str) -> ClResult<Vec<SettingRow>> {
		setting::list_by_category(&self.db, category).await
	}

	async fn delete_setting(&self, key: &str) -> ClResult<()> {
		setting::delete(&self.db, key).await
	}

	async fn replace_settings(&self, rows: &[SettingRow]) -> ClResult<u32> {
		setting::replace_all(&self.db, rows).await
	}

	async fn insert_missing_settings(&self, rows: &[SettingRow]) -> ClResult<u32> {
		setting::insert_missing(&self.db, rows).await
	}
}

// vim: ts=4
