//! Settings table access
//!
//! One row per setting. Values are stored as text and interpreted by the
//! settings cache according to the declared type.

use std::collections::HashMap;

use sqlx::{Row, Sqlite, SqlitePool, Transaction, sqlite::SqliteRow};

use animequote_types::meta_adapter::{SettingKind, SettingRow};
use animequote_types::prelude::*;

const ROW_COLUMNS: &str = "key, value, type, category, description, requires_reload, updated_at";

fn map_row(row: &SqliteRow) -> Result<SettingRow, sqlx::Error> {
	let kind: String = row.try_get("type")?;
	let key: String = row.try_get("key")?;
	let kind = SettingKind::parse(&kind).unwrap_or_else(|| {
		warn!("Unknown type {:?} for setting {}, treating it as string", kind, key);
		SettingKind::String
	});

	Ok(SettingRow {
		key: key.into(),
		value: row.try_get::<String, _>("value")?.into(),
		kind,
		category: row.try_get::<String, _>("category")?.into(),
		description: row.try_get::<String, _>("description")?.into(),
		requires_reload: row.try_get("requires_reload")?,
		updated_at: Timestamp(row.try_get("updated_at")?),
	})
}

fn map_rows(rows: &[SqliteRow]) -> ClResult<Vec<SettingRow>> {
	rows.iter()
		.map(|row| map_row(row).inspect_err(|err| warn!("DB: {:#?}", err)).map_err(|_| Error::DbError))
		.collect()
}

pub(crate) async fn read(db: &SqlitePool, key: &str) -> ClResult<Option<Box<str>>> {
	let row = sqlx::query("SELECT value FROM settings WHERE key = ?")
		.bind(key)
		.fetch_optional(db)
		.await
		.inspect_err(|err| warn!("DB: {:#?}", err))
		.map_err(|_| Error::DbError)?;

	Ok(row.map(|r| r.get::<String, _>("value").into()))
}

pub(crate) async fn read_row(db: &SqlitePool, key: &str) -> ClResult<Option<SettingRow>> {
	let row = sqlx::query(&format!("SELECT {} FROM settings WHERE key = ?", ROW_COLUMNS))
		.bind(key)
		.fetch_optional(db)
		.await
		.inspect_err(|err| warn!("DB: {:#?}", err))
		.map_err(|_| Error::DbError)?;

	row.as_ref()
		.map(map_row)
		.transpose()
		.inspect_err(|err| warn!("DB: {:#?}", err))
		.map_err(|_| Error::DbError)
}

pub(crate) async fn update(db: &SqlitePool, key: &str, value: &str) -> ClResult<()> {
	let res = sqlx::query("UPDATE settings SET value = ?, updated_at = unixepoch() WHERE key = ?")
		.bind(value)
		.bind(key)
		.execute(db)
		.await
		.inspect_err(|err| warn!("DB: {:#?}", err))
		.map_err(|_| Error::DbError)?;

	if res.rows_affected() == 0 {
		return Err(Error::NotFound);
	}
	Ok(())
}

/// Updates every given key in one transaction; an unknown key rolls it back
pub(crate) async fn update_many(db: &SqlitePool, changes: &[(&str, &str)]) -> ClResult<()> {
	let mut tx = db
		.begin()
		.await
		.inspect_err(|err| warn!("DB: {:#?}", err))
		.map_err(|_| Error::DbError)?;

	for (key, value) in changes {
		let res = sqlx::query("UPDATE settings SET value = ?, updated_at = unixepoch() WHERE key = ?")
			.bind(*value)
			.bind(*key)
			.execute(&mut *tx)
			.await
			.inspect_err(|err| warn!("DB: {:#?}", err))
			.map_err(|_| Error::DbError)?;

		if res.rows_affected() == 0 {
			debug!("Setting {} not found, rolling back batch", key);
			return Err(Error::NotFound);
		}
	}

	tx.commit().await.inspect_err(|err| warn!("DB: {:#?}", err)).map_err(|_| Error::DbError)?;
	Ok(())
}

pub(crate) async fn list(db: &SqlitePool) -> ClResult<HashMap<Box<str>, Box<str>>> {
	let rows = sqlx::query("SELECT key, value FROM settings")
		.fetch_all(db)
		.await
		.inspect_err(|err| warn!("DB: {:#?}", err))
		.map_err(|_| Error::DbError)?;

	Ok(rows
		.iter()
		.map(|row| (row.get::<String, _>("key").into(), row.get::<String, _>("value").into()))
		.collect())
}

pub(crate) async fn list_rows(db: &SqlitePool) -> ClResult<Vec<SettingRow>> {
	let rows = sqlx::query(&format!("SELECT {} FROM settings ORDER BY category, key", ROW_COLUMNS))
		.fetch_all(db)
		.await
		.inspect_err(|err| warn!("DB: {:#?}", err))
		.map_err(|_| Error::DbError)?;

	map_rows(&rows)
}

pub(crate) async fn list_by_category(db: &SqlitePool, category: &str) -> ClResult<Vec<SettingRow>> {
	let rows =
		sqlx::query(&format!("SELECT {} FROM settings WHERE category = ? ORDER BY key", ROW_COLUMNS))
			.bind(category)
			.fetch_all(db)
			.await
			.inspect_err(|err| warn!("DB: {:#?}", err))
			.map_err(|_| Error::DbError)?;

	map_rows(&rows)
}

pub(crate) async fn delete(db: &SqlitePool, key: &str) -> ClResult<()> {
	sqlx::query("DELETE FROM settings WHERE key = ?")
		.bind(key)
		.execute(db)
		.await
		.inspect_err(|err| warn!("DB: {:#?}", err))
		.map_err(|_| Error::DbError)?;
	Ok(())
}

const INSERT_IGNORE: &str = "INSERT OR IGNORE INTO settings
	(key, value, type, category, description, requires_reload, updated_at)
	VALUES (?, ?, ?, ?, ?, ?, ?)";

async fn insert_rows(tx: &mut Transaction<'_, Sqlite>, rows: &[SettingRow]) -> ClResult<u32> {
	let mut inserted = 0u32;
	for row in rows {
		let res = sqlx::query(INSERT_IGNORE)
			.bind(&*row.key)
			.bind(&*row.value)
			.bind(row.kind.as_str())
			.bind(&*row.category)
			.bind(&*row.description)
			.bind(row.requires_reload)
			.bind(row.updated_at.0)
			.execute(&mut **tx)
			.await
			.inspect_err(|err| warn!("DB: {:#?}", err))
			.map_err(|_| Error::DbError)?;

		if res.rows_affected() > 0 {
			inserted += 1;
		}
	}
	Ok(inserted)
}

/// Inserts rows whose key is not present yet, in one transaction
pub(crate) async fn insert_missing(db: &SqlitePool, rows: &[SettingRow]) -> ClResult<u32> {
	let mut tx = db
		.begin()
		.await
		.inspect_err(|err| warn!("DB: {:#?}", err))
		.map_err(|_| Error::DbError)?;

	let inserted = insert_rows(&mut tx, rows).await?;

	tx.commit().await.inspect_err(|err| warn!("DB: {:#?}", err)).map_err(|_| Error::DbError)?;
	Ok(inserted)
}

/// Deletes every row and inserts the given ones, in one transaction
pub(crate) async fn replace_all(db: &SqlitePool, rows: &[SettingRow]) -> ClResult<u32> {
	let mut tx = db
		.begin()
		.await
		.inspect_err(|err| warn!("DB: {:#?}", err))
		.map_err(|_| Error::DbError)?;

	sqlx::query("DELETE FROM settings")
		.execute(&mut *tx)
		.await
		.inspect_err(|err| warn!("DB: {:#?}", err))
		.map_err(|_| Error::DbError)?;
	let inserted = insert_rows(&mut tx, rows).await?;

	tx.commit().await.inspect_err(|err| warn!("DB: {:#?}", err)).map_err(|_| Error::DbError)?;
	Ok(inserted)
}

// vim: ts=4
