//! Administrative user table access

use sqlx::{Row, SqlitePool, sqlite::SqliteRow};

use animequote_types::auth_adapter::AdminUser;
use animequote_types::prelude::*;

use crate::crypto;

fn map_admin(row: &SqliteRow) -> Result<AdminUser, sqlx::Error> {
	Ok(AdminUser {
		id: row.try_get("id")?,
		username: row.try_get::<String, _>("username")?.into(),
		token: row.try_get::<String, _>("token")?.into(),
		created_at: Timestamp(row.try_get("created_at")?),
		last_login: row.try_get::<Option<i64>, _>("last_login")?.map(Timestamp),
	})
}

pub(crate) async fn count_token(db: &SqlitePool, token: &str) -> ClResult<i64> {
	let row = sqlx::query("SELECT COUNT(*) AS cnt FROM admin_users WHERE token = ?")
		.bind(token)
		.fetch_one(db)
		.await
		.inspect_err(|err| warn!("DB: {:#?}", err))
		.map_err(|_| Error::DbError)?;

	Ok(row.get("cnt"))
}

pub(crate) async fn read(db: &SqlitePool, username: &str) -> ClResult<Option<AdminUser>> {
	let row = sqlx::query(
		"SELECT id, username, token, created_at, last_login FROM admin_users WHERE username = ?",
	)
	.bind(username)
	.fetch_optional(db)
	.await
	.inspect_err(|err| warn!("DB: {:#?}", err))
	.map_err(|_| Error::DbError)?;

	row.as_ref()
		.map(map_admin)
		.transpose()
		.inspect_err(|err| warn!("DB: {:#?}", err))
		.map_err(|_| Error::DbError)
}

pub(crate) async fn create(db: &SqlitePool, username: &str, password: &str) -> ClResult<AdminUser> {
	if username.trim().is_empty() {
		return Err(Error::ValidationError("username must not be empty".into()));
	}
	if read(db, username).await?.is_some() {
		return Err(Error::ValidationError(format!("admin user {} already exists", username)));
	}

	let password_hash = crypto::generate_password_hash(password.into()).await?;
	let token = crypto::generate_token();
	let created_at = Timestamp::now();

	let res = sqlx::query(
		"INSERT INTO admin_users (username, password_hash, token, created_at) VALUES (?, ?, ?, ?)",
	)
	.bind(username)
	.bind(&*password_hash)
	.bind(&*token)
	.bind(created_at.0)
	.execute(db)
	.await
	.inspect_err(|err| warn!("DB: {:#?}", err))
	.map_err(|_| Error::DbError)?;

	info!("Created admin user {}", username);
	Ok(AdminUser {
		id: res.last_insert_rowid(),
		username: username.into(),
		token,
		created_at,
		last_login: None,
	})
}

pub(crate) async fn authenticate(
	db: &SqlitePool,
	username: &str,
	password: &str,
) -> ClResult<Option<Box<str>>> {
	let row = sqlx::query("SELECT id, password_hash, token FROM admin_users WHERE username = ?")
		.bind(username)
		.fetch_optional(db)
		.await
		.inspect_err(|err| warn!("DB: {:#?}", err))
		.map_err(|_| Error::DbError)?;
	let Some(row) = row else {
		return Ok(None);
	};

	let id: i64 = row.get("id");
	let password_hash: String = row.get("password_hash");
	let token: String = row.get("token");
	if !crypto::check_password(password.into(), password_hash.into()).await? {
		return Ok(None);
	}

	// A failed timestamp update does not fail the login
	if let Err(err) = sqlx::query("UPDATE admin_users SET last_login = ? WHERE id = ?")
		.bind(Timestamp::now().0)
		.bind(id)
		.execute(db)
		.await
	{
		warn!("Failed to update last login of {}: {:#?}", username, err);
	}

	Ok(Some(token.into()))
}

pub(crate) async fn rotate_token(db: &SqlitePool, username: &str) -> ClResult<Box<str>> {
	let token = crypto::generate_token();
	let res = sqlx::query("UPDATE admin_users SET token = ? WHERE username = ?")
		.bind(&*token)
		.bind(username)
		.execute(db)
		.await
		.inspect_err(|err| warn!("DB: {:#?}", err))
		.map_err(|_| Error::DbError)?;

	if res.rows_affected() == 0 {
		return Err(Error::NotFound);
	}
	info!("Rotated token of admin user {}", username);
	Ok(token)
}

// vim: ts=4
