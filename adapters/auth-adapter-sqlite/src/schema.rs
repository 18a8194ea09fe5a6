//! Database schema initialization

use sqlx::SqlitePool;

pub(crate) async fn init_db(db: &SqlitePool) -> Result<(), sqlx::Error> {
	let mut tx = db.begin().await?;

	sqlx::query(
		"CREATE TABLE IF NOT EXISTS admin_users (
		id integer PRIMARY KEY AUTOINCREMENT,
		username text NOT NULL UNIQUE,
		password_hash text NOT NULL,
		token text NOT NULL UNIQUE,
		created_at datetime DEFAULT (unixepoch()),
		last_login datetime
	)",
	)
	.execute(&mut *tx)
	.await?;

	sqlx::query("CREATE INDEX IF NOT EXISTS idx_admin_users_token ON admin_users(token)")
		.execute(&mut *tx)
		.await?;

	tx.commit().await?;
	Ok(())
}

// vim: ts=4
