//! Database schema initialization

use sqlx::SqlitePool;

/// Creates the settings table and its indexes
pub(crate) async fn init_db(db: &SqlitePool) -> Result<(), sqlx::Error> {
	let mut tx = db.begin().await?;

	sqlx::query(
		"CREATE TABLE IF NOT EXISTS settings (
		key text NOT NULL,
		value text NOT NULL,
		type text NOT NULL,
		category text NOT NULL,
		description text NOT NULL DEFAULT '',
		requires_reload integer NOT NULL DEFAULT 0,
		updated_at datetime DEFAULT (unixepoch()),
		PRIMARY KEY(key)
	)",
	)
	.execute(&mut *tx)
	.await?;

	sqlx::query("CREATE INDEX IF NOT EXISTS idx_settings_category ON settings(category, key)")
		.execute(&mut *tx)
		.await?;

	tx.commit().await?;
	Ok(())
}

// vim: ts=4
