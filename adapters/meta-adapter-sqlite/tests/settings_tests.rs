//! Settings store tests against a throwaway SQLite file

use animequote_meta_adapter_sqlite::MetaAdapterSqlite;
use animequote_types::error::Error;
use animequote_types::meta_adapter::{MetaAdapter, SettingKind, SettingRow};
use animequote_types::types::Timestamp;
use tempfile::TempDir;

async fn create_test_adapter() -> (MetaAdapterSqlite, TempDir) {
	let temp_dir = TempDir::new().expect("Failed to create temp directory");
	let adapter = MetaAdapterSqlite::new(temp_dir.path().join("anime.db"))
		.await
		.expect("Failed to create adapter");

	(adapter, temp_dir)
}

fn row(key: &str, value: &str, kind: SettingKind, category: &str) -> SettingRow {
	SettingRow {
		key: key.into(),
		value: value.into(),
		kind,
		category: category.into(),
		description: format!("{} setting", key).into(),
		requires_reload: category == "rate_limiting",
		updated_at: Timestamp(1_700_000_000),
	}
}

fn seed_rows() -> Vec<SettingRow> {
	vec![
		row("cors_enabled", "true", SettingKind::Bool, "cors"),
		row("cors_allowed_origins", r#"["*"]"#, SettingKind::Json, "cors"),
		row("rate_limit_api_rps", "50", SettingKind::Int, "rate_limiting"),
		row("security_frame_options", "DENY", SettingKind::String, "security"),
	]
}

#[tokio::test]
async fn test_insert_missing_and_read() {
	let (adapter, _temp) = create_test_adapter().await;

	let inserted = adapter.insert_missing_settings(&seed_rows()).await.unwrap();
	assert_eq!(inserted, 4);

	let value = adapter.read_setting("rate_limit_api_rps").await.unwrap();
	assert_eq!(value.as_deref(), Some("50"));

	let stored = adapter.read_setting_row("rate_limit_api_rps").await.unwrap().unwrap();
	assert_eq!(stored, seed_rows()[2]);

	assert_eq!(adapter.read_setting("missing").await.unwrap(), None);
	assert!(adapter.read_setting_row("missing").await.unwrap().is_none());
}

#[tokio::test]
async fn test_insert_missing_keeps_existing_values() {
	let (adapter, _temp) = create_test_adapter().await;
	adapter.insert_missing_settings(&seed_rows()).await.unwrap();
	adapter.update_setting("cors_enabled", "false").await.unwrap();

	let inserted = adapter.insert_missing_settings(&seed_rows()).await.unwrap();
	assert_eq!(inserted, 0);
	assert_eq!(adapter.read_setting("cors_enabled").await.unwrap().as_deref(), Some("false"));
}

#[tokio::test]
async fn test_update_unknown_key_is_not_found() {
	let (adapter, _temp) = create_test_adapter().await;
	adapter.insert_missing_settings(&seed_rows()).await.unwrap();

	let res = adapter.update_setting("no_such_key", "1").await;
	assert!(matches!(res, Err(Error::NotFound)));
}

#[tokio::test]
async fn test_update_touches_timestamp() {
	let (adapter, _temp) = create_test_adapter().await;
	adapter.insert_missing_settings(&seed_rows()).await.unwrap();

	adapter.update_setting("security_frame_options", "SAMEORIGIN").await.unwrap();
	let stored = adapter.read_setting_row("security_frame_options").await.unwrap().unwrap();
	assert_eq!(&*stored.value, "SAMEORIGIN");
	assert!(stored.updated_at > Timestamp(1_700_000_000));
}

#[tokio::test]
async fn test_list_ordering_and_categories() {
	let (adapter, _temp) = create_test_adapter().await;
	adapter.insert_missing_settings(&seed_rows()).await.unwrap();

	let all = adapter.list_settings().await.unwrap();
	assert_eq!(all.len(), 4);
	assert_eq!(all.get("cors_allowed_origins").map(|v| &**v), Some(r#"["*"]"#));

	let rows = adapter.list_setting_rows().await.unwrap();
	let keys: Vec<&str> = rows.iter().map(|r| &*r.key).collect();
	assert_eq!(
		keys,
		["cors_allowed_origins", "cors_enabled", "rate_limit_api_rps", "security_frame_options"]
	);

	let cors = adapter.list_settings_by_category("cors").await.unwrap();
	assert_eq!(cors.len(), 2);
	assert!(cors.iter().all(|r| &*r.category == "cors"));
	assert!(adapter.list_settings_by_category("nothing").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_delete() {
	let (adapter, _temp) = create_test_adapter().await;
	adapter.insert_missing_settings(&seed_rows()).await.unwrap();

	adapter.delete_setting("cors_enabled").await.unwrap();
	assert_eq!(adapter.read_setting("cors_enabled").await.unwrap(), None);
	assert_eq!(adapter.list_settings().await.unwrap().len(), 3);

}

#[tokio::test]
async fn test_update_settings_is_all_or_nothing() {
	let (adapter, _temp) = create_test_adapter().await;
	adapter.insert_missing_settings(&seed_rows()).await.unwrap();

	let res = adapter
		.update_settings(&[("security_frame_options", "SAMEORIGIN"), ("no_such_key", "1")])
		.await;
	assert!(matches!(res, Err(Error::NotFound)));
	assert_eq!(
		adapter.read_setting("security_frame_options").await.unwrap().as_deref(),
		Some("DENY")
	);

	adapter
		.update_settings(&[("security_frame_options", "SAMEORIGIN"), ("rate_limit_api_rps", "75")])
		.await
		.unwrap();
	assert_eq!(
		adapter.read_setting("security_frame_options").await.unwrap().as_deref(),
		Some("SAMEORIGIN")
	);
	assert_eq!(adapter.read_setting("rate_limit_api_rps").await.unwrap().as_deref(), Some("75"));
}

#[tokio::test]
async fn test_replace_settings() {
	let (adapter, _temp) = create_test_adapter().await;
	adapter.insert_missing_settings(&seed_rows()).await.unwrap();
	adapter.update_setting("cors_enabled", "false").await.unwrap();

	let fresh = vec![row("cors_enabled", "true", SettingKind::Bool, "cors")];
	assert_eq!(adapter.replace_settings(&fresh).await.unwrap(), 1);

	let all = adapter.list_settings().await.unwrap();
	assert_eq!(all.len(), 1);
	assert_eq!(all.get("cors_enabled").map(|v| &**v), Some("true"));
}

#[tokio::test]
async fn test_reopen_keeps_data() {
	let temp_dir = TempDir::new().unwrap();
	let path = temp_dir.path().join("nested").join("anime.db");
	{
		let adapter = MetaAdapterSqlite::new(&path).await.unwrap();
		adapter.insert_missing_settings(&seed_rows()).await.unwrap();
		adapter.update_setting("rate_limit_api_rps", "75").await.unwrap();
	}

	let adapter = MetaAdapterSqlite::new(&path).await.unwrap();
	assert_eq!(adapter.read_setting("rate_limit_api_rps").await.unwrap().as_deref(), Some("75"));
}

// vim: ts=4
