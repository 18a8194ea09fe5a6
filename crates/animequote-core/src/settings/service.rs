//! Settings service: durable store + atomically swapped in-memory snapshot
//!
//! Readers clone an `Arc` of the current snapshot and never touch storage.
//! Every mutation (update, import, reset, reload) is serialized by a single
//! write lock, so a reload can never observe the store mid-reset.

use parking_lot::RwLock;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use animequote_types::meta_adapter::{MetaAdapter, SettingKind, SettingRow};

use super::config::{
	ConnectionLimitConfig, CorsConfig, RateLimitConfig, RequestLimitConfig, SecurityHeaderConfig,
};
use super::definitions::{CATEGORIES, SettingDefinition};
use super::snapshot::{SettingsSnapshot, validate_value};
use crate::prelude::*;

/// Result of a bulk update
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct UpdateOutcome {
	pub updated_count: usize,
	pub requires_reload: bool,
}

/// Result of a best-effort import
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImportReport {
	pub imported: usize,
	pub skipped: Vec<Box<str>>,
}

/// Exported form of a setting
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SettingExport {
	pub value: Box<str>,
	#[serde(rename = "type")]
	pub kind: SettingKind,
	pub category: Box<str>,
	pub description: Box<str>,
	pub requires_reload: bool,
	#[serde(serialize_with = "animequote_types::types::serialize_timestamp_iso")]
	pub updated_at: Timestamp,
}

/// Settings grouped by category
#[derive(Debug, Clone, Serialize)]
pub struct SettingsOverview {
	pub settings: BTreeMap<Box<str>, Vec<SettingRow>>,
	pub categories: Vec<Box<str>>,
}

/// Settings service - main interface for reading and managing settings
pub struct SettingsService {
	meta: Arc<dyn MetaAdapter>,
	defaults: Arc<[SettingDefinition]>,
	snapshot: RwLock<Arc<SettingsSnapshot>>,
	write_lock: tokio::sync::Mutex<()>,
}

impl std::fmt::Debug for SettingsService {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("SettingsService")
			.field("defaults", &self.defaults.len())
			.field("loaded", &self.snapshot.read().len())
			.finish_non_exhaustive()
	}
}

impl SettingsService {
	pub fn new(meta: Arc<dyn MetaAdapter>, defaults: Vec<SettingDefinition>) -> Self {
		Self {
			meta,
			defaults: defaults.into(),
			snapshot: RwLock::new(Arc::new(SettingsSnapshot::default())),
			write_lock: tokio::sync::Mutex::new(()),
		}
	}

	/// Seeds missing defaults and loads the first snapshot
	pub async fn init(&self) -> ClResult<()> {
		let _guard = self.write_lock.lock().await;
		let inserted = self.seed_defaults().await?;
		if inserted > 0 {
			info!("Seeded {} default settings", inserted);
		}
		let loaded = self.reload_locked().await?;
		info!("Settings loaded: {} keys", loaded);
		Ok(())
	}

	// Reads
	//*******

	/// Current snapshot. Cheap; never blocks on storage.
	pub fn snapshot(&self) -> Arc<SettingsSnapshot> {
		self.snapshot.read().clone()
	}

	pub fn get(&self, key: &str) -> Option<String> {
		self.snapshot().get(key).map(ToString::to_string)
	}

	pub fn get_string(&self, key: &str, default: &str) -> String {
		self.snapshot().get_string(key, default)
	}

	pub fn get_bool(&self, key: &str, default: bool) -> bool {
		self.snapshot().get_bool(key, default)
	}

	pub fn get_int(&self, key: &str, default: i64) -> i64 {
		self.snapshot().get_int(key, default)
	}

	pub fn get_string_list(&self, key: &str, default: &[&str]) -> Vec<String> {
		self.snapshot().get_string_list(key, default)
	}

	pub fn cors_config(&self) -> CorsConfig {
		self.snapshot().cors_config()
	}

	pub fn rate_limit_config(&self) -> RateLimitConfig {
		self.snapshot().rate_limit_config()
	}

	pub fn security_header_config(&self) -> SecurityHeaderConfig {
		self.snapshot().security_header_config()
	}

	pub fn request_limit_config(&self) -> RequestLimitConfig {
		self.snapshot().request_limit_config()
	}

	pub fn connection_limit_config(&self) -> ConnectionLimitConfig {
		self.snapshot().connection_limit_config()
	}

	// Reload
	//********

	/// Re-reads the whole store and swaps the snapshot.
	/// On storage failure the previous snapshot stays in place.
	pub async fn reload(&self) -> ClResult<usize> {
		let _guard = self.write_lock.lock().await;
		self.reload_locked().await
	}

	async fn reload_locked(&self) -> ClResult<usize> {
		let values = self.meta.list_settings().await.inspect_err(|err| {
			warn!("Settings reload failed, keeping last snapshot: {}", err);
		})?;
		let count = values.len();
		*self.snapshot.write() = Arc::new(SettingsSnapshot::new(values));
		debug!("Settings snapshot swapped ({} keys)", count);
		Ok(count)
	}

	async fn seed_defaults(&self) -> ClResult<u32> {
		let now = Timestamp::now();
		let rows: Vec<SettingRow> = self.defaults.iter().map(|def| def.to_row(now)).collect();
		self.meta.insert_missing_settings(&rows).await
	}

	// Writes
	//********

	async fn validated_row(&self, key: &str, value: &str) -> ClResult<SettingRow> {
		let row = self.meta.read_setting_row(key).await?.ok_or(Error::NotFound)?;
		validate_value(row.kind, value)?;
		Ok(row)
	}

	/// Writes one setting through to the store and reloads.
	/// Returns whether the setting needs a restart to take effect.
	pub async fn update(&self, key: &str, value: &str) -> ClResult<bool> {
		let _guard = self.write_lock.lock().await;
		let row = self.validated_row(key, value).await?;
		self.meta.update_setting(key, value).await?;
		info!("Setting updated: {}", key);
		self.reload_locked().await?;
		Ok(row.requires_reload)
	}

	/// Validates every change first, then writes them and reloads once
	pub async fn update_many(&self, changes: &BTreeMap<String, String>) -> ClResult<UpdateOutcome> {
		let _guard = self.write_lock.lock().await;

		let mut requires_reload = false;
		for (key, value) in changes {
			let row = self.validated_row(key, value).await.map_err(|err| match err {
				Error::NotFound => Error::ValidationError(format!("Unknown setting: {}", key)),
				err => err,
			})?;
			requires_reload |= row.requires_reload;
		}

		let batch: Vec<(&str, &str)> =
			changes.iter().map(|(key, value)| (key.as_str(), value.as_str())).collect();
		self.meta.update_settings(&batch).await?;
		info!("Settings updated: {} keys", changes.len());

		self.reload_locked().await?;
		Ok(UpdateOutcome { updated_count: changes.len(), requires_reload })
	}

	/// Applies each entry independently; failing keys are logged and skipped
	pub async fn import(&self, entries: &BTreeMap<String, String>) -> ClResult<ImportReport> {
		let _guard = self.write_lock.lock().await;

		let mut report = ImportReport::default();
		for (key, value) in entries {
			let res = match self.validated_row(key, value).await {
				Ok(_) => self.meta.update_setting(key, value).await,
				Err(err) => Err(err),
			};
			match res {
				Ok(()) => report.imported += 1,
				Err(err) => {
					warn!("Import of setting {} skipped: {}", key, err);
					report.skipped.push(key.as_str().into());
				}
			}
		}
		info!("Settings import: {} imported, {} skipped", report.imported, report.skipped.len());

		self.reload_locked().await?;
		Ok(report)
	}

	/// Replaces every stored setting with the defaults and reloads
	pub async fn reset_to_defaults(&self) -> ClResult<()> {
		let _guard = self.write_lock.lock().await;
		let now = Timestamp::now();
		let rows: Vec<SettingRow> = self.defaults.iter().map(|def| def.to_row(now)).collect();
		let inserted = self.meta.replace_settings(&rows).await?;
		self.reload_locked().await?;
		info!("Settings reset to defaults ({} keys)", inserted);
		Ok(())
	}

	// Administrative views
	//**********************

	pub async fn list_grouped(&self) -> ClResult<SettingsOverview> {
		let rows = self.meta.list_setting_rows().await?;

		let mut settings: BTreeMap<Box<str>, Vec<SettingRow>> = BTreeMap::new();
		for row in rows {
			settings.entry(row.category.clone()).or_default().push(row);
		}

		let mut categories: Vec<Box<str>> =
			CATEGORIES.iter().filter(|c| settings.contains_key(**c)).map(|c| (*c).into()).collect();
		for category in settings.keys() {
			if !CATEGORIES.contains(&category.as_ref()) {
				categories.push(category.clone());
			}
		}

		Ok(SettingsOverview { settings, categories })
	}

	pub async fn list_by_category(&self, category: &str) -> ClResult<Vec<SettingRow>> {
		self.meta.list_settings_by_category(category).await
	}

	pub async fn export(&self) -> ClResult<BTreeMap<Box<str>, SettingExport>> {
		let rows = self.meta.list_setting_rows().await?;
		Ok(rows
			.into_iter()
			.map(|row| {
				(
					row.key,
					SettingExport {
						value: row.value,
						kind: row.kind,
						category: row.category,
						description: row.description,
						requires_reload: row.requires_reload,
						updated_at: row.updated_at,
					},
				)
			})
			.collect())
	}

	/// Raw stored values, bypassing the snapshot
	pub async fn stored_values(&self) -> ClResult<HashMap<Box<str>, Box<str>>> {
		self.meta.list_settings().await
	}
}


// vim: ts=4
