//! In-memory settings store
//!
//! Used by tests and by deployments that run without a database. Can be
//! switched to "unavailable" to exercise storage failure handling.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};

use animequote_types::meta_adapter::{MetaAdapter, SettingRow};

use crate::prelude::*;

#[derive(Debug, Default)]
pub struct InMemoryMetaAdapter {
	rows: Mutex<BTreeMap<Box<str>, SettingRow>>,
	unavailable: AtomicBool,
}

impl InMemoryMetaAdapter {
	pub fn new() -> Self {
		Self::default()
	}

	/// Makes every subsequent call fail with `Error::DbError`
	pub fn set_unavailable(&self, unavailable: bool) {
		self.unavailable.store(unavailable, Ordering::Relaxed);
	}

	fn check(&self) -> ClResult<()> {
		if self.unavailable.load(Ordering::Relaxed) { Err(Error::DbError) } else { Ok(()) }
	}
}

#[async_trait]
impl MetaAdapter for InMemoryMetaAdapter {
	async fn read_setting(&self, key: &str) -> ClResult<Option<Box<str>>> {
		self.check()?;
		Ok(self.rows.lock().get(key).map(|row| row.value.clone()))
	}

	async fn read_setting_row(&self, key: &str) -> ClResult<Option<SettingRow>> {
		self.check()?;
		Ok(self.rows.lock().get(key).cloned())
	}

	async fn update_setting(&self, key: &str, value: &str) -> ClResult<()> {
		self.check()?;
		let mut rows = self.rows.lock();
		let row = rows.get_mut(key).ok_or(Error::NotFound)?;
		row.value = value.into();
		row.updated_at = Timestamp::now();
		Ok(())
	}

	async fn update_settings(&self, changes: &[(&str, &str)]) -> ClResult<()> {
		self.check()?;
		let mut rows = self.rows.lock();
		if changes.iter().any(|(key, _)| !rows.contains_key(*key)) {
			return Err(Error::NotFound);
		}
		let now = Timestamp::now();
		for (key, value) in changes {
			if let Some(row) = rows.get_mut(*key) {
				row.value = (*value).into();
				row.updated_at = now;
			}
		}
		Ok(())
	}

	async fn list_settings(&self) -> ClResult<HashMap<Box<str>, Box<str>>> {
		self.check()?;
		Ok(self.rows.lock().values().map(|row| (row.key.clone(), row.value.clone())).collect())
	}

	async fn list_setting_rows(&self) -> ClResult<Vec<SettingRow>> {
		self.check()?;
		let mut rows: Vec<SettingRow> = self.rows.lock().values().cloned().collect();
		rows.sort_by(|a, b| a.category.cmp(&b.category).then_with(|| a.key.cmp(&b.key)));
		Ok(rows)
	}

	async fn list_settings_by_category(&self, category: &str) -> ClResult<Vec<SettingRow>> {
		self.check()?;
		Ok(self.rows.lock().values().filter(|row| row.category.as_ref() == category).cloned().collect())
	}

	async fn delete_setting(&self, key: &str) -> ClResult<()> {
		self.check()?;
		self.rows.lock().remove(key);
		Ok(())
	}

	async fn replace_settings(&self, rows: &[SettingRow]) -> ClResult<u32> {
		self.check()?;
		let mut stored = self.rows.lock();
		*stored = rows.iter().map(|row| (row.key.clone(), row.clone())).collect();
		Ok(stored.len() as u32)
	}

	async fn insert_missing_settings(&self, rows: &[SettingRow]) -> ClResult<u32> {
		self.check()?;
		let mut stored = self.rows.lock();
		let mut inserted = 0;
		for row in rows {
			if !stored.contains_key(&row.key) {
				stored.insert(row.key.clone(), row.clone());
				inserted += 1;
			}
		}
		Ok(inserted)
	}
}

// vim: ts=4
