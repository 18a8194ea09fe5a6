//! Adapter that stores the durable settings table.
//!
//! The settings cache is the only reader; administrative writes go through
//! the cache so that every write is followed by a reload.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt::Debug;

use crate::prelude::*;

/// Declared kind of a setting value. Values are always stored as strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SettingKind {
	String,
	Int,
	Bool,
	Json,
}

impl SettingKind {
	pub fn as_str(&self) -> &'static str {
		match self {
			SettingKind::String => "string",
			SettingKind::Int => "int",
			SettingKind::Bool => "bool",
			SettingKind::Json => "json",
		}
	}

	pub fn parse(s: &str) -> Option<SettingKind> {
		match s {
			"string" => Some(SettingKind::String),
			"int" => Some(SettingKind::Int),
			"bool" => Some(SettingKind::Bool),
			"json" => Some(SettingKind::Json),
			_ => None,
		}
	}
}

impl std::fmt::Display for SettingKind {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.write_str(self.as_str())
	}
}

/// One row of the settings table
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SettingRow {
	pub key: Box<str>,
	pub value: Box<str>,
	#[serde(rename = "type")]
	pub kind: SettingKind,
	pub category: Box<str>,
	pub description: Box<str>,
	pub requires_reload: bool,
	#[serde(serialize_with = "crate::types::serialize_timestamp_iso")]
	pub updated_at: Timestamp,
}

#[async_trait]
pub trait MetaAdapter: Debug + Send + Sync {
	/// Reads the raw value of a single setting
	async fn read_setting(&self, key: &str) -> ClResult<Option<Box<str>>>;

	/// Reads a setting together with its metadata
	async fn read_setting_row(&self, key: &str) -> ClResult<Option<SettingRow>>;

	/// Updates the value of an existing setting. Returns `Error::NotFound`
	/// if the key does not exist.
	async fn update_setting(&self, key: &str, value: &str) -> ClResult<()>;

	/// Updates several existing settings as one unit. Either every value is
	/// written or none is; an unknown key fails the batch with `Error::NotFound`.
	async fn update_settings(&self, changes: &[(&str, &str)]) -> ClResult<()>;

	/// Returns every `key -> value` pair
	async fn list_settings(&self) -> ClResult<HashMap<Box<str>, Box<str>>>;

	/// Returns every setting with metadata, ordered by category and key
	async fn list_setting_rows(&self) -> ClResult<Vec<SettingRow>>;

	/// Returns the settings of one category, ordered by key
	async fn list_settings_by_category(&self, category: &str) -> ClResult<Vec<SettingRow>>;

	/// Deletes a single setting
	async fn delete_setting(&self, key: &str) -> ClResult<()>;

	/// Replaces the whole settings table with the given rows as one unit.
	/// Returns the number of rows written.
	async fn replace_settings(&self, rows: &[SettingRow]) -> ClResult<u32>;

	/// Inserts the given rows, skipping keys that already exist.
	/// Returns the number of inserted rows.
	async fn insert_missing_settings(&self, rows: &[SettingRow]) -> ClResult<u32>;
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_kind_round_trip() {
		for kind in [SettingKind::String, SettingKind::Int, SettingKind::Bool, SettingKind::Json] {
			assert_eq!(SettingKind::parse(kind.as_str()), Some(kind));
		}
		assert_eq!(SettingKind::parse("float"), None);
	}

	#[test]
	fn test_row_serializes_type_field() {
		let row = SettingRow {
			key: "cors_enabled".into(),
			value: "true".into(),
			kind: SettingKind::Bool,
			category: "cors".into(),
			description: "Enable CORS".into(),
			requires_reload: false,
			updated_at: Timestamp(0),
		};
		let json = serde_json::to_value(&row).unwrap();
		assert_eq!(json["type"], "bool");
		assert_eq!(json["requires_reload"], false);
		assert_eq!(json["updated_at"], "1970-01-01T00:00:00+00:00");
	}
}

// vim: ts=4
