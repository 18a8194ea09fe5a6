//! Immutable settings snapshot with typed accessors
//!
//! Typed accessors never fail: a missing key or a value that does not parse
//! yields the caller-supplied default.

use std::collections::HashMap;

use animequote_types::meta_adapter::SettingKind;

use crate::prelude::*;

/// Immutable `key -> value` mapping served to readers
#[derive(Debug, Default, Clone)]
pub struct SettingsSnapshot {
	values: HashMap<Box<str>, Box<str>>,
}

impl SettingsSnapshot {
	pub fn new(values: HashMap<Box<str>, Box<str>>) -> Self {
		Self { values }
	}

	pub fn get(&self, key: &str) -> Option<&str> {
		self.values.get(key).map(AsRef::as_ref)
	}

	pub fn len(&self) -> usize {
		self.values.len()
	}

	pub fn is_empty(&self) -> bool {
		self.values.is_empty()
	}

	pub fn get_string(&self, key: &str, default: &str) -> String {
		match self.get(key) {
			Some(value) if !value.is_empty() => value.to_string(),
			_ => default.to_string(),
		}
	}

	pub fn get_bool(&self, key: &str, default: bool) -> bool {
		self.get(key).and_then(parse_bool).unwrap_or(default)
	}

	pub fn get_int(&self, key: &str, default: i64) -> i64 {
		self.get(key).and_then(|v| v.trim().parse::<i64>().ok()).unwrap_or(default)
	}

	/// JSON string array. An empty array counts as absent.
	pub fn get_string_list(&self, key: &str, default: &[&str]) -> Vec<String> {
		match self.get(key).and_then(|v| serde_json::from_str::<Vec<String>>(v).ok()) {
			Some(list) if !list.is_empty() => list,
			_ => default.iter().map(ToString::to_string).collect(),
		}
	}
}

/// Boolean literals accepted in stored values
pub fn parse_bool(value: &str) -> Option<bool> {
	match value {
		"1" | "t" | "T" | "TRUE" | "true" | "True" => Some(true),
		"0" | "f" | "F" | "FALSE" | "false" | "False" => Some(false),
		_ => None,
	}
}

/// Checks that a raw value deserializes according to its declared kind
pub fn validate_value(kind: SettingKind, value: &str) -> ClResult<()> {
	let valid = match kind {
		SettingKind::String => true,
		SettingKind::Int => value.trim().parse::<i64>().is_ok(),
		SettingKind::Bool => parse_bool(value).is_some(),
		SettingKind::Json => serde_json::from_str::<serde_json::Value>(value).is_ok(),
	};

	if valid {
		Ok(())
	} else {
		Err(Error::ValidationError(format!("Value {:?} is not a valid {}", value, kind)))
	}
}


// vim: ts=4
