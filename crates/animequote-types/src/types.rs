//! Common primitive types

use serde::{Deserialize, Serialize, Serializer};
use std::time::{SystemTime, UNIX_EPOCH};

/// Unix timestamp in seconds
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize, Serialize)]
pub struct Timestamp(pub i64);

impl Timestamp {
	pub fn now() -> Timestamp {
		let res = SystemTime::now().duration_since(UNIX_EPOCH).map_or(0, |d| d.as_secs());
		Timestamp(i64::try_from(res).unwrap_or(i64::MAX))
	}

	pub fn from_now(delta: i64) -> Timestamp {
		Timestamp(Self::now().0.saturating_add(delta))
	}

	/// RFC 3339 rendering, empty if out of range
	pub fn to_iso_string(&self) -> String {
		chrono::DateTime::from_timestamp(self.0, 0).map(|dt| dt.to_rfc3339()).unwrap_or_default()
	}
}

impl std::fmt::Display for Timestamp {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "{}", self.0)
	}
}

/// Serialize a timestamp as an ISO 8601 string
pub fn serialize_timestamp_iso<S>(ts: &Timestamp, serializer: S) -> Result<S::Ok, S::Error>
where
	S: Serializer,
{
	serializer.serialize_str(&ts.to_iso_string())
}


// vim: ts=4
