//! Five-field cron specification: `minute hour day month weekday`
//!
//! Each field is `*`, an exact value, an inclusive `a-b` range, a
//! comma-separated list, or a `*/n` / `s/n` stride. Values are checked
//! against the field bounds when the spec is parsed.

use chrono::{DateTime, Datelike, TimeZone, Timelike};

use crate::prelude::*;

/// One parsed cron field
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CronField {
	Any,
	Exact(u32),
	Range(u32, u32),
	List(Vec<u32>),
	Step { start: Option<u32>, step: u32 },
}

impl CronField {
	pub fn matches(&self, value: u32) -> bool {
		match self {
			CronField::Any => true,
			CronField::Exact(v) => *v == value,
			CronField::Range(start, end) => (*start..=*end).contains(&value),
			CronField::List(values) => values.contains(&value),
			CronField::Step { start: None, step } => value % step == 0,
			CronField::Step { start: Some(start), step } => {
				value >= *start && (value - start) % step == 0
			}
		}
	}
}

#[derive(Debug, Clone, Copy)]
struct FieldSpec {
	name: &'static str,
	min: u32,
	max: u32,
}

const FIELDS: [FieldSpec; 5] = [
	FieldSpec { name: "minute", min: 0, max: 59 },
	FieldSpec { name: "hour", min: 0, max: 23 },
	FieldSpec { name: "day", min: 1, max: 31 },
	FieldSpec { name: "month", min: 1, max: 12 },
	FieldSpec { name: "weekday", min: 0, max: 6 },
];

fn invalid(field: &FieldSpec, msg: impl std::fmt::Display) -> Error {
	Error::ValidationError(format!("invalid {} field: {}", field.name, msg))
}

fn parse_value(field: &FieldSpec, s: &str) -> ClResult<u32> {
	let v: u32 = s.trim().parse().map_err(|_| invalid(field, format!("bad value {:?}", s)))?;
	if v < field.min || v > field.max {
		return Err(invalid(
			field,
			format!("value {} out of bounds ({}-{})", v, field.min, field.max),
		));
	}
	Ok(v)
}

fn parse_field(field: &FieldSpec, s: &str) -> ClResult<CronField> {
	if s == "*" {
		return Ok(CronField::Any);
	}

	if let Some((start, end)) = s.split_once('-') {
		let start = parse_value(field, start)?;
		let end = parse_value(field, end)?;
		if start > end {
			return Err(invalid(field, format!("empty range {}-{}", start, end)));
		}
		return Ok(CronField::Range(start, end));
	}

	if s.contains(',') {
		let values = s.split(',').map(|v| parse_value(field, v)).collect::<ClResult<Vec<_>>>()?;
		return Ok(CronField::List(values));
	}

	if let Some((start, step)) = s.split_once('/') {
		let step: u32 = step
			.parse()
			.ok()
			.filter(|step| *step > 0)
			.ok_or_else(|| invalid(field, format!("bad step {:?}", step)))?;
		let start = if start == "*" { None } else { Some(parse_value(field, start)?) };
		return Ok(CronField::Step { start, step });
	}

	Ok(CronField::Exact(parse_value(field, s)?))
}

/// Parsed five-field cron specification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CronSpec {
	source: Box<str>,
	minute: CronField,
	hour: CronField,
	day: CronField,
	month: CronField,
	weekday: CronField,
}

impl CronSpec {
	pub fn parse(spec: &str) -> ClResult<Self> {
		let parts: Vec<&str> = spec.split_whitespace().collect();
		let [minute, hour, day, month, weekday] = parts.as_slice() else {
			return Err(Error::ValidationError(format!(
				"schedule must have 5 fields (minute hour day month weekday), got {}",
				parts.len()
			)));
		};

		Ok(Self {
			source: spec.trim().into(),
			minute: parse_field(&FIELDS[0], minute)?,
			hour: parse_field(&FIELDS[1], hour)?,
			day: parse_field(&FIELDS[2], day)?,
			month: parse_field(&FIELDS[3], month)?,
			weekday: parse_field(&FIELDS[4], weekday)?,
		})
	}

	/// True if every field matches the given wall-clock time
	pub fn matches<Tz: TimeZone>(&self, time: &DateTime<Tz>) -> bool {
		self.minute.matches(time.minute())
			&& self.hour.matches(time.hour())
			&& self.day.matches(time.day())
			&& self.month.matches(time.month())
			&& self.weekday.matches(time.weekday().num_days_from_sunday())
	}

	pub fn as_str(&self) -> &str {
		&self.source
	}
}

impl std::str::FromStr for CronSpec {
	type Err = Error;

	fn from_str(s: &str) -> ClResult<Self> {
		Self::parse(s)
	}
}

impl std::fmt::Display for CronSpec {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.write_str(&self.source)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use chrono::Utc;

	fn at(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> DateTime<Utc> {
		Utc.with_ymd_and_hms(y, mo, d, h, mi, 0).unwrap()
	}

	#[test]
	fn test_weekly_spec() {
		let spec = CronSpec::parse("0 3 * * 0").unwrap();
		// 2024-06-02 is a Sunday, 2024-06-03 a Monday
		assert!(spec.matches(&at(2024, 6, 2, 3, 0)));
		assert!(!spec.matches(&at(2024, 6, 2, 3, 5)));
		assert!(!spec.matches(&at(2024, 6, 3, 3, 0)));
		assert!(!spec.matches(&at(2024, 6, 2, 4, 0)));
		// Any day and month
		assert!(spec.matches(&at(2025, 1, 5, 3, 0)));
	}

	#[test]
	fn test_rejects_malformed_specs() {
		for spec in [
			"60 3 * * 0",
			"*/0 * * * *",
			"* * * *",
			"* * * * * *",
			"",
			"* 24 * * *",
			"* * 0 * *",
			"* * * 13 *",
			"* * * * 7",
			"5-1 * * * *",
			"1-2-3 * * * *",
			"1,x * * * *",
			"a * * * *",
			"*/x * * * *",
			"70/5 * * * *",
			"-1 * * * *",
		] {
			assert!(
				matches!(CronSpec::parse(spec), Err(Error::ValidationError(_))),
				"accepted {:?}",
				spec
			);
		}
	}

	#[test]
	fn test_field_forms() {
		let spec = CronSpec::parse("*/15 9-17 1,15 * 1-5").unwrap();
		// 2024-06-03 is a Monday
		assert!(!spec.matches(&at(2024, 6, 3, 9, 0)));
		assert!(spec.matches(&at(2024, 7, 15, 17, 45)));
		assert!(spec.matches(&at(2024, 7, 1, 9, 30)));
		assert!(!spec.matches(&at(2024, 7, 1, 9, 31)));
		assert!(!spec.matches(&at(2024, 7, 1, 18, 0)));
		assert!(!spec.matches(&at(2024, 7, 2, 9, 0)));
	}

	#[test]
	fn test_stride_with_start() {
		let field = parse_field(&FIELDS[0], "5/20").unwrap();
		assert_eq!(field, CronField::Step { start: Some(5), step: 20 });
		assert!(field.matches(5));
		assert!(field.matches(25));
		assert!(field.matches(45));
		assert!(!field.matches(0));
		assert!(!field.matches(30));
	}

	#[test]
	fn test_stride_without_start_is_modulo() {
		let field = parse_field(&FIELDS[2], "*/5").unwrap();
		assert!(field.matches(5));
		assert!(field.matches(30));
		assert!(!field.matches(1));
	}

	#[test]
	fn test_display_keeps_source() {
		let spec: CronSpec = " 0 3 * * 0 ".parse().unwrap();
		assert_eq!(spec.to_string(), "0 3 * * 0");
	}
}

// vim: ts=4
