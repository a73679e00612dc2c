use std::fmt;
use std::num::ParseFloatError;

use chrono::NaiveDate;

use enum_map::{Enum, EnumMap};

use log::warn;

use smartstring::alias::{String as SmartString};


/// Why a cell carries no value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Enum)]
pub enum MissingReason {
	Empty,
	Unparseable,
	NegativeSentinel,
	NoDenominator,
}

impl fmt::Display for MissingReason {
	fn fmt<'f>(&self, f: &'f mut fmt::Formatter) -> fmt::Result {
		match self {
			Self::Empty => f.write_str("empty"),
			Self::Unparseable => f.write_str("unparseable"),
			Self::NegativeSentinel => f.write_str("negative sentinel"),
			Self::NoDenominator => f.write_str("no denominator"),
		}
	}
}


#[derive(Debug, Clone, PartialEq)]
pub enum Field {
	Text(SmartString),
	Number(f64),
	Date(NaiveDate),
	Missing(MissingReason),
}

impl Field {
	pub fn as_text(&self) -> Option<&str> {
		match self {
			Self::Text(s) => Some(&s[..]),
			_ => None,
		}
	}

	pub fn as_number(&self) -> Option<f64> {
		match self {
			Self::Number(v) => Some(*v),
			_ => None,
		}
	}

	pub fn as_date(&self) -> Option<NaiveDate> {
		match self {
			Self::Date(d) => Some(*d),
			_ => None,
		}
	}

	pub fn is_missing(&self) -> bool {
		matches!(self, Self::Missing(_))
	}
}


#[derive(Debug, Clone, PartialEq)]
pub enum ParseCellError {
	Empty,
	Invalid(ParseFloatError),
	NotFinite,
}

impl fmt::Display for ParseCellError {
	fn fmt<'f>(&self, f: &'f mut fmt::Formatter) -> fmt::Result {
		match self {
			Self::Empty => f.write_str("empty cell"),
			Self::Invalid(e) => fmt::Display::fmt(e, f),
			Self::NotFinite => f.write_str("not a finite number"),
		}
	}
}

impl std::error::Error for ParseCellError {}

impl From<ParseFloatError> for ParseCellError {
	fn from(other: ParseFloatError) -> Self {
		Self::Invalid(other)
	}
}

impl From<ParseCellError> for MissingReason {
	fn from(other: ParseCellError) -> Self {
		match other {
			ParseCellError::Empty => Self::Empty,
			ParseCellError::Invalid(_) | ParseCellError::NotFinite => Self::Unparseable,
		}
	}
}

static NA_MARKERS: &[&str] = &["NA", "N/A", "n/a", "na", "-", "..", ":", "x", "z"];

fn is_separator(c: char) -> bool {
	c == ',' || c == '_' || c == ' ' || c == '\u{a0}' || c == '\u{202f}' || c == '\u{2009}'
}

/// Parse a numeric cell such as `"1,234"` or `" 56 "`.
///
/// Thousands separators and surrounding whitespace are dropped. The usual
/// "not available" markers of statistical releases count as empty.
pub fn parse_count(s: &str) -> Result<f64, ParseCellError> {
	let s = s.trim();
	if s.is_empty() || NA_MARKERS.contains(&s) {
		return Err(ParseCellError::Empty)
	}
	let cleaned: String = s.chars().filter(|c| !is_separator(*c)).collect();
	let v = cleaned.parse::<f64>()?;
	if !v.is_finite() {
		return Err(ParseCellError::NotFinite)
	}
	Ok(v)
}

pub fn parse_count_field(s: &str) -> Field {
	match parse_count(s) {
		Ok(v) => Field::Number(v),
		Err(e) => Field::Missing(e.into()),
	}
}


/// Running count of missing cells per reason.
#[derive(Debug, Clone, Default)]
pub struct MissingTally(EnumMap<MissingReason, usize>);

impl MissingTally {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn record(&mut self, reason: MissingReason) {
		self.0[reason] += 1;
	}

	pub fn observe(&mut self, field: &Field) {
		if let Field::Missing(reason) = field {
			self.record(*reason);
		}
	}

	pub fn get(&self, reason: MissingReason) -> usize {
		self.0[reason]
	}

	pub fn total(&self) -> usize {
		self.0.iter().map(|(_, n)| *n).sum()
	}

	/// Emit one warning per non-zero reason.
	pub fn report(&self, what: &str) {
		for (reason, n) in self.0.iter() {
			if *n > 0 {
				warn!("{}: {} missing cell(s) ({})", what, n, reason);
			}
		}
	}
}
