use std::collections::{HashMap, HashSet};
use std::fmt;
use std::num::ParseIntError;
use std::str::FromStr;

use log::{debug, info, warn};

use super::aggregate::regroup;
use super::error::{Result, Stage};
use super::observation::{GroupId, Observation};
use super::table::Table;


/// An age interval, `low..=high`, open-ended when `high` is `None`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AgeBand {
	pub low: u16,
	pub high: Option<u16>,
}

impl AgeBand {
	pub fn new(low: u16, high: Option<u16>) -> Self {
		Self{low, high}
	}

	pub fn contains_age(&self, age: u16) -> bool {
		age >= self.low && self.high.map_or(true, |h| age <= h)
	}

	/// Whether every age of `other` also lies in `self`.
	pub fn covers(&self, other: &AgeBand) -> bool {
		match other.high {
			Some(h) => self.contains_age(other.low) && self.contains_age(h),
			None => self.contains_age(other.low) && self.high.is_none(),
		}
	}

	pub fn group_id(&self) -> GroupId {
		format!("{}", self).into()
	}
}


#[derive(Debug, Clone)]
pub enum ParseAgeBandError {
	NoBounds,
	Inverted,
	InvalidNumber(ParseIntError),
}

impl fmt::Display for ParseAgeBandError {
	fn fmt<'f>(&self, f: &'f mut fmt::Formatter) -> fmt::Result {
		match self {
			Self::NoBounds => f.write_str("no recognisable age bounds"),
			Self::Inverted => f.write_str("upper age bound below lower bound"),
			Self::InvalidNumber(e) => fmt::Display::fmt(e, f),
		}
	}
}

impl std::error::Error for ParseAgeBandError {}

impl From<ParseIntError> for ParseAgeBandError {
	fn from(other: ParseIntError) -> Self {
		Self::InvalidNumber(other)
	}
}

fn strip_age_prefix(s: &str) -> &str {
	let s = s.trim();
	for prefix in &["Aged ", "aged ", "Ages ", "Age ", "age "] {
		if let Some(rest) = s.strip_prefix(*prefix) {
			return rest.trim()
		}
	}
	s
}

fn age_number(s: &str) -> std::result::Result<u16, ParseIntError> {
	// RKI style bounds carry a leading A, e.g. A15-A34
	let s = s.trim();
	let s = s.strip_prefix('A').unwrap_or(s);
	let mut s = s.trim();
	for unit in &[" years", " year", " yrs", " yr"] {
		if let Some(rest) = s.strip_suffix(*unit) {
			s = rest.trim();
			break
		}
	}
	s.parse::<u16>()
}

impl FromStr for AgeBand {
	type Err = ParseAgeBandError;

	fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
		let s = strip_age_prefix(s);
		if s.is_empty() {
			return Err(ParseAgeBandError::NoBounds)
		}
		let lower = s.to_ascii_lowercase();
		for prefix in &["under ", "<"] {
			if let Some(rest) = lower.strip_prefix(*prefix) {
				let bound = age_number(rest)?;
				if bound == 0 {
					return Err(ParseAgeBandError::Inverted)
				}
				return Ok(Self{low: 0, high: Some(bound - 1)})
			}
		}
		if let Some(rest) = s.strip_suffix('+') {
			return Ok(Self{low: age_number(rest)?, high: None})
		}
		for suffix in &[" and over", " and older", " plus", " or over"] {
			if let Some(rest) = lower.strip_suffix(*suffix) {
				return Ok(Self{low: age_number(rest)?, high: None})
			}
		}
		let bounds = s.split_once(" to ")
			.or_else(|| s.split_once('-'))
			.or_else(|| s.split_once('_'));
		let (low, high) = match bounds {
			Some((low, high)) => (age_number(low)?, age_number(high)?),
			None => {
				let v = age_number(s).map_err(|_| ParseAgeBandError::NoBounds)?;
				(v, v)
			},
		};
		if high < low {
			return Err(ParseAgeBandError::Inverted)
		}
		Ok(Self{low, high: Some(high)})
	}
}

impl fmt::Display for AgeBand {
	fn fmt<'f>(&self, f: &'f mut fmt::Formatter) -> fmt::Result {
		match self.high {
			Some(h) => write!(f, "{}-{}", self.low, h),
			None => write!(f, "{}+", self.low),
		}
	}
}

/// Group id of the first band in `bands` covering the age range of `label`,
/// so that "Aged 15 to 44" in one file meets "15-44" in another.
///
/// This is the rule `PopulationLookup::from_pyramid` sums by, so a finer
/// label such as "30_34" lands on the same id as the "30-39" denominator.
pub fn band_group(label: &str, bands: &[AgeBand]) -> Option<GroupId> {
	let band = label.parse::<AgeBand>().ok()?;
	bands.iter().find(|b| b.covers(&band)).map(|b| b.group_id())
}

/// Move observations labelled with ages onto `bands`, summing what lands
/// on the same band. Labels no band covers are dropped with a warning.
pub fn regroup_into_bands(obs: Vec<Observation>, bands: &[AgeBand]) -> Vec<Observation> {
	let mut unmatched: Vec<GroupId> = Vec::new();
	for o in obs.iter() {
		if band_group(&o.group, bands).is_none() && !unmatched.contains(&o.group) {
			unmatched.push(o.group.clone());
		}
	}
	if !unmatched.is_empty() {
		warn!("dropping age label(s) {:?}: no declared band covers them", unmatched);
	}
	regroup(obs, |g| band_group(g, bands))
}


/// Denominators per group. Built once, then only read.
#[derive(Debug, Clone, Default)]
pub struct PopulationLookup {
	entries: HashMap<GroupId, f64>,
	// groups whose population had a missing contribution
	poisoned: HashSet<GroupId>,
	order: Vec<GroupId>,
}

impl PopulationLookup {
	pub fn new() -> Self {
		Self::default()
	}

	fn add(&mut self, group: GroupId, value: Option<f64>) {
		if !self.order.contains(&group) {
			self.order.push(group.clone());
		}
		if self.poisoned.contains(&group) {
			return
		}
		match value {
			Some(v) => *self.entries.entry(group).or_insert(0.) += v,
			None => {
				self.entries.remove(&group);
				self.poisoned.insert(group);
			},
		}
	}

	/// Build from (group, population) pairs; repeated groups are summed.
	pub fn from_pairs<I: IntoIterator<Item = (GroupId, Option<f64>)>>(pairs: I) -> Self {
		let mut result = Self::new();
		for (g, v) in pairs {
			result.add(g, v);
		}
		result
	}

	/// Build from a table with one population row per group. Repeated
	/// groups (e.g. one row per sex) are summed.
	pub fn from_table(table: &Table, group_column: &str, population_column: &str) -> Result<Self> {
		let gi = table.column_index(group_column, Stage::Normaliser)?;
		let pi = table.column_index(population_column, Stage::Normaliser)?;
		let mut result = Self::new();
		for row in table.rows() {
			let group = match row[gi].as_text() {
				Some(g) => g,
				None => continue,
			};
			result.add(group.into(), row[pi].as_number());
		}
		result.log_summary();
		Ok(result)
	}

	/// Sum a single-year-of-age pyramid into `bands`.
	///
	/// Each pyramid row is assigned to the first band covering its whole
	/// age range; rows covered by no band are skipped.
	pub fn from_pyramid(table: &Table, age_column: &str, population_column: &str, bands: &[AgeBand]) -> Result<Self> {
		let ai = table.column_index(age_column, Stage::Normaliser)?;
		let pi = table.column_index(population_column, Stage::Normaliser)?;
		let mut result = Self::new();
		for band in bands {
			result.order.push(band.group_id());
		}
		let mut skipped = 0usize;
		for row in table.rows() {
			let row_band = match row[ai].as_text().and_then(|s| s.parse::<AgeBand>().ok()) {
				Some(b) => b,
				None => {
					skipped += 1;
					continue
				},
			};
			match bands.iter().find(|b| b.covers(&row_band)) {
				Some(band) => result.add(band.group_id(), row[pi].as_number()),
				None => skipped += 1,
			}
		}
		if skipped > 0 {
			debug!("{} pyramid row(s) matched no age band", skipped);
		}
		result.log_summary();
		Ok(result)
	}

	/// Add an aggregate group whose population is the sum of `members`.
	pub fn synthesize(mut self, members: &[&str], name: &str) -> Self {
		let mut total = Some(0.);
		for m in members {
			total = match (total, self.get(m)) {
				(Some(t), Some(v)) => Some(t + v),
				_ => None,
			};
		}
		if total.is_none() {
			warn!("population of {} is missing, one of its members has none", name);
		}
		self.add(name.into(), total);
		self
	}

	/// Raw population of `group`, if known.
	pub fn get(&self, group: &str) -> Option<f64> {
		self.entries.get(group).copied()
	}

	/// Groups in first-insertion order.
	pub fn groups(&self) -> &[GroupId] {
		&self.order[..]
	}

	pub fn len(&self) -> usize {
		self.entries.len()
	}

	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}

	fn log_summary(&self) {
		info!("population lookup with {} group(s)", self.entries.len());
		if !self.poisoned.is_empty() {
			warn!("{} group(s) have an incomplete population and no denominator", self.poisoned.len());
		}
	}
}


#[cfg(test)]
mod tests {
	use super::*;
	use crate::loader::load_csv;
	use crate::table::Schema;

	#[test]
	fn parses_common_age_labels() {
		assert_eq!("0-14".parse::<AgeBand>().unwrap(), AgeBand::new(0, Some(14)));
		assert_eq!("15 to 44".parse::<AgeBand>().unwrap(), AgeBand::new(15, Some(44)));
		assert_eq!("Aged 45 to 64".parse::<AgeBand>().unwrap(), AgeBand::new(45, Some(64)));
		assert_eq!("85+".parse::<AgeBand>().unwrap(), AgeBand::new(85, None));
		assert_eq!("90 and over".parse::<AgeBand>().unwrap(), AgeBand::new(90, None));
		assert_eq!("Under 1".parse::<AgeBand>().unwrap(), AgeBand::new(0, Some(0)));
		assert_eq!("Under 1 year".parse::<AgeBand>().unwrap(), AgeBand::new(0, Some(0)));
		assert_eq!("85 years and over".parse::<AgeBand>().unwrap(), AgeBand::new(85, None));
		assert_eq!("A15-A34".parse::<AgeBand>().unwrap(), AgeBand::new(15, Some(34)));
		assert_eq!("42".parse::<AgeBand>().unwrap(), AgeBand::new(42, Some(42)));
		assert!("44-15".parse::<AgeBand>().is_err());
		assert!("unknown".parse::<AgeBand>().is_err());
	}

	#[test]
	fn display_is_canonical() {
		assert_eq!(AgeBand::new(15, Some(44)).to_string(), "15-44");
		assert_eq!(AgeBand::new(85, None).to_string(), "85+");
		let bands = [AgeBand::new(15, Some(44))];
		assert_eq!(band_group("Aged 15 to 44", &bands).as_deref(), Some("15-44"));
		assert_eq!(band_group("n/a", &bands), None);
	}

	#[test]
	fn covers_respects_open_ends() {
		let b = AgeBand::new(80, None);
		assert!(b.covers(&AgeBand::new(90, None)));
		assert!(b.covers(&AgeBand::new(80, Some(84))));
		assert!(!b.covers(&AgeBand::new(75, Some(84))));
		assert!(!AgeBand::new(80, Some(89)).covers(&AgeBand::new(85, None)));
		assert!(AgeBand::new(0, Some(14)).contains_age(14));
		assert!(!AgeBand::new(0, Some(14)).contains_age(15));
	}

	#[test]
	fn pyramid_sums_into_bands() {
		let mut data = String::from("age,population\n");
		for age in 0..90 {
			data.push_str(&format!("{},100\n", age));
		}
		data.push_str("90+,\"1,000\"\n");
		let schema = Schema::new().text("age").number("population");
		let table = load_csv(data.as_bytes(), &schema).unwrap();
		let bands: Vec<AgeBand> = vec!["0-14", "15-44", "45-64", "65-74", "75-84", "85+"]
			.into_iter().map(|s| s.parse().unwrap()).collect();
		let lookup = PopulationLookup::from_pyramid(&table, "age", "population", &bands).unwrap();
		assert_eq!(lookup.get("0-14"), Some(1500.));
		assert_eq!(lookup.get("15-44"), Some(3000.));
		assert_eq!(lookup.get("85+"), Some(500. + 1000.));
		assert_eq!(&lookup.groups()[0][..], "0-14");
		assert_eq!(lookup.len(), 6);
	}

	#[test]
	fn finer_labels_land_on_covering_bands() {
		let bands = [AgeBand::new(0, Some(0)), AgeBand::new(30, Some(39)), AgeBand::new(80, None)];
		assert_eq!(band_group("30_34", &bands).as_deref(), Some("30-39"));
		assert_eq!(band_group("90+", &bands).as_deref(), Some("80+"));
		assert_eq!(band_group("Under 1 year", &bands).as_deref(), Some("0-0"));
		// straddles two bands
		assert_eq!(band_group("35-44", &bands), None);
	}

	#[test]
	fn five_year_labels_get_ten_year_denominators() {
		use crate::normalise::{Normaliser, PERCENT};
		use chrono::NaiveDate;

		let d = NaiveDate::from_ymd_opt(2021, 4, 4).unwrap();
		let mut data = String::from("age,population\n");
		for age in 30..90 {
			data.push_str(&format!("{},10\n", age));
		}
		data.push_str("90+,100\n");
		let table = load_csv(data.as_bytes(), &Schema::new().text("age").number("population")).unwrap();
		let bands = [AgeBand::new(30, Some(39)), AgeBand::new(80, None)];
		let lookup = PopulationLookup::from_pyramid(&table, "age", "population", &bands).unwrap();
		assert_eq!(lookup.get("30-39"), Some(100.));
		assert_eq!(lookup.get("80+"), Some(200.));

		let obs = regroup_into_bands(vec![
			Observation::new("30_34", d, Some(20.)),
			Observation::new("35_39", d, Some(30.)),
			Observation::new("85_89", d, Some(40.)),
			Observation::new("90+", d, Some(60.)),
			Observation::new("unknown", d, Some(1.)),
		], &bands);
		let rates = Normaliser::per_population(&lookup, PERCENT).normalise(obs);
		assert_eq!(rates.len(), 2);
		assert_eq!(&rates[0].group[..], "30-39");
		assert_eq!(rates[0].rate, Some(50.));
		assert_eq!(&rates[1].group[..], "80+");
		assert_eq!(rates[1].rate, Some(50.));
	}

	#[test]
	fn missing_contribution_poisons_group() {
		let lookup = PopulationLookup::from_pairs(vec![
			("A".into(), Some(10.)),
			("B".into(), Some(0.)),
			("C".into(), None),
			("C".into(), Some(5.)),
			("A".into(), Some(5.)),
		]);
		assert_eq!(lookup.get("A"), Some(15.));
		assert_eq!(lookup.get("B"), Some(0.));
		assert_eq!(lookup.get("C"), None);
		assert_eq!(lookup.get("D"), None);
		assert_eq!(lookup.groups(), &[GroupId::from("A"), GroupId::from("B"), GroupId::from("C")]);
	}

	#[test]
	fn synthesized_total_sums_members() {
		let lookup = PopulationLookup::from_pairs(vec![
			("North".into(), Some(100.)),
			("South".into(), Some(50.)),
		]).synthesize(&["North", "South"], "England");
		assert_eq!(lookup.get("England"), Some(150.));
		let lookup = lookup.synthesize(&["North", "Wales"], "Broken");
		assert_eq!(lookup.get("Broken"), None);
	}
}
