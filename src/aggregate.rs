use std::collections::HashMap;

use chrono::{NaiveDate, Weekday};

use log::{debug, warn};

use smartstring::alias::{String as SmartString};

use super::calendar::{week_ending, Calendar};
use super::observation::{GroupId, Observation};


/// Add two possibly-missing values. A missing addend makes the sum missing.
#[inline(always)]
pub fn strict_sum(a: Option<f64>, b: Option<f64>) -> Option<f64> {
	Some(a? + b?)
}

type ObservationKey = (GroupId, NaiveDate, Option<SmartString>);

fn key_of(o: &Observation) -> ObservationKey {
	(o.group.clone(), o.date, o.category.clone())
}

/// How rows falling into the same slot are combined.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Combine {
	/// add them up (flows: deaths per day, admissions per day)
	Sum,
	/// keep the latest by date (stocks: cumulative doses, occupied beds)
	Last,
}

/// Merge observations sharing group, date and category by summing them.
///
/// Output order follows the first appearance of each key.
pub fn sum_by_key(obs: Vec<Observation>) -> Vec<Observation> {
	let mut index: HashMap<ObservationKey, usize> = HashMap::new();
	let mut result: Vec<Observation> = Vec::with_capacity(obs.len());
	for o in obs.into_iter() {
		let k = key_of(&o);
		match index.get(&k) {
			Some(i) => {
				let acc = &mut result[*i];
				acc.value = strict_sum(acc.value, o.value);
			},
			None => {
				index.insert(k, result.len());
				result.push(o);
			},
		}
	}
	result
}

/// Move every observation to a new group (or drop it) and sum what collides.
pub fn regroup<F: Fn(&str) -> Option<GroupId>>(obs: Vec<Observation>, f: F) -> Vec<Observation> {
	let mut dropped = 0usize;
	let moved: Vec<Observation> = obs.into_iter().filter_map(|mut o| {
		match f(&o.group[..]) {
			Some(g) => {
				o.group = g;
				Some(o)
			},
			None => {
				dropped += 1;
				None
			},
		}
	}).collect();
	if dropped > 0 {
		debug!("regroup dropped {} observation(s) without a target group", dropped);
	}
	sum_by_key(moved)
}

/// Align daily observations onto week-ending dates.
pub fn resample_weekly(obs: Vec<Observation>, ending: Weekday, how: Combine) -> Vec<Observation> {
	match how {
		Combine::Sum => {
			let shifted = obs.into_iter().map(|mut o| {
				o.date = week_ending(o.date, ending);
				o
			}).collect();
			sum_by_key(shifted)
		},
		Combine::Last => {
			let mut index: HashMap<ObservationKey, usize> = HashMap::new();
			let mut result: Vec<(NaiveDate, Observation)> = Vec::new();
			for mut o in obs.into_iter() {
				let original = o.date;
				o.date = week_ending(o.date, ending);
				let k = key_of(&o);
				match index.get(&k) {
					Some(i) => {
						let slot = &mut result[*i];
						if original >= slot.0 {
							*slot = (original, o);
						}
					},
					None => {
						index.insert(k, result.len());
						result.push((original, o));
					},
				}
			}
			result.into_iter().map(|(_, o)| o).collect()
		},
	}
}

/// Keep only observations that sit on a slot of `calendar`.
pub fn to_calendar(obs: Vec<Observation>, calendar: &Calendar) -> Vec<Observation> {
	let n = obs.len();
	let kept: Vec<Observation> = obs.into_iter()
		.filter(|o| calendar.index_of(o.date).is_some())
		.collect();
	if kept.len() < n {
		warn!("{} observation(s) fall outside the calendar axis starting {}", n - kept.len(), calendar.start());
	}
	kept
}


/// Wide view: one row per date, one column per group.
#[derive(Debug, Clone, PartialEq)]
pub struct Pivot {
	dates: Vec<NaiveDate>,
	groups: Vec<GroupId>,
	cells: Vec<Vec<Option<f64>>>,
}

impl Pivot {
	/// Build from (group, date, value) triples. Dates are sorted ascending,
	/// groups keep their first-appearance order, duplicates are summed.
	pub fn from_triples<I: IntoIterator<Item = (GroupId, NaiveDate, Option<f64>)>>(triples: I) -> Self {
		let triples: Vec<_> = triples.into_iter().collect();
		let mut groups: Vec<GroupId> = Vec::new();
		let mut group_index: HashMap<GroupId, usize> = HashMap::new();
		let mut dates: Vec<NaiveDate> = triples.iter().map(|t| t.1).collect();
		dates.sort();
		dates.dedup();
		for (g, _, _) in triples.iter() {
			if !group_index.contains_key(g) {
				group_index.insert(g.clone(), groups.len());
				groups.push(g.clone());
			}
		}

		let mut cells = vec![vec![None; groups.len()]; dates.len()];
		let mut filled = vec![vec![false; groups.len()]; dates.len()];
		for (g, d, v) in triples.into_iter() {
			// both lookups succeed, the indices were built from the same triples
			let row = match dates.binary_search(&d) {
				Ok(i) => i,
				Err(_) => continue,
			};
			let col = match group_index.get(&g) {
				Some(i) => *i,
				None => continue,
			};
			if filled[row][col] {
				cells[row][col] = strict_sum(cells[row][col], v);
			} else {
				cells[row][col] = v;
				filled[row][col] = true;
			}
		}
		Self{dates, groups, cells}
	}

	/// Reorder the group columns. Groups not named in `order` keep their
	/// relative position after the named ones; unknown names are ignored.
	pub fn reordered(&self, order: &[GroupId]) -> Self {
		let mut perm: Vec<usize> = order.iter()
			.filter_map(|g| self.groups.iter().position(|h| h == g))
			.collect();
		for i in 0..self.groups.len() {
			if !perm.contains(&i) {
				perm.push(i);
			}
		}
		Self{
			dates: self.dates.clone(),
			groups: perm.iter().map(|i| self.groups[*i].clone()).collect(),
			cells: self.cells.iter().map(|row| perm.iter().map(|i| row[*i]).collect()).collect(),
		}
	}

	pub fn dates(&self) -> &[NaiveDate] {
		&self.dates[..]
	}

	pub fn groups(&self) -> &[GroupId] {
		&self.groups[..]
	}

	pub fn get(&self, date_index: usize, group_index: usize) -> Option<f64> {
		*self.cells.get(date_index)?.get(group_index)?
	}

	pub fn column(&self, group_index: usize) -> impl Iterator<Item = (NaiveDate, Option<f64>)> + '_ {
		self.dates.iter().zip(self.cells.iter()).map(move |(d, row)| (*d, row[group_index]))
	}

	/// Smallest and largest present value, if any.
	pub fn value_range(&self) -> Option<(f64, f64)> {
		let mut range: Option<(f64, f64)> = None;
		for v in self.cells.iter().flat_map(|r| r.iter()).filter_map(|v| *v) {
			if !v.is_finite() {
				continue
			}
			range = Some(match range {
				None => (v, v),
				Some((lo, hi)) => (lo.min(v), hi.max(v)),
			});
		}
		range
	}

	pub fn is_empty(&self) -> bool {
		self.dates.is_empty() || self.groups.is_empty()
	}
}

/// Pivot observation values, ignoring categories.
pub fn pivot(obs: &[Observation]) -> Pivot {
	Pivot::from_triples(obs.iter().map(|o| (o.group.clone(), o.date, o.value)))
}
