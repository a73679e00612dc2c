use std::collections::HashMap;

use chrono::NaiveDate;

use log::info;

use num_traits::ToPrimitive;

use serde::{Deserialize, Serialize};

use smartstring::alias::{String as SmartString};

use super::cell::{MissingReason, MissingTally};
use super::join::{join_population, Unmatched};
use super::observation::{GroupId, Observation};
use super::population::PopulationLookup;


pub static PER_100K: f64 = 100_000.;
pub static PERCENT: f64 = 100.;


/// An observation with its denominator and the derived rate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalisedObservation {
	pub group: GroupId,
	pub date: NaiveDate,
	pub category: Option<SmartString>,
	pub value: Option<f64>,
	pub population: Option<f64>,
	pub rate: Option<f64>,
}

impl NormalisedObservation {
	fn from_parts(o: Observation, population: Option<f64>, rate: Option<f64>) -> Self {
		Self{
			group: o.group,
			date: o.date,
			category: o.category,
			value: o.value,
			population,
			rate,
		}
	}
}


/// `value / population * scale`, or `None` if the population cannot divide.
pub fn per_capita<V: ToPrimitive, P: ToPrimitive>(value: V, population: P, scale: f64) -> Option<f64> {
	let value = value.to_f64()?;
	let population = population.to_f64()?;
	if !(population.is_finite() && population > 0.) || !value.is_finite() {
		return None
	}
	Some(value / population * scale)
}


#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ScaleMode {
	/// value per `scale` inhabitants of the group
	PerPopulation(f64),
	/// percentage of the total over all groups of the same date and category
	ShareOfTotal,
}


/// Turns observations into rates against a denominator.
#[derive(Debug, Clone, Copy)]
pub struct Normaliser<'p> {
	population: Option<&'p PopulationLookup>,
	mode: ScaleMode,
}

impl<'p> Normaliser<'p> {
	pub fn per_population(population: &'p PopulationLookup, scale: f64) -> Self {
		Self{
			population: Some(population),
			mode: ScaleMode::PerPopulation(scale),
		}
	}

	pub fn per_100k(population: &'p PopulationLookup) -> Self {
		Self::per_population(population, PER_100K)
	}

	/// Shares of the per-window total; every group is eligible.
	pub fn share_of_total() -> Self {
		Self{
			population: None,
			mode: ScaleMode::ShareOfTotal,
		}
	}

	/// Shares of the per-window total over groups with a usable population.
	pub fn share_of_total_within(population: &'p PopulationLookup) -> Self {
		Self{
			population: Some(population),
			mode: ScaleMode::ShareOfTotal,
		}
	}

	pub fn mode(&self) -> ScaleMode {
		self.mode
	}

	pub fn normalise(&self, obs: Vec<Observation>) -> Vec<NormalisedObservation> {
		let joined: Vec<(Observation, Option<f64>)> = match self.population {
			Some(lookup) => join_population(obs, lookup, Unmatched::KeepAsMissing),
			None => obs.into_iter().map(|o| (o, None)).collect(),
		};
		let mut tally = MissingTally::new();
		let result = match self.mode {
			ScaleMode::PerPopulation(scale) => joined.into_iter().map(|(o, pop)| {
				let rate = match pop.and_then(|p| per_capita(o.value?, p, scale)) {
					Some(r) => Some(r),
					None => {
						if o.value.is_some() {
							tally.record(MissingReason::NoDenominator);
						}
						None
					},
				};
				NormalisedObservation::from_parts(o, pop, rate)
			}).collect(),
			ScaleMode::ShareOfTotal => self.shares(joined, &mut tally),
		};
		info!("normalised {} observation(s) with {:?}", result.len(), self.mode);
		tally.report("normaliser");
		result
	}

	fn eligible(&self, o: &Observation, pop: Option<f64>) -> bool {
		let has_value = o.value.map_or(false, |v| v.is_finite());
		let has_denominator = match self.population {
			Some(_) => pop.map_or(false, |p| p.is_finite() && p > 0.),
			None => true,
		};
		has_value && has_denominator
	}

	fn shares(&self, joined: Vec<(Observation, Option<f64>)>, tally: &mut MissingTally) -> Vec<NormalisedObservation> {
		let mut totals: HashMap<(NaiveDate, Option<SmartString>), f64> = HashMap::new();
		for (o, pop) in joined.iter() {
			if self.eligible(o, *pop) {
				*totals.entry((o.date, o.category.clone())).or_insert(0.) += o.value.unwrap_or(0.);
			}
		}
		joined.into_iter().map(|(o, pop)| {
			let rate = if self.eligible(&o, pop) {
				let total = totals.get(&(o.date, o.category.clone())).copied().unwrap_or(0.);
				o.value.and_then(|v| per_capita(v, total, PERCENT))
			} else {
				None
			};
			if rate.is_none() && o.value.is_some() {
				tally.record(MissingReason::NoDenominator);
			}
			NormalisedObservation::from_parts(o, pop, rate)
		}).collect()
	}
}


#[cfg(test)]
mod tests {
	use super::*;

	fn d(m: u32, day: u32) -> NaiveDate {
		NaiveDate::from_ymd_opt(2020, m, day).unwrap()
	}

	fn lookup() -> PopulationLookup {
		PopulationLookup::from_pairs(vec![
			("A".into(), Some(200_000.)),
			("B".into(), Some(50_000.)),
			("Z".into(), Some(0.)),
		])
	}

	#[test]
	fn per_capita_is_linear_and_non_negative() {
		for value in &[0u32, 1, 7, 1000] {
			let r = per_capita(*value, 250_000u64, PER_100K).unwrap();
			assert!(r >= 0.);
			assert!((r - *value as f64 * 0.4).abs() < 1e-9);
		}
		assert_eq!(per_capita(5, 0, PER_100K), None);
		assert_eq!(per_capita(5., f64::NAN, PER_100K), None);
	}

	#[test]
	fn per_100k_missing_for_absent_or_zero_population() {
		let lookup = lookup();
		let obs = vec![
			Observation::new("A", d(4, 3), Some(20.)),
			Observation::new("Z", d(4, 3), Some(20.)),
			Observation::new("Q", d(4, 3), Some(20.)),
			Observation::new("B", d(4, 3), None),
		];
		let norm = Normaliser::per_100k(&lookup).normalise(obs);
		assert_eq!(norm[0].rate, Some(10.));
		assert_eq!(norm[0].population, Some(200_000.));
		assert_eq!(norm[1].rate, None);
		assert_eq!(norm[2].rate, None);
		assert_eq!(norm[2].population, None);
		assert_eq!(norm[3].rate, None);
		assert_eq!(norm.len(), 4);
	}

	#[test]
	fn shares_sum_to_one_hundred_per_window() {
		let obs = vec![
			Observation::new("Home", d(4, 3), Some(30.)),
			Observation::new("Hospital", d(4, 3), Some(60.)),
			Observation::new("Hospice", d(4, 3), Some(10.)),
			Observation::new("Home", d(4, 10), Some(1.)),
			Observation::new("Hospital", d(4, 10), Some(2.)),
		];
		let norm = Normaliser::share_of_total().normalise(obs);
		let sum_first: f64 = norm.iter().filter(|n| n.date == d(4, 3)).filter_map(|n| n.rate).sum();
		let sum_second: f64 = norm.iter().filter(|n| n.date == d(4, 10)).filter_map(|n| n.rate).sum();
		assert!((sum_first - 100.).abs() < 1e-9);
		assert!((sum_second - 100.).abs() < 1e-9);
		assert!((norm[1].rate.unwrap() - 60.).abs() < 1e-9);
	}

	#[test]
	fn shares_are_per_category() {
		let obs = vec![
			Observation::new("Home", d(4, 3), Some(1.)).with_category("Male"),
			Observation::new("Hospital", d(4, 3), Some(3.)).with_category("Male"),
			Observation::new("Home", d(4, 3), Some(5.)).with_category("Female"),
		];
		let norm = Normaliser::share_of_total().normalise(obs);
		assert_eq!(norm[0].rate, Some(25.));
		assert_eq!(norm[1].rate, Some(75.));
		assert_eq!(norm[2].rate, Some(100.));
	}

	#[test]
	fn zero_population_is_excluded_from_share_total() {
		let lookup = lookup();
		let obs = vec![
			Observation::new("A", d(4, 3), Some(30.)),
			Observation::new("Z", d(4, 3), Some(1000.)),
			Observation::new("B", d(4, 3), Some(10.)),
			Observation::new("Q", d(4, 3), Some(5.)),
		];
		let norm = Normaliser::share_of_total_within(&lookup).normalise(obs);
		assert_eq!(norm[0].rate, Some(75.));
		assert_eq!(norm[1].rate, None);
		assert_eq!(norm[2].rate, Some(25.));
		assert_eq!(norm[3].rate, None);
	}

	#[test]
	fn shares_of_zero_total_are_missing() {
		let obs = vec![
			Observation::new("Home", d(4, 3), Some(0.)),
			Observation::new("Hospital", d(4, 3), Some(0.)),
		];
		let norm = Normaliser::share_of_total().normalise(obs);
		assert!(norm.iter().all(|n| n.rate.is_none()));
	}
}
