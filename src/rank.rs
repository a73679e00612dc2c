use std::cmp::Ordering;
use std::collections::HashMap;

use chrono::{Duration, NaiveDate};

use log::{debug, info};

use serde::{Deserialize, Serialize};

use super::normalise::NormalisedObservation;
use super::observation::GroupId;


#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImpactRank {
	pub rank: usize,
	pub group: GroupId,
	pub mean_early_rate: Option<f64>,
}


/// Groups ordered by their mean rate in the early window, lowest first.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Ranking {
	entries: Vec<ImpactRank>,
}

fn compare_means(a: Option<f64>, b: Option<f64>) -> Ordering {
	match (a, b) {
		(Some(a), Some(b)) => a.partial_cmp(&b).unwrap_or(Ordering::Equal),
		(Some(_), None) => Ordering::Less,
		(None, Some(_)) => Ordering::Greater,
		(None, None) => Ordering::Equal,
	}
}

impl Ranking {
	/// Rebuild a ranking from stored entries, e.g. read back from disk.
	pub fn from_entries(mut entries: Vec<ImpactRank>) -> Self {
		entries.sort_by_key(|e| e.rank);
		Self{entries}
	}

	pub fn entries(&self) -> &[ImpactRank] {
		&self.entries[..]
	}

	/// Group ids in rank order, for use as a chart's category axis.
	pub fn category_order(&self) -> Vec<GroupId> {
		self.entries.iter().map(|e| e.group.clone()).collect()
	}

	pub fn get(&self, group: &str) -> Option<&ImpactRank> {
		self.entries.iter().find(|e| &e.group[..] == group)
	}

	pub fn rank_of(&self, group: &str) -> Option<usize> {
		self.get(group).map(|e| e.rank)
	}

	pub fn len(&self) -> usize {
		self.entries.len()
	}

	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}
}


/// Rank groups by their mean rate over all dates strictly before `cutoff`.
///
/// Missing rates are ignored; a group without any rate in the window has a
/// missing mean and sorts after every group with one. Ties keep the order in
/// which groups first appear in `obs`. Categories are pooled.
pub fn rank_early_impact(obs: &[NormalisedObservation], cutoff: NaiveDate) -> Ranking {
	let mut order: Vec<GroupId> = Vec::new();
	let mut accum: HashMap<GroupId, (f64, usize)> = HashMap::new();
	for o in obs {
		if !accum.contains_key(&o.group) {
			order.push(o.group.clone());
			accum.insert(o.group.clone(), (0., 0));
		}
		if o.date >= cutoff {
			continue
		}
		let rate = match o.rate {
			Some(r) if r.is_finite() => r,
			_ => continue,
		};
		if let Some(slot) = accum.get_mut(&o.group) {
			slot.0 += rate;
			slot.1 += 1;
		}
	}

	let mut means: Vec<(GroupId, Option<f64>)> = order.into_iter().map(|g| {
		let mean = match accum.get(&g) {
			Some((sum, n)) if *n > 0 => Some(sum / *n as f64),
			_ => None,
		};
		(g, mean)
	}).collect();
	// stable, so ties keep first-appearance order
	means.sort_by(|a, b| compare_means(a.1, b.1));

	let entries: Vec<ImpactRank> = means.into_iter().enumerate().map(|(i, (group, mean_early_rate))| {
		debug!("rank {} for {} (early mean {:?})", i + 1, group, mean_early_rate);
		ImpactRank{
			rank: i + 1,
			group,
			mean_early_rate,
		}
	}).collect();
	info!("ranked {} group(s) on rates before {}", entries.len(), cutoff);
	Ranking{entries}
}

/// First observed date plus `days`, for windows given as a length.
pub fn early_cutoff(obs: &[NormalisedObservation], days: i64) -> Option<NaiveDate> {
	let first = obs.iter().map(|o| o.date).min()?;
	first.checked_add_signed(Duration::days(days))
}
