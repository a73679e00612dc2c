use log::{debug, warn};

use super::observation::Observation;
use super::population::PopulationLookup;


/// What happens to a left row without a partner on the right.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unmatched {
	Drop,
	KeepAsMissing,
}

/// Join `left` rows to a keyed lookup.
///
/// `key` extracts the join key of a left row, `lookup` resolves it. Rows
/// whose key does not resolve are dropped or kept with `None` according to
/// `unmatched`. Left order is preserved.
pub fn join_by_key<L, R, F, G>(left: Vec<L>, key: F, lookup: G, unmatched: Unmatched) -> Vec<(L, Option<R>)>
	where F: Fn(&L) -> &str,
	      G: Fn(&str) -> Option<R>,
{
	let n = left.len();
	let mut misses = 0usize;
	let mut result = Vec::with_capacity(n);
	for row in left.into_iter() {
		let partner = lookup(key(&row));
		if partner.is_none() {
			misses += 1;
			if unmatched == Unmatched::Drop {
				continue
			}
		}
		result.push((row, partner));
	}
	if misses > 0 {
		match unmatched {
			Unmatched::Drop => warn!("join dropped {} of {} row(s) without a match", misses, n),
			Unmatched::KeepAsMissing => debug!("join kept {} of {} row(s) without a match", misses, n),
		}
	}
	result
}

/// Attach each observation's raw population.
pub fn join_population(obs: Vec<Observation>, population: &PopulationLookup, unmatched: Unmatched) -> Vec<(Observation, Option<f64>)> {
	join_by_key(obs, |o| &o.group[..], |g| population.get(g), unmatched)
}
