use log::{debug, info};

use smartstring::alias::{String as SmartString};

use super::calendar::parse_date;
use super::cell::{Field, MissingReason, MissingTally};
use super::error::{Result, Stage};
use super::table::{ColumnKind, Table};


#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
	Equals(SmartString, SmartString),
	NotEquals(SmartString, SmartString),
	OneOf(SmartString, Vec<SmartString>),
}

impl Predicate {
	fn column(&self) -> &str {
		match self {
			Self::Equals(c, _) | Self::NotEquals(c, _) | Self::OneOf(c, _) => &c[..],
		}
	}

	fn matches(&self, field: &Field) -> bool {
		let v = match field.as_text() {
			Some(v) => v,
			None => return false,
		};
		match self {
			Self::Equals(_, want) => v == &want[..],
			Self::NotEquals(_, unwanted) => v != &unwanted[..],
			Self::OneOf(_, set) => set.iter().any(|s| &s[..] == v),
		}
	}
}


/// Which numeric values are known-bad markers rather than counts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Sentinel {
	AnyNegative,
	Exactly(f64),
}

impl Sentinel {
	fn matches(&self, v: f64) -> bool {
		match self {
			Self::AnyNegative => v < 0.,
			Self::Exactly(s) => v == *s,
		}
	}
}


/// Row filter and field fixer applied between loading and extraction.
///
/// All predicates must hold for a row to be kept. Date columns are parsed
/// according to their declared format, unparseable dates become missing.
#[derive(Debug, Clone, Default)]
pub struct Cleaner {
	predicates: Vec<Predicate>,
	sentinels: Vec<(SmartString, Sentinel)>,
}

impl Cleaner {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn equals(mut self, column: &str, value: &str) -> Self {
		self.predicates.push(Predicate::Equals(column.into(), value.into()));
		self
	}

	pub fn not_equals(mut self, column: &str, value: &str) -> Self {
		self.predicates.push(Predicate::NotEquals(column.into(), value.into()));
		self
	}

	pub fn one_of(mut self, column: &str, values: &[&str]) -> Self {
		self.predicates.push(Predicate::OneOf(
			column.into(),
			values.iter().map(|v| (*v).into()).collect(),
		));
		self
	}

	pub fn flag_negative(mut self, column: &str) -> Self {
		self.sentinels.push((column.into(), Sentinel::AnyNegative));
		self
	}

	pub fn flag_sentinel(mut self, column: &str, value: f64) -> Self {
		self.sentinels.push((column.into(), Sentinel::Exactly(value)));
		self
	}

	pub fn apply(&self, table: Table) -> Result<Table> {
		let predicates = self.predicates.iter()
			.map(|p| Ok((table.column_index(p.column(), Stage::Cleaner)?, p)))
			.collect::<Result<Vec<_>>>()?;
		let sentinels = self.sentinels.iter()
			.map(|(c, s)| Ok((table.column_index(c, Stage::Cleaner)?, *s)))
			.collect::<Result<Vec<_>>>()?;
		let date_columns: Vec<_> = table.columns().iter().enumerate()
			.filter_map(|(i, c)| match c.kind() {
				ColumnKind::Date(fmt) => Some((i, fmt)),
				_ => None,
			})
			.collect();

		let n_in = table.len();
		let mut fixed = MissingTally::new();
		let (columns, rows) = table.into_parts();
		let mut kept = Vec::with_capacity(rows.len());
		for mut row in rows.into_iter() {
			if !predicates.iter().all(|(i, p)| p.matches(&row[*i])) {
				continue
			}
			for (i, fmt) in date_columns.iter() {
				let parsed = match &row[*i] {
					Field::Text(s) => match parse_date(s, *fmt) {
						Some(d) => Field::Date(d),
						None => {
							debug!("unparseable date {:?} in column {}", s, columns[*i].name());
							Field::Missing(MissingReason::Unparseable)
						},
					},
					_ => continue,
				};
				fixed.observe(&parsed);
				row[*i] = parsed;
			}
			for (i, sentinel) in sentinels.iter() {
				if let Field::Number(v) = row[*i] {
					if sentinel.matches(v) {
						row[*i] = Field::Missing(MissingReason::NegativeSentinel);
						fixed.record(MissingReason::NegativeSentinel);
					}
				}
			}
			kept.push(row);
		}
		info!("cleaner kept {} of {} rows", kept.len(), n_in);
		fixed.report("cleaner");
		Ok(Table::from_parts(columns, kept))
	}
}
