use chrono::NaiveDate;

use log::{info, warn};

use serde::{Deserialize, Serialize};

use smartstring::alias::{String as SmartString};

use super::calendar::{parse_date, DateFormat};
use super::cell::Field;
use super::error::{Result, Stage};
use super::table::Table;


pub type GroupId = SmartString;


/// One value for a group at one point of the calendar axis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
	pub group: GroupId,
	pub date: NaiveDate,
	pub value: Option<f64>,
	pub category: Option<SmartString>,
}

impl Observation {
	pub fn new(group: &str, date: NaiveDate, value: Option<f64>) -> Self {
		Self{
			group: group.into(),
			date,
			value,
			category: None,
		}
	}

	pub fn with_category(mut self, category: &str) -> Self {
		self.category = Some(category.into());
		self
	}
}


/// Which table columns make up an observation.
#[derive(Debug, Clone)]
pub struct ObservationColumns {
	group: SmartString,
	date: SmartString,
	value: SmartString,
	category: Option<SmartString>,
}

impl ObservationColumns {
	pub fn new(group: &str, date: &str, value: &str) -> Self {
		Self{
			group: group.into(),
			date: date.into(),
			value: value.into(),
			category: None,
		}
	}

	pub fn category(mut self, column: &str) -> Self {
		self.category = Some(column.into());
		self
	}
}

fn key_text(field: &Field) -> Option<SmartString> {
	match field {
		Field::Text(s) => Some(s.clone()),
		Field::Number(v) => Some(format!("{}", v).into()),
		Field::Date(d) => Some(format!("{}", d).into()),
		Field::Missing(_) => None,
	}
}

fn key_date(field: &Field) -> Option<NaiveDate> {
	match field {
		Field::Date(d) => Some(*d),
		Field::Text(s) => parse_date(s, DateFormat::Auto),
		_ => None,
	}
}

/// Turn cleaned rows into observations.
///
/// Rows without a group or a date cannot be placed on the axis and are
/// dropped. A missing value stays missing.
pub fn extract_observations(table: &Table, columns: &ObservationColumns) -> Result<Vec<Observation>> {
	let gi = table.column_index(&columns.group, Stage::Aggregate)?;
	let di = table.column_index(&columns.date, Stage::Aggregate)?;
	let vi = table.column_index(&columns.value, Stage::Aggregate)?;
	let ci = match &columns.category {
		Some(c) => Some(table.column_index(c, Stage::Aggregate)?),
		None => None,
	};

	let mut result = Vec::with_capacity(table.len());
	let mut dropped = 0;
	for row in table.rows() {
		let (group, date) = match (key_text(&row[gi]), key_date(&row[di])) {
			(Some(g), Some(d)) => (g, d),
			_ => {
				dropped += 1;
				continue
			},
		};
		let category = match ci {
			Some(ci) => match key_text(&row[ci]) {
				Some(c) => Some(c),
				None => {
					dropped += 1;
					continue
				},
			},
			None => None,
		};
		result.push(Observation{
			group,
			date,
			value: row[vi].as_number(),
			category,
		});
	}
	if dropped > 0 {
		warn!("dropped {} row(s) without group, date or category", dropped);
	}
	info!("extracted {} observations", result.len());
	Ok(result)
}
