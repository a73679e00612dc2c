use smartstring::alias::{String as SmartString};

use super::calendar::DateFormat;
use super::cell::{Field, MissingTally};
use super::error::{Error, Result, Stage};


#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
	Text,
	Number,
	Date(DateFormat),
}


#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnSpec {
	name: SmartString,
	source: SmartString,
	kind: ColumnKind,
}

impl ColumnSpec {
	pub fn name(&self) -> &str {
		&self.name
	}

	/// Header name in delimited text, key or JSON pointer in a JSON record.
	pub fn source(&self) -> &str {
		&self.source
	}

	pub fn kind(&self) -> ColumnKind {
		self.kind
	}
}


/// Columns a source is expected to provide.
#[derive(Debug, Clone)]
pub struct Schema {
	columns: Vec<ColumnSpec>,
	delimiter: u8,
}

impl Default for Schema {
	fn default() -> Self {
		Self::new()
	}
}

impl Schema {
	pub fn new() -> Self {
		Self{
			columns: Vec::new(),
			delimiter: b',',
		}
	}

	pub fn column_from(mut self, name: &str, source: &str, kind: ColumnKind) -> Self {
		self.columns.push(ColumnSpec{
			name: name.into(),
			source: source.into(),
			kind,
		});
		self
	}

	pub fn column(self, name: &str, kind: ColumnKind) -> Self {
		self.column_from(name, name, kind)
	}

	pub fn text(self, name: &str) -> Self {
		self.column(name, ColumnKind::Text)
	}

	pub fn number(self, name: &str) -> Self {
		self.column(name, ColumnKind::Number)
	}

	pub fn date(self, name: &str, format: DateFormat) -> Self {
		self.column(name, ColumnKind::Date(format))
	}

	pub fn delimiter(mut self, delimiter: u8) -> Self {
		self.delimiter = delimiter;
		self
	}

	pub fn get_delimiter(&self) -> u8 {
		self.delimiter
	}

	pub fn columns(&self) -> &[ColumnSpec] {
		&self.columns[..]
	}
}


/// Rows of fields laid out in schema column order.
#[derive(Debug, Clone)]
pub struct Table {
	columns: Vec<ColumnSpec>,
	rows: Vec<Vec<Field>>,
}

impl Table {
	pub fn new(columns: Vec<ColumnSpec>) -> Self {
		Self{
			columns,
			rows: Vec::new(),
		}
	}

	pub fn push_row(&mut self, row: Vec<Field>) {
		assert_eq!(row.len(), self.columns.len());
		self.rows.push(row);
	}

	pub fn columns(&self) -> &[ColumnSpec] {
		&self.columns[..]
	}

	pub fn rows(&self) -> &[Vec<Field>] {
		&self.rows[..]
	}

	pub fn len(&self) -> usize {
		self.rows.len()
	}

	pub fn is_empty(&self) -> bool {
		self.rows.is_empty()
	}

	pub fn find_column(&self, name: &str) -> Option<usize> {
		self.columns.iter().position(|c| &c.name[..] == name)
	}

	/// Index of a required column; its absence is fatal for `stage`.
	pub fn column_index(&self, name: &str, stage: Stage) -> Result<usize> {
		self.find_column(name).ok_or_else(|| Error::missing_column(stage, name))
	}

	pub fn tally_missing(&self) -> MissingTally {
		let mut tally = MissingTally::new();
		for row in self.rows.iter() {
			for field in row.iter() {
				tally.observe(field);
			}
		}
		tally
	}

	pub(crate) fn into_parts(self) -> (Vec<ColumnSpec>, Vec<Vec<Field>>) {
		(self.columns, self.rows)
	}

	pub(crate) fn from_parts(columns: Vec<ColumnSpec>, rows: Vec<Vec<Field>>) -> Self {
		Self{columns, rows}
	}
}
