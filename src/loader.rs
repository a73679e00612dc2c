use std::io;
use std::path::Path;

use log::{debug, info};

use serde_json::Value;

use smartstring::alias::{String as SmartString};

use super::cell::{parse_count_field, Field, MissingReason};
use super::error::{AtStage, Error, ErrorKind, Result, Stage};
use super::ioutil::magic_open;
use super::table::{ColumnKind, ColumnSpec, Schema, Table};


fn text_field(s: &str) -> Field {
	let s = s.trim();
	if s.is_empty() {
		Field::Missing(MissingReason::Empty)
	} else {
		Field::Text(s.into())
	}
}

fn raw_field(kind: ColumnKind, s: &str) -> Field {
	match kind {
		ColumnKind::Number => parse_count_field(s),
		// dates stay textual until the cleaner parses them
		ColumnKind::Text | ColumnKind::Date(_) => text_field(s),
	}
}

fn header_matches(header: &str, wanted: &str) -> bool {
	header.trim_start_matches('\u{feff}').trim() == wanted
}


/// Read delimited text against `schema`.
///
/// Only the schema's columns are kept, in schema order. A schema column that
/// is absent from the header is fatal.
pub fn load_csv<R: io::Read>(r: R, schema: &Schema) -> Result<Table> {
	let mut reader = csv::ReaderBuilder::new()
		.delimiter(schema.get_delimiter())
		.flexible(true)
		.from_reader(r);
	let headers = reader.headers().at_stage(Stage::Loader)?.clone();

	let mut indices = Vec::with_capacity(schema.columns().len());
	for spec in schema.columns() {
		match headers.iter().position(|h| header_matches(h, spec.source())) {
			Some(i) => indices.push(i),
			None => return Err(Error::missing_column(Stage::Loader, spec.source())),
		}
	}

	let mut table = Table::new(schema.columns().to_vec());
	for record in reader.records() {
		let record = record.at_stage(Stage::Loader)?;
		let row = schema.columns().iter().zip(indices.iter()).map(|(spec, i)| {
			match record.get(*i) {
				Some(s) => raw_field(spec.kind(), s),
				None => Field::Missing(MissingReason::Empty),
			}
		}).collect();
		table.push_row(row);
	}
	info!("loaded {} rows with {} columns", table.len(), table.columns().len());
	table.tally_missing().report("loader");
	Ok(table)
}

pub fn load_csv_path<P: AsRef<Path>>(path: P, schema: &Schema) -> Result<Table> {
	let path = path.as_ref();
	debug!("opening {}", path.display());
	let r = magic_open(path).at_stage(Stage::Loader)?;
	load_csv(r, schema)
}


fn pointer_for(source: &str) -> SmartString {
	if source.starts_with('/') {
		source.into()
	} else {
		let mut p = SmartString::new();
		p.push('/');
		p.push_str(source);
		p
	}
}

fn json_field(kind: ColumnKind, v: Option<&Value>) -> Field {
	match v {
		None | Some(Value::Null) => Field::Missing(MissingReason::Empty),
		Some(Value::String(s)) => raw_field(kind, s),
		Some(Value::Number(n)) => match kind {
			ColumnKind::Number => match n.as_f64() {
				Some(v) => Field::Number(v),
				None => Field::Missing(MissingReason::Unparseable),
			},
			ColumnKind::Text | ColumnKind::Date(_) => Field::Text(n.to_string().into()),
		},
		Some(Value::Bool(b)) => match kind {
			ColumnKind::Number => Field::Missing(MissingReason::Unparseable),
			_ => Field::Text(if *b { "true".into() } else { "false".into() }),
		},
		Some(Value::Array(_)) | Some(Value::Object(_)) => Field::Missing(MissingReason::Unparseable),
	}
}


/// Where to find records and their fields in a nested JSON payload.
#[derive(Debug, Clone)]
pub struct JsonSchema {
	records: SmartString,
	schema: Schema,
}

impl JsonSchema {
	/// `records` is a JSON pointer to the array of records, e.g. `/data`.
	/// Column sources are keys or JSON pointers relative to one record.
	pub fn new(records: &str, schema: Schema) -> Self {
		Self{
			records: records.into(),
			schema,
		}
	}

	pub fn schema(&self) -> &Schema {
		&self.schema
	}
}

/// Read the record array of a JSON payload against `schema`.
pub fn load_json<R: io::Read>(r: R, schema: &JsonSchema) -> Result<Table> {
	let doc: Value = serde_json::from_reader(io::BufReader::new(r)).at_stage(Stage::Loader)?;
	let records = match doc.pointer(&schema.records).and_then(|v| v.as_array()) {
		Some(v) => v,
		None => return Err(ErrorKind::MissingRecords(schema.records.clone()).at(Stage::Loader)),
	};

	let columns: Vec<ColumnSpec> = schema.schema.columns().to_vec();
	let pointers: Vec<SmartString> = columns.iter().map(|c| pointer_for(c.source())).collect();
	let mut seen = vec![false; columns.len()];
	let mut rows = Vec::with_capacity(records.len());
	for rec in records.iter() {
		let mut row = Vec::with_capacity(columns.len());
		for (i, (spec, ptr)) in columns.iter().zip(pointers.iter()).enumerate() {
			let v = rec.pointer(ptr);
			if v.is_some() {
				seen[i] = true;
			}
			row.push(json_field(spec.kind(), v));
		}
		rows.push(row);
	}

	if !records.is_empty() {
		if let Some(i) = seen.iter().position(|s| !s) {
			return Err(Error::missing_column(Stage::Loader, columns[i].source()))
		}
	}

	let table = Table::from_parts(columns, rows);
	info!("loaded {} JSON records at {}", table.len(), schema.records);
	table.tally_missing().report("loader");
	Ok(table)
}

pub fn load_json_path<P: AsRef<Path>>(path: P, schema: &JsonSchema) -> Result<Table> {
	let path = path.as_ref();
	debug!("opening {}", path.display());
	let r = magic_open(path).at_stage(Stage::Loader)?;
	load_json(r, schema)
}
