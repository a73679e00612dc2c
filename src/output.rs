use std::io;
use std::path::Path;

use log::info;

use super::aggregate::Pivot;
use super::error::{AtStage, Result, Stage};
use super::ioutil::{create_output, magic_open};
use super::normalise::NormalisedObservation;
use super::rank::{ImpactRank, Ranking};


/// Write normalised rows as `group,date,category,value,population,rate`.
///
/// Missing values are written as empty cells.
pub fn write_tidy<W: io::Write>(rows: &[NormalisedObservation], w: W) -> Result<()> {
	let mut writer = csv::Writer::from_writer(w);
	for row in rows {
		writer.serialize(row).at_stage(Stage::Output)?;
	}
	writer.flush().at_stage(Stage::Output)?;
	info!("wrote {} tidy row(s)", rows.len());
	Ok(())
}

pub fn read_tidy<R: io::Read>(r: R) -> Result<Vec<NormalisedObservation>> {
	let mut reader = csv::Reader::from_reader(r);
	let mut rows = Vec::new();
	for row in reader.deserialize() {
		let row: NormalisedObservation = row.at_stage(Stage::Output)?;
		rows.push(row);
	}
	info!("read {} tidy row(s)", rows.len());
	Ok(rows)
}

pub fn write_tidy_path<P: AsRef<Path>>(rows: &[NormalisedObservation], path: P) -> Result<()> {
	let mut out = create_output(path).at_stage(Stage::Output)?;
	write_tidy(rows, &mut out)?;
	out.finish().at_stage(Stage::Output)
}

pub fn read_tidy_path<P: AsRef<Path>>(path: P) -> Result<Vec<NormalisedObservation>> {
	let r = magic_open(path).at_stage(Stage::Output)?;
	read_tidy(r)
}


pub fn write_ranking<W: io::Write>(ranking: &Ranking, w: W) -> Result<()> {
	let mut writer = csv::Writer::from_writer(w);
	for entry in ranking.entries() {
		writer.serialize(entry).at_stage(Stage::Output)?;
	}
	writer.flush().at_stage(Stage::Output)?;
	Ok(())
}

pub fn read_ranking<R: io::Read>(r: R) -> Result<Ranking> {
	let mut reader = csv::Reader::from_reader(r);
	let mut entries = Vec::new();
	for entry in reader.deserialize() {
		let entry: ImpactRank = entry.at_stage(Stage::Output)?;
		entries.push(entry);
	}
	Ok(Ranking::from_entries(entries))
}

pub fn write_ranking_path<P: AsRef<Path>>(ranking: &Ranking, path: P) -> Result<()> {
	let mut out = create_output(path).at_stage(Stage::Output)?;
	write_ranking(ranking, &mut out)?;
	out.finish().at_stage(Stage::Output)
}

pub fn read_ranking_path<P: AsRef<Path>>(path: P) -> Result<Ranking> {
	let r = magic_open(path).at_stage(Stage::Output)?;
	read_ranking(r)
}


/// Write a pivot in wide form: one row per date, one column per group.
///
/// Missing cells are left empty.
pub fn write_pivot<W: io::Write>(pivot: &Pivot, w: W) -> Result<()> {
	let mut writer = csv::Writer::from_writer(w);
	let mut header = vec!["date".to_string()];
	header.extend(pivot.groups().iter().map(|g| g.to_string()));
	writer.write_record(&header).at_stage(Stage::Output)?;
	for (i, date) in pivot.dates().iter().enumerate() {
		let mut record = vec![date.to_string()];
		for j in 0..pivot.groups().len() {
			record.push(match pivot.get(i, j) {
				Some(v) => v.to_string(),
				None => String::new(),
			});
		}
		writer.write_record(&record).at_stage(Stage::Output)?;
	}
	writer.flush().at_stage(Stage::Output)?;
	info!("wrote {} pivot row(s)", pivot.dates().len());
	Ok(())
}

pub fn write_pivot_path<P: AsRef<Path>>(pivot: &Pivot, path: P) -> Result<()> {
	let mut out = create_output(path).at_stage(Stage::Output)?;
	write_pivot(pivot, &mut out)?;
	out.finish().at_stage(Stage::Output)
}
