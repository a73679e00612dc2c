use std::fmt;
use std::io;

use smartstring::alias::{String as SmartString};


#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
	Loader,
	Cleaner,
	Aggregate,
	Normaliser,
	Ranker,
	Render,
	Output,
}

impl fmt::Display for Stage {
	fn fmt<'f>(&self, f: &'f mut fmt::Formatter) -> fmt::Result {
		match self {
			Self::Loader => f.write_str("loader"),
			Self::Cleaner => f.write_str("cleaner"),
			Self::Aggregate => f.write_str("aggregate"),
			Self::Normaliser => f.write_str("normaliser"),
			Self::Ranker => f.write_str("ranker"),
			Self::Render => f.write_str("render"),
			Self::Output => f.write_str("output"),
		}
	}
}


#[derive(Debug)]
pub enum ErrorKind {
	Io(io::Error),
	Csv(csv::Error),
	Json(serde_json::Error),
	MissingColumn(SmartString),
	MissingRecords(SmartString),
	Render(String),
}

impl ErrorKind {
	pub fn at(self, stage: Stage) -> Error {
		Error{stage, kind: self}
	}
}

impl fmt::Display for ErrorKind {
	fn fmt<'f>(&self, f: &'f mut fmt::Formatter) -> fmt::Result {
		match self {
			Self::Io(e) => fmt::Display::fmt(e, f),
			Self::Csv(e) => fmt::Display::fmt(e, f),
			Self::Json(e) => fmt::Display::fmt(e, f),
			Self::MissingColumn(name) => write!(f, "required column \"{}\" is missing", name),
			Self::MissingRecords(pointer) => write!(f, "no record array at \"{}\"", pointer),
			Self::Render(msg) => write!(f, "failed to draw chart: {}", msg),
		}
	}
}

impl From<io::Error> for ErrorKind {
	fn from(other: io::Error) -> Self {
		Self::Io(other)
	}
}

impl From<csv::Error> for ErrorKind {
	fn from(other: csv::Error) -> Self {
		Self::Csv(other)
	}
}

impl From<serde_json::Error> for ErrorKind {
	fn from(other: serde_json::Error) -> Self {
		Self::Json(other)
	}
}


/// Failure of a pipeline run, tagged with the stage it happened in.
#[derive(Debug)]
pub struct Error {
	stage: Stage,
	kind: ErrorKind,
}

impl Error {
	pub fn stage(&self) -> Stage {
		self.stage
	}

	pub fn kind(&self) -> &ErrorKind {
		&self.kind
	}

	pub fn missing_column(stage: Stage, name: &str) -> Self {
		ErrorKind::MissingColumn(name.into()).at(stage)
	}
}

impl fmt::Display for Error {
	fn fmt<'f>(&self, f: &'f mut fmt::Formatter) -> fmt::Result {
		write!(f, "{} stage failed: {}", self.stage, self.kind)
	}
}

impl std::error::Error for Error {
	fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
		match &self.kind {
			ErrorKind::Io(e) => Some(e),
			ErrorKind::Csv(e) => Some(e),
			ErrorKind::Json(e) => Some(e),
			_ => None,
		}
	}
}

pub type Result<T> = std::result::Result<T, Error>;

/// Attach a stage to any error convertible into an [`ErrorKind`].
pub trait AtStage<T> {
	fn at_stage(self, stage: Stage) -> Result<T>;
}

impl<T, E: Into<ErrorKind>> AtStage<T> for std::result::Result<T, E> {
	fn at_stage(self, stage: Stage) -> Result<T> {
		self.map_err(|e| e.into().at(stage))
	}
}
