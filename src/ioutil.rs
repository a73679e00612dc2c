use std::io;
use std::io::{Read, Write};
use std::fs;
use std::path::Path;

use flate2;


/// Open `path` for reading, decompressing `.gz` files on the fly.
pub fn magic_open<P: AsRef<Path>>(path: P) -> io::Result<Box<dyn Read>> {
	let path = path.as_ref();
	match path.extension() {
		Some(x) if x == "gz" => {
			Ok(Box::new(flate2::read::GzDecoder::new(fs::File::open(path)?)))
		},
		_ => Ok(Box::new(fs::File::open(path)?)),
	}
}

/// A file opened by `create_output`.
///
/// Call `finish` when done: for gzip files it writes the trailer, which
/// dropping the encoder would do without reporting errors.
pub enum OutputFile {
	Plain(io::BufWriter<fs::File>),
	Gzip(flate2::write::GzEncoder<io::BufWriter<fs::File>>),
}

impl OutputFile {
	pub fn finish(self) -> io::Result<()> {
		match self {
			Self::Plain(mut w) => w.flush(),
			Self::Gzip(w) => w.finish()?.flush(),
		}
	}
}

impl Write for OutputFile {
	fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
		match self {
			Self::Plain(w) => w.write(buf),
			Self::Gzip(w) => w.write(buf),
		}
	}

	fn flush(&mut self) -> io::Result<()> {
		match self {
			Self::Plain(w) => w.flush(),
			Self::Gzip(w) => w.flush(),
		}
	}
}

/// Create `path` for writing, including missing parent directories.
pub fn create_output<P: AsRef<Path>>(path: P) -> io::Result<OutputFile> {
	let path = path.as_ref();
	if let Some(parent) = path.parent() {
		if !parent.as_os_str().is_empty() {
			fs::create_dir_all(parent)?;
		}
	}
	let file = io::BufWriter::new(fs::File::create(path)?);
	match path.extension() {
		Some(x) if x == "gz" => {
			Ok(OutputFile::Gzip(flate2::write::GzEncoder::new(file, flate2::Compression::default())))
		},
		_ => Ok(OutputFile::Plain(file)),
	}
}
