use chrono::NaiveDate;

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod error;
mod cell;
mod calendar;
mod table;
mod ioutil;
mod loader;
mod cleaner;
mod observation;
mod aggregate;
mod population;
mod join;
mod normalise;
mod rank;
mod chart;
mod render;
mod output;

pub use error::*;
pub use cell::*;
pub use calendar::*;
pub use table::*;
pub use ioutil::{magic_open, create_output, OutputFile};
pub use loader::*;
pub use cleaner::*;
pub use observation::*;
pub use aggregate::*;
pub use population::*;
pub use join::*;
pub use normalise::*;
pub use rank::*;
pub use chart::*;
pub use render::*;
pub use output::*;


/// End of the first wave; ranks are computed on data before this date.
pub fn first_wave_cutoff() -> NaiveDate {
	NaiveDate::from_ymd(2020, 7, 1)
}

/// Install a stderr log subscriber filtered by `RUST_LOG` (default `info`).
///
/// Records emitted through the `log` macros are forwarded as well. Calling
/// this more than once is harmless.
pub fn init_logging() {
	let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
	let _ = tracing_subscriber::registry()
		.with(filter)
		.with(fmt::layer().with_writer(std::io::stderr))
		.try_init();
}
