use chrono::Weekday;

use covid_rates::{
	extract_observations, first_wave_cutoff, load_csv_path, rank_early_impact, rate_pivot,
	read_tidy_path, render_svg, resample_weekly, to_calendar, Calendar, Chart, Cleaner, Combine,
	DateFormat, Layer, Normaliser, NormalisedObservation, ObservationColumns,
	PopulationLookup, Schema,
};


// registered deaths are counted in weeks ending on a Friday
static WEEK_ENDS: Weekday = Weekday::Fri;


fn admissions_schema() -> Schema {
	Schema::new()
		.date("date", DateFormat::Iso)
		.text("Region")
		.number("Admissions")
}

fn population_schema() -> Schema {
	Schema::new()
		.text("Region")
		.number("Population")
}

/// Rows of the tidy table written by the deaths-by-region run, if usable.
fn deaths_reference(tidyfile: Option<&String>) -> Option<Vec<NormalisedObservation>> {
	let path = tidyfile?;
	match read_tidy_path(path) {
		Ok(rows) if !rows.is_empty() => Some(rows),
		Ok(_) => {
			println!("{} has no rows, using own ranking and week axis", path);
			None
		},
		Err(e) => {
			println!("cannot reuse ranking from {} ({}), using own ranking and week axis", path, e);
			None
		},
	}
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
	covid_rates::init_logging();
	let argv: Vec<String> = std::env::args().collect();
	let admissionsfile = &argv[1];
	let populationfile = &argv[2];
	let outfile = &argv[3];
	let tidyfile = argv.get(4);

	println!("loading daily admissions ...");
	let admissions = load_csv_path(admissionsfile, &admissions_schema())?;
	let admissions = Cleaner::new().flag_negative("Admissions").apply(admissions)?;
	let obs = extract_observations(&admissions, &ObservationColumns::new("Region", "date", "Admissions"))?;
	let obs = resample_weekly(obs, WEEK_ENDS, Combine::Sum);

	// share the week axis and region order of the deaths series
	let reference = deaths_reference(tidyfile);
	let calendar = reference.as_ref().and_then(|rows| Calendar::spanning(rows.iter().map(|r| r.date), 7));
	let obs = match calendar {
		Some(calendar) => {
			println!("aligning to {} deaths weeks from {} ...", calendar.len(), calendar.start());
			to_calendar(obs, &calendar)
		},
		None => obs,
	};

	println!("loading population ...");
	let population = load_csv_path(populationfile, &population_schema())?;
	let population = PopulationLookup::from_table(&population, "Region", "Population")?;
	let rates: Vec<NormalisedObservation> = Normaliser::per_100k(&population).normalise(obs);

	let order = match &reference {
		Some(rows) => rank_early_impact(rows, first_wave_cutoff()).category_order(),
		None => rank_early_impact(&rates, first_wave_cutoff()).category_order(),
	};

	println!("rendering ...");
	let chart = Chart::new("Weekly hospital admissions per 100,000 by region")
		.x_label("Week ending")
		.y_label("Region")
		.size(1280, 720)
		.with_layer(Layer::Tiles(rate_pivot(&rates)))
		.with_category_order(&order)
		.with_marker(first_wave_cutoff(), "end of first wave");
	render_svg(&chart, outfile)?;
	Ok(())
}
