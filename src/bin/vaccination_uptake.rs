use chrono::Weekday;

use covid_rates::{
	early_cutoff, extract_observations, first_wave_cutoff, load_csv_path, load_json_path,
	rank_early_impact, rate_pivot, regroup_into_bands, render_svg, resample_weekly, AgeBand,
	Chart, Cleaner, ColumnKind, Combine, DateFormat, JsonSchema, Layer, Normaliser,
	ObservationColumns, PopulationLookup, Schema, PERCENT,
};


static RECORDS: &'static str = "/body";
static WEEK_ENDS: Weekday = Weekday::Sun;
// ranking window, counted from the first reported day
static EARLY_DAYS: i64 = 56;

static AGE_BANDS: [AgeBand; 10] = [
	AgeBand{low: 12, high: Some(15)},
	AgeBand{low: 16, high: Some(17)},
	AgeBand{low: 18, high: Some(24)},
	AgeBand{low: 25, high: Some(29)},
	AgeBand{low: 30, high: Some(39)},
	AgeBand{low: 40, high: Some(49)},
	AgeBand{low: 50, high: Some(59)},
	AgeBand{low: 60, high: Some(69)},
	AgeBand{low: 70, high: Some(79)},
	AgeBand{low: 80, high: None},
];


fn vaccination_schema() -> JsonSchema {
	JsonSchema::new(
		RECORDS,
		Schema::new()
			.date("date", DateFormat::EpochMillis)
			.text("age")
			.column_from("first doses", "/metric/cumPeopleVaccinatedFirstDose", ColumnKind::Number),
	)
}

fn pyramid_schema() -> Schema {
	Schema::new()
		.text("Age")
		.number("Population")
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
	covid_rates::init_logging();
	let argv: Vec<String> = std::env::args().collect();
	let payloadfile = &argv[1];
	let pyramidfile = &argv[2];
	let outfile = &argv[3];

	println!("loading vaccination payload ...");
	let doses = load_json_path(payloadfile, &vaccination_schema())?;
	let doses = Cleaner::new().flag_negative("first doses").apply(doses)?;
	let obs = extract_observations(&doses, &ObservationColumns::new("age", "date", "first doses"))?;
	let obs = regroup_into_bands(obs, &AGE_BANDS[..]);
	// cumulative counts: the value at the end of each week
	let obs = resample_weekly(obs, WEEK_ENDS, Combine::Last);

	println!("loading population pyramid ...");
	let pyramid = load_csv_path(pyramidfile, &pyramid_schema())?;
	let population = PopulationLookup::from_pyramid(&pyramid, "Age", "Population", &AGE_BANDS[..])?;

	let uptake = Normaliser::per_population(&population, PERCENT).normalise(obs);
	let cutoff = early_cutoff(&uptake, EARLY_DAYS).unwrap_or_else(first_wave_cutoff);
	println!("ranking on uptake before {} ...", cutoff);
	let ranking = rank_early_impact(&uptake, cutoff);

	println!("rendering ...");
	let chart = Chart::new("First dose uptake by age")
		.x_label("Week ending")
		.y_label("% of age band with a first dose")
		.with_layer(Layer::Lines(rate_pivot(&uptake)))
		.with_category_order(&ranking.category_order())
		.with_marker(cutoff, "end of ranking window");
	render_svg(&chart, outfile)?;
	Ok(())
}
