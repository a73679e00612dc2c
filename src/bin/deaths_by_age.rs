use covid_rates::{
	extract_observations, first_wave_cutoff, load_csv_path, rank_early_impact, rate_pivot,
	regroup_into_bands, render_svg, write_tidy_path, AgeBand, Chart, Cleaner,
	DateFormat, Layer, Normaliser, ObservationColumns, PopulationLookup, Schema,
};


static AGE_BANDS: [AgeBand; 7] = [
	AgeBand{low: 0, high: Some(0)},
	AgeBand{low: 1, high: Some(14)},
	AgeBand{low: 15, high: Some(44)},
	AgeBand{low: 45, high: Some(64)},
	AgeBand{low: 65, high: Some(74)},
	AgeBand{low: 75, high: Some(84)},
	AgeBand{low: 85, high: None},
];


fn deaths_schema() -> Schema {
	Schema::new()
		.date("Week ending", DateFormat::Auto)
		.text("Age group")
		.number("Deaths")
}

fn pyramid_schema() -> Schema {
	Schema::new()
		.text("Age")
		.number("Population")
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
	covid_rates::init_logging();
	let argv: Vec<String> = std::env::args().collect();
	let deathsfile = &argv[1];
	let pyramidfile = &argv[2];
	let outfile = &argv[3];
	let tidyfile = argv.get(4);

	println!("loading deaths by age ...");
	let deaths = load_csv_path(deathsfile, &deaths_schema())?;
	let deaths = Cleaner::new().flag_negative("Deaths").apply(deaths)?;
	let obs = extract_observations(&deaths, &ObservationColumns::new("Age group", "Week ending", "Deaths"))?;
	// labels differ between sources, e.g. "15 to 44" vs "15-44", and may be finer than the bands
	let obs = regroup_into_bands(obs, &AGE_BANDS[..]);

	println!("summing population pyramid into {} bands ...", AGE_BANDS.len());
	let pyramid = load_csv_path(pyramidfile, &pyramid_schema())?;
	let population = PopulationLookup::from_pyramid(&pyramid, "Age", "Population", &AGE_BANDS[..])?;

	let rates = Normaliser::per_100k(&population).normalise(obs);
	let ranking = rank_early_impact(&rates, first_wave_cutoff());
	for entry in ranking.entries() {
		println!("  #{} {}", entry.rank, entry.group);
	}

	println!("rendering ...");
	let chart = Chart::new("Weekly deaths per 100,000 by age")
		.x_label("Week ending")
		.y_label("Deaths per 100,000")
		.with_layer(Layer::Lines(rate_pivot(&rates)))
		.with_category_order(&ranking.category_order())
		.with_marker(first_wave_cutoff(), "end of first wave");
	render_svg(&chart, outfile)?;

	if let Some(path) = tidyfile {
		println!("writing tidy table ...");
		write_tidy_path(&rates, path)?;
	}
	Ok(())
}
