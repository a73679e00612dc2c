use covid_rates::{
	extract_observations, first_wave_cutoff, load_csv_path, rank_early_impact, rate_pivot,
	render_svg, sum_by_key, write_pivot_path, Chart, Cleaner, DateFormat, Layer, Normaliser,
	ObservationColumns, Schema,
};


static PLACES: [&'static str; 4] = ["Home", "Care home", "Hospital", "Hospice"];


fn deaths_schema() -> Schema {
	Schema::new()
		.date("Week ending", DateFormat::Auto)
		.text("Place of death")
		.number("Deaths")
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
	covid_rates::init_logging();
	let argv: Vec<String> = std::env::args().collect();
	let deathsfile = &argv[1];
	let outfile = &argv[2];
	let widefile = argv.get(3);

	println!("loading deaths by place of death ...");
	let deaths = load_csv_path(deathsfile, &deaths_schema())?;
	let deaths = Cleaner::new()
		.one_of("Place of death", &PLACES[..])
		.flag_negative("Deaths")
		.apply(deaths)?;
	let obs = sum_by_key(extract_observations(
		&deaths,
		&ObservationColumns::new("Place of death", "Week ending", "Deaths"),
	)?);

	println!("computing weekly shares ...");
	let shares = Normaliser::share_of_total().normalise(obs);
	let ranking = rank_early_impact(&shares, first_wave_cutoff());

	let shares = rate_pivot(&shares).reordered(&ranking.category_order());

	println!("rendering ...");
	let chart = Chart::new("Share of weekly deaths by place of death")
		.x_label("Week ending")
		.y_label("% of deaths")
		.with_layer(Layer::Lines(shares.clone()))
		.with_category_order(&ranking.category_order())
		.with_marker(first_wave_cutoff(), "end of first wave");
	render_svg(&chart, outfile)?;

	if let Some(path) = widefile {
		println!("writing weekly shares table ...");
		write_pivot_path(&shares, path)?;
	}
	Ok(())
}
