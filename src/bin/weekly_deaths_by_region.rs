use covid_rates::{
	extract_observations, first_wave_cutoff, load_csv_path, rank_early_impact, rate_pivot,
	render_svg, sum_by_key, write_ranking_path, write_tidy_path, Chart, Cleaner, DateFormat,
	Layer, Normaliser, ObservationColumns, PopulationLookup, Schema,
};


static SEX: &'static str = "Persons";


fn deaths_schema() -> Schema {
	Schema::new()
		.date("Week ending", DateFormat::DayMonthYear)
		.text("Sex")
		.text("Region")
		.number("Deaths")
}

fn population_schema() -> Schema {
	Schema::new()
		.text("Region")
		.number("Population")
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
	covid_rates::init_logging();
	let argv: Vec<String> = std::env::args().collect();
	let deathsfile = &argv[1];
	let populationfile = &argv[2];
	let outfile = &argv[3];
	let tidyfile = argv.get(4);
	let rankingfile = argv.get(5);

	println!("loading weekly deaths ...");
	let deaths = load_csv_path(deathsfile, &deaths_schema())?;
	let deaths = Cleaner::new()
		.equals("Sex", SEX)
		.flag_negative("Deaths")
		.apply(deaths)?;
	let obs = sum_by_key(extract_observations(
		&deaths,
		&ObservationColumns::new("Region", "Week ending", "Deaths"),
	)?);

	println!("loading population ...");
	let population = load_csv_path(populationfile, &population_schema())?;
	let population = PopulationLookup::from_table(&population, "Region", "Population")?;

	println!("normalising {} observations ...", obs.len());
	let rates = Normaliser::per_100k(&population).normalise(obs);
	let ranking = rank_early_impact(&rates, first_wave_cutoff());

	println!("rendering ...");
	let chart = Chart::new("Weekly deaths per 100,000 by region")
		.x_label("Week ending")
		.y_label("Region")
		.size(1280, 720)
		.with_layer(Layer::Tiles(rate_pivot(&rates)))
		.with_category_order(&ranking.category_order())
		.with_marker(first_wave_cutoff(), "end of first wave");
	render_svg(&chart, outfile)?;

	if let Some(path) = tidyfile {
		println!("writing tidy table ...");
		write_tidy_path(&rates, path)?;
	}
	if let Some(path) = rankingfile {
		println!("writing ranking ...");
		write_ranking_path(&ranking, path)?;
	}
	Ok(())
}
