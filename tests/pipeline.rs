use chrono::{NaiveDate, Weekday};

use covid_rates::{
	extract_observations, first_wave_cutoff, load_csv, load_json, rank_early_impact, rate_pivot,
	read_tidy_path, regroup_into_bands, render_svg, resample_weekly, sum_by_key, to_calendar,
	write_tidy_path, Calendar, Chart, Cleaner, ColumnKind, Combine, DateFormat, JsonSchema, Layer,
	AgeBand, Normaliser, Observation, ObservationColumns, PopulationLookup, Schema, Stage, PERCENT,
};


static DEATHS: &'static str = "\
Week ending,Sex,Region,Deaths
03/04/2020,Persons,North,20
03/04/2020,Males,North,12
03/04/2020,Persons,South,30
10/04/2020,Persons,North,10
10/04/2020,Persons,South,-1
10/04/2020,Persons,East,5
03/07/2020,Persons,North,1000
";

static POPULATION: &'static str = "\
Region,Population
North,200000
South,100000
East,0
";

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
	NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

fn regional_rates() -> Vec<covid_rates::NormalisedObservation> {
	let schema = Schema::new()
		.date("Week ending", DateFormat::DayMonthYear)
		.text("Sex")
		.text("Region")
		.number("Deaths");
	let deaths = load_csv(DEATHS.as_bytes(), &schema).unwrap();
	let deaths = Cleaner::new()
		.equals("Sex", "Persons")
		.flag_negative("Deaths")
		.apply(deaths)
		.unwrap();
	let obs = sum_by_key(extract_observations(
		&deaths,
		&ObservationColumns::new("Region", "Week ending", "Deaths"),
	).unwrap());

	let population = load_csv(POPULATION.as_bytes(), &Schema::new().text("Region").number("Population")).unwrap();
	let population = PopulationLookup::from_table(&population, "Region", "Population").unwrap();
	Normaliser::per_100k(&population).normalise(obs)
}

#[test]
fn regional_pipeline_ranks_and_renders() {
	let rates = regional_rates();
	assert_eq!(rates.len(), 6);

	let north_first = rates.iter().find(|r| &r.group[..] == "North" && r.date == d(2020, 4, 3)).unwrap();
	assert_eq!(north_first.value, Some(20.));
	assert_eq!(north_first.rate, Some(10.));
	let south_first = rates.iter().find(|r| &r.group[..] == "South" && r.date == d(2020, 4, 3)).unwrap();
	assert!((south_first.rate.unwrap() - 30.).abs() < 1e-9);
	let south_second = rates.iter().find(|r| &r.group[..] == "South" && r.date == d(2020, 4, 10)).unwrap();
	assert_eq!(south_second.value, None);
	assert_eq!(south_second.rate, None);
	let east = rates.iter().find(|r| &r.group[..] == "East").unwrap();
	assert_eq!(east.population, Some(0.));
	assert_eq!(east.rate, None);

	let ranking = rank_early_impact(&rates, first_wave_cutoff());
	assert_eq!(ranking.get("North").unwrap().mean_early_rate, Some(7.5));
	assert_eq!(ranking.rank_of("North"), Some(1));
	assert_eq!(ranking.rank_of("South"), Some(2));
	assert_eq!(ranking.rank_of("East"), Some(3));

	let dir = tempfile::tempdir().unwrap();
	let out = dir.path().join("regions.svg");
	let chart = Chart::new("Weekly deaths per 100,000 by region")
		.x_label("Week ending")
		.y_label("Region")
		.with_layer(Layer::Tiles(rate_pivot(&rates)))
		.with_category_order(&ranking.category_order())
		.with_marker(first_wave_cutoff(), "end of first wave");
	render_svg(&chart, &out).unwrap();
	assert!(std::fs::metadata(&out).unwrap().len() > 0);
}

#[test]
fn tidy_table_carries_ranking_to_a_later_run() {
	let rates = regional_rates();
	let dir = tempfile::tempdir().unwrap();
	let tidy = dir.path().join("tables").join("regions.csv.gz");
	write_tidy_path(&rates, &tidy).unwrap();

	let restored = read_tidy_path(&tidy).unwrap();
	assert_eq!(restored, rates);
	assert_eq!(
		rank_early_impact(&restored, first_wave_cutoff()),
		rank_early_impact(&rates, first_wave_cutoff()),
	);
}

#[test]
fn missing_column_names_stage_and_column() {
	let schema = Schema::new()
		.date("Week ending", DateFormat::DayMonthYear)
		.text("Area")
		.number("Deaths");
	let err = load_csv(DEATHS.as_bytes(), &schema).unwrap_err();
	assert_eq!(err.stage(), Stage::Loader);
	assert!(err.to_string().contains("Area"));
}

#[test]
fn json_payload_resamples_cumulative_doses() {
	let payload = r#"{"body": [
		{"date": 1617235200000, "age": "18_24", "metric": {"cumPeopleVaccinatedFirstDose": 50}},
		{"date": 1617408000000, "age": "18_24", "metric": {"cumPeopleVaccinatedFirstDose": 100}},
		{"date": 1617408000000, "age": "25_29", "metric": {}}
	]}"#;
	let schema = JsonSchema::new(
		"/body",
		Schema::new()
			.date("date", DateFormat::EpochMillis)
			.text("age")
			.column_from("first doses", "/metric/cumPeopleVaccinatedFirstDose", ColumnKind::Number),
	);
	let doses = load_json(payload.as_bytes(), &schema).unwrap();
	let doses = Cleaner::new().apply(doses).unwrap();
	let obs = extract_observations(&doses, &ObservationColumns::new("age", "date", "first doses")).unwrap();
	let obs = regroup_into_bands(obs, &[AgeBand::new(18, Some(24)), AgeBand::new(25, Some(29))]);
	let obs = resample_weekly(obs, Weekday::Sun, Combine::Last);

	let population = PopulationLookup::from_pairs(vec![
		("18-24".into(), Some(1000.)),
		("25-29".into(), Some(2000.)),
	]);
	let uptake = Normaliser::per_population(&population, PERCENT).normalise(obs);
	assert_eq!(uptake.len(), 2);
	assert_eq!(&uptake[0].group[..], "18-24");
	assert_eq!(uptake[0].date, d(2021, 4, 4));
	assert_eq!(uptake[0].value, Some(100.));
	assert_eq!(uptake[0].rate, Some(10.));
	assert_eq!(&uptake[1].group[..], "25-29");
	assert_eq!(uptake[1].rate, None);

	let dir = tempfile::tempdir().unwrap();
	let chart = Chart::new("First dose uptake")
		.with_layer(Layer::Lines(rate_pivot(&uptake)));
	render_svg(&chart, dir.path().join("uptake.svg")).unwrap();
}

#[test]
fn fine_death_labels_meet_coarse_pyramid_bands() {
	let deaths = "\
Week ending,Age group,Deaths
2020-04-03,Under 1 year,1
2020-04-03,1-4,2
2020-04-03,5-9,3
2020-04-03,85-89,40
2020-04-03,90+,60
";
	let pyramid = "\
Age,Population
0,1000
1,1000
2,1000
3,1000
4,1000
5,1000
6,1000
7,1000
8,1000
9,1000
85,500
86,500
87,500
88,500
89,500
90+,7500
";
	let bands = [AgeBand::new(0, Some(0)), AgeBand::new(1, Some(9)), AgeBand::new(85, None)];
	let schema = Schema::new()
		.date("Week ending", DateFormat::Auto)
		.text("Age group")
		.number("Deaths");
	let deaths = load_csv(deaths.as_bytes(), &schema).unwrap();
	let obs = extract_observations(&deaths, &ObservationColumns::new("Age group", "Week ending", "Deaths")).unwrap();
	let obs = regroup_into_bands(obs, &bands);

	let pyramid = load_csv(pyramid.as_bytes(), &Schema::new().text("Age").number("Population")).unwrap();
	let population = PopulationLookup::from_pyramid(&pyramid, "Age", "Population", &bands).unwrap();
	let rates = Normaliser::per_100k(&population).normalise(obs);

	assert_eq!(rates.len(), 3);
	for r in rates.iter() {
		assert!(r.rate.is_some(), "{} has no rate", r.group);
	}
	let oldest = rates.iter().find(|r| &r.group[..] == "85+").unwrap();
	assert_eq!(oldest.value, Some(100.));
	assert_eq!(oldest.rate, Some(1000.));
}

#[test]
fn admissions_share_the_deaths_week_axis() {
	let dir = tempfile::tempdir().unwrap();
	let tidy = dir.path().join("regions.csv");
	write_tidy_path(&regional_rates(), &tidy).unwrap();
	let reference = read_tidy_path(&tidy).unwrap();

	// daily admissions from Monday 30 March to Monday 20 July
	let mut daily = Vec::new();
	let mut day = d(2020, 3, 30);
	while day <= d(2020, 7, 20) {
		daily.push(Observation::new("North", day, Some(1.)));
		day = day.succ_opt().unwrap();
	}
	let weekly = resample_weekly(daily, Weekday::Fri, Combine::Sum);
	assert_eq!(weekly.first().unwrap().date, d(2020, 4, 3));
	assert_eq!(weekly.last().unwrap().date, d(2020, 7, 24));

	let calendar = Calendar::spanning(reference.iter().map(|r| r.date), 7).unwrap();
	let aligned = to_calendar(weekly, &calendar);
	assert_eq!(aligned.first().unwrap().date, d(2020, 4, 3));
	assert_eq!(aligned.last().unwrap().date, d(2020, 7, 3));
	assert_eq!(aligned.len(), 14);
	assert!(aligned.iter().all(|o| calendar.index_of(o.date).is_some()));
}
