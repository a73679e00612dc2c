use std::fmt;
use std::path::Path;

use chrono::{Duration, NaiveDate};

use log::{debug, info};

use plotters::coord::Shift;
use plotters::prelude::*;

use super::aggregate::Pivot;
use super::chart::{Chart, Layer, Marker};
use super::error::{AtStage, ErrorKind, Error, Result, Stage};


fn render_err<E: fmt::Debug>(e: E) -> Error {
	ErrorKind::Render(format!("{:?}", e)).at(Stage::Render)
}

fn day_offset(origin: NaiveDate, d: NaiveDate) -> f64 {
	(d - origin).num_days() as f64
}

fn date_label(origin: NaiveDate, x: f64) -> String {
	(origin + Duration::days(x.round() as i64)).format("%d %b %y").to_string()
}

/// Slot width of a pivot in days, taken from its first two dates.
fn slot_days(p: &Pivot) -> f64 {
	match p.dates() {
		[a, b, ..] => ((*b - *a).num_days().max(1)) as f64,
		_ => 1.,
	}
}

/// Colour for `t` in `[0, 1]`, from blue (low) to red (high).
fn heat(t: f64) -> HSLColor {
	let t = if t.is_finite() { t.max(0.).min(1.) } else { 0. };
	HSLColor(0.66 * (1. - t), 0.85, 0.5)
}

/// Runs of consecutive present values, so that gaps break the line.
fn present_runs(p: &Pivot, group: usize, origin: NaiveDate) -> Vec<Vec<(f64, f64)>> {
	let mut runs = Vec::new();
	let mut current = Vec::new();
	for (d, v) in p.column(group) {
		match v {
			Some(v) if v.is_finite() => current.push((day_offset(origin, d), v)),
			_ => {
				if !current.is_empty() {
					runs.push(std::mem::take(&mut current));
				}
			},
		}
	}
	if !current.is_empty() {
		runs.push(current);
	}
	runs
}


fn draw_lines<DB: DrawingBackend>(
	area: &DrawingArea<DB, Shift>,
	chart: &Chart,
	pivot: &Pivot,
	origin: NaiveDate,
	x_end: f64,
) -> Result<()> {
	let (lo, hi) = pivot.value_range().unwrap_or((0., 1.));
	let y_lo = lo.min(0.);
	let y_hi = if hi > y_lo { hi * 1.05 } else { y_lo + 1. };
	let format_x = |x: &f64| date_label(origin, *x);

	let mut cc = ChartBuilder::on(area)
		.margin(10)
		.x_label_area_size(40)
		.y_label_area_size(60)
		.build_cartesian_2d(0f64..x_end, y_lo..y_hi)
		.map_err(render_err)?;
	cc.configure_mesh()
		.x_desc(chart.get_x_label())
		.y_desc(chart.get_y_label())
		.x_label_formatter(&format_x)
		.draw()
		.map_err(render_err)?;

	for (i, group) in pivot.groups().iter().enumerate() {
		let color = Palette99::pick(i).to_rgba();
		for (j, run) in present_runs(pivot, i, origin).into_iter().enumerate() {
			let anno = cc.draw_series(LineSeries::new(run, color.stroke_width(2))).map_err(render_err)?;
			if j == 0 {
				anno.label(group.to_string())
					.legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(2)));
			}
		}
	}

	for Marker{date, label} in chart.markers() {
		let x = day_offset(origin, *date);
		debug!("marker {} at {}", label, date);
		cc.draw_series(std::iter::once(PathElement::new(vec![(x, y_lo), (x, y_hi)], BLACK.stroke_width(1))))
			.map_err(render_err)?;
	}

	cc.configure_series_labels()
		.position(SeriesLabelPosition::UpperRight)
		.background_style(&WHITE.mix(0.8))
		.border_style(&BLACK)
		.draw()
		.map_err(render_err)?;
	Ok(())
}


fn draw_tiles<DB: DrawingBackend>(
	area: &DrawingArea<DB, Shift>,
	chart: &Chart,
	pivot: &Pivot,
	origin: NaiveDate,
	x_end: f64,
) -> Result<()> {
	let n = pivot.groups().len() as i32;
	let (lo, hi) = pivot.value_range().unwrap_or((0., 1.));
	let span = if hi > lo { hi - lo } else { 1. };
	let width = slot_days(pivot);
	let groups = pivot.groups().to_vec();
	// the first group in category order is drawn at the top
	let format_y = move |v: &SegmentValue<i32>| match v {
		SegmentValue::CenterOf(i) if *i >= 0 && *i < n => groups[(n - 1 - *i) as usize].to_string(),
		_ => String::new(),
	};
	let format_x = |x: &f64| date_label(origin, *x);

	let mut cc = ChartBuilder::on(area)
		.margin(10)
		.x_label_area_size(40)
		.y_label_area_size(120)
		.build_cartesian_2d(0f64..x_end, (0..n).into_segmented())
		.map_err(render_err)?;
	cc.configure_mesh()
		.disable_mesh()
		.x_desc(chart.get_x_label())
		.y_labels(n.max(1) as usize)
		.x_label_formatter(&format_x)
		.y_label_formatter(&format_y)
		.draw()
		.map_err(render_err)?;

	for gi in 0..pivot.groups().len() {
		let row = n - 1 - gi as i32;
		let tiles = pivot.column(gi).filter_map(|(d, v)| {
			let v = v.filter(|v| v.is_finite())?;
			let x = day_offset(origin, d) - width / 2.;
			Some(Rectangle::new(
				[(x, SegmentValue::Exact(row)), (x + width, SegmentValue::Exact(row + 1))],
				heat((v - lo) / span).filled(),
			))
		});
		cc.draw_series(tiles).map_err(render_err)?;
	}

	for Marker{date, ..} in chart.markers() {
		let x = day_offset(origin, *date);
		cc.draw_series(std::iter::once(PathElement::new(
			vec![(x, SegmentValue::Exact(0)), (x, SegmentValue::Exact(n))],
			BLACK.stroke_width(2),
		))).map_err(render_err)?;
	}
	Ok(())
}


/// Draw `chart` into an SVG file at `path`, one panel per layer.
pub fn render_svg<P: AsRef<Path>>(chart: &Chart, path: P) -> Result<()> {
	let path = path.as_ref();
	if let Some(parent) = path.parent() {
		if !parent.as_os_str().is_empty() {
			std::fs::create_dir_all(parent).at_stage(Stage::Render)?;
		}
	}
	let layers = chart.ordered_layers();
	let (origin, last) = match chart.date_span() {
		Some(span) => span,
		None => return Err(ErrorKind::Render("chart has no data".into()).at(Stage::Render)),
	};
	let x_end = day_offset(origin, last) + layers.iter().map(|l| slot_days(l.pivot())).fold(1., f64::max);

	{
		let root = SVGBackend::new(path, chart.get_size()).into_drawing_area();
		root.fill(&WHITE).map_err(render_err)?;
		let root = root.titled(chart.title(), ("sans-serif", 24)).map_err(render_err)?;
		let panels = root.split_evenly((layers.len(), 1));
		for (layer, panel) in layers.iter().zip(panels.iter()) {
			match layer {
				Layer::Lines(p) => draw_lines(panel, chart, p, origin, x_end)?,
				Layer::Tiles(p) => draw_tiles(panel, chart, p, origin, x_end)?,
			}
		}
		root.present().map_err(render_err)?;
	}
	info!("wrote chart {:?} to {}", chart.title(), path.display());
	Ok(())
}


#[cfg(test)]
mod tests {
	use super::*;
	use crate::aggregate::pivot;
	use crate::observation::Observation;

	fn d(m: u32, day: u32) -> NaiveDate {
		NaiveDate::from_ymd_opt(2020, m, day).unwrap()
	}

	fn sample() -> Pivot {
		pivot(&[
			Observation::new("A", d(3, 6), Some(1.)),
			Observation::new("A", d(3, 13), None),
			Observation::new("A", d(3, 20), Some(3.)),
			Observation::new("A", d(3, 27), Some(4.)),
			Observation::new("B", d(3, 6), Some(2.)),
		])
	}

	#[test]
	fn gaps_split_line_runs() {
		let runs = present_runs(&sample(), 0, d(3, 6));
		assert_eq!(runs, vec![vec![(0., 1.)], vec![(14., 3.), (21., 4.)]]);
		assert_eq!(slot_days(&sample()), 7.);
	}

	#[test]
	fn heat_clamps_input() {
		assert_eq!(heat(-1.).0, heat(0.).0);
		assert_eq!(heat(2.).0, heat(1.).0);
		assert_eq!(heat(f64::NAN).0, heat(0.).0);
		assert!(heat(0.).0 > heat(1.).0);
	}

	#[test]
	fn renders_both_layer_kinds_to_svg() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("out").join("chart.svg");
		let chart = Chart::new("test")
			.x_label("week ending")
			.y_label("rate")
			.with_layer(Layer::Lines(sample()))
			.with_layer(Layer::Tiles(sample()))
			.with_marker(d(3, 20), "cutoff")
			.with_category_order(&["B".into(), "A".into()]);
		render_svg(&chart, &path).unwrap();
		let svg = std::fs::read_to_string(&path).unwrap();
		assert!(svg.starts_with("<svg"));
		assert!(svg.contains("test"));
	}

	#[test]
	fn empty_chart_is_a_render_error() {
		let dir = tempfile::tempdir().unwrap();
		let err = render_svg(&Chart::new("empty"), dir.path().join("x.svg")).unwrap_err();
		assert_eq!(err.stage(), Stage::Render);
	}
}
