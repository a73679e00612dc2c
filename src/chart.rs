use chrono::NaiveDate;

use smartstring::alias::{String as SmartString};

use super::aggregate::Pivot;
use super::normalise::NormalisedObservation;
use super::observation::GroupId;


#[derive(Debug, Clone, PartialEq)]
pub enum Layer {
	/// one line per group
	Lines(Pivot),
	/// one row of coloured tiles per group
	Tiles(Pivot),
}

impl Layer {
	pub fn pivot(&self) -> &Pivot {
		match self {
			Self::Lines(p) | Self::Tiles(p) => p,
		}
	}

	fn reordered(&self, order: &[GroupId]) -> Self {
		match self {
			Self::Lines(p) => Self::Lines(p.reordered(order)),
			Self::Tiles(p) => Self::Tiles(p.reordered(order)),
		}
	}
}


#[derive(Debug, Clone, PartialEq)]
pub struct Marker {
	pub date: NaiveDate,
	pub label: SmartString,
}


/// Description of a chart. Every builder method returns a new value and
/// leaves the receiver untouched.
#[derive(Debug, Clone, PartialEq)]
pub struct Chart {
	title: SmartString,
	x_label: SmartString,
	y_label: SmartString,
	layers: Vec<Layer>,
	markers: Vec<Marker>,
	category_order: Vec<GroupId>,
	size: (u32, u32),
}

impl Chart {
	pub fn new(title: &str) -> Self {
		Self{
			title: title.into(),
			x_label: SmartString::new(),
			y_label: SmartString::new(),
			layers: Vec::new(),
			markers: Vec::new(),
			category_order: Vec::new(),
			size: (1024, 768),
		}
	}

	pub fn x_label(&self, label: &str) -> Self {
		let mut next = self.clone();
		next.x_label = label.into();
		next
	}

	pub fn y_label(&self, label: &str) -> Self {
		let mut next = self.clone();
		next.y_label = label.into();
		next
	}

	pub fn with_layer(&self, layer: Layer) -> Self {
		let mut next = self.clone();
		next.layers.push(layer);
		next
	}

	pub fn with_marker(&self, date: NaiveDate, label: &str) -> Self {
		let mut next = self.clone();
		next.markers.push(Marker{date, label: label.into()});
		next
	}

	pub fn with_category_order(&self, order: &[GroupId]) -> Self {
		let mut next = self.clone();
		next.category_order = order.to_vec();
		next
	}

	pub fn size(&self, width: u32, height: u32) -> Self {
		let mut next = self.clone();
		next.size = (width, height);
		next
	}

	pub fn title(&self) -> &str {
		&self.title
	}

	pub fn get_x_label(&self) -> &str {
		&self.x_label
	}

	pub fn get_y_label(&self) -> &str {
		&self.y_label
	}

	pub fn markers(&self) -> &[Marker] {
		&self.markers[..]
	}

	pub fn category_order(&self) -> &[GroupId] {
		&self.category_order[..]
	}

	pub fn get_size(&self) -> (u32, u32) {
		self.size
	}

	/// Layers with their groups arranged in the category order.
	pub fn ordered_layers(&self) -> Vec<Layer> {
		self.layers.iter().map(|l| l.reordered(&self.category_order)).collect()
	}

	/// Earliest and latest date over all layers.
	pub fn date_span(&self) -> Option<(NaiveDate, NaiveDate)> {
		let dates = self.layers.iter().flat_map(|l| l.pivot().dates().iter().copied());
		let mut span: Option<(NaiveDate, NaiveDate)> = None;
		for d in dates {
			span = Some(match span {
				None => (d, d),
				Some((lo, hi)) => (lo.min(d), hi.max(d)),
			});
		}
		span
	}
}

/// Pivot the rates of normalised rows, ignoring categories.
pub fn rate_pivot(rows: &[NormalisedObservation]) -> Pivot {
	Pivot::from_triples(rows.iter().map(|r| (r.group.clone(), r.date, r.rate)))
}
