//! The static table of map layers.
//!
//! A [`Layer`] ties a public name (used in the `layers=` parameter) to the upstream tag query that
//! selects its features, the color used when rendering, the geometry kind it keeps and the order in
//! which layers are drawn.

use geo::Geometry;
use std::fmt::{self, Display};

/// Draw order assigned to names that are not in the table.
pub const UNKNOWN_LAYER_ORDER: u8 = 99;

/// Geometry family a layer keeps after fetching.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GeometryKind {
	Polygon,
	Line,
}

impl GeometryKind {
	pub fn accepts(&self, geometry: &Geometry<f64>) -> bool {
		match self {
			GeometryKind::Polygon => matches!(geometry, Geometry::Polygon(_) | Geometry::MultiPolygon(_)),
			GeometryKind::Line => matches!(geometry, Geometry::LineString(_) | Geometry::MultiLineString(_)),
		}
	}
}

/// One OSM tag condition.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TagFilter {
	/// Tag is present with any value.
	Exists(&'static str),
	Equals(&'static str, &'static str),
	OneOf(&'static str, &'static [&'static str]),
}

impl TagFilter {
	pub fn key(&self) -> &'static str {
		match self {
			TagFilter::Exists(key) | TagFilter::Equals(key, _) | TagFilter::OneOf(key, _) => key,
		}
	}

	pub fn matches(&self, key: &str, value: &str) -> bool {
		match self {
			TagFilter::Exists(k) => *k == key,
			TagFilter::Equals(k, v) => *k == key && *v == value,
			TagFilter::OneOf(k, values) => *k == key && values.contains(&value),
		}
	}
}

/// What has to be asked upstream to get the features of a layer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LayerQuery {
	/// Union of all filters.
	Features(&'static [TagFilter]),
	/// Every highway usable by any mode of travel.
	StreetNetwork,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Layer {
	pub name: &'static str,
	pub query: LayerQuery,
	pub color: &'static str,
	pub kind: GeometryKind,
	pub order: u8,
}

use GeometryKind::*;
use TagFilter::*;

static LAYERS: [Layer; 8] = [
	Layer {
		name: "water",
		query: LayerQuery::Features(&[Equals("natural", "water"), OneOf("waterway", &["river", "canal", "stream"])]),
		color: "#aed9e0",
		kind: Polygon,
		order: 1,
	},
	Layer {
		name: "parks",
		query: LayerQuery::Features(&[
			Equals("leisure", "park"),
			OneOf("landuse", &["grass", "forest", "recreation_ground"]),
		]),
		color: "#c7e9c0",
		kind: Polygon,
		order: 2,
	},
	Layer {
		name: "schools",
		query: LayerQuery::Features(&[OneOf("amenity", &["school", "university"])]),
		color: "#fdd0a2",
		kind: Polygon,
		order: 3,
	},
	Layer {
		name: "medical",
		query: LayerQuery::Features(&[Equals("amenity", "hospital")]),
		color: "#fbb4b9",
		kind: Polygon,
		order: 3,
	},
	Layer {
		name: "buildings",
		query: LayerQuery::Features(&[Exists("building")]),
		color: "#525252",
		kind: Polygon,
		order: 4,
	},
	Layer {
		name: "railways",
		query: LayerQuery::Features(&[Exists("railway")]),
		color: "#54278f",
		kind: Line,
		order: 5,
	},
	Layer {
		name: "streets",
		query: LayerQuery::StreetNetwork,
		color: "#000000",
		kind: Line,
		order: 6,
	},
	Layer {
		name: "power",
		query: LayerQuery::Features(&[Equals("power", "line")]),
		color: "#f1c40f",
		kind: Line,
		order: 7,
	},
];

impl Layer {
	pub fn all() -> &'static [Layer] {
		&LAYERS
	}

	pub fn get(name: &str) -> Option<&'static Layer> {
		LAYERS.iter().find(|layer| layer.name == name)
	}

	pub fn accepts(&self, geometry: &Geometry<f64>) -> bool {
		self.kind.accepts(geometry)
	}

	pub fn is_line(&self) -> bool {
		self.kind == GeometryKind::Line
	}
}

impl Display for Layer {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.name)
	}
}

/// Splits the comma separated `layers` parameter, dropping empty entries.
pub fn parse_layer_list(layers: &str) -> Vec<String> {
	layers
		.split(',')
		.map(str::trim)
		.filter(|name| !name.is_empty())
		.map(String::from)
		.collect()
}

pub fn layer_order(name: &str) -> u8 {
	Layer::get(name).map_or(UNKNOWN_LAYER_ORDER, |layer| layer.order)
}

/// Stable sort by draw order; names with the same order keep their relative position.
pub fn sort_layers(names: &mut [String]) {
	names.sort_by_key(|name| layer_order(name));
}
