use geo::Geometry;
use mapforge_core::overpass::Tags;
use std::fmt::{self, Display};

/// OSM element type a feature was built from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum ElementType {
	Node,
	Way,
	Relation,
}

impl ElementType {
	pub fn as_str(&self) -> &'static str {
		match self {
			ElementType::Node => "node",
			ElementType::Way => "way",
			ElementType::Relation => "relation",
		}
	}
}

impl Display for ElementType {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// A single OSM element with a resolved geometry in WGS84.
#[derive(Clone, Debug, PartialEq)]
pub struct MapFeature {
	pub element: ElementType,
	pub id: i64,
	pub geometry: Geometry<f64>,
	pub tags: Tags,
}

impl MapFeature {
	pub fn new(element: ElementType, id: i64, geometry: Geometry<f64>, tags: Tags) -> Self {
		Self {
			element,
			id,
			geometry,
			tags,
		}
	}
}
