use crate::{
	area::AreaDescriptor,
	layer::{Layer, LayerQuery, TagFilter},
};
use std::fmt::{self, Display};

pub const DEFAULT_TIMEOUT_SECONDS: u64 = 180;

/// Highway filter for the street network usable by any mode of travel.
const STREET_NETWORK_FILTER: &str = concat!(
	r#"["highway"]["area"!~"yes"]["access"!~"private"]"#,
	r#"["highway"!~"abandoned|construction|no|planned|platform|proposed|raceway|razed"]"#,
	r#"["service"!~"private"]"#
);

/// An Overpass QL query selecting the features of one layer inside one area.
#[derive(Clone, Debug)]
pub struct OverpassQuery<'a> {
	layer: &'a Layer,
	area: &'a AreaDescriptor,
	timeout_seconds: u64,
}

impl<'a> OverpassQuery<'a> {
	pub fn new(layer: &'a Layer, area: &'a AreaDescriptor) -> Self {
		Self {
			layer,
			area,
			timeout_seconds: DEFAULT_TIMEOUT_SECONDS,
		}
	}

	pub fn with_timeout(mut self, timeout_seconds: u64) -> Self {
		self.timeout_seconds = timeout_seconds;
		self
	}

	/// One statement per tag filter, all sharing the area filter.
	pub fn statements(&self) -> Vec<String> {
		let area = self.area.to_overpass_filter();
		match &self.layer.query {
			LayerQuery::Features(filters) => filters
				.iter()
				.map(|filter| format!("nwr{}{area};", tag_selector(filter)))
				.collect(),
			LayerQuery::StreetNetwork => vec![format!("way{STREET_NETWORK_FILTER}{area};")],
		}
	}

	pub fn build(&self) -> String {
		format!(
			"[out:json][timeout:{}];({});out geom;",
			self.timeout_seconds,
			self.statements().join("")
		)
	}
}

impl Display for OverpassQuery<'_> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.build())
	}
}

fn tag_selector(filter: &TagFilter) -> String {
	match filter {
		TagFilter::Exists(key) => format!("[\"{}\"]", escape(key)),
		TagFilter::Equals(key, value) => format!("[\"{}\"=\"{}\"]", escape(key), escape(value)),
		TagFilter::OneOf(key, values) => {
			let alternatives = values.iter().map(|v| escape(v)).collect::<Vec<_>>().join("|");
			format!("[\"{}\"~\"^({alternatives})$\"]", escape(key))
		}
	}
}

fn escape(value: &str) -> String {
	value.replace('\\', "\\\\").replace('"', "\\\"")
}
