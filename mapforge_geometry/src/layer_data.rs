use crate::feature::MapFeature;
use geo::{BoundingRect, Geometry, Rect};
use mapforge_core::Layer;
use std::collections::BTreeSet;

/// A feature of a cleaned layer; `properties` is aligned with [`LayerData::columns`].
#[derive(Clone, Debug, PartialEq)]
pub struct LayerFeature {
	pub geometry: Geometry<f64>,
	pub properties: Vec<String>,
}

/// The features of one layer, reduced to the geometry kind the layer keeps and with every property
/// normalised to a string.
#[derive(Clone, Debug, PartialEq)]
pub struct LayerData {
	pub layer: &'static Layer,
	pub columns: Vec<String>,
	pub features: Vec<LayerFeature>,
}

impl LayerData {
	/// Keeps the geometries the layer accepts and builds a table with the columns `element`, `id`
	/// and then every tag key in sorted order. Missing tags become empty strings.
	pub fn clean(layer: &'static Layer, features: Vec<MapFeature>) -> LayerData {
		let features: Vec<MapFeature> = features.into_iter().filter(|f| layer.accepts(&f.geometry)).collect();

		let keys: BTreeSet<&str> = features
			.iter()
			.flat_map(|f| f.tags.keys().map(String::as_str))
			.filter(|key| *key != "element" && *key != "id")
			.collect();

		let mut columns = vec![String::from("element"), String::from("id")];
		columns.extend(keys.iter().map(|key| key.to_string()));

		let rows = features
			.iter()
			.map(|feature| {
				let mut properties = Vec::with_capacity(columns.len());
				properties.push(feature.element.to_string());
				properties.push(feature.id.to_string());
				for key in &keys {
					properties.push(feature.tags.get(*key).cloned().unwrap_or_default());
				}
				LayerFeature {
					geometry: feature.geometry.clone(),
					properties,
				}
			})
			.collect();

		LayerData {
			layer,
			columns,
			features: rows,
		}
	}

	pub fn name(&self) -> &'static str {
		self.layer.name
	}

	pub fn is_empty(&self) -> bool {
		self.features.is_empty()
	}

	pub fn len(&self) -> usize {
		self.features.len()
	}

	/// Value of `column` for a feature, `""` when the column does not exist.
	pub fn value<'a>(&self, feature: &'a LayerFeature, column: &str) -> &'a str {
		self.columns
			.iter()
			.position(|c| c == column)
			.and_then(|index| feature.properties.get(index))
			.map_or("", String::as_str)
	}

	/// Bounding box of all geometries in degrees.
	pub fn bounds(&self) -> Option<Rect<f64>> {
		self.features
			.iter()
			.filter_map(|f| f.geometry.bounding_rect())
			.reduce(|a, b| {
				Rect::new(
					(a.min().x.min(b.min().x), a.min().y.min(b.min().y)),
					(a.max().x.max(b.max().x), a.max().y.max(b.max().y)),
				)
			})
	}
}
