use crate::layer_data::LayerData;
use anyhow::{Context, Result};
use geojson::{Feature, FeatureCollection, JsonObject, JsonValue};
use mapforge_derive::context;

/// Serialises a layer as an RFC 7946 FeatureCollection in WGS84. All properties are strings.
#[context("writing layer '{}' as GeoJSON", data.name())]
pub fn write_geojson(data: &LayerData) -> Result<Vec<u8>> {
	let features = data
		.features
		.iter()
		.map(|feature| {
			let properties: JsonObject = data
				.columns
				.iter()
				.zip(&feature.properties)
				.map(|(column, value)| (column.clone(), JsonValue::String(value.clone())))
				.collect();
			Feature {
				bbox: None,
				geometry: Some(geojson::Geometry::new(geojson::Value::from(&feature.geometry))),
				id: None,
				properties: Some(properties),
				foreign_members: None,
			}
		})
		.collect();

	let collection = FeatureCollection {
		bbox: None,
		features,
		foreign_members: None,
	};
	serde_json::to_vec(&collection).context("serialising feature collection")
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::write::test_data;
	use pretty_assertions::assert_eq;
	use serde_json::Value;

	#[test]
	fn feature_collection() -> Result<()> {
		let json: Value = serde_json::from_slice(&write_geojson(&test_data::parks())?)?;
		assert_eq!(json["type"], "FeatureCollection");

		let features = json["features"].as_array().unwrap();
		assert_eq!(features.len(), 2);
		assert_eq!(features[0]["geometry"]["type"], "Polygon");
		assert_eq!(features[0]["geometry"]["coordinates"].as_array().unwrap().len(), 2);
		assert_eq!(features[1]["geometry"]["type"], "MultiPolygon");

		let properties = &features[0]["properties"];
		assert_eq!(properties["element"], "way");
		assert_eq!(properties["id"], "1");
		assert_eq!(properties["name"], "Tiergarten");
		assert_eq!(properties["landuse"], "");
		Ok(())
	}

	#[test]
	fn empty_layer() -> Result<()> {
		let data = LayerData::clean(mapforge_core::Layer::get("power").unwrap(), vec![]);
		let json: Value = serde_json::from_slice(&write_geojson(&data)?)?;
		assert_eq!(json["features"], Value::Array(vec![]));
		Ok(())
	}
}
