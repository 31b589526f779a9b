//! Serde model of the Overpass JSON output produced by `out geom`.

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Deserializer};
use std::collections::BTreeMap;

pub type Tags = BTreeMap<String, String>;

#[derive(Clone, Copy, Debug, Deserialize, PartialEq)]
pub struct LatLon {
	pub lat: f64,
	pub lon: f64,
}

impl LatLon {
	/// `(x, y)` order as used by `geo`.
	pub fn to_xy(self) -> (f64, f64) {
		(self.lon, self.lat)
	}
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
pub struct OverpassResponse {
	#[serde(default)]
	pub elements: Vec<OsmElement>,
	/// Set by the server when the query failed at runtime, e.g. on a timeout.
	#[serde(default)]
	pub remark: Option<String>,
}

impl OverpassResponse {
	pub fn parse(data: &[u8]) -> Result<OverpassResponse> {
		let response: OverpassResponse =
			serde_json::from_slice(data).context("parsing Overpass response as JSON")?;
		if let Some(remark) = &response.remark {
			if remark.contains("error") {
				bail!("Overpass reported: {remark}");
			}
		}
		Ok(response)
	}

	pub fn is_empty(&self) -> bool {
		self.elements.is_empty()
	}
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum OsmElement {
	Node(OsmNode),
	Way(OsmWay),
	Relation(OsmRelation),
	/// Anything else the server might emit (`area`, `count`, ...).
	#[serde(other)]
	Other,
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct OsmNode {
	pub id: i64,
	pub lat: f64,
	pub lon: f64,
	#[serde(default)]
	pub tags: Tags,
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct OsmWay {
	pub id: i64,
	#[serde(default, deserialize_with = "skip_null_points")]
	pub geometry: Vec<LatLon>,
	#[serde(default)]
	pub tags: Tags,
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct OsmRelation {
	pub id: i64,
	#[serde(default)]
	pub members: Vec<OsmMember>,
	#[serde(default)]
	pub tags: Tags,
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct OsmMember {
	#[serde(rename = "type")]
	pub member_type: String,
	#[serde(rename = "ref")]
	pub reference: i64,
	#[serde(default)]
	pub role: String,
	#[serde(default, deserialize_with = "skip_null_points")]
	pub geometry: Vec<LatLon>,
}

impl OsmMember {
	pub fn is_way(&self) -> bool {
		self.member_type == "way"
	}
}

/// Overpass writes `null` for nodes it could not resolve.
fn skip_null_points<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<LatLon>, D::Error> {
	let points: Option<Vec<Option<LatLon>>> = Option::deserialize(deserializer)?;
	Ok(points.unwrap_or_default().into_iter().flatten().collect())
}

#[cfg(test)]
mod tests {
	use super::*;
	use pretty_assertions::assert_eq;

	const SAMPLE: &str = r#"{
		"version": 0.6,
		"generator": "Overpass API",
		"elements": [
			{"type": "node", "id": 1, "lat": 52.5, "lon": 13.4, "tags": {"amenity": "hospital"}},
			{"type": "way", "id": 2, "nodes": [1, 2], "geometry": [{"lat": 1.0, "lon": 2.0}, null, {"lat": 3.0, "lon": 4.0}]},
			{"type": "relation", "id": 3, "tags": {"type": "multipolygon"}, "members": [
				{"type": "way", "ref": 10, "role": "outer", "geometry": [{"lat": 0.0, "lon": 0.0}]},
				{"type": "node", "ref": 11, "role": "label", "lat": 0.5, "lon": 0.5}
			]},
			{"type": "area", "id": 4}
		]
	}"#;

	#[test]
	fn parse_sample() {
		let response = OverpassResponse::parse(SAMPLE.as_bytes()).unwrap();
		assert_eq!(response.elements.len(), 4);

		let OsmElement::Node(node) = &response.elements[0] else {
			panic!("expected node")
		};
		assert_eq!(node.tags["amenity"], "hospital");

		let OsmElement::Way(way) = &response.elements[1] else {
			panic!("expected way")
		};
		assert_eq!(way.geometry, [LatLon { lat: 1.0, lon: 2.0 }, LatLon { lat: 3.0, lon: 4.0 }]);
		assert!(way.tags.is_empty());

		let OsmElement::Relation(relation) = &response.elements[2] else {
			panic!("expected relation")
		};
		assert!(relation.members[0].is_way());
		assert_eq!(relation.members[0].role, "outer");
		assert!(!relation.members[1].is_way());
		assert!(relation.members[1].geometry.is_empty());

		assert_eq!(response.elements[3], OsmElement::Other);
	}

	#[test]
	fn runtime_error_remark() {
		let data = br#"{"elements": [], "remark": "runtime error: Query timed out in \"query\" at line 1 after 25 seconds."}"#;
		let err = OverpassResponse::parse(data).unwrap_err();
		assert!(err.to_string().starts_with("Overpass reported: runtime error"));
	}

	#[test]
	fn invalid_json() {
		let err = OverpassResponse::parse(b"<html>busy</html>").unwrap_err();
		assert_eq!(err.to_string(), "parsing Overpass response as JSON");
	}
}
