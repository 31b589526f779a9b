//! Turns Overpass elements into features with `geo` geometries.
//!
//! Nodes become points. Ways become line strings, or polygons when they are closed and their tags
//! describe an area. Multipolygon and boundary relations are assembled from their `outer` and
//! `inner` way members.

use crate::feature::{ElementType, MapFeature};
use geo::{Contains, Coord, Geometry, LineString, MultiPolygon, Point, Polygon};
use mapforge_core::overpass::{LatLon, OsmElement, OsmRelation, OsmWay, OverpassResponse, Tags};

/// Converts all usable elements of a response. Elements without a usable geometry are skipped.
pub fn assemble_features(response: &OverpassResponse) -> Vec<MapFeature> {
	let mut features = Vec::with_capacity(response.elements.len());
	for element in &response.elements {
		let feature = match element {
			OsmElement::Node(node) => Some(MapFeature::new(
				ElementType::Node,
				node.id,
				Geometry::Point(Point::new(node.lon, node.lat)),
				node.tags.clone(),
			)),
			OsmElement::Way(way) => way_feature(way),
			OsmElement::Relation(relation) => relation_feature(relation),
			OsmElement::Other => None,
		};
		match feature {
			Some(feature) => features.push(feature),
			None => log::debug!("skipping element without usable geometry: {element_id}", element_id = describe(element)),
		}
	}
	features
}

fn describe(element: &OsmElement) -> String {
	match element {
		OsmElement::Node(n) => format!("node {}", n.id),
		OsmElement::Way(w) => format!("way {}", w.id),
		OsmElement::Relation(r) => format!("relation {}", r.id),
		OsmElement::Other => String::from("unsupported element"),
	}
}

fn to_coords(points: &[LatLon]) -> Vec<Coord<f64>> {
	let mut coords: Vec<Coord<f64>> = Vec::with_capacity(points.len());
	for point in points {
		let coord = Coord {
			x: point.lon,
			y: point.lat,
		};
		// repeated nodes add nothing
		if coords.last() != Some(&coord) {
			coords.push(coord);
		}
	}
	coords
}

fn is_closed_ring(coords: &[Coord<f64>]) -> bool {
	coords.len() >= 4 && coords.first() == coords.last()
}

fn way_feature(way: &OsmWay) -> Option<MapFeature> {
	let coords = to_coords(&way.geometry);
	if coords.len() < 2 {
		return None;
	}
	let geometry = if is_closed_ring(&coords) && is_area(&way.tags) {
		Geometry::Polygon(Polygon::new(LineString::new(coords), vec![]))
	} else {
		Geometry::LineString(LineString::new(coords))
	};
	Some(MapFeature::new(ElementType::Way, way.id, geometry, way.tags.clone()))
}

/// Decides whether a closed way describes an area.
pub fn is_area(tags: &Tags) -> bool {
	match tags.get("area").map(String::as_str) {
		Some("no") => return false,
		Some("yes") => return true,
		_ => (),
	}
	tags.iter().any(|(key, value)| key_implies_area(key, value))
}

fn key_implies_area(key: &str, value: &str) -> bool {
	if value == "no" {
		return false;
	}
	match key {
		"building" | "landuse" | "leisure" | "amenity" | "place" | "shop" | "tourism" => true,
		"man_made" => !matches!(value, "embankment" | "pipeline"),
		"natural" => !matches!(value, "coastline" | "cliff" | "ridge" | "arete" | "tree_row"),
		"waterway" => matches!(value, "riverbank" | "dock" | "boatyard" | "dam"),
		"power" => matches!(value, "plant" | "substation" | "generator" | "transformer"),
		"railway" => matches!(value, "station" | "turntable" | "roundhouse" | "platform"),
		"highway" => matches!(value, "services" | "rest_area" | "escape" | "elevator"),
		_ => false,
	}
}

fn relation_feature(relation: &OsmRelation) -> Option<MapFeature> {
	match relation.tags.get("type").map(String::as_str) {
		Some("multipolygon" | "boundary") => (),
		_ => return None,
	}

	let mut outer = Vec::new();
	let mut inner = Vec::new();
	for member in relation.members.iter().filter(|m| m.is_way()) {
		let coords = to_coords(&member.geometry);
		if coords.len() < 2 {
			continue;
		}
		match member.role.as_str() {
			"inner" => inner.push(coords),
			"outer" | "" => outer.push(coords),
			_ => (),
		}
	}

	let geometry = build_multipolygon(stitch_rings(outer), stitch_rings(inner))?;
	Some(MapFeature::new(ElementType::Relation, relation.id, geometry, relation.tags.clone()))
}

/// Joins way segments end to end into closed rings. Segments are reversed where needed; chains that
/// cannot be closed are dropped.
pub fn stitch_rings(mut segments: Vec<Vec<Coord<f64>>>) -> Vec<LineString<f64>> {
	let mut rings = Vec::new();
	while !segments.is_empty() {
		let mut current = segments.remove(0);
		loop {
			if current.first() == current.last() {
				if current.len() >= 4 {
					rings.push(LineString::new(current));
				} else {
					log::debug!("dropping degenerate ring with {} points", current.len());
				}
				break;
			}

			let Some(&tail) = current.last() else { break };
			let next = segments
				.iter()
				.position(|s| s.first() == Some(&tail) || s.last() == Some(&tail));
			match next {
				Some(index) => {
					let mut segment = segments.remove(index);
					if segment.first() != Some(&tail) {
						segment.reverse();
					}
					current.extend(segment.into_iter().skip(1));
				}
				None => {
					log::debug!("dropping ring that cannot be closed");
					break;
				}
			}
		}
	}
	rings
}

/// Attaches every inner ring to the first outer ring containing it.
pub fn build_multipolygon(outers: Vec<LineString<f64>>, inners: Vec<LineString<f64>>) -> Option<Geometry<f64>> {
	let mut polygons: Vec<(Polygon<f64>, Vec<LineString<f64>>)> = outers
		.into_iter()
		.map(|ring| (Polygon::new(ring, vec![]), Vec::new()))
		.collect();

	for ring in inners {
		let owner = polygons
			.iter_mut()
			.find(|(outer, _)| ring.coords().any(|c| outer.contains(c)));
		match owner {
			Some((_, holes)) => holes.push(ring),
			None => log::debug!("dropping inner ring outside of all outer rings"),
		}
	}

	let mut polygons: Vec<Polygon<f64>> = polygons
		.into_iter()
		.map(|(outer, holes)| Polygon::new(outer.into_inner().0, holes))
		.collect();

	match polygons.len() {
		0 => None,
		1 => polygons.pop().map(Geometry::Polygon),
		_ => Some(Geometry::MultiPolygon(MultiPolygon::new(polygons))),
	}
}
