//! The three shapes a request can use to bound a query.
//!
//! An [`AreaDescriptor`] knows how to express itself as an Overpass area filter, as a WGS84 query
//! polygon and as the Web Mercator window the renderer draws into.

use crate::mercator::{MercatorExtent, lonlat_to_mercator, scale_factor};
use anyhow::{Context, Result, bail, ensure};
use geo::{BoundingRect, Coord, LineString, Polygon};
use std::{
	f64::consts::PI,
	fmt::{self, Display},
	str::FromStr,
};

/// Meters per degree used when a circle radius has to be expressed in degrees.
pub const METERS_PER_DEGREE: f64 = 111_000.0;
/// Number of segments of the polygon approximating a circle.
pub const CIRCLE_SEGMENTS: usize = 64;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum AreaType {
	#[default]
	BBox,
	Circle,
	Polygon,
}

impl FromStr for AreaType {
	type Err = anyhow::Error;

	fn from_str(s: &str) -> Result<Self> {
		Ok(match s.trim().to_ascii_lowercase().as_str() {
			"bbox" => AreaType::BBox,
			"circle" => AreaType::Circle,
			"polygon" => AreaType::Polygon,
			other => bail!("unknown area type '{other}', expected one of: bbox, circle, polygon"),
		})
	}
}

impl Display for AreaType {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(match self {
			AreaType::BBox => "bbox",
			AreaType::Circle => "circle",
			AreaType::Polygon => "polygon",
		})
	}
}

/// Raw area parameters as they arrive in a request, before validation.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AreaParams {
	pub area_type: AreaType,
	pub north: f64,
	pub south: f64,
	pub east: f64,
	pub west: f64,
	pub lat: f64,
	pub lon: f64,
	pub radius: f64,
	/// JSON array of `[lat, lon]` pairs.
	pub poly_coords: Option<String>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum AreaDescriptor {
	BBox { north: f64, south: f64, east: f64, west: f64 },
	/// `radius` in meters.
	Circle { lat: f64, lon: f64, radius: f64 },
	/// Ring of `(lon, lat)` points, always closed.
	Polygon(Vec<(f64, f64)>),
}

impl AreaDescriptor {
	pub fn from_params(params: &AreaParams) -> Result<AreaDescriptor> {
		match params.area_type {
			AreaType::BBox => AreaDescriptor::new_bbox(params.north, params.south, params.east, params.west),
			AreaType::Circle => AreaDescriptor::new_circle(params.lat, params.lon, params.radius),
			AreaType::Polygon => {
				let json = params
					.poly_coords
					.as_deref()
					.filter(|s| !s.trim().is_empty())
					.context("area type 'polygon' requires 'poly_coords'")?;
				AreaDescriptor::from_poly_json(json)
			}
		}
	}

	pub fn new_bbox(north: f64, south: f64, east: f64, west: f64) -> Result<AreaDescriptor> {
		ensure!(
			[north, south, east, west].iter().all(|v| v.is_finite()),
			"bbox coordinates must be finite numbers"
		);
		ensure!(
			(-90.0..=90.0).contains(&north) && (-90.0..=90.0).contains(&south),
			"bbox latitudes must be within [-90, 90]"
		);
		ensure!(north > south, "bbox north ({north}) must be greater than south ({south})");
		ensure!(east > west, "bbox east ({east}) must be greater than west ({west})");
		Ok(AreaDescriptor::BBox {
			north,
			south,
			east,
			west,
		})
	}

	pub fn new_circle(lat: f64, lon: f64, radius: f64) -> Result<AreaDescriptor> {
		ensure!(lat.is_finite() && lon.is_finite(), "circle center must be finite");
		ensure!((-90.0..=90.0).contains(&lat), "circle latitude must be within [-90, 90]");
		ensure!(radius.is_finite() && radius > 0.0, "circle radius must be greater than 0");
		Ok(AreaDescriptor::Circle { lat, lon, radius })
	}

	/// Parses a JSON array of `[lat, lon]` pairs. Points are swapped to `(lon, lat)` and the ring is
	/// closed if needed.
	pub fn from_poly_json(json: &str) -> Result<AreaDescriptor> {
		let pairs: Vec<Vec<f64>> = serde_json::from_str(json).context("'poly_coords' must be a JSON array of [lat, lon] pairs")?;
		let mut ring = Vec::with_capacity(pairs.len() + 1);
		for (index, pair) in pairs.iter().enumerate() {
			ensure!(pair.len() >= 2, "point {index} of 'poly_coords' needs a latitude and a longitude");
			ensure!(pair[0].is_finite() && pair[1].is_finite(), "point {index} of 'poly_coords' is not finite");
			ring.push((pair[1], pair[0]));
		}
		AreaDescriptor::new_polygon(ring)
	}

	pub fn new_polygon(mut ring: Vec<(f64, f64)>) -> Result<AreaDescriptor> {
		let mut distinct: Vec<(f64, f64)> = Vec::new();
		for point in &ring {
			if !distinct.contains(point) {
				distinct.push(*point);
			}
		}
		ensure!(distinct.len() >= 3, "a polygon needs at least 3 distinct points");
		if ring.first() != ring.last() {
			ring.push(ring[0]);
		}
		Ok(AreaDescriptor::Polygon(ring))
	}

	pub fn area_type(&self) -> AreaType {
		match self {
			AreaDescriptor::BBox { .. } => AreaType::BBox,
			AreaDescriptor::Circle { .. } => AreaType::Circle,
			AreaDescriptor::Polygon(_) => AreaType::Polygon,
		}
	}

	/// Overpass QL area filter appended to every statement.
	pub fn to_overpass_filter(&self) -> String {
		match self {
			AreaDescriptor::BBox {
				north,
				south,
				east,
				west,
			} => format!("({south},{west},{north},{east})"),
			AreaDescriptor::Circle { lat, lon, radius } => format!("(around:{radius},{lat},{lon})"),
			AreaDescriptor::Polygon(ring) => {
				let points = open_ring(ring)
					.iter()
					.map(|(lon, lat)| format!("{lat} {lon}"))
					.collect::<Vec<_>>()
					.join(" ");
				format!("(poly:\"{points}\")")
			}
		}
	}

	/// The query geometry in WGS84 degrees.
	pub fn to_geometry(&self) -> Polygon<f64> {
		match self {
			AreaDescriptor::BBox {
				north,
				south,
				east,
				west,
			} => Polygon::new(
				LineString::from(vec![
					(*west, *south),
					(*east, *south),
					(*east, *north),
					(*west, *north),
					(*west, *south),
				]),
				vec![],
			),
			AreaDescriptor::Circle { lat, lon, radius } => {
				let r = radius / METERS_PER_DEGREE;
				let mut ring: Vec<Coord<f64>> = (0..CIRCLE_SEGMENTS)
					.map(|i| {
						let angle = 2.0 * PI * i as f64 / CIRCLE_SEGMENTS as f64;
						Coord {
							x: lon + r * angle.cos(),
							y: lat + r * angle.sin(),
						}
					})
					.collect();
				ring.push(ring[0]);
				Polygon::new(LineString::new(ring), vec![])
			}
			AreaDescriptor::Polygon(ring) => Polygon::new(LineString::from(ring.clone()), vec![]),
		}
	}

	/// The Web Mercator window the renderer draws into.
	///
	/// For circles this is the square around the clip circle, so the figure is framed by
	/// `center ± radius` and not by the degree-approximated query ring.
	pub fn mercator_extent(&self) -> MercatorExtent {
		if let Some((x, y, r)) = self.clip_circle() {
			return MercatorExtent::new(x - r, y - r, x + r, y + r);
		}
		let geometry = self.to_geometry();
		let points = geometry.exterior().coords().map(|c| lonlat_to_mercator(c.x, c.y));
		// rings always carry at least 4 points
		MercatorExtent::from_points(points).unwrap_or(MercatorExtent::new(0.0, 0.0, 0.0, 0.0))
	}

	/// Center and radius of the circular clip in Mercator meters, only for circles.
	///
	/// The radius is multiplied by the Mercator scale factor at the center latitude, so the clip
	/// covers `radius` meters on the ground.
	pub fn clip_circle(&self) -> Option<(f64, f64, f64)> {
		match self {
			AreaDescriptor::Circle { lat, lon, radius } => {
				let (x, y) = lonlat_to_mercator(*lon, *lat);
				Some((x, y, radius * scale_factor(*lat)))
			}
			_ => None,
		}
	}

	/// `[west, south, east, north]` of the query geometry in degrees.
	pub fn lonlat_bounds(&self) -> [f64; 4] {
		match self.to_geometry().bounding_rect() {
			Some(rect) => [rect.min().x, rect.min().y, rect.max().x, rect.max().y],
			None => [0.0; 4],
		}
	}
}

impl Display for AreaDescriptor {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			AreaDescriptor::BBox {
				north,
				south,
				east,
				west,
			} => write!(f, "bbox [{west}, {south}, {east}, {north}]"),
			AreaDescriptor::Circle { lat, lon, radius } => write!(f, "circle {radius}m around ({lat}, {lon})"),
			AreaDescriptor::Polygon(ring) => write!(f, "polygon with {} points", open_ring(ring).len()),
		}
	}
}

fn open_ring(ring: &[(f64, f64)]) -> &[(f64, f64)] {
	if ring.len() > 1 && ring.first() == ring.last() {
		&ring[..ring.len() - 1]
	} else {
		ring
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use approx::assert_relative_eq;
	use pretty_assertions::assert_eq;
	use rstest::rstest;

	fn berlin_box() -> AreaDescriptor {
		AreaDescriptor::new_bbox(52.52, 52.50, 13.42, 13.38).unwrap()
	}

	#[rstest]
	#[case("bbox", AreaType::BBox)]
	#[case("Circle", AreaType::Circle)]
	#[case(" polygon ", AreaType::Polygon)]
	fn parse_area_type(#[case] input: &str, #[case] expected: AreaType) {
		assert_eq!(input.parse::<AreaType>().unwrap(), expected);
	}

	#[test]
	fn unknown_area_type() {
		let err = "hexagon".parse::<AreaType>().unwrap_err();
		assert!(err.to_string().contains("unknown area type 'hexagon'"));
	}

	#[test]
	fn bbox_from_params() {
		let params = AreaParams {
			north: 52.52,
			south: 52.50,
			east: 13.42,
			west: 13.38,
			..Default::default()
		};
		assert_eq!(AreaDescriptor::from_params(&params).unwrap(), berlin_box());
	}

	#[rstest]
	#[case(52.50, 52.52, 13.42, 13.38, "north")]
	#[case(52.52, 52.50, 13.38, 13.42, "east")]
	#[case(0.0, 0.0, 0.0, 0.0, "north")]
	#[case(95.0, 52.50, 13.42, 13.38, "latitudes")]
	fn invalid_bbox(#[case] north: f64, #[case] south: f64, #[case] east: f64, #[case] west: f64, #[case] needle: &str) {
		let err = AreaDescriptor::new_bbox(north, south, east, west).unwrap_err();
		assert!(err.to_string().contains(needle), "{err}");
	}

	#[test]
	fn circle_requires_positive_radius() {
		assert!(AreaDescriptor::new_circle(52.5, 13.4, 0.0).is_err());
		assert!(AreaDescriptor::new_circle(52.5, 13.4, -5.0).is_err());
		assert!(AreaDescriptor::new_circle(52.5, 13.4, 500.0).is_ok());
	}

	#[test]
	fn polygon_swaps_and_closes() {
		let area = AreaDescriptor::from_poly_json("[[52.5, 13.4], [52.6, 13.4], [52.6, 13.5]]").unwrap();
		assert_eq!(
			area,
			AreaDescriptor::Polygon(vec![(13.4, 52.5), (13.4, 52.6), (13.5, 52.6), (13.4, 52.5)])
		);
	}

	#[rstest]
	#[case("[[52.5, 13.4], [52.6, 13.4]]")]
	#[case("[[52.5, 13.4], [52.6, 13.4], [52.5, 13.4]]")]
	#[case("[[52.5], [52.6, 13.4], [52.6, 13.5]]")]
	#[case("not json")]
	fn invalid_polygon(#[case] json: &str) {
		assert!(AreaDescriptor::from_poly_json(json).is_err());
	}

	#[test]
	fn polygon_requires_coords() {
		let params = AreaParams {
			area_type: AreaType::Polygon,
			..Default::default()
		};
		let err = AreaDescriptor::from_params(&params).unwrap_err();
		assert_eq!(err.to_string(), "area type 'polygon' requires 'poly_coords'");
	}

	#[test]
	fn overpass_filters() {
		assert_eq!(berlin_box().to_overpass_filter(), "(52.5,13.38,52.52,13.42)");
		assert_eq!(
			AreaDescriptor::new_circle(52.5, 13.4, 250.0).unwrap().to_overpass_filter(),
			"(around:250,52.5,13.4)"
		);
		assert_eq!(
			AreaDescriptor::from_poly_json("[[1, 2], [3, 4], [5, 6]]").unwrap().to_overpass_filter(),
			"(poly:\"1 2 3 4 5 6\")"
		);
	}

	#[test]
	fn circle_geometry_in_degrees() {
		let polygon = AreaDescriptor::new_circle(10.0, 20.0, 1110.0).unwrap().to_geometry();
		let ring = polygon.exterior();
		assert_eq!(ring.0.len(), CIRCLE_SEGMENTS + 1);
		assert!(ring.is_closed());
		assert_relative_eq!(ring.0[0].x, 20.01, epsilon = 1e-12);
		assert_relative_eq!(ring.0[0].y, 10.0, epsilon = 1e-12);
		assert_relative_eq!(ring.0[16].y, 10.01, epsilon = 1e-12);
	}

	#[test]
	fn circle_extent_is_square() {
		let area = AreaDescriptor::new_circle(60.0, 0.0, 1000.0).unwrap();
		let (x, _, r) = area.clip_circle().unwrap();
		assert_relative_eq!(x, 0.0);
		assert_relative_eq!(r, 2000.0, epsilon = 1e-6);
		let extent = area.mercator_extent();
		assert_relative_eq!(extent.width(), 4000.0, epsilon = 1e-6);
		assert_relative_eq!(extent.height(), 4000.0, epsilon = 1e-6);
	}

	#[test]
	fn clip_radius_follows_latitude() {
		let equator = AreaDescriptor::new_circle(0.0, 10.0, 500.0).unwrap();
		assert_relative_eq!(equator.clip_circle().unwrap().2, 500.0, epsilon = 1e-9);

		let south = AreaDescriptor::new_circle(-60.0, 10.0, 500.0).unwrap();
		let (_, y, r) = south.clip_circle().unwrap();
		assert_relative_eq!(r, 1000.0, epsilon = 1e-6);
		let extent = south.mercator_extent();
		assert_relative_eq!(extent.min_y, y - r, epsilon = 1e-6);
		assert_relative_eq!(extent.max_y, y + r, epsilon = 1e-6);
	}

	#[test]
	fn bbox_extent_and_bounds() {
		let area = berlin_box();
		assert!(area.clip_circle().is_none());
		let extent = area.mercator_extent();
		let (min_x, min_y) = lonlat_to_mercator(13.38, 52.50);
		assert_relative_eq!(extent.min_x, min_x, epsilon = 1e-6);
		assert_relative_eq!(extent.min_y, min_y, epsilon = 1e-6);
		assert_eq!(area.lonlat_bounds(), [13.38, 52.50, 13.42, 52.52]);
	}
}
