//! Vector file writers for cleaned layers.

mod to_geojson;
mod to_geopackage;
mod to_shapefile;

pub use to_geojson::write_geojson;
pub use to_geopackage::write_geopackage;
pub use to_shapefile::write_shapefile;

use geo::{Geometry, MultiLineString, MultiPolygon};

/// WKT of WGS84 as written to `.prj` files.
pub const WGS84_WKT: &str = concat!(
	r#"GEOGCS["GCS_WGS_1984",DATUM["D_WGS_1984",SPHEROID["WGS_1984",6378137.0,298.257223563]],"#,
	r#"PRIMEM["Greenwich",0.0],UNIT["Degree",0.0174532925199433]]"#
);

pub(crate) fn to_multi_polygon(geometry: &Geometry<f64>) -> Option<MultiPolygon<f64>> {
	match geometry {
		Geometry::Polygon(polygon) => Some(MultiPolygon::new(vec![polygon.clone()])),
		Geometry::MultiPolygon(multi) => Some(multi.clone()),
		_ => None,
	}
}

pub(crate) fn to_multi_line_string(geometry: &Geometry<f64>) -> Option<MultiLineString<f64>> {
	match geometry {
		Geometry::LineString(line) => Some(MultiLineString::new(vec![line.clone()])),
		Geometry::MultiLineString(multi) => Some(multi.clone()),
		_ => None,
	}
}
