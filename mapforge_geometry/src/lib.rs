//! Turns Overpass answers into cleaned layers and writes them as GeoJSON, Shapefile or GeoPackage.

pub mod feature;
pub mod layer_data;
pub mod osm;
pub mod write;

pub use feature::{ElementType, MapFeature};
pub use layer_data::{LayerData, LayerFeature};
pub use osm::assemble_features;
pub use write::{write_geojson, write_geopackage, write_shapefile};
