//! Draws cleaned layers as a map: an SVG scene that is rasterised to PNG or converted to PDF,
//! optionally on top of basemap tiles and clipped to a circle.

pub mod basemap;
mod options;
mod raster;
mod scene;

pub use basemap::{BasemapTile, HttpTileFetcher, TileFetcher, TileProviders, load_tiles};
pub use options::RenderOptions;
pub use raster::{render, svg_to_pdf, svg_to_png};
pub use scene::MapScene;
