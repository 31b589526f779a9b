//! # MapForge
//!
//! A web service that fetches OpenStreetMap layers (water, parks, buildings, streets, …) for a
//! bounding box, a circle or a polygon through the Overpass API and delivers them either as a map
//! image (PNG, SVG, PDF) or as vector files (GeoJSON, Shapefile, GeoPackage) in a zip archive.
//!
//! ## Usage Example
//!
//! ```no_run
//! use mapforge::{
//! 	config::Config,
//! 	core::{AreaDescriptor, ExportFormat},
//! 	export::{DownloadRequest, Exporter},
//! };
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//! 	let exporter = Exporter::from_config(&Config::default())?;
//! 	let area = AreaDescriptor::new_bbox(52.52, 52.50, 13.42, 13.38)?;
//! 	let request = DownloadRequest::new(vec!["water".into(), "streets".into()], area, ExportFormat::Png);
//!
//! 	let artifact = exporter.run(&request).await?;
//! 	std::fs::write(&artifact.filename, &artifact.data)?;
//! 	Ok(())
//! }
//! ```

pub mod config;
pub mod export;
pub mod server;

pub use mapforge_core as core;
pub use mapforge_derive as derive;
pub use mapforge_geometry as geometry;
pub use mapforge_render as render;
