use anyhow::{Result, ensure};
use mapforge_derive::ConfigDoc;
use mapforge_render::{
	TileProviders,
	basemap::{DARK_TILE_URL, DEFAULT_MAX_TILES, DEFAULT_MAX_ZOOM, OSM_TILE_URL, SATELLITE_TILE_URL},
};
use serde::Deserialize;

/// Raster tiles drawn under image exports when `basemap=true`.
#[derive(Debug, Clone, Deserialize, PartialEq, ConfigDoc)]
#[serde(deny_unknown_fields, default)]
pub struct BasemapConfig {
	/// Upper limit for the number of tiles fetched for one map
	#[config_demo("36")]
	pub max_tiles: usize,

	/// Highest zoom level that is requested
	#[config_demo("19")]
	pub max_zoom: u8,

	/// URL template of the `osm` style, with {z}, {x} and {y} placeholders
	#[config_demo("https://tile.openstreetmap.org/{z}/{x}/{y}.png")]
	pub osm: String,

	/// URL template of the `satellite` style
	#[config_demo("https://server.arcgisonline.com/ArcGIS/rest/services/World_Imagery/MapServer/tile/{z}/{y}/{x}")]
	pub satellite: String,

	/// URL template of the `dark` style
	#[config_demo("https://a.basemaps.cartocdn.com/dark_all/{z}/{x}/{y}.png")]
	pub dark: String,
}

impl Default for BasemapConfig {
	fn default() -> Self {
		Self {
			max_tiles: DEFAULT_MAX_TILES,
			max_zoom: DEFAULT_MAX_ZOOM,
			osm: OSM_TILE_URL.to_string(),
			satellite: SATELLITE_TILE_URL.to_string(),
			dark: DARK_TILE_URL.to_string(),
		}
	}
}

impl BasemapConfig {
	pub fn providers(&self) -> Result<TileProviders> {
		ensure!(self.max_tiles > 0, "basemap.max_tiles must be positive");
		ensure!(self.max_zoom <= 24, "basemap.max_zoom must not exceed 24");
		for (name, template) in [("osm", &self.osm), ("satellite", &self.satellite), ("dark", &self.dark)] {
			ensure!(
				["{z}", "{x}", "{y}"].iter().all(|p| template.contains(p)),
				"basemap.{name} must contain {{z}}, {{x}} and {{y}}"
			);
		}
		Ok(TileProviders {
			osm: self.osm.clone(),
			satellite: self.satellite.clone(),
			dark: self.dark.clone(),
		})
	}
}
