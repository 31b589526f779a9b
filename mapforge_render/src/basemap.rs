//! Web map tiles drawn underneath the layers.

use anyhow::{Result, bail, ensure};
use async_trait::async_trait;
use futures::{StreamExt, TryStreamExt, stream};
use mapforge_core::{
	BasemapStyle, MercatorExtent,
	mercator::{tile_bounds, tile_range},
};
use mapforge_derive::context;
use reqwest::{Client, Url};
use std::{fmt::Debug, time::Duration};

pub const DEFAULT_MAX_ZOOM: u8 = 19;
pub const DEFAULT_MAX_TILES: usize = 36;
const CONCURRENT_TILE_REQUESTS: usize = 8;

pub const OSM_TILE_URL: &str = "https://tile.openstreetmap.org/{z}/{x}/{y}.png";
pub const SATELLITE_TILE_URL: &str =
	"https://server.arcgisonline.com/ArcGIS/rest/services/World_Imagery/MapServer/tile/{z}/{y}/{x}";
pub const DARK_TILE_URL: &str = "https://a.basemaps.cartocdn.com/dark_all/{z}/{x}/{y}.png";

/// An encoded raster tile together with the area it covers.
#[derive(Clone, Debug, PartialEq)]
pub struct BasemapTile {
	pub extent: MercatorExtent,
	pub data: Vec<u8>,
}

impl BasemapTile {
	/// MIME type sniffed from the tile data.
	pub fn mime(&self) -> &'static str {
		match image::guess_format(&self.data) {
			Ok(image::ImageFormat::Jpeg) => "image/jpeg",
			Ok(image::ImageFormat::WebP) => "image/webp",
			_ => "image/png",
		}
	}
}

/// Something that can deliver the raster tile `z/x/y` of a basemap style.
#[async_trait]
pub trait TileFetcher: Debug + Send + Sync {
	async fn fetch_tile(&self, style: BasemapStyle, z: u8, x: u32, y: u32) -> Result<Vec<u8>>;
}

/// URL templates with `{z}`, `{x}` and `{y}` placeholders.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TileProviders {
	pub osm: String,
	pub satellite: String,
	pub dark: String,
}

impl Default for TileProviders {
	fn default() -> Self {
		Self {
			osm: OSM_TILE_URL.to_string(),
			satellite: SATELLITE_TILE_URL.to_string(),
			dark: DARK_TILE_URL.to_string(),
		}
	}
}

impl TileProviders {
	pub fn template(&self, style: BasemapStyle) -> &str {
		match style {
			BasemapStyle::Osm => &self.osm,
			BasemapStyle::Satellite => &self.satellite,
			BasemapStyle::Dark => &self.dark,
		}
	}

	pub fn tile_url(&self, style: BasemapStyle, z: u8, x: u32, y: u32) -> String {
		self.template(style)
			.replace("{z}", &z.to_string())
			.replace("{x}", &x.to_string())
			.replace("{y}", &y.to_string())
	}
}

#[derive(Debug, Clone)]
pub struct HttpTileFetcher {
	client: Client,
	providers: TileProviders,
}

impl HttpTileFetcher {
	pub fn new(providers: TileProviders, user_agent: &str) -> Result<HttpTileFetcher> {
		let client = Client::builder()
			.user_agent(user_agent)
			.timeout(Duration::from_secs(30))
			.use_rustls_tls()
			.build()?;
		Ok(HttpTileFetcher { client, providers })
	}
}

#[async_trait]
impl TileFetcher for HttpTileFetcher {
	#[context("fetching {} tile {}/{}/{}", style, z, x, y)]
	async fn fetch_tile(&self, style: BasemapStyle, z: u8, x: u32, y: u32) -> Result<Vec<u8>> {
		let url = Url::parse(&self.providers.tile_url(style, z, x, y))?;
		let response = self.client.get(url).send().await?;
		if !response.status().is_success() {
			bail!("tile server answered {}", response.status());
		}
		Ok(response.bytes().await?.to_vec())
	}
}

/// Zoom level whose tiles roughly match the size of the extent.
///
/// Starts at `max(ceil(log2(720 / Δlon)), ceil(log2(720 / Δlat)))`, clamps it to `max_zoom` and
/// lowers it until at most `max_tiles` tiles are needed.
pub fn choose_zoom(extent: &MercatorExtent, max_zoom: u8, max_tiles: usize) -> u8 {
	let [west, south, east, north] = extent.to_lonlat_bounds();
	let zoom_for = |span: f64| -> f64 {
		if span > 0.0 {
			(720.0 / span).log2().ceil()
		} else {
			f64::from(max_zoom)
		}
	};
	let zoom = zoom_for(east - west).max(zoom_for(north - south));
	let mut zoom = zoom.clamp(0.0, f64::from(max_zoom)) as u8;
	while zoom > 0 && tile_count(extent, zoom) > max_tiles {
		zoom -= 1;
	}
	zoom
}

pub fn tile_count(extent: &MercatorExtent, zoom: u8) -> usize {
	let (x_min, x_max, y_min, y_max) = tile_range(extent, zoom);
	((x_max - x_min + 1) as usize) * ((y_max - y_min + 1) as usize)
}

/// Fetches every tile covering `extent`. Fails as a whole if any tile fails.
#[context("loading {} basemap", style)]
pub async fn load_tiles(
	fetcher: &dyn TileFetcher,
	style: BasemapStyle,
	extent: &MercatorExtent,
	max_zoom: u8,
	max_tiles: usize,
) -> Result<Vec<BasemapTile>> {
	let zoom = choose_zoom(extent, max_zoom, max_tiles);
	let count = tile_count(extent, zoom);
	ensure!(count <= max_tiles, "basemap needs {count} tiles, more than the allowed {max_tiles}");

	let (x_min, x_max, y_min, y_max) = tile_range(extent, zoom);
	let coords: Vec<(u32, u32)> = (y_min..=y_max)
		.flat_map(|y| (x_min..=x_max).map(move |x| (x, y)))
		.collect();
	log::debug!("loading {count} {style} basemap tiles at zoom {zoom}");

	stream::iter(coords)
		.map(|(x, y)| async move {
			let data = fetcher.fetch_tile(style, zoom, x, y).await?;
			Ok::<_, anyhow::Error>(BasemapTile {
				extent: tile_bounds(zoom, x, y),
				data,
			})
		})
		.buffered(CONCURRENT_TILE_REQUESTS)
		.try_collect::<Vec<BasemapTile>>()
		.await
}

#[cfg(test)]
mod tests {
	use super::*;
	use mapforge_core::AreaDescriptor;
	use pretty_assertions::assert_eq;
	use std::sync::Mutex;

	#[derive(Debug, Default)]
	struct RecordingFetcher {
		requests: Mutex<Vec<(BasemapStyle, u8, u32, u32)>>,
		fail: bool,
	}

	#[async_trait]
	impl TileFetcher for RecordingFetcher {
		async fn fetch_tile(&self, style: BasemapStyle, z: u8, x: u32, y: u32) -> Result<Vec<u8>> {
			self.requests.lock().unwrap().push((style, z, x, y));
			if self.fail {
				bail!("offline");
			}
			Ok(vec![z, x as u8, y as u8])
		}
	}

	#[test]
	fn provider_urls() {
		let providers = TileProviders::default();
		assert_eq!(
			providers.tile_url(BasemapStyle::Osm, 3, 4, 5),
			"https://tile.openstreetmap.org/3/4/5.png"
		);
		assert_eq!(
			providers.tile_url(BasemapStyle::Satellite, 3, 4, 5),
			"https://server.arcgisonline.com/ArcGIS/rest/services/World_Imagery/MapServer/tile/3/5/4"
		);
		assert_eq!(
			providers.tile_url(BasemapStyle::Dark, 3, 4, 5),
			"https://a.basemaps.cartocdn.com/dark_all/3/4/5.png"
		);
	}

	#[test]
	fn zoom_respects_tile_budget() {
		let extent = AreaDescriptor::new_bbox(52.6, 52.4, 13.6, 13.2).unwrap().mercator_extent();
		let zoom = choose_zoom(&extent, DEFAULT_MAX_ZOOM, DEFAULT_MAX_TILES);
		assert!(tile_count(&extent, zoom) <= DEFAULT_MAX_TILES);
		assert!(tile_count(&extent, zoom + 1) > DEFAULT_MAX_TILES || zoom == 12);
		assert!(zoom <= 12);
	}

	#[test]
	fn zoom_is_capped() {
		let extent = AreaDescriptor::new_circle(52.5, 13.4, 5.0).unwrap().mercator_extent();
		assert_eq!(choose_zoom(&extent, 17, DEFAULT_MAX_TILES), 17);
	}

	#[test]
	fn world_fits_one_tile() {
		let extent = tile_bounds(0, 0, 0);
		assert_eq!(choose_zoom(&extent, DEFAULT_MAX_ZOOM, 1), 0);
	}

	#[tokio::test]
	async fn loads_every_covering_tile() -> Result<()> {
		let fetcher = RecordingFetcher::default();
		let extent = tile_bounds(2, 1, 1);
		// shrink a bit so that only this tile is touched at zoom 2
		let extent = MercatorExtent::new(
			extent.min_x + 1.0,
			extent.min_y + 1.0,
			extent.max_x - 1.0,
			extent.max_y - 1.0,
		);
		let tiles = load_tiles(&fetcher, BasemapStyle::Dark, &extent, 2, 4).await?;
		assert_eq!(tiles.len(), 1);
		assert_eq!(tiles[0].data, vec![2, 1, 1]);
		assert_eq!(tiles[0].extent, tile_bounds(2, 1, 1));
		assert_eq!(*fetcher.requests.lock().unwrap(), vec![(BasemapStyle::Dark, 2, 1, 1)]);
		Ok(())
	}

	#[tokio::test]
	async fn failure_aborts_basemap() {
		let fetcher = RecordingFetcher {
			fail: true,
			..Default::default()
		};
		let extent = AreaDescriptor::new_bbox(52.52, 52.50, 13.42, 13.38).unwrap().mercator_extent();
		let err = load_tiles(&fetcher, BasemapStyle::Osm, &extent, 19, 36).await.unwrap_err();
		assert_eq!(err.to_string(), "loading osm basemap");
		assert_eq!(err.root_cause().to_string(), "offline");
	}

	#[test]
	fn mime_is_sniffed() {
		let png = BasemapTile {
			extent: tile_bounds(0, 0, 0),
			data: b"\x89PNG\r\n\x1a\n".to_vec(),
		};
		let jpeg = BasemapTile {
			extent: tile_bounds(0, 0, 0),
			data: vec![0xFF, 0xD8, 0xFF, 0xE0],
		};
		assert_eq!(png.mime(), "image/png");
		assert_eq!(jpeg.mime(), "image/jpeg");
	}
}
