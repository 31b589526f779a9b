use super::{DownloadRequest, ExportError, archive::zip_directory, error::format_error_chain};
use crate::config::Config;
use anyhow::{Context, Result, bail};
use futures::{StreamExt, stream};
use mapforge_core::{AreaDescriptor, ExportFormat, FeatureSource, Layer, sort_layers};
use mapforge_derive::context;
use mapforge_geometry::{LayerData, assemble_features, write_geojson, write_geopackage, write_shapefile};
use mapforge_render::{
	HttpTileFetcher, MapScene, RenderOptions, TileFetcher,
	basemap::{DEFAULT_MAX_TILES, DEFAULT_MAX_ZOOM},
	load_tiles, render,
};
use std::{
	collections::HashSet,
	fmt::{self, Debug},
	fs,
	path::{Path, PathBuf},
	sync::Arc,
};
use uuid::Uuid;

/// The file handed back to the client.
#[derive(Clone, PartialEq)]
pub struct ExportArtifact {
	pub filename: String,
	pub mime: &'static str,
	pub data: Vec<u8>,
}

impl Debug for ExportArtifact {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("ExportArtifact")
			.field("filename", &self.filename)
			.field("mime", &self.mime)
			.field("size", &self.data.len())
			.finish()
	}
}

/// Runs download requests: fetches the layers, then renders or writes them.
#[derive(Clone, Debug)]
pub struct Exporter {
	features: Arc<dyn FeatureSource>,
	tiles: Arc<dyn TileFetcher>,
	render_options: RenderOptions,
	max_tiles: usize,
	max_zoom: u8,
	temp_root: Option<PathBuf>,
	concurrency: usize,
}

impl Exporter {
	pub fn new(features: Arc<dyn FeatureSource>, tiles: Arc<dyn TileFetcher>) -> Exporter {
		Exporter {
			features,
			tiles,
			render_options: RenderOptions::default(),
			max_tiles: DEFAULT_MAX_TILES,
			max_zoom: DEFAULT_MAX_ZOOM,
			temp_root: None,
			concurrency: 2,
		}
	}

	/// Wires the HTTP clients for Overpass and the basemap providers.
	#[context("setting up the exporter")]
	pub fn from_config(config: &Config) -> Result<Exporter> {
		let features = config.overpass.build_client()?;
		let tiles = HttpTileFetcher::new(config.basemap.providers()?, &config.overpass.user_agent)?;
		let mut exporter = Exporter::new(Arc::new(features), Arc::new(tiles))
			.with_render_options(config.render.to_options()?)
			.with_basemap_limits(config.basemap.max_tiles, config.basemap.max_zoom)
			.with_concurrency(config.overpass.max_concurrent_requests);
		if let Some(temp_dir) = &config.temp_dir {
			exporter = exporter.with_temp_root(temp_dir);
		}
		Ok(exporter)
	}

	pub fn with_render_options(mut self, options: RenderOptions) -> Self {
		self.render_options = options;
		self
	}

	pub fn with_basemap_limits(mut self, max_tiles: usize, max_zoom: u8) -> Self {
		self.max_tiles = max_tiles;
		self.max_zoom = max_zoom;
		self
	}

	pub fn with_temp_root(mut self, temp_root: &Path) -> Self {
		self.temp_root = Some(temp_root.to_path_buf());
		self
	}

	pub fn with_concurrency(mut self, concurrency: usize) -> Self {
		self.concurrency = concurrency.max(1);
		self
	}

	pub async fn run(&self, request: &DownloadRequest) -> Result<ExportArtifact, ExportError> {
		let id = export_id();
		log::info!("export {id}: {request}");

		let mut names = request.layers.clone();
		sort_layers(&mut names);
		let mut seen = HashSet::new();
		names.retain(|name| seen.insert(name.clone()));

		let layers = self.fetch_layers(&names, &request.area).await;
		log::debug!(
			"export {id}: {} of {} layers have data",
			layers.len(),
			names.len()
		);

		if layers.is_empty() && !request.basemap {
			return Err(ExportError::NoData);
		}

		let artifact = if request.format.is_image() {
			self.render_image(&id, request, layers).await?
		} else {
			self.write_vectors(&id, request.format, layers).await?
		};
		log::info!("export {id}: {} ({} bytes)", artifact.filename, artifact.data.len());
		Ok(artifact)
	}

	/// Fetches and cleans the layers in the given order. Unknown, failing and empty layers are
	/// left out.
	async fn fetch_layers(&self, names: &[String], area: &AreaDescriptor) -> Vec<LayerData> {
		stream::iter(names)
			.map(|name| async move {
				let Some(layer) = Layer::get(name) else {
					log::warn!("skipping unknown layer '{name}'");
					return None;
				};
				match self.features.fetch(layer, area).await {
					Ok(response) => {
						let data = LayerData::clean(layer, assemble_features(&response));
						if data.is_empty() {
							log::debug!("layer '{name}' has no features in {area}");
							None
						} else {
							Some(data)
						}
					}
					Err(err) => {
						log::warn!("layer '{name}' failed: {}", format_error_chain(&err));
						None
					}
				}
			})
			.buffered(self.concurrency)
			.filter_map(|data| async move { data })
			.collect()
			.await
	}

	#[context("rendering {} image", request.format)]
	async fn render_image(&self, id: &str, request: &DownloadRequest, layers: Vec<LayerData>) -> Result<ExportArtifact> {
		let mut scene = MapScene::new(request.area.mercator_extent(), self.render_options);
		scene.clip_circle = request.area.clip_circle();
		scene.layers = layers;

		if request.basemap {
			match load_tiles(
				self.tiles.as_ref(),
				request.basemap_style,
				&scene.extent,
				self.max_zoom,
				self.max_tiles,
			)
			.await
			{
				Ok(tiles) => scene.basemap = tiles,
				Err(err) => log::warn!("rendering without basemap: {}", format_error_chain(&err)),
			}
		}

		let format = request.format;
		let data = tokio::task::spawn_blocking(move || render(&scene, format))
			.await
			.context("render task panicked")??;

		Ok(ExportArtifact {
			filename: format!("map_{id}.{}", format.extension()),
			mime: format.mime(),
			data,
		})
	}

	#[context("exporting layers as {}", format)]
	async fn write_vectors(&self, id: &str, format: ExportFormat, layers: Vec<LayerData>) -> Result<ExportArtifact> {
		let temp_root = self.temp_root.clone();
		let prefix = format!("export_{id}_");
		let data = tokio::task::spawn_blocking(move || -> Result<Vec<u8>> {
			let dir = create_work_dir(temp_root.as_deref(), &prefix)?;
			for layer in &layers {
				write_layer(layer, format, dir.path())?;
			}
			zip_directory(dir.path())
		})
		.await
		.context("export task panicked")??;

		Ok(ExportArtifact {
			filename: format!("MapForge_Export_{id}.zip"),
			mime: format.mime(),
			data,
		})
	}
}

/// First 6 hex digits of a random UUID.
fn export_id() -> String {
	Uuid::new_v4().simple().to_string()[..6].to_string()
}

/// Removed again when the returned handle is dropped.
fn create_work_dir(temp_root: Option<&Path>, prefix: &str) -> Result<tempfile::TempDir> {
	let mut builder = tempfile::Builder::new();
	builder.prefix(prefix);
	match temp_root {
		Some(root) => {
			fs::create_dir_all(root).with_context(|| format!("creating temp root {root:?}"))?;
			Ok(builder.tempdir_in(root)?)
		}
		None => Ok(builder.tempdir()?),
	}
}

/// Shapefiles get a folder per layer, the other formats a single file.
fn write_layer(layer: &LayerData, format: ExportFormat, dir: &Path) -> Result<()> {
	let name = layer.name();
	match format {
		ExportFormat::GeoJson => fs::write(dir.join(format!("{name}.geojson")), write_geojson(layer)?)?,
		ExportFormat::Shapefile => {
			let folder = dir.join(name);
			fs::create_dir_all(&folder)?;
			write_shapefile(layer, &folder)?;
		}
		ExportFormat::GeoPackage => write_geopackage(layer, &dir.join(format!("{name}.gpkg")))?,
		other => bail!("{other} is not a vector format"),
	}
	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::export::NO_DATA_MESSAGE;
	use anyhow::anyhow;
	use assert_fs::TempDir;
	use async_trait::async_trait;
	use mapforge_core::{BasemapStyle, OverpassResponse};
	use pretty_assertions::assert_eq;
	use std::{io::Cursor, sync::Mutex};
	use zip::ZipArchive;

	const WATER: &str = r#"{"elements":[
		{"type":"way","id":1,"tags":{"natural":"water","name":"See"},
		 "geometry":[{"lat":52.50,"lon":13.38},{"lat":52.50,"lon":13.40},{"lat":52.51,"lon":13.40},{"lat":52.50,"lon":13.38}]}
	]}"#;
	const STREETS: &str = r#"{"elements":[
		{"type":"way","id":2,"tags":{"highway":"residential","name":"Hauptstraße"},
		 "geometry":[{"lat":52.505,"lon":13.38},{"lat":52.505,"lon":13.42}]}
	]}"#;

	/// Answers from fixtures and records the order of the calls.
	#[derive(Debug, Default)]
	struct FixtureSource {
		calls: Mutex<Vec<String>>,
	}

	#[async_trait]
	impl FeatureSource for FixtureSource {
		async fn fetch(&self, layer: &Layer, _area: &AreaDescriptor) -> Result<OverpassResponse> {
			self.calls.lock().unwrap().push(layer.name.to_string());
			match layer.name {
				"water" => OverpassResponse::parse(WATER.as_bytes()),
				"streets" => OverpassResponse::parse(STREETS.as_bytes()),
				"power" => Err(anyhow!("Overpass answered 504 Gateway Timeout")),
				_ => OverpassResponse::parse(br#"{"elements":[]}"#),
			}
		}
	}

	#[derive(Debug)]
	struct OfflineTiles;

	#[async_trait]
	impl TileFetcher for OfflineTiles {
		async fn fetch_tile(&self, _style: BasemapStyle, _z: u8, _x: u32, _y: u32) -> Result<Vec<u8>> {
			Err(anyhow!("offline"))
		}
	}

	fn exporter() -> (Exporter, Arc<FixtureSource>) {
		let source = Arc::new(FixtureSource::default());
		let options = RenderOptions {
			size_inches: 1.0,
			dpi: 72,
			..Default::default()
		};
		let exporter = Exporter::new(source.clone(), Arc::new(OfflineTiles)).with_render_options(options);
		(exporter, source)
	}

	fn request(layers: &str, format: ExportFormat) -> DownloadRequest {
		DownloadRequest::new(
			mapforge_core::parse_layer_list(layers),
			AreaDescriptor::new_bbox(52.52, 52.50, 13.42, 13.38).unwrap(),
			format,
		)
	}

	fn archive_names(artifact: &ExportArtifact) -> Vec<String> {
		let archive = ZipArchive::new(Cursor::new(artifact.data.clone())).unwrap();
		let mut names: Vec<String> = archive.file_names().map(String::from).collect();
		names.sort();
		names
	}

	#[tokio::test]
	async fn geojson_archive() {
		let (exporter, source) = exporter();
		let artifact = exporter.run(&request("streets,nonsense,water,power,parks", ExportFormat::GeoJson)).await.unwrap();

		assert!(artifact.filename.starts_with("MapForge_Export_"));
		assert!(artifact.filename.ends_with(".zip"));
		assert_eq!(artifact.filename.len(), "MapForge_Export_123456.zip".len());
		assert_eq!(artifact.mime, "application/zip");
		assert_eq!(archive_names(&artifact), ["streets.geojson", "water.geojson"]);
		// sorted by draw order, unknown layers are never fetched
		assert_eq!(*source.calls.lock().unwrap(), ["water", "parks", "streets", "power"]);
	}

	#[tokio::test]
	async fn shapefile_archive_uses_folders() {
		let (exporter, _) = exporter();
		let artifact = exporter.run(&request("water", ExportFormat::Shapefile)).await.unwrap();
		assert_eq!(
			archive_names(&artifact),
			[
				"water/",
				"water/water.cpg",
				"water/water.dbf",
				"water/water.prj",
				"water/water.shp",
				"water/water.shx"
			]
		);
	}

	#[tokio::test]
	async fn geopackage_archive() {
		let (exporter, _) = exporter();
		let artifact = exporter.run(&request("water,streets", ExportFormat::GeoPackage)).await.unwrap();
		assert_eq!(archive_names(&artifact), ["streets.gpkg", "water.gpkg"]);
	}

	#[tokio::test]
	async fn temp_dirs_are_removed() {
		let root = TempDir::new().unwrap();
		let (exporter, _) = exporter();
		let exporter = exporter.with_temp_root(root.path());
		exporter.run(&request("water", ExportFormat::GeoJson)).await.unwrap();
		assert_eq!(fs::read_dir(root.path()).unwrap().count(), 0);
	}

	#[tokio::test]
	async fn png_without_basemap_tiles() {
		let (exporter, _) = exporter();
		let mut request = request("water,streets", ExportFormat::Png);
		request.basemap = true;
		let artifact = exporter.run(&request).await.unwrap();

		assert!(artifact.filename.starts_with("map_"));
		assert!(artifact.filename.ends_with(".png"));
		assert_eq!(artifact.mime, "image/png");
		assert!(artifact.data.starts_with(b"\x89PNG"));
	}

	#[tokio::test]
	async fn svg_and_pdf() {
		let (exporter, _) = exporter();
		let svg = exporter.run(&request("water", ExportFormat::Svg)).await.unwrap();
		assert_eq!(svg.mime, "image/svg+xml");
		assert!(String::from_utf8(svg.data).unwrap().contains("layer-water"));

		let pdf = exporter.run(&request("water", ExportFormat::Pdf)).await.unwrap();
		assert_eq!(pdf.mime, "application/pdf");
		assert!(pdf.data.starts_with(b"%PDF-"));
	}

	#[tokio::test]
	async fn no_data() {
		let (exporter, _) = exporter();
		let err = exporter.run(&request("parks,power,unknown", ExportFormat::Png)).await.unwrap_err();
		assert!(matches!(err, ExportError::NoData));
		assert_eq!(err.detail(), NO_DATA_MESSAGE);

		let err = exporter.run(&request("", ExportFormat::GeoJson)).await.unwrap_err();
		assert_eq!(err.status_code(), 404);
	}

	#[tokio::test]
	async fn basemap_alone_is_enough() {
		let (exporter, _) = exporter();
		let mut request = request("parks", ExportFormat::Svg);
		request.basemap = true;
		let artifact = exporter.run(&request).await.unwrap();
		assert!(String::from_utf8(artifact.data).unwrap().starts_with("<svg"));
	}

	#[test]
	fn export_ids_are_short_hex() {
		let id = export_id();
		assert_eq!(id.len(), 6);
		assert!(id.chars().all(|c| c.is_ascii_hexdigit()));
	}
}
