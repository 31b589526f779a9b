use anyhow::{Context, Result, ensure};
use mapforge::{
	config::Config,
	core::{AreaDescriptor, BasemapStyle, ExportFormat, parse_layer_list},
	export::{DownloadRequest, Exporter},
};
use std::{fs, path::PathBuf};

#[derive(clap::Args, Debug)]
#[command(arg_required_else_help = true, disable_version_flag = true, verbatim_doc_comment)]
pub struct Subcommand {
	/// Comma separated list of layers, e.g. "water,parks,streets".
	/// Known layers: water, parks, schools, medical, buildings, railways, streets, power
	#[arg(short, long, value_name = "LAYERS", display_order = 0, verbatim_doc_comment)]
	pub layers: String,

	/// Bounding box as "north,south,east,west" in degrees.
	#[arg(
		long,
		value_name = "N,S,E,W",
		allow_hyphen_values = true,
		conflicts_with_all = ["circle", "polygon"],
		required_unless_present_any = ["circle", "polygon"],
		display_order = 1
	)]
	pub bbox: Option<String>,

	/// Circle as "lat,lon,radius" with the radius in meters.
	#[arg(
		long,
		value_name = "LAT,LON,RADIUS",
		allow_hyphen_values = true,
		conflicts_with = "polygon",
		required_unless_present_any = ["bbox", "polygon"],
		display_order = 1
	)]
	pub circle: Option<String>,

	/// Polygon as JSON array of [lat, lon] pairs.
	#[arg(
		long,
		value_name = "JSON",
		allow_hyphen_values = true,
		required_unless_present_any = ["bbox", "circle"],
		display_order = 1
	)]
	pub polygon: Option<String>,

	/// Output format: png, svg, pdf, geojson, shp or gpkg.
	#[arg(short, long = "format", value_name = "FMT", default_value = "geojson", display_order = 2)]
	pub format: String,

	/// Draw the map on top of a basemap (image formats only).
	#[arg(long, display_order = 3)]
	pub basemap: bool,

	/// Basemap style: osm, satellite or dark.
	#[arg(long, value_name = "STYLE", default_value = "osm", display_order = 3)]
	pub basemap_style: String,

	/// Path to a configuration file (YAML format) with Overpass, rendering and basemap settings.
	#[arg(short = 'c', long, value_name = "FILE", display_order = 4)]
	pub config: Option<PathBuf>,

	/// Overpass API endpoint, overrides the configuration file.
	#[arg(long, value_name = "URL", display_order = 4)]
	pub overpass_url: Option<String>,

	/// Output file. If it is a directory, the generated filename is used inside it.
	#[arg(short, long, value_name = "OUTPUT", display_order = 0)]
	pub output: PathBuf,
}

#[tokio::main]
pub async fn run(arguments: &Subcommand) -> Result<()> {
	let mut config = match &arguments.config {
		Some(path) => Config::from_path(path)?,
		None => Config::default(),
	};
	config.overpass.override_optional_url(&arguments.overpass_url);

	let request = build_request(arguments)?;
	log::info!("export {request}");

	let exporter = Exporter::from_config(&config)?;
	let artifact = exporter
		.run(&request)
		.await
		.map_err(|err| anyhow::Error::from(err).context("export failed"))?;

	let path = if arguments.output.is_dir() {
		arguments.output.join(&artifact.filename)
	} else {
		arguments.output.clone()
	};
	fs::write(&path, &artifact.data).with_context(|| format!("writing {path:?}"))?;
	eprintln!("wrote {} bytes to {path:?}", artifact.data.len());

	Ok(())
}

fn build_request(arguments: &Subcommand) -> Result<DownloadRequest> {
	let area = if let Some(bbox) = &arguments.bbox {
		let [north, south, east, west] = parse_numbers::<4>(bbox, "--bbox")?;
		AreaDescriptor::new_bbox(north, south, east, west)?
	} else if let Some(circle) = &arguments.circle {
		let [lat, lon, radius] = parse_numbers::<3>(circle, "--circle")?;
		AreaDescriptor::new_circle(lat, lon, radius)?
	} else if let Some(polygon) = &arguments.polygon {
		AreaDescriptor::from_poly_json(polygon)?
	} else {
		anyhow::bail!("one of --bbox, --circle or --polygon is required");
	};

	let format: ExportFormat = arguments.format.parse()?;
	let mut request = DownloadRequest::new(parse_layer_list(&arguments.layers), area, format);
	request.basemap = arguments.basemap;
	request.basemap_style = BasemapStyle::parse_lenient(&arguments.basemap_style);
	Ok(request)
}

fn parse_numbers<const N: usize>(text: &str, flag: &str) -> Result<[f64; N]> {
	let numbers = text
		.split(',')
		.map(|part| {
			let part = part.trim();
			part.parse::<f64>().with_context(|| format!("invalid number '{part}' in {flag}"))
		})
		.collect::<Result<Vec<f64>>>()?;
	ensure!(numbers.len() == N, "{flag} expects {N} comma separated numbers, got {}", numbers.len());
	let mut result = [0.0; N];
	result.copy_from_slice(&numbers);
	Ok(result)
}
