use super::ExportError;
use anyhow::{Context, Result, anyhow};
use mapforge_core::{AreaDescriptor, AreaParams, AreaType, BasemapStyle, ExportFormat, parse_layer_list};
use serde::Deserialize;
use std::fmt::{self, Display};

/// Raw query parameters of `/download`. Values stay strings so that parse errors become a JSON
/// 400 answer instead of a generic extractor rejection.
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
pub struct DownloadParams {
	pub layers: Option<String>,
	#[serde(rename = "type")]
	pub area_type: Option<String>,
	pub fmt: Option<String>,
	pub north: Option<String>,
	pub south: Option<String>,
	pub east: Option<String>,
	pub west: Option<String>,
	pub lat: Option<String>,
	pub lon: Option<String>,
	pub radius: Option<String>,
	pub poly_coords: Option<String>,
	pub basemap: Option<String>,
	pub basemap_style: Option<String>,
}

/// A validated export request.
#[derive(Clone, Debug, PartialEq)]
pub struct DownloadRequest {
	/// In the order they were requested; the exporter sorts them.
	pub layers: Vec<String>,
	pub area: AreaDescriptor,
	pub format: ExportFormat,
	pub basemap: bool,
	pub basemap_style: BasemapStyle,
}

impl DownloadRequest {
	pub fn new(layers: Vec<String>, area: AreaDescriptor, format: ExportFormat) -> DownloadRequest {
		DownloadRequest {
			layers,
			area,
			format,
			basemap: false,
			basemap_style: BasemapStyle::default(),
		}
	}

	pub fn from_params(params: &DownloadParams) -> Result<DownloadRequest, ExportError> {
		parse_params(params).map_err(|err| ExportError::bad_request(&err))
	}
}

impl Display for DownloadRequest {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "[{}] in {} as {}", self.layers.join(","), self.area, self.format)?;
		if self.basemap && self.format.is_image() {
			write!(f, " on {} basemap", self.basemap_style)?;
		}
		Ok(())
	}
}

fn parse_params(params: &DownloadParams) -> Result<DownloadRequest> {
	let area_type = match non_empty(&params.area_type) {
		Some(value) => value.parse::<AreaType>()?,
		None => AreaType::default(),
	};

	let area_params = AreaParams {
		area_type,
		north: parse_number("north", &params.north)?,
		south: parse_number("south", &params.south)?,
		east: parse_number("east", &params.east)?,
		west: parse_number("west", &params.west)?,
		lat: parse_number("lat", &params.lat)?,
		lon: parse_number("lon", &params.lon)?,
		radius: parse_number("radius", &params.radius)?,
		poly_coords: params.poly_coords.clone(),
	};
	let area = AreaDescriptor::from_params(&area_params).context("invalid area")?;

	let format = match non_empty(&params.fmt) {
		Some(value) => value.parse::<ExportFormat>()?,
		None => ExportFormat::default(),
	};

	let basemap = match non_empty(&params.basemap) {
		Some(value) => parse_bool("basemap", value)?,
		None => false,
	};

	let basemap_style = non_empty(&params.basemap_style).map_or_else(BasemapStyle::default, BasemapStyle::parse_lenient);

	Ok(DownloadRequest {
		layers: parse_layer_list(params.layers.as_deref().unwrap_or_default()),
		area,
		format,
		basemap,
		basemap_style,
	})
}

fn non_empty(value: &Option<String>) -> Option<&str> {
	value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// Missing numbers are 0, like in the query defaults of the web frontend.
fn parse_number(name: &str, value: &Option<String>) -> Result<f64> {
	match non_empty(value) {
		None => Ok(0.0),
		Some(text) => {
			let number = text
				.parse::<f64>()
				.map_err(|_| anyhow!("invalid number '{text}' for parameter '{name}'"))?;
			if number.is_finite() {
				Ok(number)
			} else {
				Err(anyhow!("parameter '{name}' must be a finite number"))
			}
		}
	}
}

fn parse_bool(name: &str, value: &str) -> Result<bool> {
	match value.to_ascii_lowercase().as_str() {
		"true" | "t" | "yes" | "y" | "on" | "1" => Ok(true),
		"false" | "f" | "no" | "n" | "off" | "0" => Ok(false),
		_ => Err(anyhow!("invalid boolean '{value}' for parameter '{name}'")),
	}
}
