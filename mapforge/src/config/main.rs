use super::{BasemapConfig, CorsConfig, OverpassConfig, RenderConfig, ServerConfig};
use anyhow::Result;
use mapforge_derive::{ConfigDoc, context};
use serde::Deserialize;
use std::{
	collections::HashMap,
	fs::File,
	io::{BufReader, Read},
	path::{Path, PathBuf},
};

#[derive(Default, Debug, Clone, Deserialize, PartialEq, ConfigDoc)]
#[serde(deny_unknown_fields)]
pub struct Config {
	/// HTTP server configuration
	#[serde(default)]
	pub server: ServerConfig,

	/// Cross-Origin Resource Sharing (CORS) settings
	#[serde(default)]
	pub cors: CorsConfig,

	/// Extra response headers added to every HTTP response.
	#[serde(default)]
	#[config_demo(
		r#"
  Cache-Control: no-store
  X-Frame-Options: DENY"#
	)]
	pub extra_response_headers: HashMap<String, String>,

	/// Folder with `index.html`, `favicon.ico` and the frontend assets.
	/// Defaults to the current directory
	#[serde(default)]
	#[config_demo("./frontend")]
	pub static_folder: Option<PathBuf>,

	/// Feature API
	#[serde(default)]
	pub overpass: OverpassConfig,

	/// Image exports
	#[serde(default)]
	pub render: RenderConfig,

	/// Basemap tiles
	#[serde(default)]
	pub basemap: BasemapConfig,

	/// Where per-request working directories are created.
	/// Defaults to the system temp directory
	#[serde(default)]
	#[config_demo("/var/tmp/mapforge")]
	pub temp_dir: Option<PathBuf>,
}

impl Config {
	pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
		Ok(serde_yaml_ng::from_reader(reader)?)
	}

	pub fn from_string(text: &str) -> Result<Self> {
		Ok(serde_yaml_ng::from_str(text)?)
	}

	/// Parses the file and resolves relative paths against its folder.
	#[context("reading config file {:?}", path)]
	pub fn from_path(path: &Path) -> Result<Self> {
		let file = File::open(path)?;
		let mut config = Config::from_reader(BufReader::new(file))?;
		config.resolve_paths(path.parent().unwrap_or(Path::new(".")));
		Ok(config)
	}

	pub fn resolve_paths(&mut self, base: &Path) {
		for path in [&mut self.static_folder, &mut self.temp_dir].into_iter().flatten() {
			if path.is_relative() {
				*path = base.join(&*path);
			}
		}
	}

	pub fn static_folder(&self) -> PathBuf {
		self.static_folder.clone().unwrap_or_else(|| PathBuf::from("."))
	}

	pub fn override_optional_static_folder(&mut self, static_folder: &Option<PathBuf>) {
		if static_folder.is_some() {
			self.static_folder = static_folder.clone();
		}
	}
}
