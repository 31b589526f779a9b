use anyhow::{Result, ensure};
use mapforge_core::overpass::{DEFAULT_OVERPASS_URL, DEFAULT_TIMEOUT_SECONDS, OverpassClient};
use mapforge_derive::{ConfigDoc, context};
use serde::Deserialize;

pub const DEFAULT_MAX_CONCURRENT_REQUESTS: usize = 2;

pub fn default_user_agent() -> String {
	format!("mapforge/{}", env!("CARGO_PKG_VERSION"))
}

#[derive(Debug, Clone, Deserialize, PartialEq, ConfigDoc)]
#[serde(deny_unknown_fields)]
pub struct OverpassConfig {
	/// Overpass API interpreter endpoint
	#[serde(default = "default_url")]
	#[config_demo("https://overpass-api.de/api/interpreter")]
	pub url: String,

	/// Server side query timeout in seconds
	#[serde(default = "default_timeout_seconds")]
	#[config_demo("180")]
	pub timeout_seconds: u64,

	/// How many layers of one export are fetched at the same time
	#[serde(default = "default_max_concurrent_requests")]
	#[config_demo("2")]
	pub max_concurrent_requests: usize,

	/// User agent sent to Overpass and to the basemap tile servers
	#[serde(default = "default_user_agent")]
	#[config_demo("mapforge")]
	pub user_agent: String,
}

fn default_url() -> String {
	DEFAULT_OVERPASS_URL.to_string()
}

fn default_timeout_seconds() -> u64 {
	DEFAULT_TIMEOUT_SECONDS
}

fn default_max_concurrent_requests() -> usize {
	DEFAULT_MAX_CONCURRENT_REQUESTS
}

impl Default for OverpassConfig {
	fn default() -> Self {
		Self {
			url: default_url(),
			timeout_seconds: default_timeout_seconds(),
			max_concurrent_requests: default_max_concurrent_requests(),
			user_agent: default_user_agent(),
		}
	}
}

impl OverpassConfig {
	pub fn override_optional_url(&mut self, url: &Option<String>) {
		if let Some(url) = url {
			self.url = url.clone();
		}
	}

	#[context("creating Overpass client from config")]
	pub fn build_client(&self) -> Result<OverpassClient> {
		ensure!(self.timeout_seconds > 0, "overpass.timeout_seconds must be positive");
		ensure!(
			self.max_concurrent_requests > 0,
			"overpass.max_concurrent_requests must be positive"
		);
		OverpassClient::new(&self.url, self.timeout_seconds, &self.user_agent)
	}
}
