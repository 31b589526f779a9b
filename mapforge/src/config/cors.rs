//! Which browser origins may call the download endpoint.
//!
//! ```yaml
//! cors:
//!   allowed_origins:
//!     - "https://maps.example.org"
//!     - "*.example.net"
//!   max_age_seconds: 86400
//! ```

use mapforge_derive::ConfigDoc;
use serde::Deserialize;

pub const DEFAULT_MAX_AGE_SECONDS: u64 = 86400;

#[derive(Debug, Clone, Deserialize, PartialEq, ConfigDoc)]
#[serde(deny_unknown_fields)]
pub struct CorsConfig {
	/// Allowed origins for CORS requests. Defaults to `["*"]`.
	/// Supports:
	/// - `*` to allow all origins
	/// - exact origins like `https://example.com`
	/// - globs at the start like `*.example.com`
	/// - globs at the end like `https://dev-*`
	/// - regular expressions enclosed in slashes like `/example\..*$/`
	#[serde(default = "default_allowed_origins")]
	#[config_demo(
		r#"
    - "https://maps.example.org"
    - "*.example.net""#
	)]
	pub allowed_origins: Vec<String>,

	/// How long browsers may cache preflight responses. Defaults to 86400 (1 day)
	#[serde(default)]
	#[config_demo("86400")]
	pub max_age_seconds: Option<u64>,
}

fn default_allowed_origins() -> Vec<String> {
	vec!["*".to_string()]
}

impl Default for CorsConfig {
	fn default() -> Self {
		Self {
			allowed_origins: default_allowed_origins(),
			max_age_seconds: None,
		}
	}
}

impl CorsConfig {
	pub fn max_age_seconds(&self) -> u64 {
		self.max_age_seconds.unwrap_or(DEFAULT_MAX_AGE_SECONDS)
	}
}
