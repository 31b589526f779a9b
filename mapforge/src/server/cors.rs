//! CORS layer built from the `allowed_origins` patterns of the config.
//!
//! - `"*"`                      allows every origin
//! - `"*.example.com"`          suffix match
//! - `"https://dev-*"`          prefix match
//! - `"/^https://(a|b)\.org$/"` regular expression between slashes
//! - anything else              exact match

use anyhow::{Context, Result};
use axum::http::{HeaderValue, request::Parts};
use regex::Regex;
use std::time::Duration;
use tower_http::cors::{AllowOrigin, CorsLayer};

#[derive(Clone, Debug)]
enum OriginPattern {
	Any,
	Suffix(String),
	Prefix(String),
	Regex(Regex),
	Exact(String),
}

impl OriginPattern {
	fn parse(pattern: &str) -> Result<OriginPattern> {
		let pattern = pattern.trim();
		Ok(if pattern == "*" {
			OriginPattern::Any
		} else if pattern.len() > 2 && pattern.starts_with('/') && pattern.ends_with('/') {
			let source = &pattern[1..pattern.len() - 1];
			OriginPattern::Regex(Regex::new(source).with_context(|| format!("invalid origin regex '{source}'"))?)
		} else if let Some(suffix) = pattern.strip_prefix('*').filter(|s| !s.contains('*')) {
			OriginPattern::Suffix(suffix.to_string())
		} else if let Some(prefix) = pattern.strip_suffix('*').filter(|s| !s.contains('*')) {
			OriginPattern::Prefix(prefix.to_string())
		} else {
			OriginPattern::Exact(pattern.to_string())
		})
	}

	fn matches(&self, origin: &str) -> bool {
		match self {
			OriginPattern::Any => true,
			OriginPattern::Suffix(suffix) => origin.ends_with(suffix.as_str()),
			OriginPattern::Prefix(prefix) => origin.starts_with(prefix.as_str()),
			OriginPattern::Regex(regex) => regex.is_match(origin),
			OriginPattern::Exact(exact) => origin == exact,
		}
	}
}

pub fn build_cors_layer(allowed_origins: &[String], max_age_seconds: u64) -> Result<CorsLayer> {
	let patterns = allowed_origins
		.iter()
		.map(|p| OriginPattern::parse(p))
		.collect::<Result<Vec<_>>>()?;

	Ok(CorsLayer::new()
		.allow_origin(AllowOrigin::predicate(move |origin: &HeaderValue, _: &Parts| {
			let origin = origin.to_str().unwrap_or_default();
			patterns.iter().any(|p| p.matches(origin))
		}))
		.max_age(Duration::from_secs(max_age_seconds)))
}
