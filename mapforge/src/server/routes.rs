//! Router composition. Handlers live in `handlers`, CORS in `cors`.

use super::{
	cors::build_cors_layer,
	handlers::{AppState, download, favicon, index, serve_static, status},
};
use crate::config::CorsConfig;
use anyhow::{Context, Result};
use axum::{
	Router,
	body::Body,
	http::{HeaderName, HeaderValue},
	middleware,
	response::Response,
	routing::get,
};
use mapforge_derive::context;
use std::{collections::HashMap, sync::Arc};

pub fn add_routes(state: AppState) -> Router {
	Router::new()
		.route("/", get(index))
		.route("/favicon.ico", get(favicon))
		.route("/download", get(download))
		.route("/status", get(status))
		.fallback(get(serve_static))
		.with_state(state)
}

#[context("adding CORS layer")]
pub fn add_cors(app: Router, cors: &CorsConfig) -> Result<Router> {
	Ok(app.layer(build_cors_layer(&cors.allowed_origins, cors.max_age_seconds())?))
}

/// Sets the configured headers on every response, replacing existing values.
#[context("adding extra response headers")]
pub fn add_extra_headers(app: Router, headers: &HashMap<String, String>) -> Result<Router> {
	if headers.is_empty() {
		return Ok(app);
	}

	let mut parsed: Vec<(HeaderName, HeaderValue)> = Vec::with_capacity(headers.len());
	for (name, value) in headers {
		parsed.push((
			HeaderName::try_from(name.as_str()).with_context(|| format!("invalid header name '{name}'"))?,
			HeaderValue::try_from(value.as_str()).with_context(|| format!("invalid value for header '{name}'"))?,
		));
	}
	let parsed = Arc::new(parsed);

	Ok(app.layer(middleware::map_response(move |mut response: Response<Body>| {
		let headers = Arc::clone(&parsed);
		async move {
			for (name, value) in headers.iter() {
				response.headers_mut().insert(name.clone(), value.clone());
			}
			response
		}
	})))
}
