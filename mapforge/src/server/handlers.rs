//! HTTP handlers of the map server.
//!
//! Errors of `/download` are answered as `{"detail": ...}`, errors of the static routes as
//! `{"error": ...}`. CORS headers are left to the `CorsLayer`.

use super::static_folder::{StaticFile, StaticFolder, is_allowed_file};
use crate::export::{DownloadParams, DownloadRequest, ExportArtifact, ExportError, Exporter};
use axum::{
	body::Body,
	extract::{Query, State, rejection::QueryRejection},
	http::{StatusCode, Uri, header},
	response::Response,
};
use percent_encoding::percent_decode_str;
use serde_json::json;
use std::sync::Arc;

#[derive(Clone, Debug)]
pub struct AppState {
	pub exporter: Arc<Exporter>,
	pub static_folder: Arc<StaticFolder>,
}

pub async fn download(
	State(state): State<AppState>,
	query: Result<Query<DownloadParams>, QueryRejection>,
) -> Response<Body> {
	let params = match query {
		Ok(Query(params)) => params,
		Err(rejection) => return error_detail(StatusCode::BAD_REQUEST, &rejection.body_text()),
	};
	log::debug!("handle download request: {params:?}");

	let result = match DownloadRequest::from_params(&params) {
		Ok(request) => state.exporter.run(&request).await,
		Err(err) => Err(err),
	};

	match result {
		Ok(artifact) => ok_artifact(artifact),
		Err(err) => export_error(&err),
	}
}

pub async fn index(State(state): State<AppState>) -> Response<Body> {
	match state.static_folder.get("index.html") {
		Some(file) => ok_file(file),
		None => error_json(StatusCode::NOT_FOUND, "File not found"),
	}
}

pub async fn favicon(State(state): State<AppState>) -> Response<Body> {
	match state.static_folder.get("favicon.ico") {
		Some(file) => ok_file(file),
		None => error_json(StatusCode::NOT_FOUND, "Favicon not found"),
	}
}

/// Catch-all for single files next to `index.html`. The path is percent-decoded before it is checked.
pub async fn serve_static(uri: Uri, State(state): State<AppState>) -> Response<Body> {
	let Ok(path) = percent_decode_str(uri.path()).decode_utf8() else {
		return error_json(StatusCode::NOT_FOUND, "File not found");
	};
	let filename = path.trim_start_matches('/');
	log::debug!("handle static request: {filename}");

	if !is_allowed_file(filename) {
		return error_json(StatusCode::FORBIDDEN, "File type not allowed");
	}
	if filename.contains('/') || filename.contains('\\') {
		return error_json(StatusCode::NOT_FOUND, "File not found");
	}
	match state.static_folder.get(filename) {
		Some(file) => ok_file(file),
		None => error_json(StatusCode::NOT_FOUND, "File not found"),
	}
}

pub async fn status() -> &'static str {
	"ready!"
}

// --- small helpers -----------------------------------------------------------

fn ok_artifact(artifact: ExportArtifact) -> Response<Body> {
	build(
		Response::builder()
			.status(StatusCode::OK)
			.header(header::CONTENT_TYPE, artifact.mime)
			.header(
				header::CONTENT_DISPOSITION,
				format!("attachment; filename=\"{}\"", artifact.filename),
			)
			.body(Body::from(artifact.data)),
	)
}

fn ok_file(file: StaticFile) -> Response<Body> {
	build(
		Response::builder()
			.status(StatusCode::OK)
			.header(header::CONTENT_TYPE, file.mime)
			.body(Body::from(file.data)),
	)
}

fn export_error(err: &ExportError) -> Response<Body> {
	let detail = err.detail();
	match err {
		ExportError::Internal(_) => log::error!("export failed: {detail}"),
		_ => log::info!("export rejected: {detail}"),
	}
	let status = StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
	error_detail(status, &detail)
}

fn error_detail(status: StatusCode, detail: &str) -> Response<Body> {
	json_response(status, &json!({ "detail": detail }))
}

fn error_json(status: StatusCode, message: &str) -> Response<Body> {
	json_response(status, &json!({ "error": message }))
}

fn json_response(status: StatusCode, value: &serde_json::Value) -> Response<Body> {
	build(
		Response::builder()
			.status(status)
			.header(header::CONTENT_TYPE, "application/json")
			.body(Body::from(value.to_string())),
	)
}

fn build(response: Result<Response<Body>, axum::http::Error>) -> Response<Body> {
	response.unwrap_or_else(|err| {
		log::error!("building response failed: {err}");
		let mut response = Response::new(Body::from("Internal Server Error"));
		*response.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
		response
	})
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::export::NO_DATA_MESSAGE;
	use anyhow::anyhow;

	async fn body_text(response: Response<Body>) -> String {
		let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
		String::from_utf8_lossy(&bytes).into_owned()
	}

	#[tokio::test]
	async fn artifact_headers() {
		let response = ok_artifact(ExportArtifact {
			filename: "map_abc123.png".to_string(),
			mime: "image/png",
			data: vec![1, 2, 3],
		});
		assert_eq!(response.status(), 200);
		assert_eq!(response.headers()[header::CONTENT_TYPE], "image/png");
		assert_eq!(
			response.headers()[header::CONTENT_DISPOSITION],
			"attachment; filename=\"map_abc123.png\""
		);
		assert_eq!(
			axum::body::to_bytes(response.into_body(), 10).await.unwrap().as_ref(),
			&[1, 2, 3]
		);
	}

	#[tokio::test]
	async fn export_errors_as_detail() {
		let response = export_error(&ExportError::NoData);
		assert_eq!(response.status(), 404);
		assert_eq!(response.headers()[header::CONTENT_TYPE], "application/json");
		assert_eq!(
			body_text(response).await,
			json!({ "detail": NO_DATA_MESSAGE }).to_string()
		);

		let response = export_error(&ExportError::BadRequest("unknown format 'tiff'".into()));
		assert_eq!(response.status(), 400);

		let response = export_error(&ExportError::Internal(anyhow!("disk full")));
		assert_eq!(response.status(), 500);
		assert_eq!(body_text(response).await, r#"{"detail":"disk full"}"#);
	}
}
