use anyhow::{Result, ensure};
use mapforge_derive::context;
use std::{
	env::current_dir,
	fmt::Debug,
	fs,
	path::{Path, PathBuf},
};

/// Extensions the catch-all route is allowed to deliver.
pub const ALLOWED_EXTENSIONS: [&str; 7] = [".png", ".jpg", ".jpeg", ".svg", ".ico", ".css", ".js"];

/// A local folder with the web frontend.
#[derive(Clone, Debug, PartialEq)]
pub struct StaticFolder {
	folder: PathBuf,
}

/// A file read from the folder.
#[derive(Clone, Debug, PartialEq)]
pub struct StaticFile {
	pub data: Vec<u8>,
	pub mime: String,
}

impl StaticFolder {
	#[context("loading static folder from path: {:?}", path)]
	pub fn new(path: &Path) -> Result<StaticFolder> {
		let folder = current_dir()?.join(path);
		ensure!(folder.exists(), "path {folder:?} does not exist");
		ensure!(folder.is_dir(), "path {folder:?} must be a directory");
		Ok(StaticFolder {
			folder: folder.canonicalize()?,
		})
	}

	pub fn path(&self) -> &Path {
		&self.folder
	}

	/// Reads a file below the folder. Paths leaving the folder are treated as missing.
	pub fn get(&self, relative: &str) -> Option<StaticFile> {
		let relative = relative.trim_start_matches('/');
		if relative.is_empty() {
			return None;
		}
		let path = self.folder.join(relative).canonicalize().ok()?;
		if !path.starts_with(&self.folder) || !path.is_file() {
			return None;
		}
		let data = match fs::read(&path) {
			Ok(data) => data,
			Err(err) => {
				log::warn!("reading static file {path:?} failed: {err}");
				return None;
			}
		};
		Some(StaticFile {
			data,
			mime: guess_mime(&path),
		})
	}
}

pub fn is_allowed_file(filename: &str) -> bool {
	let filename = filename.to_ascii_lowercase();
	ALLOWED_EXTENSIONS.iter().any(|ext| filename.ends_with(ext))
}

pub fn guess_mime(path: &Path) -> String {
	let mime = mime_guess::from_path(path).first_or_octet_stream().essence_str().to_owned();
	if mime.starts_with("text/") {
		format!("{mime}; charset=utf-8")
	} else {
		mime
	}
}
