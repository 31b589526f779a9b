//! Packs an export folder into a zip archive.

use anyhow::{Result, ensure};
use mapforge_derive::context;
use std::{
	fs,
	io::{Cursor, Write},
	path::{Path, PathBuf},
};
use zip::{CompressionMethod, ZipWriter, write::SimpleFileOptions};

/// Zips everything below `dir`. Entry names are relative to `dir`, use `/` as separator and are
/// sorted; folders get their own entries.
#[context("zipping directory {:?}", dir)]
pub fn zip_directory(dir: &Path) -> Result<Vec<u8>> {
	ensure!(dir.is_dir(), "{dir:?} is not a directory");

	let mut entries: Vec<(String, PathBuf)> = Vec::new();
	collect_entries(dir, dir, &mut entries)?;
	entries.sort_by(|a, b| a.0.cmp(&b.0));

	let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
	let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
	for (name, path) in &entries {
		if path.is_dir() {
			writer.add_directory(name.as_str(), options)?;
		} else {
			writer.start_file(name.as_str(), options)?;
			writer.write_all(&fs::read(path)?)?;
		}
	}
	Ok(writer.finish()?.into_inner())
}

fn collect_entries(root: &Path, dir: &Path, entries: &mut Vec<(String, PathBuf)>) -> Result<()> {
	for entry in fs::read_dir(dir)? {
		let path = entry?.path();
		let relative: Vec<String> = path
			.strip_prefix(root)?
			.components()
			.map(|c| c.as_os_str().to_string_lossy().into_owned())
			.collect();
		let mut name = relative.join("/");
		if path.is_dir() {
			name.push('/');
			entries.push((name, path.clone()));
			collect_entries(root, &path, entries)?;
		} else {
			entries.push((name, path));
		}
	}
	Ok(())
}
