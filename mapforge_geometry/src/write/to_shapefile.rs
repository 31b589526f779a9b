use super::{WGS84_WKT, to_multi_line_string, to_multi_polygon};
use crate::layer_data::{LayerData, LayerFeature};
use anyhow::{Result, anyhow};
use mapforge_derive::context;
use shapefile::{
	Point, Polygon, PolygonRing, Polyline, Writer,
	dbase::{FieldName, FieldValue, Record, TableWriterBuilder},
};
use std::{collections::HashSet, fs, path::Path};

/// dBase allows at most this many fields per table.
pub const MAX_FIELDS: usize = 254;
/// Longest character value a dBase field can hold, in bytes.
pub const MAX_VALUE_LEN: usize = 254;
const MAX_FIELD_NAME_LEN: usize = 10;

/// Writes `<layer>.shp`, `.shx`, `.dbf`, `.prj` and `.cpg` into `dir`.
#[context("writing layer '{}' as shapefile to {:?}", data.name(), dir)]
pub fn write_shapefile(data: &LayerData, dir: &Path) -> Result<()> {
	fs::create_dir_all(dir)?;
	let base = dir.join(data.name());

	let mut columns = data.columns.clone();
	if columns.len() > MAX_FIELDS {
		log::warn!(
			"layer '{}' has {} attributes, only the first {MAX_FIELDS} are kept in the shapefile",
			data.name(),
			columns.len()
		);
		columns.truncate(MAX_FIELDS);
	}
	let field_names = dbase_field_names(&columns);

	let mut table = TableWriterBuilder::new();
	for (index, name) in field_names.iter().enumerate() {
		let width = data
			.features
			.iter()
			.map(|f| truncate(&f.properties[index], MAX_VALUE_LEN).len())
			.max()
			.unwrap_or(0)
			.clamp(1, MAX_VALUE_LEN);
		let field_name =
			FieldName::try_from(name.as_str()).map_err(|err| anyhow!("invalid dBase field name '{name}': {err:?}"))?;
		table = table.add_character_field(field_name, width as u8);
	}

	let mut writer = Writer::from_path(base.with_extension("shp"), table)?;
	let mut written = 0usize;
	for feature in &data.features {
		let record = to_record(feature, &field_names);
		if data.layer.is_line() {
			let Some(shape) = to_polyline(feature) else { continue };
			writer.write_shape_and_record(&shape, &record)?;
		} else {
			let Some(shape) = to_polygon(feature) else { continue };
			writer.write_shape_and_record(&shape, &record)?;
		}
		written += 1;
	}
	drop(writer);

	fs::write(base.with_extension("prj"), WGS84_WKT)?;
	fs::write(base.with_extension("cpg"), "UTF-8")?;

	log::debug!("wrote {written} shapes of layer '{}'", data.name());
	Ok(())
}

fn to_record(feature: &LayerFeature, field_names: &[String]) -> Record {
	let mut record = Record::default();
	for (name, value) in field_names.iter().zip(&feature.properties) {
		let value = truncate(value, MAX_VALUE_LEN);
		record.insert(name.clone(), FieldValue::Character(Some(value.to_string())));
	}
	record
}

fn to_points(coords: &geo::LineString<f64>) -> Vec<Point> {
	coords.coords().map(|c| Point::new(c.x, c.y)).collect()
}

fn to_polygon(feature: &LayerFeature) -> Option<Polygon> {
	let multi = to_multi_polygon(&feature.geometry)?;
	let mut rings = Vec::new();
	for polygon in &multi.0 {
		if polygon.exterior().0.len() < 4 {
			continue;
		}
		rings.push(PolygonRing::Outer(to_points(polygon.exterior())));
		for interior in polygon.interiors().iter().filter(|r| r.0.len() >= 4) {
			rings.push(PolygonRing::Inner(to_points(interior)));
		}
	}
	(!rings.is_empty()).then(|| Polygon::with_rings(rings))
}

fn to_polyline(feature: &LayerFeature) -> Option<Polyline> {
	let multi = to_multi_line_string(&feature.geometry)?;
	let parts: Vec<Vec<Point>> = multi.0.iter().filter(|l| l.0.len() >= 2).map(to_points).collect();
	(!parts.is_empty()).then(|| Polyline::with_parts(parts))
}

/// Cuts `value` to at most `max_len` bytes without splitting a character.
pub fn truncate(value: &str, max_len: usize) -> &str {
	if value.len() <= max_len {
		return value;
	}
	let mut end = max_len;
	while !value.is_char_boundary(end) {
		end -= 1;
	}
	&value[..end]
}

/// Turns column names into unique dBase field names of at most 10 ASCII characters.
pub fn dbase_field_names(columns: &[String]) -> Vec<String> {
	let mut taken: HashSet<String> = HashSet::new();
	columns
		.iter()
		.map(|column| {
			let mut base: String = column
				.chars()
				.map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
				.collect();
			if base.is_empty() {
				base = String::from("field");
			}

			let mut name = truncate(&base, MAX_FIELD_NAME_LEN).to_string();
			let mut counter = 1;
			while taken.contains(&name.to_ascii_lowercase()) {
				let suffix = format!("_{counter}");
				name = format!("{}{suffix}", truncate(&base, MAX_FIELD_NAME_LEN - suffix.len()));
				counter += 1;
			}
			taken.insert(name.to_ascii_lowercase());
			name
		})
		.collect()
}
