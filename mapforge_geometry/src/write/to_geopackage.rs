//! Minimal OGC GeoPackage 1.3 writer: one feature table per file.

use super::{to_multi_line_string, to_multi_polygon};
use crate::layer_data::LayerData;
use anyhow::{Result, bail};
use byteorder::{LE, WriteBytesExt};
use geo::{BoundingRect, Geometry};
use mapforge_derive::context;
use rusqlite::{Connection, params, params_from_iter, types::Value};
use std::{collections::HashSet, path::Path};
use wkb::{Endianness, writer::write_geometry};

/// `GPKG` as big-endian integer.
const APPLICATION_ID: i32 = 0x4750_4B47;
const USER_VERSION: i32 = 10300;
const SRS_ID: i32 = 4326;

const WGS84_DEFINITION: &str = concat!(
	r#"GEOGCS["WGS 84",DATUM["WGS_1984",SPHEROID["WGS 84",6378137,298.257223563,"#,
	r#"AUTHORITY["EPSG","7030"]],AUTHORITY["EPSG","6326"]],PRIMEM["Greenwich",0,AUTHORITY["EPSG","8901"]],"#,
	r#"UNIT["degree",0.0174532925199433,AUTHORITY["EPSG","9122"]],AUTHORITY["EPSG","4326"]]"#
);

const SCHEMA: &str = "
	CREATE TABLE gpkg_spatial_ref_sys (
		srs_name TEXT NOT NULL,
		srs_id INTEGER NOT NULL PRIMARY KEY,
		organization TEXT NOT NULL,
		organization_coordsys_id INTEGER NOT NULL,
		definition TEXT NOT NULL,
		description TEXT
	);
	CREATE TABLE gpkg_contents (
		table_name TEXT NOT NULL PRIMARY KEY,
		data_type TEXT NOT NULL,
		identifier TEXT UNIQUE,
		description TEXT DEFAULT '',
		last_change DATETIME NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ','now')),
		min_x DOUBLE,
		min_y DOUBLE,
		max_x DOUBLE,
		max_y DOUBLE,
		srs_id INTEGER,
		CONSTRAINT fk_gc_r_srs_id FOREIGN KEY (srs_id) REFERENCES gpkg_spatial_ref_sys(srs_id)
	);
	CREATE TABLE gpkg_geometry_columns (
		table_name TEXT NOT NULL,
		column_name TEXT NOT NULL,
		geometry_type_name TEXT NOT NULL,
		srs_id INTEGER NOT NULL,
		z TINYINT NOT NULL,
		m TINYINT NOT NULL,
		CONSTRAINT pk_geom_cols PRIMARY KEY (table_name, column_name),
		CONSTRAINT fk_gc_tn FOREIGN KEY (table_name) REFERENCES gpkg_contents(table_name),
		CONSTRAINT fk_gc_srs FOREIGN KEY (srs_id) REFERENCES gpkg_spatial_ref_sys (srs_id)
	);
";

/// Writes the layer into a new GeoPackage at `path`. Geometries are stored as `MULTIPOLYGON` or
/// `MULTILINESTRING`.
#[context("writing layer '{}' as GeoPackage to {:?}", data.name(), path)]
pub fn write_geopackage(data: &LayerData, path: &Path) -> Result<()> {
	if path.exists() {
		bail!("file {path:?} already exists");
	}

	let mut connection = Connection::open(path)?;
	connection.execute_batch(&format!(
		"PRAGMA application_id = {APPLICATION_ID}; PRAGMA user_version = {USER_VERSION};"
	))?;
	connection.execute_batch(SCHEMA)?;

	let transaction = connection.transaction()?;
	{
		let mut srs = transaction.prepare(
			"INSERT INTO gpkg_spatial_ref_sys (srs_name, srs_id, organization, organization_coordsys_id, definition, description) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
		)?;
		srs.execute(params!["Undefined cartesian SRS", -1, "NONE", -1, "undefined", "undefined cartesian coordinate reference system"])?;
		srs.execute(params!["Undefined geographic SRS", 0, "NONE", 0, "undefined", "undefined geographic coordinate reference system"])?;
		srs.execute(params!["WGS 84 geodetic", SRS_ID, "EPSG", SRS_ID, WGS84_DEFINITION, "longitude/latitude coordinates in decimal degrees on the WGS 84 spheroid"])?;
	}

	let table = data.name();
	let geometry_type = if data.layer.is_line() {
		"MULTILINESTRING"
	} else {
		"MULTIPOLYGON"
	};
	let bounds = data.bounds();
	transaction.execute(
		"INSERT INTO gpkg_contents (table_name, data_type, identifier, min_x, min_y, max_x, max_y, srs_id) VALUES (?1, 'features', ?1, ?2, ?3, ?4, ?5, ?6)",
		params![
			table,
			bounds.map(|b| b.min().x),
			bounds.map(|b| b.min().y),
			bounds.map(|b| b.max().x),
			bounds.map(|b| b.max().y),
			SRS_ID
		],
	)?;
	transaction.execute(
		"INSERT INTO gpkg_geometry_columns (table_name, column_name, geometry_type_name, srs_id, z, m) VALUES (?1, 'geom', ?2, ?3, 0, 0)",
		params![table, geometry_type, SRS_ID],
	)?;

	let columns = attribute_columns(&data.columns);
	let column_defs: String = columns.iter().map(|c| format!(", {} TEXT", quote(c))).collect();
	transaction.execute_batch(&format!(
		"CREATE TABLE {} (fid INTEGER PRIMARY KEY AUTOINCREMENT NOT NULL, geom {geometry_type}{column_defs});",
		quote(table)
	))?;

	{
		let column_list: String = columns.iter().map(|c| format!(", {}", quote(c))).collect();
		let placeholders: String = (0..columns.len()).map(|i| format!(", ?{}", i + 2)).collect();
		let mut insert = transaction.prepare(&format!(
			"INSERT INTO {} (geom{column_list}) VALUES (?1{placeholders})",
			quote(table)
		))?;

		for feature in &data.features {
			let Some(blob) = geometry_blob(&feature.geometry, data.layer.is_line())? else {
				continue;
			};
			let mut values: Vec<Value> = Vec::with_capacity(columns.len() + 1);
			values.push(Value::Blob(blob));
			values.extend(feature.properties.iter().map(|v| Value::Text(v.clone())));
			insert.execute(params_from_iter(values))?;
		}
	}
	transaction.commit()?;

	Ok(())
}

/// GeoPackage binary: `GP` header with an xy envelope followed by little-endian ISO WKB.
fn geometry_blob(geometry: &Geometry<f64>, is_line: bool) -> Result<Option<Vec<u8>>> {
	let multi = if is_line {
		to_multi_line_string(geometry).map(Geometry::MultiLineString)
	} else {
		to_multi_polygon(geometry).map(Geometry::MultiPolygon)
	};
	let Some(multi) = multi else { return Ok(None) };
	let Some(rect) = multi.bounding_rect() else {
		return Ok(None);
	};

	let mut blob = Vec::new();
	blob.extend_from_slice(b"GP");
	blob.write_u8(0)?;
	// little endian, envelope [minx, maxx, miny, maxy]
	blob.write_u8(0b0000_0011)?;
	blob.write_i32::<LE>(SRS_ID)?;
	blob.write_f64::<LE>(rect.min().x)?;
	blob.write_f64::<LE>(rect.max().x)?;
	blob.write_f64::<LE>(rect.min().y)?;
	blob.write_f64::<LE>(rect.max().y)?;
	write_geometry(&mut blob, &multi, Endianness::LittleEndian)?;
	Ok(Some(blob))
}

/// Attribute column names, renamed where they clash with `fid`, `geom` or each other.
fn attribute_columns(columns: &[String]) -> Vec<String> {
	let mut taken: HashSet<String> = ["fid", "geom"].iter().map(|s| s.to_string()).collect();
	columns
		.iter()
		.map(|column| {
			let mut name = column.clone();
			let mut counter = 1;
			while taken.contains(&name.to_ascii_lowercase()) {
				name = format!("{column}_{counter}");
				counter += 1;
			}
			taken.insert(name.to_ascii_lowercase());
			name
		})
		.collect()
}

fn quote(identifier: &str) -> String {
	format!("\"{}\"", identifier.replace('"', "\"\""))
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::write::test_data;
	use assert_fs::TempDir;
	use pretty_assertions::assert_eq;

	#[test]
	fn writes_feature_table() -> Result<()> {
		let dir = TempDir::new()?;
		let path = dir.path().join("parks.gpkg");
		write_geopackage(&test_data::parks(), &path)?;

		let connection = Connection::open(&path)?;
		let application_id: i32 = connection.query_row("PRAGMA application_id", [], |row| row.get(0))?;
		assert_eq!(application_id, APPLICATION_ID);
		let user_version: i32 = connection.query_row("PRAGMA user_version", [], |row| row.get(0))?;
		assert_eq!(user_version, USER_VERSION);

		let (data_type, min_x, max_y): (String, f64, f64) = connection.query_row(
			"SELECT data_type, min_x, max_y FROM gpkg_contents WHERE table_name = 'parks'",
			[],
			|row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
		)?;
		assert_eq!((data_type.as_str(), min_x, max_y), ("features", 13.0, 52.5));

		let geometry_type: String = connection.query_row(
			"SELECT geometry_type_name FROM gpkg_geometry_columns WHERE table_name = 'parks'",
			[],
			|row| row.get(0),
		)?;
		assert_eq!(geometry_type, "MULTIPOLYGON");

		let names: Vec<String> = connection
			.prepare("SELECT name FROM parks ORDER BY fid")?
			.query_map([], |row| row.get(0))?
			.collect::<rusqlite::Result<_>>()?;
		assert_eq!(names, ["Tiergarten", "Grünwald"]);

		let blob: Vec<u8> = connection.query_row("SELECT geom FROM parks WHERE fid = 1", [], |row| row.get(0))?;
		assert_eq!(&blob[..4], b"GP\x00\x03");
		assert_eq!(&blob[4..8], &4326i32.to_le_bytes());
		// envelope is followed by a little-endian MultiPolygon
		assert_eq!(&blob[40..45], &[1, 6, 0, 0, 0]);
		Ok(())
	}

	#[test]
	fn blob_holds_multi_line_string_wkb() -> Result<()> {
		let line = Geometry::LineString(geo::LineString::from(vec![(13.0, 52.0), (13.5, 52.5)]));
		let blob = geometry_blob(&line, true)?.unwrap();
		assert_eq!(&blob[8..16], &13.0f64.to_le_bytes());
		assert_eq!(&blob[32..40], &52.5f64.to_le_bytes());

		let wkb = &blob[40..];
		// MultiLineString with one LineString of two points
		assert_eq!(&wkb[..9], &[1, 5, 0, 0, 0, 1, 0, 0, 0]);
		assert_eq!(&wkb[9..18], &[1, 2, 0, 0, 0, 2, 0, 0, 0]);
		assert_eq!(wkb.len(), 9 + 9 + 2 * 16);
		assert_eq!(&wkb[18..26], &13.0f64.to_le_bytes());
		Ok(())
	}

	#[test]
	fn points_have_no_blob() -> Result<()> {
		let point = Geometry::Point(geo::Point::new(13.0, 52.0));
		assert_eq!(geometry_blob(&point, false)?, None);
		Ok(())
	}

	#[test]
	fn refuses_to_overwrite() -> Result<()> {
		let dir = TempDir::new()?;
		let path = dir.path().join("streets.gpkg");
		write_geopackage(&test_data::streets(), &path)?;
		assert!(write_geopackage(&test_data::streets(), &path).is_err());
		Ok(())
	}

	#[test]
	fn reserved_column_names_are_renamed() {
		let columns: Vec<String> = ["element", "fid", "geom", "fid_1"].iter().map(|s| s.to_string()).collect();
		assert_eq!(attribute_columns(&columns), ["element", "fid_1", "geom_1", "fid_1_1"]);
	}

	#[test]
	fn quoting() {
		assert_eq!(quote("addr:street"), "\"addr:street\"");
		assert_eq!(quote("a\"b"), "\"a\"\"b\"");
	}
}
