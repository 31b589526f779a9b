use anyhow::{Result, bail};
use std::{
	fmt::{self, Display},
	str::FromStr,
};

/// Output encoding requested with the `fmt` parameter.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ExportFormat {
	Png,
	Svg,
	Pdf,
	#[default]
	GeoJson,
	Shapefile,
	GeoPackage,
}

impl ExportFormat {
	pub fn all() -> [ExportFormat; 6] {
		use ExportFormat::*;
		[Png, Svg, Pdf, GeoJson, Shapefile, GeoPackage]
	}

	/// `true` for formats that are rendered as a map image.
	pub fn is_image(&self) -> bool {
		matches!(self, ExportFormat::Png | ExportFormat::Svg | ExportFormat::Pdf)
	}

	/// File extension without the dot. Also the value accepted by the `fmt` parameter.
	pub fn extension(&self) -> &'static str {
		match self {
			ExportFormat::Png => "png",
			ExportFormat::Svg => "svg",
			ExportFormat::Pdf => "pdf",
			ExportFormat::GeoJson => "geojson",
			ExportFormat::Shapefile => "shp",
			ExportFormat::GeoPackage => "gpkg",
		}
	}

	/// MIME type of the delivered artifact. Vector formats are always delivered as a zip archive.
	pub fn mime(&self) -> &'static str {
		match self {
			ExportFormat::Png => "image/png",
			ExportFormat::Svg => "image/svg+xml",
			ExportFormat::Pdf => "application/pdf",
			_ => "application/zip",
		}
	}
}

impl FromStr for ExportFormat {
	type Err = anyhow::Error;

	fn from_str(s: &str) -> Result<Self> {
		let value = s.trim().to_ascii_lowercase();
		match ExportFormat::all().into_iter().find(|f| f.extension() == value) {
			Some(format) => Ok(format),
			None => bail!("unknown format '{s}', expected one of: png, svg, pdf, geojson, shp, gpkg"),
		}
	}
}

impl Display for ExportFormat {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.extension())
	}
}

/// Tile provider drawn underneath the layers.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum BasemapStyle {
	#[default]
	Osm,
	Satellite,
	Dark,
}

impl BasemapStyle {
	/// Never fails: anything that is not `satellite` or `dark` is the OSM style.
	pub fn parse_lenient(s: &str) -> BasemapStyle {
		match s.trim().to_ascii_lowercase().as_str() {
			"satellite" => BasemapStyle::Satellite,
			"dark" => BasemapStyle::Dark,
			_ => BasemapStyle::Osm,
		}
	}

	pub fn as_str(&self) -> &'static str {
		match self {
			BasemapStyle::Osm => "osm",
			BasemapStyle::Satellite => "satellite",
			BasemapStyle::Dark => "dark",
		}
	}
}

impl Display for BasemapStyle {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	#[case("png", ExportFormat::Png, "image/png", true)]
	#[case("SVG", ExportFormat::Svg, "image/svg+xml", true)]
	#[case("pdf", ExportFormat::Pdf, "application/pdf", true)]
	#[case("geojson", ExportFormat::GeoJson, "application/zip", false)]
	#[case("shp", ExportFormat::Shapefile, "application/zip", false)]
	#[case(" gpkg", ExportFormat::GeoPackage, "application/zip", false)]
	fn parse_format(#[case] input: &str, #[case] format: ExportFormat, #[case] mime: &str, #[case] image: bool) {
		let parsed: ExportFormat = input.parse().unwrap();
		assert_eq!(parsed, format);
		assert_eq!(parsed.mime(), mime);
		assert_eq!(parsed.is_image(), image);
	}

	#[test]
	fn default_is_geojson() {
		assert_eq!(ExportFormat::default(), ExportFormat::GeoJson);
	}

	#[rstest]
	#[case("kml")]
	#[case("")]
	#[case("shapefile")]
	fn reject_unknown_format(#[case] input: &str) {
		assert!(input.parse::<ExportFormat>().is_err());
	}

	#[rstest]
	#[case("osm", BasemapStyle::Osm)]
	#[case("satellite", BasemapStyle::Satellite)]
	#[case("Dark", BasemapStyle::Dark)]
	#[case("watercolor", BasemapStyle::Osm)]
	fn lenient_basemap_style(#[case] input: &str, #[case] expected: BasemapStyle) {
		assert_eq!(BasemapStyle::parse_lenient(input), expected);
	}
}
