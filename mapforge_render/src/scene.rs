//! Builds the SVG document of a map.
//!
//! The canvas shows a Web Mercator window. Its longer side is `size_inches * 72` user units (one
//! unit is one point in PDF output) and its aspect ratio follows the window. There is no background,
//! so everything outside the features stays transparent.

use crate::{basemap::BasemapTile, options::RenderOptions};
use anyhow::{Result, ensure};
use base64::{Engine, engine::general_purpose::STANDARD};
use geo::{Geometry, LineString, Polygon};
use mapforge_core::{MercatorExtent, mercator::lonlat_to_mercator};
use mapforge_geometry::LayerData;
use svg::{
	Document,
	node::element::{Circle, ClipPath, Definitions, Group, Image, Path, path::Data},
};

const CLIP_ID: &str = "map-clip";

/// Everything needed to draw one map.
#[derive(Clone, Debug)]
pub struct MapScene {
	pub extent: MercatorExtent,
	/// Drawn in this order.
	pub layers: Vec<LayerData>,
	/// `(center_x, center_y, radius)` in Mercator meters.
	pub clip_circle: Option<(f64, f64, f64)>,
	pub basemap: Vec<BasemapTile>,
	pub options: RenderOptions,
}

/// Maps Mercator meters onto canvas points.
#[derive(Clone, Copy, Debug)]
struct Canvas {
	extent: MercatorExtent,
	width: f64,
	height: f64,
	scale: f64,
}

impl Canvas {
	fn new(extent: MercatorExtent, longest_side: f64) -> Result<Canvas> {
		ensure!(
			extent.width() > 0.0 && extent.height() > 0.0,
			"the map extent must have a positive width and height"
		);
		let scale = longest_side / extent.width().max(extent.height());
		Ok(Canvas {
			extent,
			width: extent.width() * scale,
			height: extent.height() * scale,
			scale,
		})
	}

	fn project(&self, x: f64, y: f64) -> (f32, f32) {
		(
			((x - self.extent.min_x) * self.scale) as f32,
			((self.extent.max_y - y) * self.scale) as f32,
		)
	}

	fn project_lonlat(&self, lon: f64, lat: f64) -> (f32, f32) {
		let (x, y) = lonlat_to_mercator(lon, lat);
		self.project(x, y)
	}
}

impl MapScene {
	pub fn new(extent: MercatorExtent, options: RenderOptions) -> MapScene {
		MapScene {
			extent,
			layers: Vec::new(),
			clip_circle: None,
			basemap: Vec::new(),
			options,
		}
	}

	/// Canvas size in points.
	pub fn canvas_size(&self) -> Result<(f64, f64)> {
		let canvas = Canvas::new(self.extent, self.options.canvas_points())?;
		Ok((canvas.width, canvas.height))
	}

	pub fn to_document(&self) -> Result<Document> {
		let canvas = Canvas::new(self.extent, self.options.canvas_points())?;

		let mut document = Document::new()
			.set("xmlns:xlink", "http://www.w3.org/1999/xlink")
			.set("width", canvas.width)
			.set("height", canvas.height)
			.set("viewBox", (0.0, 0.0, canvas.width, canvas.height));

		let mut content = Group::new().set("id", "map");

		if let Some((x, y, r)) = self.clip_circle {
			let (cx, cy) = canvas.project(x, y);
			let circle = Circle::new()
				.set("cx", cx)
				.set("cy", cy)
				.set("r", (r * canvas.scale) as f32);
			document = document.add(Definitions::new().add(ClipPath::new().set("id", CLIP_ID).add(circle)));
			content = content.set("clip-path", format!("url(#{CLIP_ID})"));
		}

		if !self.basemap.is_empty() {
			content = content.add(self.basemap_group(&canvas));
		}

		for layer in &self.layers {
			content = content.add(self.layer_group(&canvas, layer));
		}

		Ok(document.add(content))
	}

	pub fn to_svg(&self) -> Result<String> {
		Ok(self.to_document()?.to_string())
	}

	fn basemap_group(&self, canvas: &Canvas) -> Group {
		let mut group = Group::new().set("id", "basemap");
		for tile in &self.basemap {
			let (x0, y0) = canvas.project(tile.extent.min_x, tile.extent.max_y);
			let (x1, y1) = canvas.project(tile.extent.max_x, tile.extent.min_y);
			let href = format!("data:{};base64,{}", tile.mime(), STANDARD.encode(&tile.data));
			group = group.add(
				Image::new()
					.set("x", x0)
					.set("y", y0)
					.set("width", x1 - x0)
					.set("height", y1 - y0)
					.set("preserveAspectRatio", "none")
					.set("xlink:href", href),
			);
		}
		group
	}

	fn layer_group(&self, canvas: &Canvas, data: &LayerData) -> Group {
		let layer = data.layer;
		let mut group = Group::new().set("id", format!("layer-{}", layer.name));
		if layer.is_line() {
			group = group
				.set("fill", "none")
				.set("stroke", layer.color)
				.set("stroke-width", self.options.line_width)
				.set("stroke-linejoin", "round")
				.set("stroke-linecap", "round");
		} else {
			group = group
				.set("fill", layer.color)
				.set("fill-opacity", self.options.polygon_opacity)
				.set("fill-rule", "evenodd")
				.set("stroke", "none");
		}

		for feature in &data.features {
			let (path_data, drawn) = geometry_data(Data::new(), canvas, &feature.geometry);
			if drawn {
				group = group.add(Path::new().set("d", path_data));
			}
		}
		group
	}
}

/// Appends the sub paths of a geometry. The flag tells whether anything was drawn.
fn geometry_data(data: Data, canvas: &Canvas, geometry: &Geometry<f64>) -> (Data, bool) {
	match geometry {
		Geometry::LineString(line) => line_data(data, canvas, line, false),
		Geometry::MultiLineString(lines) => lines.0.iter().fold((data, false), |(data, drawn), line| {
			let (data, added) = line_data(data, canvas, line, false);
			(data, drawn || added)
		}),
		Geometry::Polygon(polygon) => polygon_data(data, canvas, polygon),
		Geometry::MultiPolygon(polygons) => polygons.0.iter().fold((data, false), |(data, drawn), polygon| {
			let (data, added) = polygon_data(data, canvas, polygon);
			(data, drawn || added)
		}),
		Geometry::GeometryCollection(collection) => {
			collection.0.iter().fold((data, false), |(data, drawn), child| {
				let (data, added) = geometry_data(data, canvas, child);
				(data, drawn || added)
			})
		}
		_ => (data, false),
	}
}

fn polygon_data(data: Data, canvas: &Canvas, polygon: &Polygon<f64>) -> (Data, bool) {
	let (mut data, drawn) = line_data(data, canvas, polygon.exterior(), true);
	if drawn {
		for ring in polygon.interiors() {
			data = line_data(data, canvas, ring, true).0;
		}
	}
	(data, drawn)
}

fn line_data(data: Data, canvas: &Canvas, line: &LineString<f64>, close: bool) -> (Data, bool) {
	let mut coords = line.coords();
	let Some(first) = coords.next() else {
		return (data, false);
	};
	let mut data = data.move_to(canvas.project_lonlat(first.x, first.y));
	for coord in coords {
		data = data.line_to(canvas.project_lonlat(coord.x, coord.y));
	}
	if close {
		data = data.close();
	}
	(data, true)
}
