/// Figure settings shared by all image formats.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RenderOptions {
	/// Length of the longer canvas side.
	pub size_inches: f64,
	/// Raster resolution; only affects PNG output.
	pub dpi: u32,
	/// Stroke width of line layers in points.
	pub line_width: f64,
	pub polygon_opacity: f64,
}

impl Default for RenderOptions {
	fn default() -> Self {
		Self {
			size_inches: 10.0,
			dpi: 300,
			line_width: 0.8,
			polygon_opacity: 0.7,
		}
	}
}

impl RenderOptions {
	/// Longer canvas side in points.
	pub fn canvas_points(&self) -> f64 {
		self.size_inches * 72.0
	}

	/// Scale factor from points to PNG pixels.
	pub fn pixel_scale(&self) -> f32 {
		self.dpi as f32 / 72.0
	}
}
