use anyhow::{Result, ensure};
use mapforge_derive::ConfigDoc;
use mapforge_render::RenderOptions;
use serde::Deserialize;

/// Figure settings of PNG, SVG and PDF exports.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, ConfigDoc)]
#[serde(deny_unknown_fields, default)]
pub struct RenderConfig {
	/// Length of the longer side of the figure in inches
	#[config_demo("10")]
	pub size_inches: f64,

	/// Resolution of PNG exports
	#[config_demo("300")]
	pub dpi: u32,

	/// Stroke width of streets, railways and power lines in points
	#[config_demo("0.8")]
	pub line_width: f64,

	/// Opacity of filled polygons, between 0 and 1
	#[config_demo("0.7")]
	pub polygon_opacity: f64,
}

impl Default for RenderConfig {
	fn default() -> Self {
		let options = RenderOptions::default();
		Self {
			size_inches: options.size_inches,
			dpi: options.dpi,
			line_width: options.line_width,
			polygon_opacity: options.polygon_opacity,
		}
	}
}

impl RenderConfig {
	pub fn to_options(&self) -> Result<RenderOptions> {
		ensure!(self.size_inches > 0.0, "render.size_inches must be positive");
		ensure!(self.dpi > 0, "render.dpi must be positive");
		ensure!(self.line_width >= 0.0, "render.line_width must not be negative");
		ensure!(
			(0.0..=1.0).contains(&self.polygon_opacity),
			"render.polygon_opacity must be between 0 and 1"
		);
		Ok(RenderOptions {
			size_inches: self.size_inches,
			dpi: self.dpi,
			line_width: self.line_width,
			polygon_opacity: self.polygon_opacity,
		})
	}
}
