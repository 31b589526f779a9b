use crate::scene::MapScene;
use anyhow::{Context, Result, anyhow, bail};
use image::{ExtendedColorType, ImageEncoder, codecs::png};
use mapforge_core::ExportFormat;
use mapforge_derive::context;
use resvg::{tiny_skia, usvg};

/// Renders the scene into the requested image format.
#[context("rendering map as {}", format)]
pub fn render(scene: &MapScene, format: ExportFormat) -> Result<Vec<u8>> {
	let svg = scene.to_svg()?;
	match format {
		ExportFormat::Svg => Ok(svg.into_bytes()),
		ExportFormat::Png => svg_to_png(&svg, scene.options.pixel_scale()),
		ExportFormat::Pdf => svg_to_pdf(&svg),
		other => bail!("{other} is not an image format"),
	}
}

/// Rasterises an SVG document, scaling points by `scale`.
pub fn svg_to_png(svg: &str, scale: f32) -> Result<Vec<u8>> {
	let tree = usvg::Tree::from_str(svg, &usvg::Options::default()).context("parsing SVG")?;
	let size = tree
		.size()
		.to_int_size()
		.scale_by(scale)
		.context("invalid image size")?;

	let mut pixmap = tiny_skia::Pixmap::new(size.width(), size.height())
		.with_context(|| format!("allocating a {}x{} pixmap", size.width(), size.height()))?;
	resvg::render(&tree, tiny_skia::Transform::from_scale(scale, scale), &mut pixmap.as_mut());

	// tiny-skia keeps premultiplied alpha, PNG wants it straight
	let mut rgba: Vec<u8> = Vec::with_capacity(pixmap.data().len());
	for pixel in pixmap.pixels() {
		let color = pixel.demultiply();
		rgba.extend_from_slice(&[color.red(), color.green(), color.blue(), color.alpha()]);
	}

	let mut buffer: Vec<u8> = Vec::new();
	png::PngEncoder::new_with_quality(&mut buffer, png::CompressionType::Default, png::FilterType::Adaptive)
		.write_image(&rgba, size.width(), size.height(), ExtendedColorType::Rgba8)?;
	Ok(buffer)
}

/// Converts an SVG document into a single page PDF of the same size.
pub fn svg_to_pdf(svg: &str) -> Result<Vec<u8>> {
	let options = svg2pdf::usvg::Options::default();
	let tree = svg2pdf::usvg::Tree::from_str(svg, &options).context("parsing SVG")?;
	svg2pdf::to_pdf(
		&tree,
		svg2pdf::ConversionOptions::default(),
		svg2pdf::PageOptions::default(),
	)
	.map_err(|err| anyhow!("converting SVG to PDF failed: {err:?}"))
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::{RenderOptions, basemap::BasemapTile};
	use geo::{Geometry, LineString, polygon};
	use image::{GenericImageView, ImageFormat};
	use mapforge_core::{AreaDescriptor, Layer};
	use mapforge_geometry::{ElementType, LayerData, MapFeature};

	fn scene(options: RenderOptions) -> MapScene {
		let area = AreaDescriptor::new_bbox(1.0, 0.0, 2.0, 0.0).unwrap();
		let park = polygon![(x: 0.2, y: 0.2), (x: 1.8, y: 0.2), (x: 1.8, y: 0.8), (x: 0.2, y: 0.2)];
		let rail = LineString::from(vec![(0.0, 0.5), (2.0, 0.5)]);
		let mut scene = MapScene::new(area.mercator_extent(), options);
		scene.layers = vec![
			LayerData::clean(
				Layer::get("parks").unwrap(),
				vec![MapFeature::new(ElementType::Way, 1, Geometry::Polygon(park), Default::default())],
			),
			LayerData::clean(
				Layer::get("railways").unwrap(),
				vec![MapFeature::new(ElementType::Way, 2, Geometry::LineString(rail), Default::default())],
			),
		];
		scene
	}

	fn small() -> RenderOptions {
		RenderOptions {
			size_inches: 2.0,
			dpi: 72,
			..Default::default()
		}
	}

	#[test]
	fn png_has_canvas_size_and_transparency() -> Result<()> {
		let data = render(&scene(small()), ExportFormat::Png)?;
		assert_eq!(image::guess_format(&data)?, ImageFormat::Png);

		let image = image::load_from_memory(&data)?;
		let (width, height) = image.dimensions();
		assert_eq!(width, 144);
		assert!((71..=73).contains(&height), "height {height}");
		// corners are outside every feature
		assert_eq!(image.get_pixel(0, 0).0[3], 0);
		// the railway crosses the middle
		assert!(image.get_pixel(width / 2, height / 2).0[3] > 0);
		Ok(())
	}

	#[test]
	fn dpi_scales_png() -> Result<()> {
		let options = RenderOptions { dpi: 144, ..small() };
		let image = image::load_from_memory(&render(&scene(options), ExportFormat::Png)?)?;
		assert_eq!(image.width(), 288);
		Ok(())
	}

	#[test]
	fn pdf_and_svg() -> Result<()> {
		let pdf = render(&scene(small()), ExportFormat::Pdf)?;
		assert!(pdf.starts_with(b"%PDF-"));

		let svg = String::from_utf8(render(&scene(small()), ExportFormat::Svg)?)?;
		assert!(svg.starts_with("<svg"));
		assert!(svg.contains("layer-railways"));
		Ok(())
	}

	#[test]
	fn clipped_circle_with_basemap() -> Result<()> {
		let area = AreaDescriptor::new_circle(0.5, 1.0, 20_000.0)?;
		let mut scene = scene(small());
		scene.extent = area.mercator_extent();
		scene.clip_circle = area.clip_circle();

		let mut tile = Vec::new();
		png::PngEncoder::new(&mut tile).write_image(&[255, 0, 0, 255].repeat(4), 2, 2, ExtendedColorType::Rgba8)?;
		scene.basemap = vec![BasemapTile {
			extent: scene.extent,
			data: tile,
		}];

		let image = image::load_from_memory(&render(&scene, ExportFormat::Png)?)?;
		assert_eq!(image.width(), image.height());
		// outside the circle nothing is drawn, the center shows the basemap
		assert_eq!(image.get_pixel(1, 1).0[3], 0);
		let center = image.get_pixel(image.width() / 2, image.height() / 4);
		assert_eq!(center.0[3], 255);
		Ok(())
	}

	#[test]
	fn vector_formats_are_rejected() {
		assert!(render(&scene(small()), ExportFormat::GeoJson).is_err());
	}
}
