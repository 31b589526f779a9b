//! Spherical Web Mercator (EPSG:3857) helpers and slippy-map tile math.

use std::f64::consts::PI;

pub const EARTH_RADIUS: f64 = 6_378_137.0;
pub const MAX_LATITUDE: f64 = 85.051_128_779_806_59;
/// Half the width of the projected world in meters.
pub const HALF_WORLD: f64 = PI * EARTH_RADIUS;

/// Axis aligned rectangle in Web Mercator meters.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MercatorExtent {
	pub min_x: f64,
	pub min_y: f64,
	pub max_x: f64,
	pub max_y: f64,
}

impl MercatorExtent {
	pub fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
		Self {
			min_x,
			min_y,
			max_x,
			max_y,
		}
	}

	/// Extent of a set of projected points.
	pub fn from_points<I: IntoIterator<Item = (f64, f64)>>(points: I) -> Option<Self> {
		let mut iter = points.into_iter();
		let (x, y) = iter.next()?;
		let mut extent = Self::new(x, y, x, y);
		for (x, y) in iter {
			extent.min_x = extent.min_x.min(x);
			extent.min_y = extent.min_y.min(y);
			extent.max_x = extent.max_x.max(x);
			extent.max_y = extent.max_y.max(y);
		}
		Some(extent)
	}

	pub fn width(&self) -> f64 {
		self.max_x - self.min_x
	}

	pub fn height(&self) -> f64 {
		self.max_y - self.min_y
	}

	pub fn intersects(&self, other: &MercatorExtent) -> bool {
		self.min_x < other.max_x && other.min_x < self.max_x && self.min_y < other.max_y && other.min_y < self.max_y
	}

	/// `[west, south, east, north]` in degrees.
	pub fn to_lonlat_bounds(&self) -> [f64; 4] {
		let (west, south) = mercator_to_lonlat(self.min_x, self.min_y);
		let (east, north) = mercator_to_lonlat(self.max_x, self.max_y);
		[west, south, east, north]
	}
}

pub fn lonlat_to_mercator(lon: f64, lat: f64) -> (f64, f64) {
	let lat = lat.clamp(-MAX_LATITUDE, MAX_LATITUDE);
	let x = EARTH_RADIUS * lon.to_radians();
	let y = EARTH_RADIUS * (PI / 4.0 + lat.to_radians() / 2.0).tan().ln();
	(x, y)
}

pub fn mercator_to_lonlat(x: f64, y: f64) -> (f64, f64) {
	let lon = (x / EARTH_RADIUS).to_degrees();
	let lat = (2.0 * (y / EARTH_RADIUS).exp().atan() - PI / 2.0).to_degrees();
	(lon, lat)
}

/// Ratio between projected and true distances at a latitude.
pub fn scale_factor(lat: f64) -> f64 {
	1.0 / lat.clamp(-MAX_LATITUDE, MAX_LATITUDE).to_radians().cos()
}

/// Bounds of slippy-map tile `z/x/y`.
pub fn tile_bounds(z: u8, x: u32, y: u32) -> MercatorExtent {
	let size = 2.0 * HALF_WORLD / f64::from(1u32 << z);
	let min_x = -HALF_WORLD + f64::from(x) * size;
	let max_y = HALF_WORLD - f64::from(y) * size;
	MercatorExtent::new(min_x, max_y - size, min_x + size, max_y)
}

/// Inclusive tile column and row ranges covering an extent: `(x_min, x_max, y_min, y_max)`.
pub fn tile_range(extent: &MercatorExtent, z: u8) -> (u32, u32, u32, u32) {
	let count = 1u32 << z;
	let size = 2.0 * HALF_WORLD / f64::from(count);
	let to_index = |v: f64| -> u32 { (v / size).floor().clamp(0.0, f64::from(count - 1)) as u32 };
	let x_min = to_index(extent.min_x + HALF_WORLD);
	let x_max = to_index(extent.max_x + HALF_WORLD);
	let y_min = to_index(HALF_WORLD - extent.max_y);
	let y_max = to_index(HALF_WORLD - extent.min_y);
	(x_min, x_max, y_min, y_max)
}

#[cfg(test)]
mod tests {
	use super::*;
	use approx::assert_relative_eq;

	#[test]
	fn origin_and_corners() {
		assert_eq!(lonlat_to_mercator(0.0, 0.0), (0.0, 0.0));
		let (x, y) = lonlat_to_mercator(180.0, MAX_LATITUDE);
		assert_relative_eq!(x, HALF_WORLD, epsilon = 1e-6);
		assert_relative_eq!(y, HALF_WORLD, epsilon = 1e-3);
	}

	#[test]
	fn known_point() {
		// Berlin, Brandenburger Tor
		let (x, y) = lonlat_to_mercator(13.377_704, 52.516_275);
		assert_relative_eq!(x, 1_489_199.0, epsilon = 1.0);
		assert_relative_eq!(y, 6_894_018.4, epsilon = 1.0);
	}

	#[test]
	fn inverse_projection() {
		let (x, y) = lonlat_to_mercator(-8.61, 41.15);
		let (lon, lat) = mercator_to_lonlat(x, y);
		assert_relative_eq!(lon, -8.61, epsilon = 1e-9);
		assert_relative_eq!(lat, 41.15, epsilon = 1e-9);
	}

	#[test]
	fn latitude_is_clamped() {
		assert_eq!(lonlat_to_mercator(0.0, 90.0), lonlat_to_mercator(0.0, MAX_LATITUDE));
	}

	#[test]
	fn scale_factor_grows_with_latitude() {
		assert_relative_eq!(scale_factor(0.0), 1.0);
		assert_relative_eq!(scale_factor(60.0), 2.0, epsilon = 1e-12);
	}

	#[test]
	fn tile_bounds_cover_world() {
		let world = tile_bounds(0, 0, 0);
		assert_relative_eq!(world.min_x, -HALF_WORLD);
		assert_relative_eq!(world.max_y, HALF_WORLD);
		assert_relative_eq!(world.width(), 2.0 * HALF_WORLD);

		let ne = tile_bounds(1, 1, 0);
		assert_relative_eq!(ne.min_x, 0.0, epsilon = 1e-6);
		assert_relative_eq!(ne.min_y, 0.0, epsilon = 1e-6);
	}

	#[test]
	fn tile_range_of_small_extent() {
		let (x, y) = lonlat_to_mercator(13.4, 52.5);
		let extent = MercatorExtent::new(x - 10.0, y - 10.0, x + 10.0, y + 10.0);
		let (x_min, x_max, y_min, y_max) = tile_range(&extent, 10);
		assert_eq!((x_min, x_max), (550, 550));
		assert_eq!((y_min, y_max), (335, 335));
	}

	#[test]
	fn extent_from_points() {
		let extent = MercatorExtent::from_points([(1.0, 5.0), (-2.0, 3.0), (4.0, -1.0)]).unwrap();
		assert_eq!(extent, MercatorExtent::new(-2.0, -1.0, 4.0, 5.0));
		assert!(MercatorExtent::from_points(std::iter::empty()).is_none());
	}
}
