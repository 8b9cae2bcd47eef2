use nalgebra::Vector2;

use crate::core::constants::{EARTH_HALF_CIRCUMFERENCE, EARTH_RADIUS};
use crate::core::tile_id::TileId;

/// Maps tile addresses and geographic coordinates into projection space.
///
/// Projection space is measured in doubles; tile placement is derived from it
/// once when a `Tile` is constructed.
pub trait MapProjection: Send + Sync {
    /// Bounds of a tile as `(min, max)` corners in projection units.
    fn tile_bounds(&self, id: TileId) -> (Vector2<f64>, Vector2<f64>);

    /// Converts longitude/latitude in degrees into projection units.
    fn lon_lat_to_meters(&self, lon_lat: Vector2<f64>) -> Vector2<f64>;

    /// Center of a tile in projection units.
    fn tile_center(&self, id: TileId) -> Vector2<f64> {
        let (min, max) = self.tile_bounds(id);
        (min + max) * 0.5
    }
}

/// Spherical Web Mercator (EPSG:3857) with the tile grid origin in the north-west corner.
#[derive(Debug, Clone, Copy, Default)]
pub struct MercatorProjection;

impl MercatorProjection {
    pub fn new() -> Self {
        Self
    }

    /// Side length of a tile at `zoom` in meters.
    pub fn tile_size_meters(zoom: u8) -> f64 {
        2.0 * EARTH_HALF_CIRCUMFERENCE / 2f64.powi(i32::from(zoom))
    }
}

impl MapProjection for MercatorProjection {
    fn tile_bounds(&self, id: TileId) -> (Vector2<f64>, Vector2<f64>) {
        let size = Self::tile_size_meters(id.zoom);
        let min_x = -EARTH_HALF_CIRCUMFERENCE + id.x as f64 * size;
        let max_y = EARTH_HALF_CIRCUMFERENCE - id.y as f64 * size;
        (
            Vector2::new(min_x, max_y - size),
            Vector2::new(min_x + size, max_y),
        )
    }

    fn lon_lat_to_meters(&self, lon_lat: Vector2<f64>) -> Vector2<f64> {
        let x = lon_lat.x.to_radians() * EARTH_RADIUS;
        let y = (std::f64::consts::FRAC_PI_4 + lon_lat.y.to_radians() / 2.0)
            .tan()
            .ln()
            * EARTH_RADIUS;
        Vector2::new(x, y)
    }
}
