//! Core constants shared by the tile and geometry modules.
//! Keeping them in a single place makes it easier to tweak engine-wide magic numbers.

/// Web Mercator sphere radius in meters (EPSG:3857).
pub const EARTH_RADIUS: f64 = 6_378_137.0;

/// Half the side length of the Web Mercator square, in meters.
pub const EARTH_HALF_CIRCUMFERENCE: f64 = std::f64::consts::PI * EARTH_RADIUS;

/// Deepest zoom level a `TileId` may address.
pub const MAX_ZOOM: u8 = 24;

/// Number of distinct vertices addressable by a 16-bit index buffer.
pub const MAX_INDEXED_VERTICES: usize = u16::MAX as usize + 1;

/// Tile-local coordinates span `[-TILE_EXTENT, TILE_EXTENT]` on both axes.
pub const TILE_EXTENT: f32 = 0.5;
