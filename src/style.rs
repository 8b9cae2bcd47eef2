//! Styles turn decoded tile data into meshes
//!
//! A style reads one source layer and feeds its features through the geometry
//! builders. Features that cannot be meshed are logged and skipped, so one
//! bad polygon never costs the whole tile.

use nalgebra::Vector3;

use crate::core::tile_id::TileId;
use crate::geometry::{
    build_poly_line, build_polygon, build_polygon_extrusion, build_quad_at_point, GeometryError,
    Mesh, MeshBuffers,
};
use crate::tiles::data::{FeatureGeometry, TileData};
use crate::Result;

/// Per-tile parameters a style needs while building
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TileContext {
    pub id: TileId,
    /// Side length of the tile in projection units
    pub scale: f32,
    pub inverse_scale: f32,
    pub extrusion_enabled: bool,
}

impl TileContext {
    pub fn new(id: TileId, scale: f32, extrusion_enabled: bool) -> Self {
        Self {
            id,
            scale,
            inverse_scale: 1.0 / scale,
            extrusion_enabled,
        }
    }

    /// Convert a length in projection units (meters) into tile-local units.
    pub fn to_local(&self, meters: f32) -> f32 {
        meters * self.inverse_scale
    }
}

pub trait Style: Send + Sync {
    fn name(&self) -> &str;

    /// Build this style's mesh for one tile; `None` if the tile has nothing to draw.
    fn build(&self, tile: &TileContext, data: &TileData) -> Result<Option<Mesh>>;
}

fn lift(point: &[f32; 2], z: f32) -> Vector3<f32> {
    Vector3::new(point[0], point[1], z)
}

/// Build one feature into `scratch` and move it into `out` only if every part succeeded.
fn append_feature(
    style: &str,
    out: &mut MeshBuffers,
    scratch: &mut MeshBuffers,
    build: impl FnOnce(&mut MeshBuffers) -> std::result::Result<(), GeometryError>,
) {
    scratch.clear();
    let result = build(scratch).and_then(|()| out.append(scratch));
    if let Err(e) = result {
        log::debug!("style {} skipped feature: {}", style, e);
    }
}

/// Filled polygons, optionally extruded into walls from `min_height` to `height`.
#[derive(Debug, Clone)]
pub struct PolygonStyle {
    pub name: String,
    pub layer: String,
    pub extrude: bool,
    /// Meters, used when a feature has no `height` property
    pub default_height: f32,
    /// Meters, used when a feature has no `min_height` property
    pub default_min_height: f32,
}

impl PolygonStyle {
    pub fn new(name: impl Into<String>, layer: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            layer: layer.into(),
            extrude: false,
            default_height: 0.0,
            default_min_height: 0.0,
        }
    }

    pub fn extruded(mut self, default_height: f32) -> Self {
        self.extrude = true;
        self.default_height = default_height;
        self
    }
}

impl Style for PolygonStyle {
    fn name(&self) -> &str {
        &self.name
    }

    fn build(&self, tile: &TileContext, data: &TileData) -> Result<Option<Mesh>> {
        let Some(layer) = data.layer(&self.layer) else {
            return Ok(None);
        };
        let extrude = self.extrude && tile.extrusion_enabled;

        let mut buffers = MeshBuffers::new();
        let mut scratch = MeshBuffers::new();
        for feature in &layer.features {
            let FeatureGeometry::Polygon(rings) = &feature.geometry else {
                continue;
            };
            let height = if extrude {
                tile.to_local(feature.number("height").unwrap_or(self.default_height))
            } else {
                0.0
            };

            append_feature(&self.name, &mut buffers, &mut scratch, |part| {
                let points: Vec<_> = rings.iter().flatten().map(|p| lift(p, height)).collect();
                let ring_sizes: Vec<_> = rings.iter().map(Vec::len).collect();
                build_polygon(&points, &ring_sizes, part)?;
                if !extrude {
                    return Ok(());
                }

                let min_height =
                    tile.to_local(feature.number("min_height").unwrap_or(self.default_min_height));
                // Walls need every edge, so each ring is closed before extruding.
                let mut closed = Vec::with_capacity(points.len() + rings.len());
                let mut closed_sizes = Vec::with_capacity(rings.len());
                for ring in rings.iter().filter(|ring| !ring.is_empty()) {
                    closed.extend(ring.iter().map(|p| lift(p, height)));
                    let mut size = ring.len();
                    if ring.first() != ring.last() {
                        closed.push(lift(&ring[0], height));
                        size += 1;
                    }
                    closed_sizes.push(size);
                }
                build_polygon_extrusion(&closed, &closed_sizes, min_height, part)?;
                Ok(())
            });
        }

        log::debug!(
            "style {} built {} triangles for tile {}",
            self.name,
            buffers.triangle_count(),
            tile.id
        );
        Ok(Mesh::from_buffers(buffers))
    }
}

/// Flat ribbons along line features, `width` meters wide.
#[derive(Debug, Clone)]
pub struct PolylineStyle {
    pub name: String,
    pub layer: String,
    pub width: f32,
}

impl PolylineStyle {
    pub fn new(name: impl Into<String>, layer: impl Into<String>, width: f32) -> Self {
        Self {
            name: name.into(),
            layer: layer.into(),
            width,
        }
    }
}

impl Style for PolylineStyle {
    fn name(&self) -> &str {
        &self.name
    }

    fn build(&self, tile: &TileContext, data: &TileData) -> Result<Option<Mesh>> {
        let Some(layer) = data.layer(&self.layer) else {
            return Ok(None);
        };
        let width = tile.to_local(self.width);

        let mut buffers = MeshBuffers::new();
        let mut scratch = MeshBuffers::new();
        for feature in &layer.features {
            if let FeatureGeometry::Line(line) = &feature.geometry {
                let points: Vec<_> = line.iter().map(|p| lift(p, 0.0)).collect();
                append_feature(&self.name, &mut buffers, &mut scratch, |part| {
                    build_poly_line(&points, width, part).map(|_| ())
                });
            }
        }
        Ok(Mesh::from_buffers(buffers))
    }
}

/// Upward-facing square markers, `size` meters across, at point features.
#[derive(Debug, Clone)]
pub struct PointStyle {
    pub name: String,
    pub layer: String,
    pub size: f32,
}

impl PointStyle {
    pub fn new(name: impl Into<String>, layer: impl Into<String>, size: f32) -> Self {
        Self {
            name: name.into(),
            layer: layer.into(),
            size,
        }
    }
}

impl Style for PointStyle {
    fn name(&self) -> &str {
        &self.name
    }

    fn build(&self, tile: &TileContext, data: &TileData) -> Result<Option<Mesh>> {
        let Some(layer) = data.layer(&self.layer) else {
            return Ok(None);
        };
        let size = tile.to_local(self.size);

        let mut buffers = MeshBuffers::new();
        let mut scratch = MeshBuffers::new();
        for feature in &layer.features {
            if let FeatureGeometry::Point(p) = &feature.geometry {
                append_feature(&self.name, &mut buffers, &mut scratch, |part| {
                    build_quad_at_point(lift(p, 0.0), Vector3::z(), size, size, part).map(|_| ())
                });
            }
        }
        Ok(Mesh::from_buffers(buffers))
    }
}
