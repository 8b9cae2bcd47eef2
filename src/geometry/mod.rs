//! Computational geometry for tile meshes
//!
//! Pure functions that turn feature rings and lines into triangle buffers:
//! - Polygon fills tessellated with the nonzero winding rule
//! - Extruded walls along polygon outlines
//! - Flat line ribbons and point quads

pub mod handler;
pub mod mesh;
pub mod tessellator;

pub use handler::{
    build_poly_line, build_polygon, build_polygon_extrusion, build_polygon_with,
    build_quad_at_point,
};
pub use mesh::{Mesh, MeshBuffers, Vertex};
pub use tessellator::{LyonTessellator, PolygonTessellator, Triangulation};

/// Failures reported by the geometry builders.
///
/// A failed call never leaves partial output behind.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GeometryError {
    #[error("degenerate geometry: {0}")]
    Degenerate(String),

    #[error("index overflow: {required} vertices exceed the 16-bit limit of {limit}")]
    IndexOverflow { required: usize, limit: usize },

    #[error("ring sizes declare {declared} points but only {available} were given")]
    RingOverflow { declared: usize, available: usize },
}
