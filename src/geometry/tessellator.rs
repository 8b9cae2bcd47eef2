//! Polygon triangulation behind a narrow interface.
//!
//! The geometry builders only need "rings in, triangles out" with the nonzero
//! winding rule, so any planar tessellator can be plugged in here.

use lyon::math::point;
use lyon::path::Path;
use lyon::tessellation::{
    BuffersBuilder, FillOptions, FillTessellator, FillVertex, VertexBuffers,
};
use nalgebra::Vector3;

use super::GeometryError;

/// Triangles produced from a set of rings, with indices local to `vertices`.
///
/// Indices are 32-bit so large inputs come back whole; narrowing to the 16-bit
/// mesh range is the caller's check.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Triangulation {
    pub vertices: Vec<Vector3<f32>>,
    pub indices: Vec<u32>,
}

impl Triangulation {
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }
}

pub trait PolygonTessellator: Send + Sync {
    /// Triangulate closed rings on the horizontal plane using the nonzero winding rule.
    ///
    /// The first ring is the outer boundary; holes are expected to wind the
    /// opposite way. Output vertices keep a z coordinate interpolated from the input.
    fn tessellate(&self, rings: &[&[Vector3<f32>]]) -> Result<Triangulation, GeometryError>;
}

/// Default tessellator built on lyon's sweep-line fill tessellator.
#[derive(Debug, Clone, Copy)]
pub struct LyonTessellator {
    tolerance: f32,
}

impl LyonTessellator {
    pub fn new() -> Self {
        Self {
            tolerance: FillOptions::DEFAULT_TOLERANCE,
        }
    }

    pub fn with_tolerance(tolerance: f32) -> Self {
        Self { tolerance }
    }

    fn build_path(rings: &[&[Vector3<f32>]]) -> Path {
        // One custom attribute carries z through the tessellator.
        let mut builder = Path::builder_with_attributes(1);
        for ring in rings {
            let Some((first, rest)) = ring.split_first() else {
                continue;
            };
            builder.begin(point(first.x, first.y), &[first.z]);
            for p in rest {
                builder.line_to(point(p.x, p.y), &[p.z]);
            }
            builder.end(true);
        }
        builder.build()
    }
}

impl Default for LyonTessellator {
    fn default() -> Self {
        Self::new()
    }
}

impl PolygonTessellator for LyonTessellator {
    fn tessellate(&self, rings: &[&[Vector3<f32>]]) -> Result<Triangulation, GeometryError> {
        let finite = rings
            .iter()
            .flat_map(|ring| ring.iter())
            .all(|p| p.x.is_finite() && p.y.is_finite() && p.z.is_finite());
        if !finite {
            return Err(GeometryError::Degenerate(
                "ring contains non-finite coordinates".to_string(),
            ));
        }

        let path = Self::build_path(rings);
        let mut geometry: VertexBuffers<[f32; 3], u32> = VertexBuffers::new();
        let options = FillOptions::non_zero().with_tolerance(self.tolerance);

        FillTessellator::new()
            .tessellate_path(
                &path,
                &options,
                &mut BuffersBuilder::new(&mut geometry, |mut vertex: FillVertex<'_>| {
                    let position = vertex.position();
                    let z = vertex.interpolated_attributes()[0];
                    [position.x, position.y, z]
                }),
            )
            .map_err(|e| GeometryError::Degenerate(format!("tessellator failed: {:?}", e)))?;

        Ok(Triangulation {
            vertices: geometry
                .vertices
                .into_iter()
                .map(|[x, y, z]| Vector3::new(x, y, z))
                .collect(),
            indices: geometry.indices,
        })
    }
}
