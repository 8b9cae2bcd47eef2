use bytemuck::{Pod, Zeroable};
use nalgebra::Vector3;

use super::GeometryError;
use crate::core::constants::MAX_INDEXED_VERTICES;

/// Accumulating output of the geometry builders.
///
/// Builders append to these vectors; indices always refer to positions in
/// `points` counted from the start of the buffer, not from the start of the call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeshBuffers {
    pub points: Vec<Vector3<f32>>,
    pub normals: Vec<Vector3<f32>>,
    pub indices: Vec<u16>,
}

impl MeshBuffers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn vertex_count(&self) -> usize {
        self.points.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    pub fn clear(&mut self) {
        self.points.clear();
        self.normals.clear();
        self.indices.clear();
    }

    /// Append all of `other`, rebasing its indices past the vertices already here.
    ///
    /// Nothing is written if the combined vertex count would not fit 16-bit indices.
    pub fn append(&mut self, other: &MeshBuffers) -> Result<(), GeometryError> {
        let base = self.points.len();
        let required = base.saturating_add(other.points.len());
        if required > MAX_INDEXED_VERTICES {
            return Err(GeometryError::IndexOverflow {
                required,
                limit: MAX_INDEXED_VERTICES,
            });
        }

        let base = base as u16;
        self.indices.extend(other.indices.iter().map(|&i| base + i));
        self.points.extend_from_slice(&other.points);
        self.normals.extend_from_slice(&other.normals);
        Ok(())
    }
}

/// Interleaved vertex layout uploaded to the GPU
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
}

/// Drawable geometry of one style on one tile.
///
/// Positions are relative to the tile origin, in tile-local units.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Mesh {
    vertices: Vec<Vertex>,
    indices: Vec<u16>,
}

impl Mesh {
    /// Interleave builder output into a mesh. Returns `None` if the buffers hold no triangles.
    pub fn from_buffers(buffers: MeshBuffers) -> Option<Self> {
        if buffers.is_empty() {
            return None;
        }
        let vertices = buffers
            .points
            .iter()
            .zip(buffers.normals.iter())
            .map(|(p, n)| Vertex {
                position: [p.x, p.y, p.z],
                normal: [n.x, n.y, n.z],
            })
            .collect();
        Some(Self {
            vertices,
            indices: buffers.indices,
        })
    }

    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    pub fn indices(&self) -> &[u16] {
        &self.indices
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Raw vertex bytes for buffer upload.
    pub fn vertex_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.vertices)
    }

    /// Raw index bytes for buffer upload.
    pub fn index_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.indices)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mesh_interleaves_buffers() {
        let mut buffers = MeshBuffers::new();
        buffers.points.push(Vector3::new(0.0, 0.0, 1.0));
        buffers.points.push(Vector3::new(1.0, 0.0, 1.0));
        buffers.points.push(Vector3::new(0.0, 1.0, 1.0));
        buffers.normals.extend([Vector3::z(); 3]);
        buffers.indices.extend([0, 1, 2]);

        let mesh = Mesh::from_buffers(buffers).unwrap();
        assert_eq!(mesh.vertices().len(), 3);
        assert_eq!(mesh.vertices()[1].position, [1.0, 0.0, 1.0]);
        assert_eq!(mesh.vertices()[1].normal, [0.0, 0.0, 1.0]);
        assert_eq!(mesh.triangle_count(), 1);
        assert_eq!(mesh.vertex_bytes().len(), 3 * std::mem::size_of::<Vertex>());
        assert_eq!(mesh.index_bytes().len(), 6);
    }

    fn triangle(z: f32) -> MeshBuffers {
        MeshBuffers {
            points: vec![
                Vector3::new(0.0, 0.0, z),
                Vector3::new(1.0, 0.0, z),
                Vector3::new(0.0, 1.0, z),
            ],
            normals: vec![Vector3::z(); 3],
            indices: vec![0, 1, 2],
        }
    }

    #[test]
    fn test_append_rebases_indices() {
        let mut buffers = triangle(0.0);
        buffers.append(&triangle(1.0)).unwrap();
        assert_eq!(buffers.vertex_count(), 6);
        assert_eq!(buffers.indices, vec![0, 1, 2, 3, 4, 5]);
        assert_eq!(buffers.points[3].z, 1.0);
        assert_eq!(buffers.normals.len(), 6);
    }

    #[test]
    fn test_append_refuses_overflow_untouched() {
        let mut buffers = MeshBuffers::new();
        buffers
            .points
            .resize(MAX_INDEXED_VERTICES - 2, Vector3::zeros());
        buffers
            .normals
            .resize(MAX_INDEXED_VERTICES - 2, Vector3::z());
        let before = buffers.clone();

        assert_eq!(
            buffers.append(&triangle(0.0)),
            Err(GeometryError::IndexOverflow {
                required: MAX_INDEXED_VERTICES + 1,
                limit: MAX_INDEXED_VERTICES,
            })
        );
        assert_eq!(buffers, before);
    }

    #[test]
    fn test_empty_buffers_have_no_mesh() {
        assert!(Mesh::from_buffers(MeshBuffers::new()).is_none());
    }
}
