use nalgebra::Vector3;
use vectile::geometry::{
    build_poly_line, build_polygon, build_polygon_extrusion, build_quad_at_point, GeometryError,
    Mesh, MeshBuffers,
};

/// Integration tests for the mesh builders as styles use them
#[cfg(test)]
mod geometry_tests {
    use super::*;

    fn ring(points: &[(f32, f32)], z: f32) -> Vec<Vector3<f32>> {
        points.iter().map(|&(x, y)| Vector3::new(x, y, z)).collect()
    }

    fn triangle_area(buffers: &MeshBuffers, tri: &[u16]) -> f32 {
        let a = buffers.points[tri[0] as usize];
        let b = buffers.points[tri[1] as usize];
        let c = buffers.points[tri[2] as usize];
        ((b - a).cross(&(c - a))).z.abs() * 0.5
    }

    fn assert_indices_in_range(buffers: &MeshBuffers) {
        assert_eq!(buffers.points.len(), buffers.normals.len());
        assert_eq!(buffers.indices.len() % 3, 0);
        assert!(buffers
            .indices
            .iter()
            .all(|&i| (i as usize) < buffers.points.len()));
    }

    /// Polygons, walls, lines and markers appended to one buffer stay consistent
    #[test]
    fn test_mixed_builders_share_one_buffer() {
        let mut buffers = MeshBuffers::new();
        let square = ring(&[(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0)], 0.3);

        assert_eq!(build_polygon(&square, &[4], &mut buffers).unwrap(), 2);
        let after_fill = buffers.vertex_count();

        let mut closed = square.clone();
        closed.push(square[0]);
        assert_eq!(build_polygon_extrusion(&closed, &[5], 0.0, &mut buffers).unwrap(), 8);
        assert_eq!(buffers.vertex_count(), after_fill + 16);

        let line = ring(&[(0.0, 0.0), (0.5, 0.0), (0.5, 0.5)], 0.0);
        assert_eq!(build_poly_line(&line, 0.1, &mut buffers).unwrap(), 4);

        let marker = build_quad_at_point(Vector3::zeros(), Vector3::z(), 0.2, 0.2, &mut buffers);
        assert_eq!(marker.unwrap(), 2);

        assert_indices_in_range(&buffers);
        assert_eq!(buffers.triangle_count(), 16);

        let mesh = Mesh::from_buffers(buffers).unwrap();
        assert_eq!(mesh.vertex_bytes().len(), mesh.vertices().len() * 24);
        assert_eq!(mesh.index_bytes().len(), mesh.indices().len() * 2);
    }

    /// Second polygon's indices start at the vertex count found before the call
    #[test]
    fn test_second_polygon_is_offset() {
        let mut buffers = MeshBuffers::new();
        let first = ring(&[(0.0, 0.0), (1.0, 0.0), (0.0, 1.0)], 0.0);
        let second = ring(&[(5.0, 5.0), (6.0, 5.0), (5.0, 6.0)], 0.0);

        build_polygon(&first, &[3], &mut buffers).unwrap();
        let offset = buffers.vertex_count() as u16;
        build_polygon(&second, &[3], &mut buffers).unwrap();

        assert!(buffers.indices[3..].iter().all(|&i| i >= offset));
        assert!(buffers.indices[..3].iter().all(|&i| i < offset));
        assert_indices_in_range(&buffers);
    }

    /// Overlapping rings with the same winding are filled once, not cut out
    #[test]
    fn test_nonzero_fill_of_overlapping_rings() {
        let mut buffers = MeshBuffers::new();
        let mut points = ring(&[(0.0, 0.0), (2.0, 0.0), (2.0, 2.0), (0.0, 2.0)], 0.0);
        points.extend(ring(&[(1.0, 1.0), (3.0, 1.0), (3.0, 3.0), (1.0, 3.0)], 0.0));

        build_polygon(&points, &[4, 4], &mut buffers).unwrap();
        let area: f32 = buffers
            .indices
            .chunks(3)
            .map(|tri| triangle_area(&buffers, tri))
            .sum();
        // Union of two 2x2 squares overlapping in a 1x1 square.
        assert!((area - 7.0).abs() < 1e-3, "area was {}", area);
    }

    /// A hole wound the opposite way is left empty
    #[test]
    fn test_hole_is_left_empty() {
        let mut buffers = MeshBuffers::new();
        let mut points = ring(&[(0.0, 0.0), (4.0, 0.0), (4.0, 4.0), (0.0, 4.0)], 0.0);
        points.extend(ring(&[(1.0, 1.0), (1.0, 3.0), (3.0, 3.0), (3.0, 1.0)], 0.0));

        build_polygon(&points, &[4, 4], &mut buffers).unwrap();
        let area: f32 = buffers
            .indices
            .chunks(3)
            .map(|tri| triangle_area(&buffers, tri))
            .sum();
        assert!((area - 12.0).abs() < 1e-3, "area was {}", area);
        assert!(buffers.normals.iter().all(|n| *n == Vector3::z()));
    }

    /// Each ring of n points yields n - 1 wall quads
    #[test]
    fn test_extrusion_quad_count_per_ring() {
        let mut buffers = MeshBuffers::new();
        let mut points = ring(&[(0.0, 0.0), (1.0, 0.0), (1.0, 1.0)], 2.0);
        points.extend(ring(&[(5.0, 5.0), (6.0, 5.0), (6.0, 6.0), (5.0, 6.0), (5.0, 5.0)], 2.0));

        let triangles = build_polygon_extrusion(&points, &[3, 5], 0.5, &mut buffers).unwrap();
        assert_eq!(triangles, (2 + 4) * 2);
        assert_eq!(buffers.vertex_count(), (2 + 4) * 4);
        assert_indices_in_range(&buffers);

        // Walls run from the ring's own height down to the minimum.
        assert!(buffers
            .points
            .iter()
            .all(|p| p.z == 2.0 || p.z == 0.5));
        assert!(buffers
            .normals
            .iter()
            .all(|n| n.z == 0.0 && (n.norm() - 1.0).abs() < 1e-5));
    }

    /// Errors leave the buffers untouched
    #[test]
    fn test_failures_do_not_write() {
        let mut buffers = MeshBuffers::new();
        let square = ring(&[(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0)], 0.0);
        build_polygon(&square, &[4], &mut buffers).unwrap();
        let before = buffers.clone();

        let line = ring(&[(0.0, 0.0), (1.0, 1.0)], 0.0);
        assert!(matches!(
            build_polygon(&line, &[2], &mut buffers),
            Err(GeometryError::Degenerate(_))
        ));
        assert!(matches!(
            build_polygon(&square, &[4, 4], &mut buffers),
            Err(GeometryError::RingOverflow { declared: 8, available: 4 })
        ));
        assert!(build_poly_line(&line, 0.0, &mut buffers).is_err());
        assert_eq!(buffers, before);
    }

    /// Building past the 16-bit index range is refused
    #[test]
    fn test_index_overflow_is_refused() {
        let mut buffers = MeshBuffers::new();
        buffers.points = vec![Vector3::zeros(); 65_534];
        buffers.normals = vec![Vector3::z(); 65_534];

        let square = ring(&[(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0)], 0.0);
        let result = build_polygon(&square, &[4], &mut buffers);
        assert!(matches!(result, Err(GeometryError::IndexOverflow { .. })));

        let mut closed = square.clone();
        closed.push(square[0]);
        let result = build_polygon_extrusion(&closed, &[5], 0.0, &mut buffers);
        assert!(matches!(result, Err(GeometryError::IndexOverflow { .. })));

        assert_eq!(buffers.vertex_count(), 65_534);
        assert!(buffers.indices.is_empty());
    }

    #[test]
    fn test_polygon_filling_the_index_range_exactly() {
        let mut buffers = MeshBuffers::new();
        buffers.points = vec![Vector3::zeros(); 65_532];
        buffers.normals = vec![Vector3::z(); 65_532];

        let square = ring(&[(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0)], 0.0);
        assert_eq!(build_polygon(&square, &[4], &mut buffers), Ok(2));
        assert_eq!(buffers.vertex_count(), 65_536);
        assert_eq!(buffers.indices.iter().max(), Some(&u16::MAX));
        assert_indices_in_range(&buffers);
    }

    #[test]
    fn test_extrusion_filling_the_index_range_exactly() {
        // 16385 points make 16384 quads, exactly 65536 vertices.
        let wall: Vec<_> = (0..16_385)
            .map(|i| Vector3::new(i as f32 * 0.01, 0.0, 1.0))
            .collect();
        let mut buffers = MeshBuffers::new();

        assert_eq!(
            build_polygon_extrusion(&wall, &[wall.len()], 0.0, &mut buffers),
            Ok(32_768)
        );
        assert_eq!(buffers.vertex_count(), 65_536);
        assert_eq!(buffers.indices.len(), 32_768 * 3);
        assert_eq!(buffers.indices.iter().max(), Some(&u16::MAX));
        assert_indices_in_range(&buffers);
    }

    #[test]
    fn test_oversized_polygon_reports_index_overflow() {
        let n = 70_000;
        let circle: Vec<_> = (0..n)
            .map(|i| {
                let angle = i as f32 / n as f32 * std::f32::consts::TAU;
                Vector3::new(10_000.0 * angle.cos(), 10_000.0 * angle.sin(), 0.0)
            })
            .collect();
        let mut buffers = MeshBuffers::new();

        match build_polygon(&circle, &[n], &mut buffers) {
            Err(GeometryError::IndexOverflow { required, limit }) => {
                assert!(required > limit);
                assert_eq!(limit, 65_536);
            }
            other => panic!("expected index overflow, got {:?}", other),
        }
        assert_eq!(buffers, MeshBuffers::new());
    }
}
