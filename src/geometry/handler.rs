//! Mesh builders for tile features.
//!
//! Every builder appends to a `MeshBuffers` so several features can share one
//! mesh. New indices are offset by the vertex count found in the buffer before
//! the call. Work is validated up front and written only on success, so an
//! error leaves the buffers exactly as they were.

use nalgebra::Vector3;
use std::iter;

use super::mesh::MeshBuffers;
use super::tessellator::{LyonTessellator, PolygonTessellator};
use super::GeometryError;
use crate::core::constants::MAX_INDEXED_VERTICES;

fn up() -> Vector3<f32> {
    Vector3::z()
}

/// Split `points` into consecutive rings of `ring_sizes[i]` points each.
fn split_rings<'a>(
    points: &'a [Vector3<f32>],
    ring_sizes: &[usize],
) -> Result<Vec<&'a [Vector3<f32>]>, GeometryError> {
    let declared = ring_sizes
        .iter()
        .try_fold(0usize, |acc, &size| acc.checked_add(size))
        .unwrap_or(usize::MAX);
    if declared > points.len() {
        return Err(GeometryError::RingOverflow {
            declared,
            available: points.len(),
        });
    }

    let mut rings = Vec::with_capacity(ring_sizes.len());
    let mut start = 0;
    for &size in ring_sizes {
        rings.push(&points[start..start + size]);
        start += size;
    }
    Ok(rings)
}

fn check_index_range(offset: usize, added: usize) -> Result<(), GeometryError> {
    let required = offset.saturating_add(added);
    if required > MAX_INDEXED_VERTICES {
        return Err(GeometryError::IndexOverflow {
            required,
            limit: MAX_INDEXED_VERTICES,
        });
    }
    Ok(())
}

/// Append one quad laid out as `[start_a, start_b, end_a, end_b]`.
///
/// Triangles are `(o, o+1, o+2)` and `(o+1, o+3, o+2)`; the caller has already
/// checked that `o + 3` fits in 16 bits.
fn push_quad(out: &mut MeshBuffers, corners: [Vector3<f32>; 4], normal: Vector3<f32>) {
    let o = out.points.len() as u16;
    out.points.extend_from_slice(&corners);
    out.normals.extend(iter::repeat(normal).take(4));
    out.indices
        .extend_from_slice(&[o, o + 1, o + 2, o + 1, o + 3, o + 2]);
}

fn report<T>(operation: &str, result: Result<T, GeometryError>) -> Result<T, GeometryError> {
    if let Err(e) = &result {
        log::warn!("{} dropped feature: {}", operation, e);
    }
    result
}

/// Tessellate a polygon (outer ring followed by holes) into flat triangles.
///
/// `ring_sizes` holds the point count of each ring. Rings with fewer than
/// three points are ignored. Every emitted normal is `(0, 0, 1)`.
/// Returns the number of triangles appended.
pub fn build_polygon(
    points: &[Vector3<f32>],
    ring_sizes: &[usize],
    out: &mut MeshBuffers,
) -> Result<usize, GeometryError> {
    build_polygon_with(&LyonTessellator::new(), points, ring_sizes, out)
}

/// Same as [`build_polygon`] with a caller-supplied tessellator.
pub fn build_polygon_with<T: PolygonTessellator + ?Sized>(
    tessellator: &T,
    points: &[Vector3<f32>],
    ring_sizes: &[usize],
    out: &mut MeshBuffers,
) -> Result<usize, GeometryError> {
    let result: Result<usize, GeometryError> = (|| {
        let contours: Vec<_> = split_rings(points, ring_sizes)?
            .into_iter()
            .filter(|ring| ring.len() >= 3)
            .collect();
        if contours.is_empty() {
            return Err(GeometryError::Degenerate(
                "polygon has no ring with at least three points".to_string(),
            ));
        }

        let triangulation = tessellator.tessellate(&contours)?;
        if triangulation.indices.is_empty() {
            return Err(GeometryError::Degenerate(
                "tessellation produced no triangles".to_string(),
            ));
        }

        let vertex_data_offset = out.points.len();
        check_index_range(vertex_data_offset, triangulation.vertices.len())?;

        // In range after the check above.
        out.indices.extend(
            triangulation
                .indices
                .iter()
                .map(|&i| (vertex_data_offset + i as usize) as u16),
        );
        out.normals
            .extend(iter::repeat(up()).take(triangulation.vertices.len()));
        out.points.extend(triangulation.vertices);
        Ok(triangulation.indices.len() / 3)
    })();

    report("build_polygon", result)
}

/// Build vertical walls from each ring's points down to `min_feature_height`.
///
/// Each consecutive pair of points inside a ring becomes one quad with a flat
/// outward normal `normalize(up x edge)`. Rings are left open: the last point is
/// only joined to the first if the caller repeats it. A ring of `n` points
/// therefore yields `n - 1` quads.
pub fn build_polygon_extrusion(
    points: &[Vector3<f32>],
    ring_sizes: &[usize],
    min_feature_height: f32,
    out: &mut MeshBuffers,
) -> Result<usize, GeometryError> {
    let result: Result<usize, GeometryError> = (|| {
        let rings = split_rings(points, ring_sizes)?;
        let quads: usize = rings.iter().map(|ring| ring.len().saturating_sub(1)).sum();
        if quads == 0 {
            return Ok(0);
        }
        check_index_range(out.points.len(), quads * 4)?;

        for ring in rings {
            for edge in ring.windows(2) {
                let (start, end) = (edge[0], edge[1]);
                // Zero-length edges have no direction to face.
                let normal = up()
                    .cross(&(end - start))
                    .try_normalize(f32::EPSILON)
                    .unwrap_or_else(Vector3::zeros);
                push_quad(
                    out,
                    [
                        start,
                        end,
                        Vector3::new(start.x, start.y, min_feature_height),
                        Vector3::new(end.x, end.y, min_feature_height),
                    ],
                    normal,
                );
            }
        }
        Ok(quads * 2)
    })();

    report("build_polygon_extrusion", result)
}

/// Build a flat ribbon of `width` along a polyline.
///
/// Each segment becomes its own quad facing `(0, 0, 1)`; joins are not filled.
/// Segments with no horizontal length are skipped.
pub fn build_poly_line(
    points: &[Vector3<f32>],
    width: f32,
    out: &mut MeshBuffers,
) -> Result<usize, GeometryError> {
    let result: Result<usize, GeometryError> = (|| {
        if !(width.is_finite() && width > 0.0) {
            return Err(GeometryError::Degenerate(format!(
                "line width must be positive, got {}",
                width
            )));
        }

        let offsets: Vec<_> = points
            .windows(2)
            .filter_map(|segment| {
                let (start, end) = (segment[0], segment[1]);
                let direction = (end - start).xy().try_normalize(f32::EPSILON)?;
                let half = Vector3::new(-direction.y, direction.x, 0.0) * (width * 0.5);
                Some((start, end, half))
            })
            .collect();
        if offsets.is_empty() {
            return Ok(0);
        }
        check_index_range(out.points.len(), offsets.len() * 4)?;

        for (start, end, half) in &offsets {
            push_quad(
                out,
                [start + half, end + half, start - half, end - half],
                up(),
            );
        }
        Ok(offsets.len() * 2)
    })();

    report("build_poly_line", result)
}

/// Build a `width` x `height` quad centered on `point`, facing along `normal`.
pub fn build_quad_at_point(
    point: Vector3<f32>,
    normal: Vector3<f32>,
    width: f32,
    height: f32,
    out: &mut MeshBuffers,
) -> Result<usize, GeometryError> {
    let result: Result<usize, GeometryError> = (|| {
        let normal = normal.try_normalize(f32::EPSILON).ok_or_else(|| {
            GeometryError::Degenerate("quad normal has zero length".to_string())
        })?;
        check_index_range(out.points.len(), 4)?;

        // A quad facing straight up lies in the xy plane.
        let u = normal
            .cross(&up())
            .try_normalize(f32::EPSILON)
            .unwrap_or_else(Vector3::x);
        let v = normal.cross(&u);
        let (du, dv) = (u * (width * 0.5), v * (height * 0.5));

        push_quad(
            out,
            [point - du + dv, point + du + dv, point - du - dv, point + du - dv],
            normal,
        );
        Ok(2)
    })();

    report("build_quad_at_point", result)
}
