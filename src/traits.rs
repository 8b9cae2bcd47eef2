//! Collaborator interfaces
//!
//! The tile core does not own a camera, a text renderer or a GPU device. These
//! traits describe the narrow surface it needs from each of them.

use nalgebra::{Matrix4, Vector2};

use crate::geometry::Mesh;

/// Camera state supplied to tiles once per frame.
pub trait View {
    /// Combined view and projection transform, relative to `origin()`.
    fn view_projection_matrix(&self) -> Matrix4<f32>;

    /// Position of the camera in projection units.
    ///
    /// Kept in double precision; tiles subtract their own origin from it before
    /// anything is reduced to `f32`.
    fn origin(&self) -> Vector2<f64>;

    /// Viewport size in pixels
    fn screen_size(&self) -> Vector2<f32>;

    /// Fractional zoom level of the camera
    fn zoom(&self) -> f64;
}

/// Screen-space placement of a label after an update
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LabelTransform {
    pub screen_position: Vector2<f32>,
    pub rotation: f32,
    pub alpha: f32,
}

/// A label placed on a tile by the label subsystem.
pub trait Label: Send {
    /// Advance fades and reproject the label against the tile's transform.
    fn update(&mut self, mvp: &Matrix4<f32>, screen_size: Vector2<f32>, dt: f32);

    fn transform(&self) -> LabelTransform;
}

/// Font rendering context that receives label transforms before text is drawn.
pub trait LabelContext {
    fn push_transform(&mut self, style: &str, transform: LabelTransform);
}

/// Glyph geometry for one style on one tile.
pub trait TextBuffer: Send {
    fn glyph_count(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.glyph_count() == 0
    }
}

/// Sink for draw calls issued by tiles.
pub trait RenderContext {
    fn draw_mesh(&mut self, style: &str, mesh: &Mesh, mvp: &Matrix4<f32>);
}
