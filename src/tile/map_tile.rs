//! Tile of vector map data
//!
//! A `Tile` covers a fixed area of the map at a fixed zoom level. It knows its
//! place in the quadtree and in projected global space, and it owns the
//! drawable geometry, labels and text produced for that area by each style.

use nalgebra::{Matrix4, Vector2, Vector3};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use super::handle::{TileHandle, TileShared};
use super::proxy::{ProxyId, Proxies};
use super::state::TileState;
use crate::core::projection::MapProjection;
use crate::core::tile_id::TileId;
use crate::geometry::Mesh;
use crate::prelude::HashMap;
use crate::traits::{Label, LabelContext, RenderContext, TextBuffer, View};
use crate::Result;

pub struct Tile {
    id: TileId,
    shared: Arc<TileShared>,

    /// Center of the tile in projection space
    origin: Vector2<f64>,
    scale: f32,
    inverse_scale: f32,
    /// Tile-local to projection units, without the translation to `origin`.
    ///
    /// Distances from the global origin are too large for `f32`, so the
    /// translation relative to the view origin is applied only when drawing.
    model_matrix: Matrix4<f32>,

    visible: bool,
    proxies: Proxies,
    /// Number of other tiles this tile currently stands in for
    proxy_counter: u32,

    geometry: HashMap<String, Mesh>,
    labels: HashMap<String, Vec<Box<dyn Label>>>,
    buffers: BTreeMap<String, Box<dyn TextBuffer>>,
}

impl Tile {
    /// Place a new tile for `id`, which must be inside the grid (`TileId::is_valid`).
    pub fn new(id: TileId, projection: &dyn MapProjection) -> Self {
        let (min, max) = projection.tile_bounds(id);
        let scale = (max.x - min.x) as f32;

        Self {
            id,
            shared: Arc::new(TileShared::default()),
            origin: (min + max) * 0.5,
            scale,
            inverse_scale: 1.0 / scale,
            model_matrix: Matrix4::new_scaling(scale),
            visible: false,
            proxies: Proxies::empty(),
            proxy_counter: 0,
            geometry: HashMap::default(),
            labels: HashMap::default(),
            buffers: BTreeMap::new(),
        }
    }

    pub fn id(&self) -> TileId {
        self.id
    }

    /// Center of the tile area in projection units
    pub fn origin(&self) -> Vector2<f64> {
        self.origin
    }

    /// Side length of the tile in projection units
    pub fn scale(&self) -> f32 {
        self.scale
    }

    pub fn inverse_scale(&self) -> f32 {
        self.inverse_scale
    }

    pub fn get_model_matrix(&self) -> &Matrix4<f32> {
        &self.model_matrix
    }

    /// Handle for loader threads; shares this tile's state and priority.
    pub fn handle(&self) -> TileHandle {
        TileHandle::new(self.id, self.shared.clone())
    }

    // State

    pub fn get_state(&self) -> TileState {
        self.shared.state.load()
    }

    pub fn has_state(&self, state: TileState) -> bool {
        self.get_state() == state
    }

    /// Move to `state`, rejecting transitions the tile lifecycle does not allow.
    pub fn set_state(&self, state: TileState) -> Result<()> {
        self.handle().set_state(state)
    }

    /// Cancel the tile unless it already finished. Returns true if this call canceled it.
    pub fn cancel(&self) -> bool {
        self.handle().cancel()
    }

    pub fn is_ready(&self) -> bool {
        self.has_state(TileState::Ready)
    }

    pub fn is_canceled(&self) -> bool {
        self.has_state(TileState::Canceled)
    }

    /// Whether this tile is in the current set of visible tiles
    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    pub fn get_priority(&self) -> f64 {
        self.shared.priority.load()
    }

    pub fn set_priority(&self, priority: f64) {
        self.shared.priority.store(priority);
    }

    // Proxies

    /// Returns true if the flag was newly set.
    pub fn set_proxy(&mut self, id: ProxyId) -> bool {
        let flag = Proxies::from(id);
        let changed = !self.proxies.contains(flag);
        self.proxies.insert(flag);
        changed
    }

    /// Returns true if the flag was set before this call.
    pub fn unset_proxy(&mut self, id: ProxyId) -> bool {
        let flag = Proxies::from(id);
        let changed = self.proxies.contains(flag);
        self.proxies.remove(flag);
        changed
    }

    pub fn has_proxy(&self, id: ProxyId) -> bool {
        self.proxies.has(id)
    }

    pub fn proxies(&self) -> Proxies {
        self.proxies
    }

    pub fn get_proxy_counter(&self) -> u32 {
        self.proxy_counter
    }

    pub fn inc_proxy_counter(&mut self) {
        self.proxy_counter += 1;
    }

    /// Decrement, stopping at zero.
    pub fn dec_proxy_counter(&mut self) {
        self.proxy_counter = self.proxy_counter.saturating_sub(1);
    }

    pub fn reset_proxy_counter(&mut self) {
        self.proxy_counter = 0;
    }

    // Drawables

    /// Attach geometry for a style, replacing any earlier mesh for it.
    ///
    /// Mesh coordinates must be relative to the tile origin.
    pub fn add_geometry(&mut self, style: impl Into<String>, mesh: Mesh) {
        self.geometry.insert(style.into(), mesh);
    }

    pub fn get_geometry(&self, style: &str) -> Option<&Mesh> {
        self.geometry.get(style)
    }

    pub fn styles(&self) -> impl Iterator<Item = &str> {
        self.geometry.keys().map(String::as_str)
    }

    pub fn add_label(&mut self, style: impl Into<String>, label: Box<dyn Label>) {
        self.labels.entry(style.into()).or_default().push(label);
    }

    pub fn labels(&self, style: &str) -> &[Box<dyn Label>] {
        self.labels.get(style).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn set_text_buffer(&mut self, style: impl Into<String>, buffer: Box<dyn TextBuffer>) {
        self.buffers.insert(style.into(), buffer);
    }

    pub fn get_text_buffer(&self, style: &str) -> Option<&dyn TextBuffer> {
        self.buffers.get(style).map(|buffer| buffer.as_ref())
    }

    /// Text buffers in style name order
    pub fn text_buffers(&self) -> impl Iterator<Item = (&str, &dyn TextBuffer)> {
        self.buffers
            .iter()
            .map(|(style, buffer)| (style.as_str(), buffer.as_ref()))
    }

    // Frame

    /// Tile-local to view-relative transform.
    ///
    /// The offset between the tile and view origins is taken in `f64` and only
    /// then reduced to `f32`, which keeps far-away tiles from jittering.
    pub fn tile_transform(&self, view: &dyn View) -> Matrix4<f32> {
        let offset = self.origin - view.origin();
        let translation =
            Matrix4::new_translation(&Vector3::new(offset.x as f32, offset.y as f32, 0.0));
        translation * self.model_matrix
    }

    pub fn model_view_projection(&self, view: &dyn View) -> Matrix4<f32> {
        view.view_projection_matrix() * self.tile_transform(view)
    }

    /// Update every style's labels against the current view.
    pub fn update(&mut self, dt: f32, view: &dyn View) {
        if self.labels.is_empty() {
            return;
        }
        let mvp = self.model_view_projection(view);
        let screen_size = view.screen_size();
        for labels in self.labels.values_mut() {
            for label in labels.iter_mut() {
                label.update(&mvp, screen_size, dt);
            }
        }
    }

    /// Update the labels of one style against the current view.
    pub fn update_labels(&mut self, dt: f32, style: &str, view: &dyn View) {
        let mvp = self.model_view_projection(view);
        let screen_size = view.screen_size();
        if let Some(labels) = self.labels.get_mut(style) {
            for label in labels.iter_mut() {
                label.update(&mvp, screen_size, dt);
            }
        }
    }

    /// Push the style's label transforms to the font context, in insertion order.
    pub fn push_label_transforms(&self, style: &str, context: &mut dyn LabelContext) {
        for label in self.labels(style) {
            context.push_transform(style, label.transform());
        }
    }

    /// Draw the style's geometry. Returns false if this tile has none for it.
    pub fn draw(&self, style: &str, view: &dyn View, context: &mut dyn RenderContext) -> bool {
        let Some(mesh) = self.geometry.get(style) else {
            return false;
        };
        let mvp = self.model_view_projection(view);
        context.draw_mesh(style, mesh, &mvp);
        true
    }
}

impl fmt::Debug for Tile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tile")
            .field("id", &self.id)
            .field("state", &self.get_state())
            .field("priority", &self.get_priority())
            .field("visible", &self.visible)
            .field("proxies", &self.proxies)
            .field("proxy_counter", &self.proxy_counter)
            .field("styles", &self.geometry.len())
            .finish()
    }
}
