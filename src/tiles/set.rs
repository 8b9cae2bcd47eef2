//! Tile set management
//!
//! `TileSet` is the main-thread owner of every tracked `Tile`. Each frame it
//! - creates tiles for newly visible ids and revises priorities
//! - links tiles that are not ready to ready ancestors or children standing in for them
//! - attaches finished worker results
//! - cancels and eventually drops tiles nobody needs any more

use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::Arc;

use super::worker::TileResult;
use crate::core::config::EngineConfig;
use crate::core::projection::MapProjection;
use crate::core::tile_id::TileId;
use crate::prelude::{HashMap, HashSet};
use crate::tile::{ProxyId, Tile, TileHandle, TileState};
use crate::traits::{RenderContext, View};

/// Tile that `proxy` on `id` refers to.
pub fn proxy_target(id: TileId, proxy: ProxyId) -> Option<TileId> {
    match proxy {
        ProxyId::Parent => id.parent(),
        ProxyId::Parent2 => id.ancestor(2),
        child => {
            let index = ProxyId::CHILDREN.iter().position(|c| *c == child)?;
            id.children().map(|children| children[index])
        }
    }
}

/// Load priority of a visible tile: higher is more urgent.
///
/// Tiles at the view's zoom level near the view center come first; every zoom
/// level of difference costs as much as one tile width of distance.
pub fn view_priority(tile: &Tile, view: &dyn View) -> f64 {
    let distance = (tile.origin() - view.origin()).norm() / tile.scale() as f64;
    -((tile.id().zoom as f64 - view.zoom()).abs() + distance)
}

pub struct TileSet {
    projection: Arc<dyn MapProjection>,
    config: EngineConfig,
    tiles: HashMap<TileId, Tile>,
    /// Tiles that are neither visible nor standing in for another tile,
    /// least recently released first
    retained: LruCache<TileId, ()>,
}

impl TileSet {
    pub fn new(projection: Arc<dyn MapProjection>, config: EngineConfig) -> Self {
        let capacity = NonZeroUsize::new(config.cache_size).unwrap_or(NonZeroUsize::MIN);
        Self {
            projection,
            config,
            tiles: HashMap::default(),
            retained: LruCache::new(capacity),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn get(&self, id: &TileId) -> Option<&Tile> {
        self.tiles.get(id)
    }

    pub fn get_mut(&mut self, id: &TileId) -> Option<&mut Tile> {
        self.tiles.get_mut(id)
    }

    pub fn tiles(&self) -> impl Iterator<Item = &Tile> {
        self.tiles.values()
    }

    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    /// Number of tracked tiles waiting to be dropped
    pub fn retained(&self) -> usize {
        self.retained.len()
    }

    /// Apply the current visible set.
    ///
    /// Returns handles of tiles created by this call; they are in the `None`
    /// state and should be queued for loading.
    pub fn update(&mut self, visible: &[TileId], view: &dyn View) -> Vec<TileHandle> {
        let wanted: HashSet<TileId> = visible.iter().copied().filter(TileId::is_valid).collect();
        let mut created = Vec::new();

        for &id in &wanted {
            let stale = self.tiles.get(&id).map_or(true, Tile::is_canceled);
            if stale {
                if self.tiles.contains_key(&id) {
                    self.unlink_all(id);
                    self.tiles.remove(&id);
                }
                let tile = Tile::new(id, self.projection.as_ref());
                created.push(tile.handle());
                self.tiles.insert(id, tile);
            }
        }

        for (id, tile) in self.tiles.iter_mut() {
            let is_wanted = wanted.contains(id);
            tile.set_visible(is_wanted);
            if is_wanted {
                tile.set_priority(view_priority(tile, view));
            } else {
                tile.set_priority(f64::NEG_INFINITY);
            }
        }

        self.refresh_proxies();
        self.evict();

        if !created.is_empty() {
            log::debug!("tile set created {} tiles, tracking {}", created.len(), self.tiles.len());
        }
        created
    }

    /// Attach a worker result to its tile. Returns true if the tile became ready.
    pub fn attach(&mut self, result: TileResult) -> bool {
        let (handle, meshes) = match result {
            TileResult::Built { handle, meshes } => (handle, meshes),
            TileResult::Failed { handle, error } => {
                log::debug!("tile {} failed to load: {}", handle.id(), error);
                return false;
            }
        };

        let id = handle.id();
        let Some(tile) = self.tiles.get_mut(&id) else {
            log::debug!("discarding result for untracked tile {}", id);
            return false;
        };
        if !tile.handle().same_tile(&handle) || tile.is_canceled() {
            log::debug!("discarding result for canceled tile {}", id);
            return false;
        }

        for (style, mesh) in meshes {
            tile.add_geometry(style, mesh);
        }
        if let Err(e) = tile.set_state(TileState::Ready) {
            log::warn!("tile {} could not become ready: {}", id, e);
            return false;
        }

        // A ready tile draws itself; release whatever stood in for it.
        self.unlink_all(id);
        self.refresh_proxies();
        true
    }

    /// Ids of tiles to draw this frame: ready visible tiles plus the ready
    /// tiles standing in for visible ones, in `TileId` order.
    pub fn render_list(&self) -> Vec<TileId> {
        let mut ids: Vec<TileId> = self
            .tiles
            .values()
            .filter(|tile| tile.is_visible())
            .flat_map(|tile| {
                let own = tile.is_ready().then(|| tile.id());
                let proxies = tile
                    .proxies()
                    .relations()
                    .filter_map(move |proxy| proxy_target(tile.id(), proxy))
                    .collect::<Vec<_>>();
                own.into_iter().chain(proxies)
            })
            .filter(|id| self.tiles.get(id).map_or(false, Tile::is_ready))
            .collect();
        ids.sort();
        ids.dedup();
        ids
    }

    /// Advance label state on every tile in the render list.
    pub fn update_drawables(&mut self, dt: f32, view: &dyn View) {
        for id in self.render_list() {
            if let Some(tile) = self.tiles.get_mut(&id) {
                tile.update(dt, view);
            }
        }
    }

    /// Draw each style across the render list, coarse tiles first. Returns the draw count.
    pub fn draw(&self, styles: &[&str], view: &dyn View, context: &mut dyn RenderContext) -> usize {
        let order = self.render_list();
        let mut draws = 0;
        for style in styles {
            for id in &order {
                if let Some(tile) = self.tiles.get(id) {
                    if tile.draw(style, view, context) {
                        draws += 1;
                    }
                }
            }
        }
        draws
    }

    fn is_ready(&self, id: &TileId) -> bool {
        self.tiles.get(id).map_or(false, Tile::is_ready)
    }

    /// Proxies a visible, unready tile should use right now.
    fn desired_proxies(&self, id: TileId) -> Vec<ProxyId> {
        for level in 1..=self.config.max_proxy_depth {
            if let Some(proxy) = ProxyId::ancestor(level) {
                if proxy_target(id, proxy).map_or(false, |target| self.is_ready(&target)) {
                    return vec![proxy];
                }
            }
        }
        ProxyId::CHILDREN
            .into_iter()
            .filter(|proxy| proxy_target(id, *proxy).map_or(false, |target| self.is_ready(&target)))
            .collect()
    }

    /// Set `proxy` on `id` and count it on the target, in lockstep.
    fn link(&mut self, id: TileId, proxy: ProxyId) {
        let Some(target) = proxy_target(id, proxy) else {
            return;
        };
        let changed = self
            .tiles
            .get_mut(&id)
            .map_or(false, |tile| tile.set_proxy(proxy));
        if changed {
            if let Some(target) = self.tiles.get_mut(&target) {
                target.inc_proxy_counter();
            }
        }
    }

    /// Clear `proxy` on `id` and release it on the target, in lockstep.
    fn unlink(&mut self, id: TileId, proxy: ProxyId) {
        let changed = self
            .tiles
            .get_mut(&id)
            .map_or(false, |tile| tile.unset_proxy(proxy));
        if changed {
            if let Some(target) = proxy_target(id, proxy).and_then(|t| self.tiles.get_mut(&t)) {
                target.dec_proxy_counter();
            }
        }
    }

    fn unlink_all(&mut self, id: TileId) {
        let Some(proxies) = self.tiles.get(&id).map(Tile::proxies) else {
            return;
        };
        for proxy in proxies.relations() {
            self.unlink(id, proxy);
        }
    }

    fn refresh_proxies(&mut self) {
        let ids: Vec<TileId> = self.tiles.keys().copied().collect();
        for id in ids {
            let needs_proxy = self
                .tiles
                .get(&id)
                .map_or(false, |tile| tile.is_visible() && !tile.is_ready());
            if !needs_proxy {
                self.unlink_all(id);
                continue;
            }

            let desired = self.desired_proxies(id);
            let current = self.tiles.get(&id).map(Tile::proxies).unwrap_or_default();
            for proxy in current.relations().filter(|proxy| !desired.contains(proxy)) {
                self.unlink(id, proxy);
            }
            for proxy in desired {
                self.link(id, proxy);
            }
        }
    }

    /// Cancel unneeded tiles and drop the ones pushed out of the retention cache.
    fn evict(&mut self) {
        let mut released = Vec::new();
        for (id, tile) in &self.tiles {
            if tile.is_visible() || tile.get_proxy_counter() > 0 {
                self.retained.pop(id);
            } else if !self.retained.contains(id) {
                released.push(*id);
            }
        }
        released.sort();

        for id in released {
            let Some(tile) = self.tiles.get(&id) else {
                continue;
            };
            tile.cancel();
            if let Some((old, ())) = self.retained.push(id, ()) {
                if let Some(tile) = self.tiles.remove(&old) {
                    log::debug!("evicted tile {} ({})", old, tile.get_state());
                }
            }
        }
    }
}
