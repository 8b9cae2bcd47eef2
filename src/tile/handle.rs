use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use super::state::{AtomicTileState, TileState};
use crate::core::tile_id::TileId;
use crate::Result;

/// Scheduling priority readable and writable from any thread.
///
/// The `f64` is stored as its bit pattern, so a reader always sees one of the
/// values that was actually written.
#[derive(Debug)]
pub struct AtomicPriority(AtomicU64);

impl AtomicPriority {
    pub fn new(value: f64) -> Self {
        Self(AtomicU64::new(value.to_bits()))
    }

    pub fn load(&self) -> f64 {
        f64::from_bits(self.0.load(Ordering::Acquire))
    }

    pub fn store(&self, value: f64) {
        self.0.store(value.to_bits(), Ordering::Release);
    }
}

impl Default for AtomicPriority {
    fn default() -> Self {
        Self::new(0.0)
    }
}

/// The part of a tile that crosses thread boundaries.
#[derive(Debug, Default)]
pub(crate) struct TileShared {
    pub(crate) state: AtomicTileState,
    pub(crate) priority: AtomicPriority,
}

/// Cheap, cloneable reference to a tile's state and priority.
///
/// Worker threads hold handles instead of tiles; everything else about a tile
/// stays with its owner on the main thread.
#[derive(Debug, Clone)]
pub struct TileHandle {
    id: TileId,
    shared: Arc<TileShared>,
}

impl TileHandle {
    pub(crate) fn new(id: TileId, shared: Arc<TileShared>) -> Self {
        Self { id, shared }
    }

    pub fn id(&self) -> TileId {
        self.id
    }

    pub fn state(&self) -> TileState {
        self.shared.state.load()
    }

    pub fn set_state(&self, state: TileState) -> Result<()> {
        let previous = self.shared.state.transition(state)?;
        log::debug!("tile {} {} -> {}", self.id, previous, state);
        Ok(())
    }

    pub fn is_canceled(&self) -> bool {
        self.state() == TileState::Canceled
    }

    /// Cancel the tile unless it already finished. Returns true if this call canceled it.
    pub fn cancel(&self) -> bool {
        match self.shared.state.transition(TileState::Canceled) {
            Ok(previous) if previous != TileState::Canceled => {
                log::debug!("tile {} canceled while {}", self.id, previous);
                true
            }
            _ => false,
        }
    }

    pub fn priority(&self) -> f64 {
        self.shared.priority.load()
    }

    pub fn set_priority(&self, priority: f64) {
        self.shared.priority.store(priority);
    }

    /// True if both handles refer to the same tile instance.
    pub fn same_tile(&self, other: &TileHandle) -> bool {
        Arc::ptr_eq(&self.shared, &other.shared)
    }
}
