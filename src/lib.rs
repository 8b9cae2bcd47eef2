//! # Vectile
//!
//! Tile geometry core for a vector map engine.
//!
//! The crate covers the part of the engine between decoded tile data and the
//! renderer: tile identity and lifecycle, proxy bookkeeping while tiles load,
//! and the geometry builders that turn polygon rings into triangle meshes.

pub mod core;
pub mod geometry;
pub mod prelude;
pub mod style;
pub mod tile;
pub mod tiles;
pub mod traits;

pub use crate::core::constants;

// Re-export public API
pub use crate::core::{EngineConfig, EngineProfile, MapProjection, MercatorProjection, TileId};

pub use geometry::{build_polygon, build_polygon_extrusion, GeometryError, Mesh, MeshBuffers};

pub use style::{PointStyle, PolygonStyle, PolylineStyle, Style, TileContext};

pub use tile::{ProxyId, Tile, TileHandle, TileState};

pub use tiles::{MemoryTileSource, TileData, TileResult, TileSet, TileSource, TileWorker};

pub use traits::{Label, LabelContext, RenderContext, TextBuffer, View};

/// Result type used throughout the library
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid tile state transition {from} -> {to}")]
    InvalidTransition { from: TileState, to: TileState },

    #[error("tile {0} not found")]
    TileNotFound(TileId),

    #[error("Source error: {0}")]
    Source(String),

    #[error("Geometry error: {0}")]
    Geometry(#[from] GeometryError),

    #[error("Configuration error: {0}")]
    Config(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("tile workers have shut down")]
    WorkerShutdown,
}

/// Install `env_logger` as the global logger, configured from `RUST_LOG`.
///
/// Does nothing if a logger is already installed.
#[cfg(feature = "debug")]
pub fn init_logger() {
    let _ = env_logger::try_init();
}
