//! Prelude module for common vectile types and traits
//!
//! This module re-exports the most commonly used types, traits, and functions
//! for easy importing with `use vectile::prelude::*;`

pub use crate::core::{
    config::{EngineConfig, EngineProfile},
    projection::{MapProjection, MercatorProjection},
    tile_id::TileId,
};

pub use crate::geometry::{
    build_poly_line, build_polygon, build_polygon_extrusion, build_quad_at_point, GeometryError,
    Mesh, MeshBuffers, Vertex,
};

pub use crate::style::{PointStyle, PolygonStyle, PolylineStyle, Style, TileContext};

pub use crate::tile::{Proxies, ProxyId, Tile, TileHandle, TileState};

pub use crate::tiles::{
    data::{Feature, FeatureGeometry, Layer, TileData},
    set::TileSet,
    source::{MemoryTileSource, TileSource},
    worker::{TileResult, TileWorker},
};

pub use crate::traits::{Label, LabelContext, LabelTransform, RenderContext, TextBuffer, View};

pub use crate::{Error, Result};

pub use std::{sync::Arc, time::Duration};

pub use fxhash::{FxHashMap as HashMap, FxHashSet as HashSet, FxHasher};
