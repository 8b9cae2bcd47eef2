pub mod data;
pub mod set;
pub mod source;
pub mod worker;

// Re-exports for convenience
pub use data::{Feature, FeatureGeometry, Layer, TileData};
pub use set::TileSet;
pub use source::{MemoryTileSource, TileSource};
pub use worker::{TileResult, TileWorker};
