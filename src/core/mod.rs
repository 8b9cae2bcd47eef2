pub mod config;
pub mod constants;
pub mod projection;
pub mod tile_id;

pub use config::{EngineConfig, EngineProfile};
pub use projection::{MapProjection, MercatorProjection};
pub use tile_id::TileId;
