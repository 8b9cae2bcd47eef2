pub mod handle;
pub mod map_tile;
pub mod proxy;
pub mod state;

pub use handle::{AtomicPriority, TileHandle};
pub use map_tile::Tile;
pub use proxy::{Proxies, ProxyId};
pub use state::{AtomicTileState, TileState};
