use std::path::Path;

use super::data::TileData;
use crate::core::tile_id::TileId;
use crate::prelude::HashMap;
use crate::{Error, Result};

/// Anything that can produce decoded data for a tile.
///
/// `load` is called from worker threads and may block.
pub trait TileSource: Send + Sync {
    fn load(&self, id: TileId) -> Result<TileData>;
}

/// Source serving tiles that were decoded ahead of time.
#[derive(Debug, Default)]
pub struct MemoryTileSource {
    tiles: HashMap<TileId, TileData>,
}

impl MemoryTileSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, id: TileId, data: TileData) {
        self.tiles.insert(id, data);
    }

    pub fn with_tile(mut self, id: TileId, data: TileData) -> Self {
        self.insert(id, data);
        self
    }

    /// Serve the same data under every id in `ids`.
    pub fn fill(ids: impl IntoIterator<Item = TileId>, data: &TileData) -> Self {
        let mut source = Self::new();
        for id in ids {
            source.insert(id, data.clone());
        }
        source
    }

    /// Read one JSON-encoded `TileData` fixture and serve it for `id`.
    pub fn from_json_file(id: TileId, path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        let data: TileData = serde_json::from_str(&json)?;
        Ok(Self::new().with_tile(id, data))
    }

    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }
}

impl TileSource for MemoryTileSource {
    fn load(&self, id: TileId) -> Result<TileData> {
        self.tiles
            .get(&id)
            .cloned()
            .ok_or(Error::TileNotFound(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tiles::data::Layer;

    #[test]
    fn test_memory_source_lookup() {
        let id = TileId::new(3, 1, 2);
        let data = TileData::new(vec![Layer::new("water", Vec::new())]);
        let source = MemoryTileSource::new().with_tile(id, data.clone());
        assert_eq!(source.load(id).unwrap(), data);
        assert!(matches!(
            source.load(TileId::new(3, 0, 0)),
            Err(Error::TileNotFound(_))
        ));
    }

    #[test]
    fn test_missing_fixture_is_io_error() {
        let result = MemoryTileSource::from_json_file(TileId::new(0, 0, 0), "/nonexistent/tile.json");
        assert!(matches!(result, Err(Error::Io(_))));
    }
}
