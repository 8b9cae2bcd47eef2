use serde::{Deserialize, Serialize};
use std::fmt;

use crate::core::constants::MAX_ZOOM;

/// Address of a tile in the quadtree.
///
/// Ordering is lexicographic over `(zoom, x, y)`, so a sorted collection of ids
/// walks coarse levels before fine ones.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct TileId {
    pub zoom: u8,
    pub x: u32,
    pub y: u32,
}

impl TileId {
    pub fn new(zoom: u8, x: u32, y: u32) -> Self {
        Self { zoom, x, y }
    }

    /// Number of tiles along one axis at this zoom level, saturating at `u64::MAX`.
    pub fn tiles_per_axis(&self) -> u64 {
        1u64.checked_shl(u32::from(self.zoom)).unwrap_or(u64::MAX)
    }

    /// Checks that the tile lies inside the grid for its zoom level
    pub fn is_valid(&self) -> bool {
        if self.zoom > MAX_ZOOM {
            return false;
        }
        let n = self.tiles_per_axis();
        (self.x as u64) < n && (self.y as u64) < n
    }

    /// Gets the parent tile at the next coarser zoom level
    pub fn parent(&self) -> Option<TileId> {
        if self.zoom == 0 {
            None
        } else {
            Some(TileId::new(self.zoom - 1, self.x / 2, self.y / 2))
        }
    }

    /// Gets the ancestor `levels` steps up, if one exists.
    pub fn ancestor(&self, levels: u8) -> Option<TileId> {
        if levels > self.zoom {
            return None;
        }
        Some(TileId::new(
            self.zoom - levels,
            self.x >> levels,
            self.y >> levels,
        ))
    }

    /// Gets the four child tiles at the next finer zoom level.
    ///
    /// Order is north-west, north-east, south-west, south-east, which matches
    /// `ProxyId::Child1..Child4`.
    pub fn children(&self) -> Option<[TileId; 4]> {
        if self.zoom >= MAX_ZOOM || !self.is_valid() {
            return None;
        }
        let (x, y, z) = (self.x * 2, self.y * 2, self.zoom + 1);
        Some([
            TileId::new(z, x, y),
            TileId::new(z, x + 1, y),
            TileId::new(z, x, y + 1),
            TileId::new(z, x + 1, y + 1),
        ])
    }

    /// Index of this tile among its parent's children, 0..4.
    pub fn child_index(&self) -> usize {
        ((self.x & 1) + 2 * (self.y & 1)) as usize
    }

    /// Returns true if `other` is this tile or lies below it in the quadtree.
    pub fn contains(&self, other: &TileId) -> bool {
        other.zoom >= self.zoom
            && other.ancestor(other.zoom - self.zoom).as_ref() == Some(self)
    }
}

impl fmt::Display for TileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.zoom, self.x, self.y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parent_and_children_roundtrip() {
        let id = TileId::new(5, 10, 21);
        let children = id.children().unwrap();
        for (i, child) in children.iter().enumerate() {
            assert_eq!(child.parent(), Some(id));
            assert_eq!(child.child_index(), i);
        }
        assert_eq!(TileId::new(0, 0, 0).parent(), None);
    }

    #[test]
    fn test_out_of_grid_ids_have_no_children() {
        assert_eq!(TileId::new(3, u32::MAX, 0).children(), None);
        assert_eq!(TileId::new(3, 8, 0).children(), None);
        assert_eq!(TileId::new(30, 0, 0).children(), None);
        assert!(TileId::new(MAX_ZOOM - 1, 0, 0).children().is_some());

        let far = TileId::new(u8::MAX, 1, 1);
        assert_eq!(far.tiles_per_axis(), u64::MAX);
        assert!(!far.is_valid());
    }

    #[test]
    fn test_ordering_is_zoom_first() {
        let mut ids = vec![
            TileId::new(2, 0, 0),
            TileId::new(1, 1, 1),
            TileId::new(1, 0, 1),
            TileId::new(0, 0, 0),
        ];
        ids.sort();
        assert_eq!(
            ids,
            vec![
                TileId::new(0, 0, 0),
                TileId::new(1, 0, 1),
                TileId::new(1, 1, 1),
                TileId::new(2, 0, 0),
            ]
        );
    }

    #[test]
    fn test_validity_and_ancestry() {
        assert!(TileId::new(1, 1, 1).is_valid());
        assert!(!TileId::new(1, 2, 0).is_valid());
        assert!(!TileId::new(MAX_ZOOM + 1, 0, 0).is_valid());

        let id = TileId::new(4, 9, 6);
        assert_eq!(id.ancestor(2), Some(TileId::new(2, 2, 1)));
        assert_eq!(id.ancestor(5), None);
        assert!(TileId::new(2, 2, 1).contains(&id));
        assert!(!TileId::new(2, 1, 1).contains(&id));
        assert_eq!(id.to_string(), "4/9/6");
    }
}
