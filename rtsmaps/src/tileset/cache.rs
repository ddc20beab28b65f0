//! Per-tileset tile memoization

use super::{Tile, Tileset};
use crate::Result;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

type Slot = Arc<Mutex<Option<Arc<[Tile]>>>>;

/// Memoized tiles keyed by tileset
///
/// Each tileset is loaded at most once. Concurrent first requests for the same
/// tileset wait on a per-tileset slot while one of them loads; requests for
/// other tilesets proceed independently. A failed load leaves the slot empty
/// so a later request retries.
#[derive(Debug, Default)]
pub struct TileCache {
    slots: Mutex<HashMap<Tileset, Slot>>,
}

impl TileCache {
    /// Create an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Tiles for `tileset`, calling `load` if they are not cached yet
    pub fn get_or_load<F>(&self, tileset: Tileset, load: F) -> Result<Arc<[Tile]>>
    where
        F: FnOnce() -> Result<Vec<Tile>>,
    {
        let slot = Arc::clone(self.slots.lock().entry(tileset).or_default());

        let mut tiles = slot.lock();
        if let Some(tiles) = tiles.as_ref() {
            return Ok(Arc::clone(tiles));
        }

        log::debug!("Loading tileset {tileset}");
        let loaded: Arc<[Tile]> = load()?.into();
        *tiles = Some(Arc::clone(&loaded));
        Ok(loaded)
    }

    /// Tiles for `tileset` if they have been loaded
    pub fn get(&self, tileset: Tileset) -> Option<Arc<[Tile]>> {
        let slot = self.slots.lock().get(&tileset).cloned()?;
        let tiles = slot.lock();
        tiles.clone()
    }

    /// Number of loaded tilesets
    pub fn len(&self) -> usize {
        let slots: Vec<Slot> = self.slots.lock().values().cloned().collect();
        slots.iter().filter(|slot| slot.lock().is_some()).count()
    }

    /// Whether nothing has been loaded
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
