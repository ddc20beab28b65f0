//! Read-only access to named entries in game data containers
//!
//! Two container formats are supported: MPQ archives ([`MpqStore`]) and the
//! `.hed` index + `.mfp` data file pair ([`HedArchive`]). Several stores can
//! be stacked with [`LayeredStore`] so patch archives shadow base archives.

mod hed;
mod mpq;

pub use hed::{index_path, parse_index, HedArchive};
pub use mpq::MpqStore;

use crate::{Error, Result};

/// Location of one entry inside a data file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveEntry {
    /// Decoded entry name
    pub name: String,
    /// Byte offset in the data file
    pub offset: u32,
    /// Length in bytes
    pub length: u32,
}

/// A container of named byte blobs
///
/// Reads take `&self`; implementations serialize access to their underlying
/// file handle. Handles are released when the store is dropped.
pub trait ArchiveStore: Send + Sync + std::fmt::Debug {
    /// Whether `name` is present
    fn contains(&self, name: &str) -> bool;

    /// Read the full contents of `name`
    fn read(&self, name: &str) -> Result<Vec<u8>>;

    /// Names of all entries, when the container can enumerate them
    fn entry_names(&self) -> Vec<String> {
        Vec::new()
    }
}

/// Several stores searched newest first
#[derive(Debug, Default)]
pub struct LayeredStore {
    layers: Vec<Box<dyn ArchiveStore>>,
}

impl LayeredStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a store on top; its entries shadow those already loaded
    pub fn push(&mut self, store: Box<dyn ArchiveStore>) {
        self.layers.push(store);
    }

    /// Number of loaded layers
    pub fn len(&self) -> usize {
        self.layers.len()
    }

    /// Whether no layer has been loaded
    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    fn layer_for(&self, name: &str) -> Option<&dyn ArchiveStore> {
        self.layers
            .iter()
            .rev()
            .find(|layer| layer.contains(name))
            .map(|layer| layer.as_ref())
    }
}

impl ArchiveStore for LayeredStore {
    fn contains(&self, name: &str) -> bool {
        self.layer_for(name).is_some()
    }

    fn read(&self, name: &str) -> Result<Vec<u8>> {
        self.layer_for(name)
            .ok_or_else(|| Error::EntryNotFound(name.to_string()))?
            .read(name)
    }

    fn entry_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .layers
            .iter()
            .flat_map(|layer| layer.entry_names())
            .collect();
        names.sort();
        names.dedup();
        names
    }
}
