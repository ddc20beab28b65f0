//! MPQ archives as an [`ArchiveStore`]

use super::ArchiveStore;
use crate::{Error, Result};
use mopaq::Archive;
use std::io::Read;
use std::path::Path;

/// An opened MPQ archive
#[derive(Debug)]
pub struct MpqStore {
    archive: Archive,
}

impl MpqStore {
    /// Open an MPQ archive
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let archive = Archive::open(path.as_ref())?;
        log::info!("Loaded {}", path.as_ref().display());
        Ok(Self { archive })
    }

    /// The wrapped archive
    pub fn archive(&self) -> &Archive {
        &self.archive
    }
}

impl ArchiveStore for MpqStore {
    fn contains(&self, name: &str) -> bool {
        self.archive.contains(name)
    }

    fn read(&self, name: &str) -> Result<Vec<u8>> {
        if !self.archive.contains(name) {
            return Err(Error::EntryNotFound(name.to_string()));
        }

        let mut file = self.archive.open_file(name)?;
        let mut data = Vec::with_capacity(file.size() as usize);
        file.read_to_end(&mut data)?;
        Ok(data)
    }

    fn entry_names(&self) -> Vec<String> {
        match self.archive.list() {
            Ok(names) => names,
            Err(e) => {
                log::warn!(
                    "Cannot list {}: {e}",
                    self.archive.path().display()
                );
                Vec::new()
            }
        }
    }
}
