//! Fixed-size binary record tables

use crate::{Error, Result};

/// A record with a fixed on-disk size
pub trait Record: Sized {
    /// Size of one record in bytes
    const SIZE: usize;

    /// Decode one record; `data` is exactly [`Self::SIZE`] bytes long
    fn parse(data: &[u8]) -> Self;
}

/// Decode a blob into consecutive records
///
/// Fails when the blob length is not a multiple of the record size.
pub fn read_table<T: Record>(data: &[u8]) -> Result<Vec<T>> {
    if data.len() % T::SIZE != 0 {
        return Err(Error::chunk_corrupt(format!(
            "table of {} bytes is not a multiple of the {}-byte record size",
            data.len(),
            T::SIZE
        )));
    }

    Ok(data.chunks_exact(T::SIZE).map(T::parse).collect())
}
