//! Sector decompression
//!
//! Compressed sectors in `COMPRESS` files start with a mask byte naming the
//! methods that were applied. Methods are undone in a fixed order: bzip2,
//! then PKWARE implode, then zlib. Files with the older `IMPLODE` flag carry
//! no mask byte and are always PKWARE imploded.

use crate::{Error, Result};
use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use std::io::{Read, Write};

/// Compression method flags
pub mod flags {
    /// Huffman (used by WAVE files)
    pub const HUFFMAN: u8 = 0x01;
    /// zlib / deflate
    pub const ZLIB: u8 = 0x02;
    /// PKWARE Data Compression Library implode
    pub const PKWARE: u8 = 0x08;
    /// bzip2
    pub const BZIP2: u8 = 0x10;
    /// Sparse (run length of zeros)
    pub const SPARSE: u8 = 0x20;
    /// IMA ADPCM mono
    pub const ADPCM_MONO: u8 = 0x40;
    /// IMA ADPCM stereo
    pub const ADPCM_STEREO: u8 = 0x80;
}

const SUPPORTED: u8 = flags::ZLIB | flags::PKWARE | flags::BZIP2;

/// Undo every method named in `mask`
///
/// `data` is the sector payload without its mask byte. `expected_size` is a
/// capacity hint; the caller verifies the final length.
pub fn decompress(data: &[u8], mask: u8, expected_size: usize) -> Result<Vec<u8>> {
    if mask & !SUPPORTED != 0 || mask == 0 {
        return Err(Error::UnsupportedCompression(mask));
    }

    let mut buffer = data.to_vec();

    if mask & flags::BZIP2 != 0 {
        buffer = decompress_bzip2(&buffer, expected_size, mask)?;
    }
    if mask & flags::PKWARE != 0 {
        buffer = explode(&buffer)?;
    }
    if mask & flags::ZLIB != 0 {
        buffer = decompress_zlib(&buffer, expected_size)?;
    }

    Ok(buffer)
}

/// Decompress a PKWARE imploded buffer
pub fn explode(data: &[u8]) -> Result<Vec<u8>> {
    explode::explode(data).map_err(|e| Error::decompression(format!("explode: {e:?}")))
}

fn decompress_zlib(data: &[u8], expected_size: usize) -> Result<Vec<u8>> {
    let mut decoder = ZlibDecoder::new(data).take(expected_size as u64 + 1);
    let mut out = Vec::with_capacity(capacity_hint(data, expected_size));
    decoder
        .read_to_end(&mut out)
        .map_err(|e| Error::decompression(format!("zlib: {e}")))?;
    Ok(out)
}

/// Output never exceeds `expected_size + 1` bytes; the hint is also kept in
/// proportion to the input so a corrupt size field cannot reserve gigabytes.
fn capacity_hint(data: &[u8], expected_size: usize) -> usize {
    expected_size.min(data.len().saturating_mul(16))
}

#[cfg(feature = "compression-bzip2")]
fn decompress_bzip2(data: &[u8], expected_size: usize, _mask: u8) -> Result<Vec<u8>> {
    use bzip2::read::BzDecoder;

    let mut decoder = BzDecoder::new(data).take(expected_size as u64 + 1);
    let mut out = Vec::with_capacity(capacity_hint(data, expected_size));
    decoder
        .read_to_end(&mut out)
        .map_err(|e| Error::decompression(format!("bzip2: {e}")))?;
    Ok(out)
}

#[cfg(not(feature = "compression-bzip2"))]
fn decompress_bzip2(_data: &[u8], _expected_size: usize, mask: u8) -> Result<Vec<u8>> {
    Err(Error::UnsupportedCompression(mask))
}

/// Compress a buffer with zlib
pub fn compress_zlib(data: &[u8]) -> Result<Vec<u8>> {
    let mut encoder = ZlibEncoder::new(Vec::new(), flate2::Compression::default());
    encoder.write_all(data)?;
    Ok(encoder.finish()?)
}
