//! Offset-indexed string tables
//!
//! Used by scenario `STR` chunks and by `.tbl` files such as
//! `arr\mapdata.tbl`: a `u16` count, `count` `u16` offsets into the same
//! blob, and NUL-terminated Windows-1252 strings.

use byteorder::{ByteOrder, LittleEndian};
use encoding_rs::WINDOWS_1252;

/// Decoded strings in table order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StringTable(Vec<String>);

impl StringTable {
    /// Parse a string table blob
    ///
    /// A blob too short for its count yields an empty table. Offset slots
    /// missing from a truncated header, and offsets past the end of the blob,
    /// yield empty strings.
    pub fn parse(data: &[u8]) -> Self {
        if data.len() < 2 {
            return Self::default();
        }

        let count = usize::from(LittleEndian::read_u16(&data[0..2]));
        let strings = (0..count)
            .map(|i| {
                let slot = 2 + i * 2;
                data.get(slot..slot + 2)
                    .map(|raw| decode_at(data, usize::from(LittleEndian::read_u16(raw))))
                    .unwrap_or_default()
            })
            .collect();

        Self(strings)
    }

    /// 1-based lookup, as scenario properties refer to strings
    pub fn get_one_based(&self, index: u16) -> Option<&str> {
        let index = usize::from(index).checked_sub(1)?;
        self.0.get(index).map(String::as_str)
    }

    /// Number of strings
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the table has no strings
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate over the strings
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    /// Take ownership of the strings
    pub fn into_vec(self) -> Vec<String> {
        self.0
    }
}

/// Decode NUL-terminated Windows-1252 text starting at `offset`
pub fn decode_at(data: &[u8], offset: usize) -> String {
    let tail = data.get(offset..).unwrap_or_default();
    let end = tail.iter().position(|&b| b == 0).unwrap_or(tail.len());
    decode(&tail[..end])
}

/// Decode Windows-1252 text
pub fn decode(raw: &[u8]) -> String {
    let (text, _) = WINDOWS_1252.decode_without_bom_handling(raw);
    text.into_owned()
}
