//! MPQ header discovery and parsing

use crate::{signatures, Error, Result};
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::io::{ErrorKind, Read, Seek, SeekFrom, Write};

/// Size of the original (v1) MPQ header
pub const HEADER_SIZE_V1: u32 = 32;

/// Headers are only searched for at multiples of this value
pub const HEADER_ALIGNMENT: u64 = 0x200;

/// Largest accepted sector size shift (512 << 16 = 32 MiB sectors)
pub const MAX_BLOCK_SIZE: u16 = 16;

/// MPQ archive header
///
/// Only the fields shared by every format version are decoded; StarCraft and
/// Warcraft II archives are all version 0.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MpqHeader {
    /// Size of the header in bytes
    pub header_size: u32,
    /// Size of the archive in bytes
    pub archive_size: u32,
    /// MPQ format version (0 = original format)
    pub format_version: u16,
    /// Sector size as a power of two multiple of 512
    pub block_size: u16,
    /// Offset to the hash table, relative to the header
    pub hash_table_offset: u32,
    /// Offset to the block table, relative to the header
    pub block_table_offset: u32,
    /// Number of entries in the hash table
    pub hash_table_entries: u32,
    /// Number of entries in the block table
    pub block_table_entries: u32,
}

impl MpqHeader {
    /// Sector size in bytes
    pub fn sector_size(&self) -> usize {
        crate::calculate_sector_size(self.block_size)
    }

    /// Read a header from the current position (signature included)
    pub fn read<R: Read>(reader: &mut R) -> Result<Self> {
        let signature = reader.read_u32::<LittleEndian>()?;
        if signature != signatures::MPQ_ARCHIVE {
            return Err(Error::invalid_header(format!(
                "bad signature 0x{signature:08X}"
            )));
        }

        let header = Self {
            header_size: reader.read_u32::<LittleEndian>()?,
            archive_size: reader.read_u32::<LittleEndian>()?,
            format_version: reader.read_u16::<LittleEndian>()?,
            block_size: reader.read_u16::<LittleEndian>()?,
            hash_table_offset: reader.read_u32::<LittleEndian>()?,
            block_table_offset: reader.read_u32::<LittleEndian>()?,
            hash_table_entries: reader.read_u32::<LittleEndian>()?,
            block_table_entries: reader.read_u32::<LittleEndian>()?,
        };

        if header.header_size < HEADER_SIZE_V1 {
            return Err(Error::invalid_header(format!(
                "header size {} is smaller than {HEADER_SIZE_V1}",
                header.header_size
            )));
        }

        if header.block_size > MAX_BLOCK_SIZE {
            return Err(Error::invalid_header(format!(
                "sector size shift {} exceeds {MAX_BLOCK_SIZE}",
                header.block_size
            )));
        }

        Ok(header)
    }

    /// Write a v1 header (signature included)
    pub fn write<W: Write>(&self, writer: &mut W) -> Result<()> {
        writer.write_u32::<LittleEndian>(signatures::MPQ_ARCHIVE)?;
        writer.write_u32::<LittleEndian>(self.header_size)?;
        writer.write_u32::<LittleEndian>(self.archive_size)?;
        writer.write_u16::<LittleEndian>(self.format_version)?;
        writer.write_u16::<LittleEndian>(self.block_size)?;
        writer.write_u32::<LittleEndian>(self.hash_table_offset)?;
        writer.write_u32::<LittleEndian>(self.block_table_offset)?;
        writer.write_u32::<LittleEndian>(self.hash_table_entries)?;
        writer.write_u32::<LittleEndian>(self.block_table_entries)?;
        Ok(())
    }
}

/// Locate the MPQ header
///
/// Returns the absolute offset of the header together with the parsed header.
/// A user data header (`MPQ\x1B`) redirects the search to the offset it
/// stores.
pub fn find_header<R: Read + Seek>(reader: &mut R) -> Result<(u64, MpqHeader)> {
    let file_size = reader.seek(SeekFrom::End(0))?;
    let mut offset = 0u64;

    while offset + u64::from(HEADER_SIZE_V1) <= file_size {
        reader.seek(SeekFrom::Start(offset))?;
        let signature = match reader.read_u32::<LittleEndian>() {
            Ok(signature) => signature,
            Err(e) if e.kind() == ErrorKind::UnexpectedEof => break,
            Err(e) => return Err(e.into()),
        };

        match signature {
            signatures::MPQ_ARCHIVE => {
                reader.seek(SeekFrom::Start(offset))?;
                let header = MpqHeader::read(reader)?;
                log::debug!(
                    "Found MPQ header at 0x{offset:X} (version {}, {} hash / {} block entries)",
                    header.format_version,
                    header.hash_table_entries,
                    header.block_table_entries
                );
                return Ok((offset, header));
            }
            signatures::MPQ_USERDATA => {
                let _user_data_size = reader.read_u32::<LittleEndian>()?;
                let header_offset = reader.read_u32::<LittleEndian>()?;
                log::debug!("Found user data header at 0x{offset:X}");

                let target = offset + u64::from(header_offset);
                if target <= offset {
                    return Err(Error::invalid_header("user data header points backwards"));
                }
                reader.seek(SeekFrom::Start(target))?;
                let header = MpqHeader::read(reader)?;
                return Ok((target, header));
            }
            _ => offset += HEADER_ALIGNMENT,
        }
    }

    Err(Error::invalid_header("no MPQ header found"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn sample_header() -> MpqHeader {
        MpqHeader {
            header_size: HEADER_SIZE_V1,
            archive_size: 4096,
            format_version: 0,
            block_size: 3,
            hash_table_offset: 1000,
            block_table_offset: 2000,
            hash_table_entries: 16,
            block_table_entries: 4,
        }
    }

    #[test]
    fn test_header_write_then_read() {
        let header = sample_header();
        let mut buffer = Cursor::new(Vec::new());
        header.write(&mut buffer).unwrap();
        assert_eq!(buffer.get_ref().len(), HEADER_SIZE_V1 as usize);

        buffer.set_position(0);
        assert_eq!(MpqHeader::read(&mut buffer).unwrap(), header);
        assert_eq!(header.sector_size(), 4096);
    }

    #[test]
    fn test_find_header_skips_prefix() {
        let mut data = vec![0u8; 0x400];
        let mut encoded = Cursor::new(Vec::new());
        sample_header().write(&mut encoded).unwrap();
        data.extend_from_slice(encoded.get_ref());

        let (offset, header) = find_header(&mut Cursor::new(data)).unwrap();
        assert_eq!(offset, 0x400);
        assert_eq!(header.hash_table_entries, 16);
    }

    #[test]
    fn test_find_header_follows_user_data() {
        let mut data = Vec::new();
        data.extend_from_slice(&signatures::MPQ_USERDATA.to_le_bytes());
        data.extend_from_slice(&0x10u32.to_le_bytes());
        data.extend_from_slice(&0x200u32.to_le_bytes());
        data.resize(0x200, 0);
        let mut encoded = Cursor::new(Vec::new());
        sample_header().write(&mut encoded).unwrap();
        data.extend_from_slice(encoded.get_ref());

        let (offset, _) = find_header(&mut Cursor::new(data)).unwrap();
        assert_eq!(offset, 0x200);
    }

    #[test]
    fn test_missing_header() {
        let result = find_header(&mut Cursor::new(vec![0u8; 2048]));
        assert!(matches!(result, Err(Error::InvalidHeader(_))));
    }

    #[test]
    fn test_sector_size_shift_is_bounded() {
        for block_size in [MAX_BLOCK_SIZE + 1, 55, 64, u16::MAX] {
            let mut header = sample_header();
            header.block_size = block_size;
            let mut buffer = Cursor::new(Vec::new());
            header.write(&mut buffer).unwrap();
            buffer.set_position(0);
            assert!(matches!(
                MpqHeader::read(&mut buffer),
                Err(Error::InvalidHeader(_))
            ));
        }

        let mut header = sample_header();
        header.block_size = MAX_BLOCK_SIZE;
        let mut buffer = Cursor::new(Vec::new());
        header.write(&mut buffer).unwrap();
        buffer.set_position(0);
        assert_eq!(MpqHeader::read(&mut buffer).unwrap().sector_size(), 512 << 16);
    }

    #[test]
    fn test_header_too_small() {
        let mut header = sample_header();
        header.header_size = 16;
        let mut buffer = Cursor::new(Vec::new());
        header.write(&mut buffer).unwrap();
        buffer.set_position(0);
        assert!(matches!(
            MpqHeader::read(&mut buffer),
            Err(Error::InvalidHeader(_))
        ));
    }
}
