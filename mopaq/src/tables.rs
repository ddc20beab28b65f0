//! MPQ hash and block tables

use crate::crypto::{decrypt_bytes, encrypt_bytes, hash_string, hash_type};
use crate::{Error, Result};
use bitflags::bitflags;
use byteorder::{ByteOrder, LittleEndian};
use std::io::{Read, Seek, SeekFrom, Write};

/// Size in bytes of a single hash or block table entry
pub const ENTRY_SIZE: usize = 16;

/// Name the hash table encryption key is derived from
pub const HASH_TABLE_KEY_NAME: &str = "(hash table)";

/// Name the block table encryption key is derived from
pub const BLOCK_TABLE_KEY_NAME: &str = "(block table)";

/// Hash table entry (16 bytes)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HashEntry {
    /// The hash of the full file name (part A)
    pub name_1: u32,
    /// The hash of the full file name (part B)
    pub name_2: u32,
    /// The language of the file (Windows LANGID)
    pub locale: u16,
    /// The platform the file is used for
    pub platform: u16,
    /// Block table index or special value
    pub block_index: u32,
}

impl HashEntry {
    /// Value indicating the hash entry has never been used
    pub const EMPTY_NEVER_USED: u32 = 0xFFFFFFFF;
    /// Value indicating the hash entry was deleted
    pub const EMPTY_DELETED: u32 = 0xFFFFFFFE;

    /// Create an empty hash entry
    pub fn empty() -> Self {
        Self {
            name_1: EMPTY_NAME,
            name_2: EMPTY_NAME,
            locale: 0xFFFF,
            platform: 0xFFFF,
            block_index: Self::EMPTY_NEVER_USED,
        }
    }

    /// Check if this entry has never been used
    pub fn is_empty(&self) -> bool {
        self.block_index == Self::EMPTY_NEVER_USED
    }

    /// Check if this entry contains valid file information
    pub fn is_valid(&self) -> bool {
        self.block_index < Self::EMPTY_DELETED
    }

    fn parse(data: &[u8]) -> Self {
        Self {
            name_1: LittleEndian::read_u32(&data[0..4]),
            name_2: LittleEndian::read_u32(&data[4..8]),
            locale: LittleEndian::read_u16(&data[8..10]),
            platform: LittleEndian::read_u16(&data[10..12]),
            block_index: LittleEndian::read_u32(&data[12..16]),
        }
    }

    fn encode(&self, out: &mut [u8]) {
        LittleEndian::write_u32(&mut out[0..4], self.name_1);
        LittleEndian::write_u32(&mut out[4..8], self.name_2);
        LittleEndian::write_u16(&mut out[8..10], self.locale);
        LittleEndian::write_u16(&mut out[10..12], self.platform);
        LittleEndian::write_u32(&mut out[12..16], self.block_index);
    }
}

const EMPTY_NAME: u32 = 0xFFFFFFFF;

bitflags! {
    /// Block table entry flags
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct BlockFlags: u32 {
        /// File is compressed using PKWARE Data compression library
        const IMPLODE = 0x0000_0100;
        /// File is compressed using one or more compression methods
        const COMPRESS = 0x0000_0200;
        /// File is encrypted
        const ENCRYPTED = 0x0001_0000;
        /// The decryption key for the file is adjusted by the block position
        const FIX_KEY = 0x0002_0000;
        /// File is stored as a single unit, not split into sectors
        const SINGLE_UNIT = 0x0100_0000;
        /// File is a deletion marker
        const DELETE_MARKER = 0x0200_0000;
        /// File has checksums for each sector
        const SECTOR_CRC = 0x0400_0000;
        /// File exists in the archive
        const EXISTS = 0x8000_0000;
    }
}

/// Block table entry (16 bytes)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockEntry {
    /// Offset of the file data, relative to the archive header
    pub file_pos: u32,
    /// Compressed file size
    pub compressed_size: u32,
    /// Size of uncompressed file
    pub file_size: u32,
    /// Flags for the file
    pub flags: BlockFlags,
}

impl BlockEntry {
    /// Check if the file is compressed by any method
    pub fn is_compressed(&self) -> bool {
        self.flags
            .intersects(BlockFlags::IMPLODE | BlockFlags::COMPRESS)
    }

    /// Check if the file is encrypted
    pub fn is_encrypted(&self) -> bool {
        self.flags.contains(BlockFlags::ENCRYPTED)
    }

    /// Check if the file uses fixed key encryption
    pub fn has_fix_key(&self) -> bool {
        self.flags.contains(BlockFlags::FIX_KEY)
    }

    /// Check if the file is stored as a single unit
    pub fn is_single_unit(&self) -> bool {
        self.flags.contains(BlockFlags::SINGLE_UNIT)
    }

    /// Check if the file exists
    pub fn exists(&self) -> bool {
        self.flags.contains(BlockFlags::EXISTS)
    }

    fn parse(data: &[u8]) -> Self {
        Self {
            file_pos: LittleEndian::read_u32(&data[0..4]),
            compressed_size: LittleEndian::read_u32(&data[4..8]),
            file_size: LittleEndian::read_u32(&data[8..12]),
            flags: BlockFlags::from_bits_retain(LittleEndian::read_u32(&data[12..16])),
        }
    }

    fn encode(&self, out: &mut [u8]) {
        LittleEndian::write_u32(&mut out[0..4], self.file_pos);
        LittleEndian::write_u32(&mut out[4..8], self.compressed_size);
        LittleEndian::write_u32(&mut out[8..12], self.file_size);
        LittleEndian::write_u32(&mut out[12..16], self.flags.bits());
    }
}

fn read_encrypted<R: Read + Seek>(
    reader: &mut R,
    offset: u64,
    entries: u32,
    key_name: &str,
) -> Result<Vec<u8>> {
    let stream_len = reader.seek(SeekFrom::End(0))?;
    let byte_size = u64::from(entries) * ENTRY_SIZE as u64;
    if offset.saturating_add(byte_size) > stream_len {
        return Err(Error::corrupted_table(format!(
            "{key_name} of {entries} entries at 0x{offset:X} runs past the end of the archive ({stream_len} bytes)"
        )));
    }

    reader.seek(SeekFrom::Start(offset))?;
    let mut raw = vec![0u8; byte_size as usize];
    reader.read_exact(&mut raw).map_err(|e| {
        Error::corrupted_table(format!("{key_name} truncated at 0x{offset:X}: {e}"))
    })?;

    decrypt_bytes(&mut raw, hash_string(key_name, hash_type::FILE_KEY));
    Ok(raw)
}

fn write_encrypted<W: Write>(writer: &mut W, mut raw: Vec<u8>, key_name: &str) -> Result<()> {
    encrypt_bytes(&mut raw, hash_string(key_name, hash_type::FILE_KEY));
    writer.write_all(&raw)?;
    Ok(())
}

/// Hash table
#[derive(Debug, Clone)]
pub struct HashTable {
    entries: Vec<HashEntry>,
}

impl HashTable {
    /// Create a new empty hash table
    pub fn new(size: usize) -> Result<Self> {
        if !crate::is_power_of_two(size as u32) {
            return Err(Error::corrupted_table("Hash table size must be power of 2"));
        }

        Ok(Self {
            entries: vec![HashEntry::empty(); size],
        })
    }

    /// Read and decrypt a hash table from the archive
    pub fn read<R: Read + Seek>(reader: &mut R, offset: u64, size: u32) -> Result<Self> {
        if !crate::is_power_of_two(size) {
            return Err(Error::corrupted_table(format!(
                "Hash table size {size} is not a power of 2"
            )));
        }

        let raw = read_encrypted(reader, offset, size, HASH_TABLE_KEY_NAME)?;
        let entries = raw.chunks_exact(ENTRY_SIZE).map(HashEntry::parse).collect();

        Ok(Self { entries })
    }

    /// Encrypt and write the table
    pub fn write<W: Write>(&self, writer: &mut W) -> Result<()> {
        let mut raw = vec![0u8; self.entries.len() * ENTRY_SIZE];
        for (entry, out) in self.entries.iter().zip(raw.chunks_exact_mut(ENTRY_SIZE)) {
            entry.encode(out);
        }
        write_encrypted(writer, raw, HASH_TABLE_KEY_NAME)
    }

    /// Get all entries
    pub fn entries(&self) -> &[HashEntry] {
        &self.entries
    }

    /// Get the size of the hash table
    pub fn size(&self) -> usize {
        self.entries.len()
    }

    /// Find a file in the hash table
    ///
    /// A `locale` of 0 matches any entry; otherwise neutral (0) entries match
    /// as well.
    pub fn find_file(&self, filename: &str, locale: u16) -> Option<(usize, &HashEntry)> {
        let name_a = hash_string(filename, hash_type::NAME_A);
        let name_b = hash_string(filename, hash_type::NAME_B);
        let start_index = hash_string(filename, hash_type::TABLE_OFFSET) as usize;

        let mask = self.entries.len() - 1;
        let start = start_index & mask;
        let mut index = start;

        loop {
            let entry = &self.entries[index];

            if entry.is_empty() {
                return None;
            }

            if entry.name_1 == name_a
                && entry.name_2 == name_b
                && entry.is_valid()
                && (locale == 0 || entry.locale == 0 || entry.locale == locale)
            {
                return Some((index, entry));
            }

            index = (index + 1) & mask;
            if index == start {
                return None;
            }
        }
    }

    /// Insert a name pointing at `block_index`, probing linearly from the
    /// name's home slot
    pub fn insert(&mut self, filename: &str, block_index: u32) -> Result<usize> {
        let mask = self.entries.len() - 1;
        let start = hash_string(filename, hash_type::TABLE_OFFSET) as usize & mask;
        let mut index = start;

        loop {
            if !self.entries[index].is_valid() {
                self.entries[index] = HashEntry {
                    name_1: hash_string(filename, hash_type::NAME_A),
                    name_2: hash_string(filename, hash_type::NAME_B),
                    locale: 0,
                    platform: 0,
                    block_index,
                };
                return Ok(index);
            }

            index = (index + 1) & mask;
            if index == start {
                return Err(Error::corrupted_table("Hash table is full"));
            }
        }
    }
}

/// Block table
#[derive(Debug, Clone, Default)]
pub struct BlockTable {
    entries: Vec<BlockEntry>,
}

impl BlockTable {
    /// Create an empty block table
    pub fn new() -> Self {
        Self::default()
    }

    /// Read and decrypt a block table from the archive
    pub fn read<R: Read + Seek>(reader: &mut R, offset: u64, size: u32) -> Result<Self> {
        let raw = read_encrypted(reader, offset, size, BLOCK_TABLE_KEY_NAME)?;
        let entries = raw.chunks_exact(ENTRY_SIZE).map(BlockEntry::parse).collect();

        Ok(Self { entries })
    }

    /// Encrypt and write the table
    pub fn write<W: Write>(&self, writer: &mut W) -> Result<()> {
        let mut raw = vec![0u8; self.entries.len() * ENTRY_SIZE];
        for (entry, out) in self.entries.iter().zip(raw.chunks_exact_mut(ENTRY_SIZE)) {
            entry.encode(out);
        }
        write_encrypted(writer, raw, BLOCK_TABLE_KEY_NAME)
    }

    /// Append an entry, returning its index
    pub fn push(&mut self, entry: BlockEntry) -> u32 {
        self.entries.push(entry);
        (self.entries.len() - 1) as u32
    }

    /// Get all entries
    pub fn entries(&self) -> &[BlockEntry] {
        &self.entries
    }

    /// Get a specific entry
    pub fn get(&self, index: usize) -> Option<&BlockEntry> {
        self.entries.get(index)
    }

    /// Get the size of the block table
    pub fn size(&self) -> usize {
        self.entries.len()
    }
}
