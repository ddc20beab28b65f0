//! MPQ archive handling

use crate::compression;
use crate::crypto::{decrypt_bytes, file_key};
use crate::header::{self, MpqHeader};
use crate::tables::{BlockEntry, BlockFlags, BlockTable, HashTable};
use crate::{Error, Result};
use byteorder::{ByteOrder, LittleEndian};
use parking_lot::Mutex;
use std::fs::File;
use std::io::{self, BufReader, Cursor, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

/// Name of the optional file listing the archive contents
pub const LISTFILE: &str = "(listfile)";

/// An opened MPQ archive
///
/// The tables are decoded once at open time. File reads take `&self`; the
/// underlying reader sits behind a mutex because every read seeks.
#[derive(Debug)]
pub struct Archive {
    /// Path to the archive file
    path: PathBuf,
    /// Archive file reader
    reader: Mutex<BufReader<File>>,
    /// Offset of the MPQ header in the file
    archive_offset: u64,
    /// Length of the archive file in bytes
    file_len: u64,
    /// MPQ header
    header: MpqHeader,
    hash_table: HashTable,
    block_table: BlockTable,
}

impl Archive {
    /// Open an existing MPQ archive
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = File::open(&path)?;
        let file_len = file.metadata()?.len();
        let mut reader = BufReader::new(file);

        let (archive_offset, header) = header::find_header(&mut reader)?;

        let hash_table = HashTable::read(
            &mut reader,
            archive_offset + u64::from(header.hash_table_offset),
            header.hash_table_entries,
        )?;
        let block_table = BlockTable::read(
            &mut reader,
            archive_offset + u64::from(header.block_table_offset),
            header.block_table_entries,
        )?;

        log::debug!(
            "Opened {} ({} files, sector size {})",
            path.display(),
            block_table.size(),
            header.sector_size()
        );

        Ok(Archive {
            path,
            reader: Mutex::new(reader),
            archive_offset,
            file_len,
            header,
            hash_table,
            block_table,
        })
    }

    /// Get the archive header
    pub fn header(&self) -> &MpqHeader {
        &self.header
    }

    /// Get the archive offset in the file
    pub fn archive_offset(&self) -> u64 {
        self.archive_offset
    }

    /// Get the path to the archive
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Check whether a file with this name is stored in the archive
    pub fn contains(&self, name: &str) -> bool {
        self.find_block(name).is_some()
    }

    /// Names from the archive's `(listfile)`, if it has one
    pub fn list(&self) -> Result<Vec<String>> {
        if !self.contains(LISTFILE) {
            return Ok(Vec::new());
        }

        let data = self.read_file(LISTFILE)?;
        Ok(String::from_utf8_lossy(&data)
            .split(['\r', '\n', ';'])
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(str::to_string)
            .collect())
    }

    /// Open a file as a readable, seekable stream
    pub fn open_file(&self, name: &str) -> Result<MpqFile> {
        let data = self.read_file(name)?;
        Ok(MpqFile {
            name: name.to_string(),
            cursor: Cursor::new(data),
        })
    }

    /// Read a file from the archive
    pub fn read_file(&self, name: &str) -> Result<Vec<u8>> {
        let block = self
            .find_block(name)
            .ok_or_else(|| Error::FileNotFound(name.to_string()))?;

        if block.file_size == 0 {
            return Ok(Vec::new());
        }

        let data_offset = self.archive_offset + u64::from(block.file_pos);
        if data_offset + u64::from(block.compressed_size) > self.file_len {
            return Err(Error::corrupted_file(
                name,
                format!(
                    "{} stored bytes at 0x{data_offset:X} run past the end of the archive ({} bytes)",
                    block.compressed_size, self.file_len
                ),
            ));
        }

        let raw = {
            let mut reader = self.reader.lock();
            reader.seek(SeekFrom::Start(data_offset))?;
            let mut raw = vec![0u8; block.compressed_size as usize];
            reader.read_exact(&mut raw).map_err(|e| {
                Error::corrupted_file(name, format!("stored data truncated: {e}"))
            })?;
            raw
        };

        let key = if block.is_encrypted() {
            file_key(name, block.file_pos, block.file_size, block.has_fix_key())
        } else {
            0
        };

        let data = if !block.is_compressed() {
            self.read_stored(raw, &block, key)
        } else if block.is_single_unit() {
            read_single_unit(raw, &block, key)?
        } else {
            self.read_sectors(name, &raw, &block, key)?
        };

        if data.len() != block.file_size as usize {
            return Err(Error::corrupted_file(
                name,
                format!(
                    "expected {} bytes, decoded {}",
                    block.file_size,
                    data.len()
                ),
            ));
        }

        Ok(data)
    }

    fn find_block(&self, name: &str) -> Option<BlockEntry> {
        let (_, entry) = self.hash_table.find_file(name, 0)?;
        let block = self.block_table.get(entry.block_index as usize)?;
        block.exists().then_some(*block)
    }

    fn read_stored(&self, mut raw: Vec<u8>, block: &BlockEntry, key: u32) -> Vec<u8> {
        if block.is_encrypted() {
            let sector_size = if block.is_single_unit() {
                raw.len().max(1)
            } else {
                self.header.sector_size()
            };
            for (index, sector) in raw.chunks_mut(sector_size).enumerate() {
                decrypt_bytes(sector, key.wrapping_add(index as u32));
            }
        }
        raw.truncate(block.file_size as usize);
        raw
    }

    fn read_sectors(
        &self,
        name: &str,
        raw: &[u8],
        block: &BlockEntry,
        key: u32,
    ) -> Result<Vec<u8>> {
        let sector_size = self.header.sector_size();
        let file_size = block.file_size as usize;
        let sector_count = file_size.div_ceil(sector_size);

        let table_len = (sector_count + 1) * 4;
        if raw.len() < table_len {
            return Err(Error::corrupted_file(name, "sector table truncated"));
        }

        let mut table = raw[..table_len].to_vec();
        if block.is_encrypted() {
            decrypt_bytes(&mut table, key.wrapping_sub(1));
        }
        let offsets: Vec<usize> = table
            .chunks_exact(4)
            .map(|chunk| LittleEndian::read_u32(chunk) as usize)
            .collect();

        let mut out = Vec::with_capacity(file_size.min(raw.len().saturating_mul(16)));
        for index in 0..sector_count {
            let (start, end) = (offsets[index], offsets[index + 1]);
            if start > end || end > raw.len() {
                return Err(Error::corrupted_file(
                    name,
                    format!("sector {index} spans {start}..{end} outside {} bytes", raw.len()),
                ));
            }

            let mut sector = raw[start..end].to_vec();
            if block.is_encrypted() {
                decrypt_bytes(&mut sector, key.wrapping_add(index as u32));
            }

            let expected = (file_size - index * sector_size).min(sector_size);
            let decoded = decode_sector(sector, block, expected)?;
            out.extend_from_slice(&decoded);
        }

        Ok(out)
    }
}

fn read_single_unit(mut raw: Vec<u8>, block: &BlockEntry, key: u32) -> Result<Vec<u8>> {
    if block.is_encrypted() {
        decrypt_bytes(&mut raw, key);
    }
    decode_sector(raw, block, block.file_size as usize)
}

/// Decode one sector; sectors at least as long as their output are stored raw
fn decode_sector(sector: Vec<u8>, block: &BlockEntry, expected: usize) -> Result<Vec<u8>> {
    if sector.len() >= expected {
        let mut sector = sector;
        sector.truncate(expected);
        return Ok(sector);
    }

    if block.flags.contains(BlockFlags::IMPLODE) {
        return compression::explode(&sector);
    }

    match sector.split_first() {
        Some((&mask, payload)) => compression::decompress(payload, mask, expected),
        None => Err(Error::decompression("empty compressed sector")),
    }
}

/// A file read out of an archive
///
/// The contents are fully decoded when the file is opened.
#[derive(Debug)]
pub struct MpqFile {
    name: String,
    cursor: Cursor<Vec<u8>>,
}

impl MpqFile {
    /// Name the file was opened under
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Decoded size in bytes
    pub fn size(&self) -> u64 {
        self.cursor.get_ref().len() as u64
    }

    /// Consume the stream, returning its contents
    pub fn into_inner(self) -> Vec<u8> {
        self.cursor.into_inner()
    }
}

impl Read for MpqFile {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.cursor.read(buf)
    }
}

impl Seek for MpqFile {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        self.cursor.seek(pos)
    }
}
