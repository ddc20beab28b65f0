//! Archive builder for creating MPQ archives
//!
//! Writes original-format (v1) archives. This is mainly used to produce
//! fixtures; it supports the same storage variants the reader decodes.

use crate::archive::LISTFILE;
use crate::compression::{compress_zlib, flags as compression_flags};
use crate::crypto::{encrypt_bytes, file_key};
use crate::header::{MpqHeader, HEADER_SIZE_V1};
use crate::tables::{BlockEntry, BlockFlags, BlockTable, HashTable};
use crate::{Error, Result};
use byteorder::{LittleEndian, WriteBytesExt};
use std::io::{BufWriter, Seek, SeekFrom, Write};
use std::path::Path;
use tempfile::NamedTempFile;

/// How a single file is stored
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FileOptions {
    /// Compress sectors with zlib when it makes them smaller
    pub compress: bool,
    /// Encrypt the stored data
    pub encrypt: bool,
    /// Adjust the encryption key by block position and size
    pub fix_key: bool,
    /// Store the file as one unit instead of splitting it into sectors
    pub single_unit: bool,
}

impl FileOptions {
    /// zlib compressed, sector split
    pub fn compressed() -> Self {
        Self {
            compress: true,
            ..Self::default()
        }
    }

    /// Enable encryption
    pub fn encrypted(mut self, fix_key: bool) -> Self {
        self.encrypt = true;
        self.fix_key = fix_key;
        self
    }

    /// Store as a single unit
    pub fn single_unit(mut self) -> Self {
        self.single_unit = true;
        self
    }
}

/// File to be added to the archive
#[derive(Debug)]
struct PendingFile {
    archive_name: String,
    data: Vec<u8>,
    options: FileOptions,
}

/// Builder for creating new MPQ archives
#[derive(Debug)]
pub struct ArchiveBuilder {
    /// Block size (sector size = 512 * 2^block_size)
    block_size: u16,
    /// Files to be added
    pending_files: Vec<PendingFile>,
    /// Whether to write a `(listfile)`
    listfile: bool,
}

impl ArchiveBuilder {
    /// Create a new archive builder
    pub fn new() -> Self {
        Self {
            block_size: 3,
            pending_files: Vec::new(),
            listfile: true,
        }
    }

    /// Set the block size (clamped to the largest shift readers accept)
    pub fn block_size(mut self, block_size: u16) -> Self {
        self.block_size = block_size.min(crate::header::MAX_BLOCK_SIZE);
        self
    }

    /// Set whether a `(listfile)` is generated
    pub fn listfile(mut self, generate: bool) -> Self {
        self.listfile = generate;
        self
    }

    /// Add a file from memory, stored uncompressed
    pub fn add_file_data(self, data: Vec<u8>, archive_name: &str) -> Self {
        self.add_file_data_with_options(data, archive_name, FileOptions::default())
    }

    /// Add a file from memory with explicit storage options
    pub fn add_file_data_with_options(
        mut self,
        data: Vec<u8>,
        archive_name: &str,
        options: FileOptions,
    ) -> Self {
        self.pending_files.push(PendingFile {
            archive_name: archive_name.to_string(),
            data,
            options,
        });
        self
    }

    /// Calculate the hash table size based on file count
    fn calculate_hash_table_size(&self) -> u32 {
        let file_count = self.pending_files.len() + usize::from(self.listfile);
        ((file_count * 2).max(16) as u32).next_power_of_two()
    }

    /// Build the archive and write to the specified path
    pub fn build<P: AsRef<Path>>(mut self, path: P) -> Result<()> {
        let path = path.as_ref();

        let temp_file = NamedTempFile::new_in(path.parent().unwrap_or_else(|| Path::new(".")))?;

        if self.listfile {
            let mut content = String::new();
            for file in &self.pending_files {
                content.push_str(&file.archive_name);
                content.push_str("\r\n");
            }
            content.push_str(LISTFILE);
            content.push_str("\r\n");

            self.pending_files.push(PendingFile {
                archive_name: LISTFILE.to_string(),
                data: content.into_bytes(),
                options: FileOptions::compressed(),
            });
        }

        {
            let mut writer = BufWriter::new(temp_file.as_file());
            self.write_archive(&mut writer)?;
            writer.flush()?;
        }

        temp_file.persist(path).map_err(|e| Error::Io(e.error))?;
        log::debug!(
            "Wrote {} ({} files)",
            path.display(),
            self.pending_files.len()
        );

        Ok(())
    }

    fn write_archive<W: Write + Seek>(&self, writer: &mut W) -> Result<()> {
        let hash_table_size = self.calculate_hash_table_size();
        let sector_size = crate::calculate_sector_size(self.block_size);

        writer.seek(SeekFrom::Start(u64::from(HEADER_SIZE_V1)))?;

        let mut hash_table = HashTable::new(hash_table_size as usize)?;
        let mut block_table = BlockTable::new();

        for pending in &self.pending_files {
            let file_pos = writer.stream_position()? as u32;
            let (compressed_size, flags) = write_file(writer, pending, file_pos, sector_size)?;

            let block_index = block_table.push(BlockEntry {
                file_pos,
                compressed_size: compressed_size as u32,
                file_size: pending.data.len() as u32,
                flags: flags | BlockFlags::EXISTS,
            });
            hash_table.insert(&pending.archive_name, block_index)?;
        }

        let hash_table_offset = writer.stream_position()? as u32;
        hash_table.write(writer)?;

        let block_table_offset = writer.stream_position()? as u32;
        block_table.write(writer)?;

        let archive_size = writer.stream_position()? as u32;

        writer.seek(SeekFrom::Start(0))?;
        MpqHeader {
            header_size: HEADER_SIZE_V1,
            archive_size,
            format_version: 0,
            block_size: self.block_size,
            hash_table_offset,
            block_table_offset,
            hash_table_entries: hash_table_size,
            block_table_entries: block_table.size() as u32,
        }
        .write(writer)?;

        Ok(())
    }
}

impl Default for ArchiveBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn write_file<W: Write>(
    writer: &mut W,
    pending: &PendingFile,
    file_pos: u32,
    sector_size: usize,
) -> Result<(usize, BlockFlags)> {
    let PendingFile {
        archive_name,
        data,
        options,
    } = pending;

    let mut flags = BlockFlags::empty();
    if options.single_unit {
        flags |= BlockFlags::SINGLE_UNIT;
    }
    if options.compress {
        flags |= BlockFlags::COMPRESS;
    }
    if options.encrypt {
        flags |= BlockFlags::ENCRYPTED;
        if options.fix_key {
            flags |= BlockFlags::FIX_KEY;
        }
    }
    let key = file_key(archive_name, file_pos, data.len() as u32, options.fix_key);

    let unit_size = if options.single_unit {
        data.len().max(1)
    } else {
        sector_size
    };

    let mut sectors: Vec<Vec<u8>> = data
        .chunks(unit_size)
        .map(|chunk| {
            if options.compress {
                encode_sector(chunk)
            } else {
                Ok(chunk.to_vec())
            }
        })
        .collect::<Result<_>>()?;

    if options.encrypt {
        for (index, sector) in sectors.iter_mut().enumerate() {
            encrypt_bytes(sector, key.wrapping_add(index as u32));
        }
    }

    let mut written = 0;

    // Compressed files that are not single units carry a sector offset table
    if options.compress && !options.single_unit {
        let mut table = Vec::with_capacity((sectors.len() + 1) * 4);
        let mut offset = (sectors.len() + 1) * 4;
        table.write_u32::<LittleEndian>(offset as u32)?;
        for sector in &sectors {
            offset += sector.len();
            table.write_u32::<LittleEndian>(offset as u32)?;
        }
        if options.encrypt {
            encrypt_bytes(&mut table, key.wrapping_sub(1));
        }
        writer.write_all(&table)?;
        written += table.len();
    }

    for sector in &sectors {
        writer.write_all(sector)?;
        written += sector.len();
    }

    log::trace!("Stored {archive_name}: {} -> {written} bytes", data.len());
    Ok((written, flags))
}

/// zlib-compress a sector behind its mask byte, or keep it raw when that
/// would not save space
fn encode_sector(sector: &[u8]) -> Result<Vec<u8>> {
    let compressed = compress_zlib(sector)?;
    if compressed.len() + 1 < sector.len() {
        let mut out = Vec::with_capacity(compressed.len() + 1);
        out.push(compression_flags::ZLIB);
        out.extend_from_slice(&compressed);
        Ok(out)
    } else {
        Ok(sector.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_table_size() {
        let builder = ArchiveBuilder::new();
        assert_eq!(builder.calculate_hash_table_size(), 16);

        let mut builder = ArchiveBuilder::new().listfile(false);
        for i in 0..20 {
            builder = builder.add_file_data(vec![i], &format!("file{i}.txt"));
        }
        assert_eq!(builder.calculate_hash_table_size(), 64);
    }

    #[test]
    fn test_encode_sector_keeps_incompressible_data() {
        let data = [1u8, 2, 3];
        assert_eq!(encode_sector(&data).unwrap(), data);

        let data = vec![0u8; 1024];
        let encoded = encode_sector(&data).unwrap();
        assert_eq!(encoded[0], compression_flags::ZLIB);
        assert!(encoded.len() < data.len());
    }
}
