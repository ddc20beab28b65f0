//! `.hed` index + `.mfp` data file archives
//!
//! The index starts with two little-endian `u32`s (an unknown value and the
//! entry count), followed by one 72-byte record per entry:
//!
//! | Offset | Size | Field              |
//! |--------|------|--------------------|
//! | 0      | 4    | data offset        |
//! | 4      | 63   | name (EUC-KR)      |
//! | 67     | 1    | name length        |
//! | 68     | 4    | data length        |

use super::{ArchiveEntry, ArchiveStore};
use crate::{Error, Result};
use byteorder::{ByteOrder, LittleEndian};
use encoding_rs::EUC_KR;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{BufReader, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

const INDEX_HEADER_SIZE: usize = 8;
const RECORD_SIZE: usize = 72;
const NAME_OFFSET: usize = 4;
const NAME_LENGTH_OFFSET: usize = 67;
const DATA_LENGTH_OFFSET: usize = 68;

/// Parse an index blob into its entries, in record order
pub fn parse_index(data: &[u8]) -> Result<Vec<ArchiveEntry>> {
    if data.len() < INDEX_HEADER_SIZE {
        return Err(Error::archive_corrupt(format!(
            "index is {} bytes, shorter than its header",
            data.len()
        )));
    }

    let count = LittleEndian::read_u32(&data[4..8]) as usize;
    let available = (data.len() - INDEX_HEADER_SIZE) / RECORD_SIZE;
    if count > available {
        return Err(Error::archive_corrupt(format!(
            "index declares {count} entries but only holds {available}"
        )));
    }
    let trailing = (data.len() - INDEX_HEADER_SIZE) % RECORD_SIZE;
    if count < available || trailing != 0 {
        log::warn!(
            "index declares {count} entries but holds {available} records and {trailing} stray bytes, reading {count}"
        );
    }

    (0..count)
        .map(|i| {
            let start = INDEX_HEADER_SIZE + RECORD_SIZE * i;
            parse_record(i, &data[start..start + RECORD_SIZE])
        })
        .collect()
}

fn parse_record(index: usize, record: &[u8]) -> Result<ArchiveEntry> {
    let name_length = usize::from(record[NAME_LENGTH_OFFSET]);
    if NAME_OFFSET + name_length > NAME_LENGTH_OFFSET {
        return Err(Error::archive_corrupt(format!(
            "record {index}: name length {name_length} overruns the record"
        )));
    }

    let raw_name = &record[NAME_OFFSET..NAME_OFFSET + name_length];
    let (name, had_errors) = EUC_KR.decode_without_bom_handling(raw_name);
    if had_errors {
        return Err(Error::archive_corrupt(format!(
            "record {index}: name is not valid EUC-KR"
        )));
    }

    Ok(ArchiveEntry {
        name: name.into_owned(),
        offset: LittleEndian::read_u32(&record[0..4]),
        length: LittleEndian::read_u32(&record[DATA_LENGTH_OFFSET..DATA_LENGTH_OFFSET + 4]),
    })
}

/// Index path for a data file: same stem, `.hed` extension
///
/// An existing sibling with the exact stem is preferred; otherwise the
/// lowercased name is used, as the games ship it.
pub fn index_path(data_path: &Path) -> PathBuf {
    let exact = data_path.with_extension("hed");
    if exact.exists() {
        return exact;
    }

    let file_name = data_path
        .file_name()
        .map(|name| name.to_string_lossy().to_lowercase())
        .unwrap_or_default();
    data_path
        .with_file_name(file_name)
        .with_extension("hed")
}

/// An opened `.hed` / `.mfp` pair
#[derive(Debug)]
pub struct HedArchive {
    path: PathBuf,
    entries: HashMap<String, ArchiveEntry>,
    data: Mutex<BufReader<File>>,
    data_len: u64,
}

impl HedArchive {
    /// Open a data file, reading the index that sits next to it
    pub fn open<P: AsRef<Path>>(data_path: P) -> Result<Self> {
        let data_path = data_path.as_ref();
        Self::open_with_index(data_path, &index_path(data_path))
    }

    /// Open a data file with an explicit index file
    pub fn open_with_index(data_path: &Path, index_path: &Path) -> Result<Self> {
        let index = fs::read(index_path).map_err(|e| {
            Error::archive_corrupt(format!(
                "cannot read index {}: {e}",
                index_path.display()
            ))
        })?;

        let mut entries = HashMap::new();
        for entry in parse_index(&index)? {
            if let Some(previous) = entries.insert(entry.name.clone(), entry) {
                log::debug!("Index entry {} redefined", previous.name);
            }
        }

        let data = File::open(data_path)?;
        let data_len = data.metadata()?.len();
        log::info!(
            "Loaded {} ({} entries)",
            data_path.display(),
            entries.len()
        );

        Ok(Self {
            path: data_path.to_path_buf(),
            entries,
            data: Mutex::new(BufReader::new(data)),
            data_len,
        })
    }

    /// Path of the data file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Look up an entry by name
    pub fn entry(&self, name: &str) -> Option<&ArchiveEntry> {
        self.entries.get(name)
    }

    /// Number of distinct entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the index has no entries
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl ArchiveStore for HedArchive {
    fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    fn read(&self, name: &str) -> Result<Vec<u8>> {
        let entry = self
            .entries
            .get(name)
            .ok_or_else(|| Error::EntryNotFound(name.to_string()))?;

        let end = u64::from(entry.offset) + u64::from(entry.length);
        if end > self.data_len {
            return Err(Error::archive_corrupt(format!(
                "{name}: {} bytes at 0x{:X} run past the end of the data file ({} bytes)",
                entry.length, entry.offset, self.data_len
            )));
        }

        let mut data = self.data.lock();
        data.seek(SeekFrom::Start(u64::from(entry.offset)))?;

        let mut buffer = vec![0u8; entry.length as usize];
        data.read_exact(&mut buffer).map_err(|e| {
            Error::archive_corrupt(format!(
                "{name}: {} bytes at 0x{:X} not available: {e}",
                entry.length, entry.offset
            ))
        })?;

        Ok(buffer)
    }

    fn entry_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.entries.keys().cloned().collect();
        names.sort();
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(name: &[u8], offset: u32, length: u32) -> [u8; RECORD_SIZE] {
        let mut record = [0u8; RECORD_SIZE];
        record[0..4].copy_from_slice(&offset.to_le_bytes());
        record[NAME_OFFSET..NAME_OFFSET + name.len()].copy_from_slice(name);
        record[NAME_LENGTH_OFFSET] = name.len() as u8;
        record[DATA_LENGTH_OFFSET..].copy_from_slice(&length.to_le_bytes());
        record
    }

    fn index(records: &[[u8; RECORD_SIZE]]) -> Vec<u8> {
        let mut data = Vec::new();
        data.extend_from_slice(&0u32.to_le_bytes());
        data.extend_from_slice(&(records.len() as u32).to_le_bytes());
        for record in records {
            data.extend_from_slice(record);
        }
        data
    }

    #[test]
    fn test_parse_index() {
        let data = index(&[record(b"map01.amm", 0, 10), record(b"map02.amm", 10, 20)]);
        let entries = parse_index(&data).unwrap();

        assert_eq!(entries.len(), 2);
        assert_eq!(
            entries[1],
            ArchiveEntry {
                name: "map02.amm".to_string(),
                offset: 10,
                length: 20,
            }
        );
    }

    #[test]
    fn test_korean_names() {
        let (encoded, _, _) = EUC_KR.encode("캠페인.amm");
        let data = index(&[record(&encoded, 0, 1)]);
        assert_eq!(parse_index(&data).unwrap()[0].name, "캠페인.amm");
    }

    #[test]
    fn test_count_exceeds_blob() {
        let mut data = index(&[record(b"a", 0, 1)]);
        data[4..8].copy_from_slice(&2u32.to_le_bytes());
        assert!(matches!(parse_index(&data), Err(Error::ArchiveCorrupt(_))));
        assert!(matches!(parse_index(&[0u8; 4]), Err(Error::ArchiveCorrupt(_))));
    }

    #[test]
    fn test_records_beyond_count_are_ignored() {
        let mut data = index(&[record(b"a", 0, 1), record(b"b", 1, 1)]);
        data[4..8].copy_from_slice(&1u32.to_le_bytes());
        data.extend_from_slice(&[0xAB; 5]);

        let entries = parse_index(&data).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].name, "a");
    }

    #[test]
    fn test_bad_names() {
        let mut bad_length = record(b"a", 0, 1);
        bad_length[NAME_LENGTH_OFFSET] = 64;
        assert!(parse_index(&index(&[bad_length])).is_err());

        let bad_encoding = record(&[0xFF, 0xFF], 0, 1);
        assert!(parse_index(&index(&[bad_encoding])).is_err());
    }

    #[test]
    fn test_index_path() {
        let path = index_path(Path::new("/nonexistent/Armageddon.MFP"));
        assert_eq!(path, PathBuf::from("/nonexistent/armageddon.hed"));
    }
}
