//! Archive reading tests against archives written by `ArchiveBuilder`

use mopaq::builder::FileOptions;
use mopaq::{Archive, ArchiveBuilder, Error};
use pretty_assertions::assert_eq;
use std::io::{Read, Seek, SeekFrom};
use tempfile::TempDir;

fn terrain_bytes(len: usize) -> Vec<u8> {
    (0..len).map(|i| ((i / 7) % 251) as u8).collect()
}

#[test]
fn test_read_uncompressed_files() {
    let temp_dir = TempDir::new().unwrap();
    let archive_path = temp_dir.path().join("plain.mpq");

    ArchiveBuilder::new()
        .add_file_data(b"Test content 1".to_vec(), "file1.txt")
        .add_file_data(b"Test content 2".to_vec(), "folder\\file2.txt")
        .build(&archive_path)
        .expect("Failed to create archive");

    let archive = Archive::open(&archive_path).expect("Failed to open archive");
    assert!(archive.contains("file1.txt"));
    assert!(archive.contains("FOLDER/FILE2.TXT"));
    assert!(!archive.contains("nonexistent.txt"));

    assert_eq!(archive.read_file("file1.txt").unwrap(), b"Test content 1");
    assert_eq!(
        archive.read_file("folder/file2.txt").unwrap(),
        b"Test content 2"
    );
}

#[test]
fn test_read_storage_variants() {
    let _ = env_logger::builder().is_test(true).try_init();
    let temp_dir = TempDir::new().unwrap();
    let archive_path = temp_dir.path().join("variants.mpq");
    let data = terrain_bytes(3000);

    ArchiveBuilder::new()
        .block_size(0)
        .add_file_data_with_options(data.clone(), "compressed.bin", FileOptions::compressed())
        .add_file_data_with_options(
            data.clone(),
            "encrypted.bin",
            FileOptions::default().encrypted(false),
        )
        .add_file_data_with_options(
            data.clone(),
            "staredit\\scenario.chk",
            FileOptions::compressed().encrypted(true),
        )
        .add_file_data_with_options(
            data.clone(),
            "single.bin",
            FileOptions::compressed().single_unit().encrypted(false),
        )
        .add_file_data_with_options(
            b"abc".to_vec(),
            "tiny.bin",
            FileOptions::compressed(),
        )
        .build(&archive_path)
        .unwrap();

    let archive = Archive::open(&archive_path).unwrap();
    assert_eq!(archive.header().sector_size(), 512);

    for name in [
        "compressed.bin",
        "encrypted.bin",
        "staredit\\scenario.chk",
        "single.bin",
    ] {
        assert_eq!(archive.read_file(name).unwrap(), data, "{name}");
    }
    assert_eq!(archive.read_file("tiny.bin").unwrap(), b"abc");
}

#[test]
fn test_open_file_stream() {
    let temp_dir = TempDir::new().unwrap();
    let archive_path = temp_dir.path().join("stream.mpq");

    ArchiveBuilder::new()
        .add_file_data_with_options(
            b"0123456789".repeat(100),
            "digits.txt",
            FileOptions::compressed(),
        )
        .build(&archive_path)
        .unwrap();

    let archive = Archive::open(&archive_path).unwrap();
    let mut file = archive.open_file("digits.txt").unwrap();
    assert_eq!(file.size(), 1000);
    assert_eq!(file.name(), "digits.txt");

    file.seek(SeekFrom::Start(995)).unwrap();
    let mut tail = String::new();
    file.read_to_string(&mut tail).unwrap();
    assert_eq!(tail, "56789");
}

#[test]
fn test_listfile() {
    let temp_dir = TempDir::new().unwrap();
    let archive_path = temp_dir.path().join("listed.mpq");

    ArchiveBuilder::new()
        .add_file_data(b"a".to_vec(), "maps\\one.scm")
        .add_file_data(b"b".to_vec(), "maps\\two.scm")
        .build(&archive_path)
        .unwrap();

    let archive = Archive::open(&archive_path).unwrap();
    assert_eq!(
        archive.list().unwrap(),
        vec!["maps\\one.scm", "maps\\two.scm", "(listfile)"]
    );

    let unlisted_path = temp_dir.path().join("unlisted.mpq");
    ArchiveBuilder::new()
        .listfile(false)
        .add_file_data(b"a".to_vec(), "a.txt")
        .build(&unlisted_path)
        .unwrap();
    assert!(Archive::open(&unlisted_path).unwrap().list().unwrap().is_empty());
}

#[test]
fn test_archive_behind_prefix() {
    let temp_dir = TempDir::new().unwrap();
    let archive_path = temp_dir.path().join("inner.mpq");

    ArchiveBuilder::new()
        .add_file_data_with_options(
            terrain_bytes(9000),
            "data.bin",
            FileOptions::compressed().encrypted(true),
        )
        .build(&archive_path)
        .unwrap();

    let mut wrapped = vec![0x90u8; 0x400];
    wrapped.extend(std::fs::read(&archive_path).unwrap());
    let wrapped_path = temp_dir.path().join("wrapped.exe");
    std::fs::write(&wrapped_path, wrapped).unwrap();

    let archive = Archive::open(&wrapped_path).unwrap();
    assert_eq!(archive.archive_offset(), 0x400);
    assert_eq!(archive.read_file("data.bin").unwrap(), terrain_bytes(9000));
}

#[test]
fn test_missing_file_and_bad_archive() {
    let temp_dir = TempDir::new().unwrap();
    let archive_path = temp_dir.path().join("empty.mpq");
    ArchiveBuilder::new().build(&archive_path).unwrap();

    let archive = Archive::open(&archive_path).unwrap();
    assert!(matches!(
        archive.read_file("nope.txt"),
        Err(Error::FileNotFound(name)) if name == "nope.txt"
    ));

    let junk_path = temp_dir.path().join("junk.mpq");
    std::fs::write(&junk_path, vec![0u8; 4096]).unwrap();
    assert!(matches!(
        Archive::open(&junk_path),
        Err(Error::InvalidHeader(_))
    ));
}

#[test]
fn test_implausible_sector_size_shift() {
    let temp_dir = TempDir::new().unwrap();
    let archive_path = temp_dir.path().join("(2)Broken.scm");
    ArchiveBuilder::new()
        .add_file_data_with_options(
            terrain_bytes(9000),
            "staredit\\scenario.chk",
            FileOptions::compressed(),
        )
        .build(&archive_path)
        .unwrap();

    let mut bytes = std::fs::read(&archive_path).unwrap();
    bytes[14..16].copy_from_slice(&55u16.to_le_bytes());
    std::fs::write(&archive_path, bytes).unwrap();

    assert!(matches!(
        Archive::open(&archive_path),
        Err(Error::InvalidHeader(_))
    ));
}

#[test]
fn test_block_past_end_of_archive() {
    use mopaq::crypto::{decrypt_bytes, encrypt_bytes, hash_string, hash_type};
    use mopaq::MpqHeader;

    let temp_dir = TempDir::new().unwrap();
    let archive_path = temp_dir.path().join("oversized.mpq");
    ArchiveBuilder::new()
        .add_file_data(b"Test content".to_vec(), "file.txt")
        .build(&archive_path)
        .unwrap();

    // claim every block holds u32::MAX stored bytes
    let mut bytes = std::fs::read(&archive_path).unwrap();
    let header = MpqHeader::read(&mut std::io::Cursor::new(&bytes)).unwrap();
    let start = header.block_table_offset as usize;
    let end = start + header.block_table_entries as usize * 16;
    let key = hash_string("(block table)", hash_type::FILE_KEY);
    let mut table = bytes[start..end].to_vec();
    decrypt_bytes(&mut table, key);
    for entry in table.chunks_exact_mut(16) {
        entry[4..8].copy_from_slice(&u32::MAX.to_le_bytes());
    }
    encrypt_bytes(&mut table, key);
    bytes[start..end].copy_from_slice(&table);
    std::fs::write(&archive_path, bytes).unwrap();

    let archive = Archive::open(&archive_path).unwrap();
    assert!(matches!(
        archive.read_file("file.txt"),
        Err(Error::CorruptedFile { .. })
    ));
}
