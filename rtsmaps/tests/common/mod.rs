//! Fixture builders shared by the integration tests
#![allow(dead_code)]

use rtsmaps::tileset::{reconstruct, GroupRecord, TableSet, Vf4, Vr4, Vx4};
use rtsmaps::{Result, Tile, TileSource, Tileset};
use std::sync::Arc;

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Encode one chunk
pub fn chunk(tag: &[u8; 4], payload: &[u8]) -> Vec<u8> {
    let mut data = tag.to_vec();
    data.extend_from_slice(&(payload.len() as i32).to_le_bytes());
    data.extend_from_slice(payload);
    data
}

pub fn u16s(values: &[u16]) -> Vec<u8> {
    values.iter().flat_map(|v| v.to_le_bytes()).collect()
}

/// `DIM` payload: height first
pub fn dim(width: u16, height: u16) -> Vec<u8> {
    u16s(&[height, width])
}

/// A string table blob
pub fn string_table(strings: &[&str]) -> Vec<u8> {
    let mut data = u16s(&[strings.len() as u16]);
    let mut offset = 2 + strings.len() * 2;
    for s in strings {
        data.extend_from_slice(&(offset as u16).to_le_bytes());
        offset += s.len() + 1;
    }
    for s in strings {
        data.extend_from_slice(s.as_bytes());
        data.push(0);
    }
    data
}

/// A Warcraft II scenario: 2 human and 3 computer players
pub fn pud(era: u16, width: u16, height: u16, cells: &[u16], description: Option<&str>) -> Vec<u8> {
    let mut data = chunk(b"TYPE", b"WAR2 MAP\0\0\x0a\xff");
    data.extend(chunk(b"VER ", &u16s(&[17])));
    if let Some(description) = description {
        let mut text = description.as_bytes().to_vec();
        text.resize(32, 0);
        data.extend(chunk(b"DESC", &text));
    }
    data.extend(chunk(
        b"OWNR",
        &[5, 5, 4, 4, 4, 3, 3, 3, 3, 3, 3, 3, 3, 3, 3, 0],
    ));
    data.extend(chunk(b"ERA ", &u16s(&[era])));
    data.extend(chunk(b"DIM ", &dim(width, height)));
    data.extend(chunk(b"UDTA", &[0; 24]));
    data.extend(chunk(b"MTXM", &u16s(cells)));
    data
}

/// A StarCraft scenario: one human and one computer on a shared allied
/// force, named through its string table
pub fn chk(era: u16, width: u16, height: u16, cells: &[u16]) -> Vec<u8> {
    let mut forces = vec![0u8; 20];
    forces[16] = 0b10;

    let half = cells.len() / 2;
    let mut data = chunk(b"VER ", &u16s(&[205]));
    data.extend(chunk(b"IVE2", &u16s(&[11])));
    data.extend(chunk(b"OWNR", &[6, 5, 0, 0, 0, 0, 0, 0, 7, 7, 7, 7]));
    data.extend(chunk(b"FORC", &forces));
    data.extend(chunk(b"ERA ", &u16s(&[era])));
    data.extend(chunk(b"DIM ", &dim(width, height)));
    data.extend(chunk(b"MTXM", &u16s(&cells[..half])));
    data.extend(chunk(b"STR ", &string_table(&["Jungle Run", "Hold the ridge."])));
    data.extend(chunk(b"MTXM", &u16s(&cells[half..])));
    data.extend(chunk(b"SPRP", &u16s(&[1, 2])));
    data
}

/// Tables for a tileset of `groups` groups; group 1 is a doodad
pub fn tileset_tables(tileset: Tileset, groups: usize) -> Vec<(String, Vec<u8>)> {
    let layout = tileset.layout();
    let starcraft = layout.flags.is_some();

    let mut group_table = Vec::new();
    for group in 0..groups {
        let megatiles: Vec<u16> = (0..16).map(|i| (i % 2) as u16).collect();
        let megagroup = if group == 1 { 1u16 } else { 0 };
        if starcraft {
            let mut record = u16s(&[megagroup]);
            record.extend_from_slice(&[0x80 * (group as u8 % 2), 0]);
            record.extend(u16s(&[3, 4, 5, 6]));
            record.extend_from_slice(&[0; 8]);
            record.extend(u16s(&megatiles));
            group_table.extend(record);
        } else {
            let mut record = u16s(&megatiles);
            record.extend_from_slice(&[megagroup as u8, 0, 0, 3, 4, 5, 6, 0, 0, 0]);
            group_table.extend(record);
        }
    }

    // megatile 0: minitile 0 everywhere; megatile 1: minitile 1, walkable
    let graphics = [u16s(&[0; 16]), u16s(&[2; 16])].concat();
    let flags = [u16s(&[0; 16]), u16s(&[1; 16])].concat();
    let minitiles = [vec![0u8; 64], vec![1u8; 64]].concat();
    let palette = if starcraft {
        vec![0, 0, 0, 0, 40, 120, 40, 0]
    } else {
        vec![0, 0, 0, 40, 120, 40]
    };

    let mut tables = vec![
        (tileset.table_path(layout.groups), group_table),
        (tileset.table_path(layout.graphics), graphics),
        (tileset.table_path(layout.minitiles), minitiles),
        (tileset.table_path(layout.palette), palette),
    ];
    if let Some(extension) = layout.flags {
        tables.push((tileset.table_path(extension), flags));
    }
    tables
}

/// One group of 16 identical, empty tiles
pub fn blank_tiles() -> Arc<[Tile]> {
    let tables = TableSet {
        groups: vec![GroupRecord {
            megagroup: 0,
            flags: 0,
            edges: [0; 4],
            megatiles: [0; 16],
        }],
        flags: Some(vec![Vf4([0; 16])]),
        graphics: vec![Vx4([0; 16])],
        minitiles: vec![Vr4([0; 64])],
        palette: vec![[0, 0, 0]],
    };
    reconstruct(&tables).unwrap().into()
}

/// Serves the same tiles for every tileset
#[derive(Debug)]
pub struct StaticTiles(pub Arc<[Tile]>);

impl TileSource for StaticTiles {
    fn tiles(&self, _tileset: Tileset) -> Result<Arc<[Tile]>> {
        Ok(Arc::clone(&self.0))
    }
}

/// A `.hed` index for entries laid out back to back
pub fn hed_index(entries: &[(&str, &[u8])]) -> (Vec<u8>, Vec<u8>) {
    let mut index = vec![0u8; 4];
    index.extend_from_slice(&(entries.len() as u32).to_le_bytes());
    let mut data = Vec::new();

    for (name, contents) in entries {
        let mut record = [0u8; 72];
        record[0..4].copy_from_slice(&(data.len() as u32).to_le_bytes());
        record[4..4 + name.len()].copy_from_slice(name.as_bytes());
        record[67] = name.len() as u8;
        record[68..72].copy_from_slice(&(contents.len() as u32).to_le_bytes());
        index.extend_from_slice(&record);
        data.extend_from_slice(contents);
    }

    (index, data)
}
