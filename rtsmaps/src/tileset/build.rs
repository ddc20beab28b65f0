//! Tile reconstruction from the linked tileset tables

use super::records::{Cv4, Cv5, GroupRecord, Ppl, Vf4, Vr4, Vx4, Wpe};
use super::tile::{GroupKind, Minitile, PixelBlock, Rgb, Tile, TileGroup};
use super::Tileset;
use crate::archive::ArchiveStore;
use crate::table::read_table;
use crate::{Error, GameFamily, Result};
use std::sync::Arc;

/// The decoded tables of one tileset
#[derive(Debug, Clone, Default)]
pub struct TableSet {
    /// Tile groups
    pub groups: Vec<GroupRecord>,
    /// Minitile flags per megatile; all-zero flags when absent
    pub flags: Option<Vec<Vf4>>,
    /// Minitile graphics descriptors per megatile
    pub graphics: Vec<Vx4>,
    /// Minitile palette indices
    pub minitiles: Vec<Vr4>,
    /// Palette
    pub palette: Vec<Rgb>,
}

/// Read and decode a tileset's tables from an archive store
pub fn load_tiles(tileset: Tileset, store: &dyn ArchiveStore) -> Result<Vec<Tile>> {
    let layout = tileset.layout();
    let read = |extension: &str| store.read(&tileset.table_path(extension));

    let tables = match tileset.family() {
        GameFamily::StarCraft => TableSet {
            groups: read_table::<Cv5>(&read(layout.groups)?)?
                .into_iter()
                .map(|Cv5(group)| group)
                .collect(),
            flags: match layout.flags {
                Some(extension) => Some(read_table::<Vf4>(&read(extension)?)?),
                None => None,
            },
            graphics: read_table(&read(layout.graphics)?)?,
            minitiles: read_table(&read(layout.minitiles)?)?,
            palette: read_table::<Wpe>(&read(layout.palette)?)?
                .into_iter()
                .map(|Wpe(rgb)| rgb)
                .collect(),
        },
        _ => TableSet {
            groups: read_table::<Cv4>(&read(layout.groups)?)?
                .into_iter()
                .map(|Cv4(group)| group)
                .collect(),
            flags: None,
            graphics: read_table(&read(layout.graphics)?)?,
            minitiles: read_table(&read(layout.minitiles)?)?,
            palette: read_table::<Ppl>(&read(layout.palette)?)?
                .into_iter()
                .map(|Ppl(rgb)| rgb)
                .collect(),
        },
    };

    let tiles = reconstruct(&tables)?;
    log::debug!(
        "Reconstructed {tileset}: {} groups, {} tiles",
        tables.groups.len(),
        tiles.len()
    );
    Ok(tiles)
}

/// Join decoded tables into tiles
///
/// Every group yields 16 tiles, so a tile's position in the result equals its
/// index. Any megatile, graphics or palette reference that falls outside its
/// table fails the whole tileset.
pub fn reconstruct(tables: &TableSet) -> Result<Vec<Tile>> {
    let blocks = resolve_pixels(&tables.minitiles, &tables.palette)?;
    let no_flags = Vf4([0; 16]);

    let mut tiles = Vec::with_capacity(tables.groups.len() * 16);
    for (group_id, record) in tables.groups.iter().enumerate() {
        let group = Arc::new(tile_group(group_id as u32, record));

        for (offset, &megatile) in record.megatiles.iter().enumerate() {
            let megatile = usize::from(megatile);
            let graphics = tables.graphics.get(megatile).ok_or_else(|| {
                Error::chunk_corrupt(format!(
                    "group {group_id} references megatile {megatile} of {}",
                    tables.graphics.len()
                ))
            })?;
            let flags = match &tables.flags {
                Some(flags) => flags.get(megatile).ok_or_else(|| {
                    Error::chunk_corrupt(format!(
                        "group {group_id} references megatile {megatile} without flags"
                    ))
                })?,
                None => &no_flags,
            };

            let minitiles = build_minitiles(flags, graphics, &blocks).ok_or_else(|| {
                Error::chunk_corrupt(format!(
                    "megatile {megatile} references a minitile beyond {}",
                    blocks.len()
                ))
            })?;

            tiles.push(Tile {
                index: group_id as u32 * 16 + offset as u32,
                group_offset: offset as u8,
                group: Arc::clone(&group),
                minitiles,
            });
        }
    }

    Ok(tiles)
}

fn tile_group(group_id: u32, record: &GroupRecord) -> TileGroup {
    let [left_edge, top_edge, right_edge, bottom_edge] = record.edges;
    let kind = if record.megagroup == 1 {
        GroupKind::Doodad {
            overlay_id: left_edge,
        }
    } else {
        GroupKind::Terrain {
            left_edge,
            top_edge,
            right_edge,
            bottom_edge,
        }
    };

    TileGroup {
        group_id,
        megagroup: record.megagroup,
        buildable: record.buildable(),
        kind,
    }
}

fn resolve_pixels(minitiles: &[Vr4], palette: &[Rgb]) -> Result<Vec<Arc<PixelBlock>>> {
    minitiles
        .iter()
        .enumerate()
        .map(|(id, Vr4(indices))| {
            let mut block = [[[0u8; 3]; 8]; 8];
            for (pixel, &color) in block.iter_mut().flatten().zip(indices.iter()) {
                *pixel = *palette.get(usize::from(color)).ok_or_else(|| {
                    Error::chunk_corrupt(format!(
                        "minitile {id} uses color {color} of {}",
                        palette.len()
                    ))
                })?;
            }
            Ok(Arc::new(block))
        })
        .collect()
}

fn build_minitiles(
    Vf4(flags): &Vf4,
    Vx4(graphics): &Vx4,
    blocks: &[Arc<PixelBlock>],
) -> Option<[[Minitile; 4]; 4]> {
    let minitile = |i: usize| Minitile::new(flags[i], graphics[i], blocks);

    Some([
        [minitile(0)?, minitile(1)?, minitile(2)?, minitile(3)?],
        [minitile(4)?, minitile(5)?, minitile(6)?, minitile(7)?],
        [minitile(8)?, minitile(9)?, minitile(10)?, minitile(11)?],
        [minitile(12)?, minitile(13)?, minitile(14)?, minitile(15)?],
    ])
}
