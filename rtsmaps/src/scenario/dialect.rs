//! Per-family chunk handlers and post-processing

use super::builder::{Forces, ScenarioBuilder};
use super::{DecodeOptions, PlayerType, ScenarioVersion, TileGrid, TileSource};
use crate::alliance::{resolve_alliances, MAX_FORCES, MAX_PLAYERS};
use crate::strings::{self, StringTable};
use crate::tileset::Tileset;
use crate::{Error, GameFamily, Result};
use byteorder::{ByteOrder, LittleEndian};
use std::fmt;

/// Applies one chunk payload to the scenario being built
pub type ChunkHandler = fn(&mut ScenarioBuilder, &[u8]) -> Result<()>;

/// `FORC` payload size: player forces, force name indices, force flags
const FORCES_SIZE: usize = 20;
const FORCE_FLAGS_OFFSET: usize = 16;

/// Chunk vocabulary of one game family
pub struct Dialect {
    /// Family whose files this dialect reads
    pub family: GameFamily,
    handlers: &'static [(&'static str, ChunkHandler)],
}

impl Dialect {
    /// StarCraft `.chk` scenarios
    pub const STARCRAFT: Dialect = Dialect {
        family: GameFamily::StarCraft,
        handlers: &[
            ("VER", handle_version),
            ("OWNR", handle_owners),
            ("FORC", handle_forces),
            ("ERA", handle_era),
            ("DIM", handle_dimensions),
            ("MTXM", handle_terrain),
            ("STR", handle_strings),
            ("SPRP", handle_properties),
        ],
    };

    /// Warcraft II `.pud` scenarios
    pub const WARCRAFT2: Dialect = Dialect {
        family: GameFamily::Warcraft2,
        handlers: &[
            ("VER", handle_version),
            ("OWNR", handle_owners),
            ("ERA", handle_era),
            ("ERAX", handle_extended_era),
            ("DIM", handle_dimensions),
            ("MTXM", handle_terrain),
            ("DESC", handle_description),
        ],
    };

    /// Armageddon `.amm` scenarios; their chunk layout is not known
    pub const ARMAGEDDON: Dialect = Dialect {
        family: GameFamily::Armageddon,
        handlers: &[],
    };

    /// The dialect of a family
    pub fn for_family(family: GameFamily) -> &'static Dialect {
        match family {
            GameFamily::StarCraft => &Self::STARCRAFT,
            GameFamily::Warcraft2 => &Self::WARCRAFT2,
            GameFamily::Armageddon => &Self::ARMAGEDDON,
        }
    }

    /// Handler registered for a trimmed tag
    pub fn handler(&self, tag: &str) -> Option<ChunkHandler> {
        self.handlers
            .iter()
            .find(|(name, _)| *name == tag)
            .map(|&(_, handler)| handler)
    }

    /// Tags this dialect decodes
    pub fn tags(&self) -> impl Iterator<Item = &'static str> {
        self.handlers.iter().map(|&(name, _)| name)
    }

    /// Derive the final fields once every chunk has been read
    pub(crate) fn post_process(
        &self,
        builder: &mut ScenarioBuilder,
        tiles: &dyn TileSource,
        options: &DecodeOptions,
    ) -> Result<()> {
        match self.family {
            GameFamily::StarCraft => {
                resolve_terrain(builder, tiles, options)?;
                resolve_properties(builder, options);
                if let (Some(types), Some(forces)) = (&builder.player_types, &builder.forces) {
                    builder.alliances = Some(alliances(types, forces));
                }
            }
            GameFamily::Warcraft2 => {
                if let Some(tileset) = builder.extended_tileset {
                    builder.tileset = Some(tileset);
                }
                resolve_terrain(builder, tiles, options)?;
                builder.name = Some(builder.filename.clone());
                builder.description = Some(
                    builder
                        .description_text
                        .clone()
                        .filter(|text| !text.is_empty())
                        .unwrap_or_else(|| options.default_description.clone()),
                );
                builder.strings = Some(StringTable::default());
                builder.alliances = Some(1);
            }
            GameFamily::Armageddon => {}
        }
        Ok(())
    }
}

impl fmt::Debug for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dialect")
            .field("family", &self.family)
            .field("tags", &self.tags().collect::<Vec<_>>())
            .finish()
    }
}

fn u16_at(data: &[u8], offset: usize, what: &str) -> Result<u16> {
    data.get(offset..offset + 2)
        .map(LittleEndian::read_u16)
        .ok_or_else(|| Error::chunk_corrupt(format!("{what} chunk too short: {} bytes", data.len())))
}

fn handle_version(builder: &mut ScenarioBuilder, data: &[u8]) -> Result<()> {
    builder.version = Some(ScenarioVersion::from_code(u16_at(data, 0, "VER")?)?);
    Ok(())
}

fn handle_owners(builder: &mut ScenarioBuilder, data: &[u8]) -> Result<()> {
    let types = data
        .iter()
        .take(MAX_PLAYERS)
        .map(|&raw| PlayerType::from_raw(builder.family, raw))
        .collect::<Result<Vec<_>>>()?;
    builder.player_types = Some(types);
    Ok(())
}

fn handle_forces(builder: &mut ScenarioBuilder, data: &[u8]) -> Result<()> {
    let mut padded = [0u8; FORCES_SIZE];
    let len = data.len().min(FORCES_SIZE);
    padded[..len].copy_from_slice(&data[..len]);

    let mut forces = Forces::default();
    forces.player_forces.copy_from_slice(&padded[..MAX_PLAYERS]);
    forces
        .force_flags
        .copy_from_slice(&padded[FORCE_FLAGS_OFFSET..FORCE_FLAGS_OFFSET + MAX_FORCES]);
    builder.forces = Some(forces);
    Ok(())
}

fn era_tileset(builder: &ScenarioBuilder, data: &[u8]) -> Result<Tileset> {
    let era = u16_at(data, 0, "ERA")?;
    Tileset::from_era(builder.family, era).ok_or_else(|| Error::unsupported("era", era))
}

fn handle_era(builder: &mut ScenarioBuilder, data: &[u8]) -> Result<()> {
    builder.tileset = Some(era_tileset(builder, data)?);
    Ok(())
}

fn handle_extended_era(builder: &mut ScenarioBuilder, data: &[u8]) -> Result<()> {
    builder.extended_tileset = Some(era_tileset(builder, data)?);
    Ok(())
}

fn handle_dimensions(builder: &mut ScenarioBuilder, data: &[u8]) -> Result<()> {
    let height = u16_at(data, 0, "DIM")?;
    let width = u16_at(data, 2, "DIM")?;
    builder.dimensions = Some((width, height));
    Ok(())
}

fn handle_terrain(builder: &mut ScenarioBuilder, data: &[u8]) -> Result<()> {
    builder
        .terrain
        .get_or_insert_with(Vec::new)
        .extend_from_slice(data);
    Ok(())
}

fn handle_strings(builder: &mut ScenarioBuilder, data: &[u8]) -> Result<()> {
    builder.strings = Some(StringTable::parse(data));
    Ok(())
}

fn handle_properties(builder: &mut ScenarioBuilder, data: &[u8]) -> Result<()> {
    builder.properties = Some((u16_at(data, 0, "SPRP")?, u16_at(data, 2, "SPRP")?));
    Ok(())
}

fn handle_description(builder: &mut ScenarioBuilder, data: &[u8]) -> Result<()> {
    builder.description_text = Some(strings::decode_at(data, 0));
    Ok(())
}

fn resolve_terrain(
    builder: &mut ScenarioBuilder,
    source: &dyn TileSource,
    options: &DecodeOptions,
) -> Result<()> {
    let (Some(tileset), Some((width, height)), Some(raw)) =
        (builder.tileset, builder.dimensions, builder.terrain.as_ref())
    else {
        return Ok(());
    };

    let max = builder.family().max_map_dimension();
    if width > max || height > max {
        return Err(Error::chunk_corrupt(format!(
            "map dimensions {width}x{height} exceed {max}x{max}"
        )));
    }

    let tiles = source.tiles(tileset)?;
    if tiles.is_empty() {
        return Err(Error::chunk_corrupt(format!("tileset {tileset} has no tiles")));
    }

    let expected = usize::from(width) * usize::from(height);
    let mut cells: Vec<u32> = raw
        .chunks_exact(2)
        .map(|pair| u32::from(LittleEndian::read_u16(pair)))
        .map(|index| if (index as usize) < tiles.len() { index } else { 0 })
        .collect();

    if cells.len() < expected {
        if !options.pad_short_terrain {
            return Err(Error::chunk_corrupt(format!(
                "terrain holds {} of {expected} tiles",
                cells.len()
            )));
        }
        log::warn!(
            "{}: terrain holds {} of {expected} tiles, padding",
            builder.filename,
            cells.len()
        );
        cells.resize(expected, 0);
    }
    cells.truncate(expected);

    builder.tiles = Some(TileGrid::new(width, height, tiles, cells)?);
    Ok(())
}

fn resolve_properties(builder: &mut ScenarioBuilder, options: &DecodeOptions) {
    let (name_index, description_index) = builder.properties.unwrap_or_default();
    let lookup = |index: u16| {
        builder
            .strings
            .as_ref()
            .and_then(|strings| strings.get_one_based(index))
            .map(str::to_string)
    };

    let name = lookup(name_index).unwrap_or_else(|| builder.filename.clone());
    let description =
        lookup(description_index).unwrap_or_else(|| options.default_description.clone());
    builder.name = Some(name);
    builder.description = Some(description);
}

fn alliances(types: &[PlayerType], forces: &Forces) -> u32 {
    let mut slots = [PlayerType::Inactive; MAX_PLAYERS];
    for (slot, &player_type) in slots.iter_mut().zip(types) {
        *slot = player_type;
    }
    resolve_alliances(&slots, &forces.player_forces, &forces.force_flags)
}
