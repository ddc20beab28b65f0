//! Scenario decoding
//!
//! Scenario files are streams of tagged chunks. [`ScenarioDecoder`] walks the
//! stream with a [`ChunkReader`], hands each chunk its [`Dialect`] knows to a
//! handler that fills a [`ScenarioBuilder`], then runs the dialect's
//! post-processing and finalizes an immutable [`Scenario`].

mod builder;
mod chunk;
mod dialect;

pub use builder::{Forces, ScenarioBuilder};
pub use chunk::{ChunkHeader, ChunkReader, CHUNK_HEADER_SIZE};
pub use dialect::{ChunkHandler, Dialect};

use crate::config::{ExtractConfig, DEFAULT_DESCRIPTION};
use crate::tileset::{Tile, Tileset};
use crate::{Error, GameFamily, Result};
use std::fmt;
use std::io::{Cursor, Read, Seek};
use std::sync::Arc;

/// Scenario file format versions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScenarioVersion {
    /// Warcraft II
    Warcraft2,
    /// Warcraft II: Beyond the Dark Portal
    Warcraft2Expansion,
    /// StarCraft beta
    StarCraftBeta,
    /// StarCraft 1.00
    StarCraft100,
    /// StarCraft 1.04
    StarCraft104,
    /// Brood War beta
    BroodWarBeta,
    /// Brood War
    BroodWar,
}

impl ScenarioVersion {
    /// Decode a raw `VER` code
    pub fn from_code(code: u16) -> Result<Self> {
        Ok(match code {
            17 => ScenarioVersion::Warcraft2,
            19 => ScenarioVersion::Warcraft2Expansion,
            47 => ScenarioVersion::StarCraftBeta,
            59 => ScenarioVersion::StarCraft100,
            63 => ScenarioVersion::StarCraft104,
            75 => ScenarioVersion::BroodWarBeta,
            205 => ScenarioVersion::BroodWar,
            other => return Err(Error::unsupported("scenario version", other)),
        })
    }

    /// Raw `VER` code
    pub fn code(self) -> u16 {
        match self {
            ScenarioVersion::Warcraft2 => 17,
            ScenarioVersion::Warcraft2Expansion => 19,
            ScenarioVersion::StarCraftBeta => 47,
            ScenarioVersion::StarCraft100 => 59,
            ScenarioVersion::StarCraft104 => 63,
            ScenarioVersion::BroodWarBeta => 75,
            ScenarioVersion::BroodWar => 205,
        }
    }
}

/// Who controls a player slot
///
/// The raw values differ per family; [`PlayerType::from_raw`] holds both
/// tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlayerType {
    /// Slot not in use
    Inactive,
    /// Computer player that never acts
    PassiveComputer,
    /// Slot open but unusable
    Nobody,
    /// Rescuable units, passive
    RescuePassive,
    /// Rescuable units, active
    RescueActive,
    /// Unused slot
    Unused,
    /// Computer player
    Computer,
    /// Human player
    Human,
    /// Neutral units
    Neutral,
}

impl PlayerType {
    /// Decode a raw `OWNR` byte for a game family
    pub fn from_raw(family: GameFamily, value: u8) -> Result<Self> {
        let player_type = match (family, value) {
            (GameFamily::StarCraft, 0) => PlayerType::Inactive,
            (GameFamily::StarCraft, 3) => PlayerType::RescuePassive,
            (GameFamily::StarCraft, 4) => PlayerType::Unused,
            (GameFamily::StarCraft, 5) => PlayerType::Computer,
            (GameFamily::StarCraft, 6) => PlayerType::Human,
            (GameFamily::StarCraft, 7) => PlayerType::Neutral,
            (GameFamily::Warcraft2, 0..=2) => PlayerType::PassiveComputer,
            (GameFamily::Warcraft2, 3) => PlayerType::Nobody,
            (GameFamily::Warcraft2, 4) => PlayerType::Computer,
            (GameFamily::Warcraft2, 5) => PlayerType::Human,
            (GameFamily::Warcraft2, 6) => PlayerType::RescuePassive,
            (GameFamily::Warcraft2, 7) => PlayerType::RescueActive,
            _ => return Err(Error::unsupported("player type", value)),
        };
        Ok(player_type)
    }

    /// Whether the slot is played, by a human or the computer
    pub fn is_active(self) -> bool {
        matches!(self, PlayerType::Human | PlayerType::Computer)
    }
}

/// Scenario terrain: a `width` x `height` grid of tiles
#[derive(Debug, Clone)]
pub struct TileGrid {
    width: u16,
    height: u16,
    tiles: Arc<[Tile]>,
    cells: Vec<u32>,
}

impl TileGrid {
    /// Build a grid from row-major positions into `tiles`
    ///
    /// Fails if `cells` does not hold exactly `width * height` positions or
    /// any position is outside `tiles`.
    pub fn new(width: u16, height: u16, tiles: Arc<[Tile]>, cells: Vec<u32>) -> Result<Self> {
        if cells.len() != usize::from(width) * usize::from(height) {
            return Err(Error::chunk_corrupt(format!(
                "{} cells for a {width}x{height} grid",
                cells.len()
            )));
        }
        if let Some(&bad) = cells.iter().find(|&&cell| cell as usize >= tiles.len()) {
            return Err(Error::chunk_corrupt(format!(
                "cell refers to tile {bad} of {}",
                tiles.len()
            )));
        }

        Ok(Self {
            width,
            height,
            tiles,
            cells,
        })
    }

    /// Width in tiles
    pub fn width(&self) -> u16 {
        self.width
    }

    /// Height in tiles
    pub fn height(&self) -> u16 {
        self.height
    }

    /// Tile at column `x`, row `y`
    pub fn get(&self, x: u16, y: u16) -> Option<&Tile> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let cell = self.cells[usize::from(y) * usize::from(self.width) + usize::from(x)];
        self.tiles.get(cell as usize)
    }

    /// Iterate over rows, top to bottom
    pub fn rows(&self) -> impl Iterator<Item = impl Iterator<Item = &Tile>> {
        self.cells
            .chunks(usize::from(self.width).max(1))
            .take(usize::from(self.height))
            .map(move |row| row.iter().map(move |&cell| &self.tiles[cell as usize]))
    }

    /// Tile indices, row-major
    pub fn indices(&self) -> impl Iterator<Item = u32> + '_ {
        self.cells.iter().map(move |&cell| self.tiles[cell as usize].index)
    }
}

impl PartialEq for TileGrid {
    fn eq(&self, other: &Self) -> bool {
        self.width == other.width
            && self.height == other.height
            && self
                .cells
                .iter()
                .zip(&other.cells)
                .all(|(&a, &b)| self.tiles[a as usize] == other.tiles[b as usize])
    }
}

impl Eq for TileGrid {}

/// A decoded scenario
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scenario {
    /// File the scenario was read from
    pub filename: String,
    /// Display name
    pub name: String,
    /// Briefing / objectives text
    pub description: String,
    /// Format version, when the file declares one
    pub version: Option<ScenarioVersion>,
    /// Terrain theme
    pub tileset: Tileset,
    /// Controller of each player slot
    pub player_types: Vec<PlayerType>,
    /// Slots controlled by humans
    pub human_players: u32,
    /// Slots controlled by the computer
    pub computer_players: u32,
    /// Effective number of alliances
    pub alliances: u32,
    /// Terrain
    pub tiles: TileGrid,
    /// The scenario's string table
    pub strings: Vec<String>,
}

impl Scenario {
    /// Width in tiles
    pub fn width(&self) -> u16 {
        self.tiles.width()
    }

    /// Height in tiles
    pub fn height(&self) -> u16 {
        self.tiles.height()
    }
}

impl fmt::Display for Scenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({}, {}x{}, {} human / {} computer)",
            self.name,
            self.tileset,
            self.width(),
            self.height(),
            self.human_players,
            self.computer_players
        )
    }
}

/// Supplies reconstructed tiles for a tileset
pub trait TileSource {
    /// All tiles of `tileset`, indexed by tile index
    fn tiles(&self, tileset: Tileset) -> Result<Arc<[Tile]>>;
}

/// Settings affecting post-processing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodeOptions {
    /// Description used when a scenario names none
    pub default_description: String,
    /// Fill short terrain with tile 0 instead of failing
    pub pad_short_terrain: bool,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self {
            default_description: DEFAULT_DESCRIPTION.to_string(),
            pad_short_terrain: true,
        }
    }
}

impl From<&ExtractConfig> for DecodeOptions {
    fn from(config: &ExtractConfig) -> Self {
        Self {
            default_description: config.default_description.clone(),
            pad_short_terrain: config.pad_short_terrain,
        }
    }
}

/// Decodes scenario chunk streams of one dialect
pub struct ScenarioDecoder<'a> {
    dialect: &'static Dialect,
    tiles: &'a dyn TileSource,
    options: DecodeOptions,
}

impl<'a> ScenarioDecoder<'a> {
    /// Create a decoder resolving terrain through `tiles`
    pub fn new(dialect: &'static Dialect, tiles: &'a dyn TileSource) -> Self {
        Self {
            dialect,
            tiles,
            options: DecodeOptions::default(),
        }
    }

    /// Replace the post-processing options
    pub fn with_options(mut self, options: DecodeOptions) -> Self {
        self.options = options;
        self
    }

    /// The dialect in use
    pub fn dialect(&self) -> &'static Dialect {
        self.dialect
    }

    /// Decode a scenario from a seekable stream
    pub fn decode<R: Read + Seek>(&self, filename: &str, reader: R) -> Result<Scenario> {
        let mut chunks = ChunkReader::new(reader)?;
        let mut builder = ScenarioBuilder::new(self.dialect.family, filename);

        while let Some(header) = chunks.next_header()? {
            match self.dialect.handler(&header.tag) {
                Some(handler) => {
                    let payload = chunks.read_payload(&header)?;
                    log::trace!("{filename}: {} ({} bytes)", header.tag, payload.len());
                    handler(&mut builder, &payload)?;
                }
                None => chunks.skip(&header)?,
            }
        }

        self.dialect.post_process(&mut builder, self.tiles, &self.options)?;
        builder.finish()
    }

    /// Decode a scenario held in memory
    pub fn decode_bytes(&self, filename: &str, data: &[u8]) -> Result<Scenario> {
        self.decode(filename, Cursor::new(data))
    }
}

impl fmt::Debug for ScenarioDecoder<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScenarioDecoder")
            .field("dialect", &self.dialect.family)
            .field("options", &self.options)
            .finish()
    }
}
