//! Mutable scenario state filled while reading chunks

use super::{PlayerType, Scenario, ScenarioVersion, TileGrid};
use crate::alliance::{MAX_FORCES, MAX_PLAYERS};
use crate::strings::StringTable;
use crate::tileset::Tileset;
use crate::{Error, GameFamily, Result};

/// Player force assignments and force flags from a `FORC` chunk
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Forces {
    /// Force of each player slot
    pub player_forces: [u8; MAX_PLAYERS],
    /// Flags of each force
    pub force_flags: [u8; MAX_FORCES],
}

/// Accumulates decoded chunk data for one scenario
///
/// Chunk handlers fill the raw fields, post-processing derives the rest, and
/// [`ScenarioBuilder::finish`] checks that everything required is present.
#[derive(Debug, Clone)]
pub struct ScenarioBuilder {
    pub(crate) family: GameFamily,
    pub(crate) filename: String,

    pub(crate) version: Option<ScenarioVersion>,
    pub(crate) player_types: Option<Vec<PlayerType>>,
    pub(crate) forces: Option<Forces>,
    pub(crate) tileset: Option<Tileset>,
    pub(crate) extended_tileset: Option<Tileset>,
    /// Width, height
    pub(crate) dimensions: Option<(u16, u16)>,
    pub(crate) terrain: Option<Vec<u8>>,
    pub(crate) strings: Option<StringTable>,
    /// Name and description string indices
    pub(crate) properties: Option<(u16, u16)>,
    pub(crate) description_text: Option<String>,

    pub(crate) name: Option<String>,
    pub(crate) description: Option<String>,
    pub(crate) alliances: Option<u32>,
    pub(crate) tiles: Option<TileGrid>,
}

impl ScenarioBuilder {
    /// Start an empty scenario read from `filename`
    pub fn new(family: GameFamily, filename: &str) -> Self {
        Self {
            family,
            filename: filename.to_string(),
            version: None,
            player_types: None,
            forces: None,
            tileset: None,
            extended_tileset: None,
            dimensions: None,
            terrain: None,
            strings: None,
            properties: None,
            description_text: None,
            name: None,
            description: None,
            alliances: None,
            tiles: None,
        }
    }

    /// Game family whose raw values are being decoded
    pub fn family(&self) -> GameFamily {
        self.family
    }

    /// Source filename
    pub fn filename(&self) -> &str {
        &self.filename
    }

    /// Validate and freeze the scenario
    pub fn finish(self) -> Result<Scenario> {
        let player_types = self.player_types.ok_or(Error::missing("player_types"))?;
        let tileset = self.tileset.ok_or(Error::missing("tileset"))?;
        let tiles = self.tiles.ok_or(Error::missing("tiles"))?;
        let name = self.name.ok_or(Error::missing("name"))?;
        let description = self.description.ok_or(Error::missing("description"))?;
        let alliances = self.alliances.ok_or(Error::missing("alliances"))?;
        let strings = self.strings.ok_or(Error::missing("strings"))?;

        let count = |wanted: PlayerType| {
            player_types.iter().filter(|&&t| t == wanted).count() as u32
        };
        let human_players = count(PlayerType::Human);
        let computer_players = count(PlayerType::Computer);

        Ok(Scenario {
            filename: self.filename,
            name,
            description,
            version: self.version,
            tileset,
            player_types,
            human_players,
            computer_players,
            alliances,
            tiles,
            strings: strings.into_vec(),
        })
    }
}
