//! Terrain tilesets
//!
//! A tileset is stored as a set of linked record tables sharing one archive
//! basename:
//!
//! - a group table (`cv5` / `cv4`) listing 16 megatile ids per tile group
//! - per-megatile flag (`vf4`, StarCraft only) and graphics index (`vx4`)
//!   tables, 16 minitile descriptors each
//! - minitile pixels (`vr4`), 64 palette indices each
//! - the palette (`wpe` / `ppl`)
//!
//! [`reconstruct`] joins them into [`Tile`] values; [`TileCache`] memoizes
//! the result per tileset.

mod build;
mod cache;
mod records;
mod tile;

pub use build::{load_tiles, reconstruct, TableSet};
pub use cache::TileCache;
pub use records::{Cv4, Cv5, GroupRecord, Ppl, Vf4, Vr4, Vx4, Wpe};
pub use tile::{GroupKind, Minitile, PixelBlock, Rgb, Tile, TileGroup};

use crate::GameFamily;
use std::fmt;

/// A terrain theme
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tileset {
    /// StarCraft Badlands
    Badlands,
    /// StarCraft Space Platform
    SpacePlatform,
    /// StarCraft Installation
    Installation,
    /// StarCraft Ash World
    Ashworld,
    /// StarCraft Jungle World
    Jungle,
    /// StarCraft Desert World
    Desert,
    /// StarCraft Ice World
    Arctic,
    /// StarCraft Twilight World
    Twilight,
    /// Warcraft II Forest
    Forest,
    /// Warcraft II Winter
    Winter,
    /// Warcraft II Wasteland
    Wasteland,
    /// Warcraft II Swamp
    Swamp,
}

const STARCRAFT_TILESETS: [Tileset; 8] = [
    Tileset::Badlands,
    Tileset::SpacePlatform,
    Tileset::Installation,
    Tileset::Ashworld,
    Tileset::Jungle,
    Tileset::Desert,
    Tileset::Arctic,
    Tileset::Twilight,
];

const WARCRAFT2_TILESETS: [Tileset; 4] = [
    Tileset::Forest,
    Tileset::Winter,
    Tileset::Wasteland,
    Tileset::Swamp,
];

/// File extensions of the tables making up a tileset
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TilesetLayout {
    /// Tile group table
    pub groups: &'static str,
    /// Minitile flags table, absent for Warcraft II
    pub flags: Option<&'static str>,
    /// Minitile graphics index table
    pub graphics: &'static str,
    /// Minitile pixel table
    pub minitiles: &'static str,
    /// Palette
    pub palette: &'static str,
}

impl TilesetLayout {
    /// StarCraft tables: cv5 / vf4 / vx4 / vr4 / wpe
    pub const STARCRAFT: TilesetLayout = TilesetLayout {
        groups: "cv5",
        flags: Some("vf4"),
        graphics: "vx4",
        minitiles: "vr4",
        palette: "wpe",
    };

    /// Warcraft II tables: cv4 / vx4 / vr4 / ppl
    pub const WARCRAFT2: TilesetLayout = TilesetLayout {
        groups: "cv4",
        flags: None,
        graphics: "vx4",
        minitiles: "vr4",
        palette: "ppl",
    };
}

impl Tileset {
    /// All tilesets of a family, in on-disk index order
    pub fn for_family(family: GameFamily) -> &'static [Tileset] {
        match family {
            GameFamily::StarCraft => &STARCRAFT_TILESETS,
            GameFamily::Warcraft2 => &WARCRAFT2_TILESETS,
            GameFamily::Armageddon => &[],
        }
    }

    /// Map a raw era value to a tileset, wrapping out-of-range values
    ///
    /// Returns `None` only for families without tilesets.
    pub fn from_era(family: GameFamily, era: u16) -> Option<Tileset> {
        let tilesets = Self::for_family(family);
        if tilesets.is_empty() {
            return None;
        }
        Some(tilesets[usize::from(era) % tilesets.len()])
    }

    /// Family this tileset belongs to
    pub fn family(self) -> GameFamily {
        match self {
            Tileset::Forest | Tileset::Winter | Tileset::Wasteland | Tileset::Swamp => {
                GameFamily::Warcraft2
            }
            _ => GameFamily::StarCraft,
        }
    }

    /// Position within the family
    pub fn index(self) -> u16 {
        Self::for_family(self.family())
            .iter()
            .position(|&t| t == self)
            .unwrap_or_default() as u16
    }

    /// Archive path of the tables, without extension
    pub fn basename(self) -> &'static str {
        match self {
            Tileset::Badlands => "tileset\\badlands",
            Tileset::SpacePlatform => "tileset\\platform",
            Tileset::Installation => "tileset\\install",
            Tileset::Ashworld => "tileset\\AshWorld",
            Tileset::Jungle => "tileset\\Jungle",
            Tileset::Desert => "tileset\\Desert",
            Tileset::Arctic => "tileset\\Ice",
            Tileset::Twilight => "tileset\\Twilight",
            Tileset::Forest => "Art\\bgs\\Forest\\forest",
            Tileset::Winter => "Art\\bgs\\Iceland\\iceland",
            Tileset::Wasteland => "Art\\bgs\\Swamp\\swamp",
            Tileset::Swamp => "Art\\bgs\\XSwamp\\xswamp",
        }
    }

    /// Table layout for this tileset's family
    pub fn layout(self) -> TilesetLayout {
        match self.family() {
            GameFamily::Warcraft2 => TilesetLayout::WARCRAFT2,
            _ => TilesetLayout::STARCRAFT,
        }
    }

    /// Archive path of one table
    pub fn table_path(self, extension: &str) -> String {
        format!("{}.{extension}", self.basename())
    }
}

impl fmt::Display for Tileset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Tileset::Badlands => "Badlands",
            Tileset::SpacePlatform => "Space Platform",
            Tileset::Installation => "Installation",
            Tileset::Ashworld => "Ash World",
            Tileset::Jungle => "Jungle",
            Tileset::Desert => "Desert",
            Tileset::Arctic => "Arctic",
            Tileset::Twilight => "Twilight",
            Tileset::Forest => "Forest",
            Tileset::Winter => "Winter",
            Tileset::Wasteland => "Wasteland",
            Tileset::Swamp => "Swamp",
        })
    }
}
