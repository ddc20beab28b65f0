//! Game families

use std::fmt;

/// A family of games sharing data formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GameFamily {
    /// StarCraft and Brood War
    StarCraft,
    /// Warcraft II and Beyond the Dark Portal
    Warcraft2,
    /// Armageddon (`.hed` / `.mfp` data)
    Armageddon,
}

impl GameFamily {
    /// Largest width or height, in tiles, a map of this family can have
    pub fn max_map_dimension(self) -> u16 {
        match self {
            GameFamily::StarCraft | GameFamily::Armageddon => 256,
            GameFamily::Warcraft2 => 128,
        }
    }
}

impl fmt::Display for GameFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            GameFamily::StarCraft => "StarCraft",
            GameFamily::Warcraft2 => "Warcraft II",
            GameFamily::Armageddon => "Armageddon",
        })
    }
}
