//! # rtsmaps - Scenario and Tileset Extraction
//!
//! Reads StarCraft and Warcraft II installations and turns the scenarios they
//! ship, plus any loose map files, into plain [`Scenario`] values with fully
//! reconstructed terrain.
//!
//! ## Features
//!
//! - Game detection and layered loading of MPQ data files
//! - The `.hed` / `.mfp` container used by Armageddon
//! - Chunk-stream scenario decoding for `.chk`, `.scm`, `.scx` and `.pud`
//! - Tile reconstruction from the `cv5`/`cv4`, `vf4`, `vx4`, `vr4` and
//!   palette tables, memoized per tileset
//! - Alliance counting from force assignments
//!
//! ## Example
//!
//! ```no_run
//! use rtsmaps::Game;
//!
//! # fn main() -> Result<(), rtsmaps::Error> {
//! let game = Game::open("/games/starcraft")?;
//! let extraction = game.extract_all();
//!
//! for scenario in &extraction.scenarios {
//!     println!("{scenario}");
//! }
//! for skipped in &extraction.skipped {
//!     eprintln!("{}: {}", skipped.source, skipped.error);
//! }
//! # Ok(())
//! # }
//! ```

#![warn(
    missing_docs,
    missing_debug_implementations,
    rust_2018_idioms,
    unreachable_pub
)]

pub mod alliance;
pub mod archive;
pub mod config;
pub mod error;
pub mod family;
pub mod game;
pub mod scenario;
pub mod strings;
pub mod table;
pub mod tileset;

// Re-export commonly used types
pub use alliance::resolve_alliances;
pub use archive::{ArchiveEntry, ArchiveStore, HedArchive, LayeredStore, MpqStore};
pub use config::ExtractConfig;
pub use error::{Error, Result};
pub use family::GameFamily;
pub use game::{detect, Extraction, Game, GameProfile, SkippedScenario};
pub use scenario::{
    DecodeOptions, Dialect, PlayerType, Scenario, ScenarioDecoder, ScenarioVersion, TileGrid,
    TileSource,
};
pub use strings::StringTable;
pub use tileset::{Tile, TileCache, Tileset};
