//! Game installations: detection, data loading and batch extraction

use crate::archive::{ArchiveStore, HedArchive, LayeredStore, MpqStore};
use crate::config::ExtractConfig;
use crate::scenario::{Dialect, Scenario, ScenarioDecoder, TileSource};
use crate::strings::StringTable;
use crate::tileset::{load_tiles, Tile, TileCache, Tileset};
use crate::{Error, GameFamily, Result};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use walkdir::WalkDir;

/// StarCraft's list of campaign map directories
pub const MAP_DATA_TABLE: &str = "arr\\mapdata.tbl";

/// Scenario path inside a StarCraft map directory or `.scm`/`.scx` archive
pub const SCENARIO_CHK: &str = "staredit\\scenario.chk";

/// Directory of loose maps inside a game installation
pub const MAPS_DIRECTORY: &str = "Maps";

/// Container format of a game's data files
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerKind {
    /// MPQ archives
    Mpq,
    /// `.hed` index + data file pairs
    Hed,
}

/// How to recognize and load one game
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameProfile {
    /// Game family
    pub family: GameFamily,
    /// Files that must all exist in the installation directory
    pub required_files: &'static [&'static str],
    /// Data files loaded in order when present; later files shadow earlier
    pub data_files: &'static [&'static str],
    /// Format of the data files
    pub container: ContainerKind,
    /// Loose scenario file extensions, lowercase
    pub scenario_extensions: &'static [&'static str],
}

impl GameProfile {
    /// Armageddon
    pub const ARMAGEDDON: GameProfile = GameProfile {
        family: GameFamily::Armageddon,
        required_files: &["Armageddon.MFP"],
        data_files: &["Armageddon.MFP"],
        container: ContainerKind::Hed,
        scenario_extensions: &["amm"],
    };

    /// Warcraft II: Battle.net Edition
    pub const WARCRAFT2: GameProfile = GameProfile {
        family: GameFamily::Warcraft2,
        required_files: &["War2Dat.mpq"],
        data_files: &["War2Dat.mpq"],
        container: ContainerKind::Mpq,
        scenario_extensions: &["pud"],
    };

    /// StarCraft, with Brood War and patches when installed
    pub const STARCRAFT: GameProfile = GameProfile {
        family: GameFamily::StarCraft,
        required_files: &["StarDat.mpq"],
        data_files: &[
            "Starcraft.mpq",
            "Broodwar.mpq",
            "StarDat.mpq",
            "BrooDat.mpq",
            "patch_rt.mpq",
            "patch_ed.mpq",
        ],
        container: ContainerKind::Mpq,
        scenario_extensions: &["chk", "scm", "scx"],
    };

    /// Whether every required file exists in `directory`
    pub fn matches(&self, directory: &Path) -> bool {
        self.required_files
            .iter()
            .all(|name| directory.join(name).is_file())
    }

    /// Whether `path` has one of this game's loose scenario extensions
    pub fn is_scenario_file(&self, path: &Path) -> bool {
        path.extension()
            .map(|ext| ext.to_string_lossy().to_lowercase())
            .is_some_and(|ext| self.scenario_extensions.contains(&ext.as_str()))
    }
}

/// Known games, in detection order
pub const PROFILES: [&GameProfile; 3] = [
    &GameProfile::ARMAGEDDON,
    &GameProfile::WARCRAFT2,
    &GameProfile::STARCRAFT,
];

/// The first profile whose required files exist in `directory`
pub fn detect(directory: &Path) -> Result<&'static GameProfile> {
    let profile = PROFILES
        .into_iter()
        .find(|profile| profile.matches(directory))
        .ok_or_else(|| Error::GameNotFound(directory.to_path_buf()))?;
    log::info!("Detected {} in {}", profile.family, directory.display());
    Ok(profile)
}

/// A scenario that could not be extracted
#[derive(Debug)]
pub struct SkippedScenario {
    /// Archive entry or file path
    pub source: String,
    /// Why it was skipped
    pub error: Error,
}

/// Outcome of a batch extraction
#[derive(Debug, Default)]
pub struct Extraction {
    /// Successfully decoded scenarios
    pub scenarios: Vec<Scenario>,
    /// Scenarios that failed to decode
    pub skipped: Vec<SkippedScenario>,
}

impl Extraction {
    fn record(&mut self, source: &str, result: Result<Scenario>) {
        match result {
            Ok(scenario) => {
                log::debug!("Extracted {source}: {scenario}");
                self.scenarios.push(scenario);
            }
            Err(error) => {
                log::warn!("Skipping {source}: {error}");
                self.skipped.push(SkippedScenario {
                    source: source.to_string(),
                    error,
                });
            }
        }
    }

    /// Append another extraction's results
    pub fn extend(&mut self, other: Extraction) {
        self.scenarios.extend(other.scenarios);
        self.skipped.extend(other.skipped);
    }

    /// Number of scenarios attempted
    pub fn attempted(&self) -> usize {
        self.scenarios.len() + self.skipped.len()
    }
}

/// A scenario stored inside the game's data files
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScenarioEntry {
    /// Entry path in the data files
    pub path: String,
    /// Filename reported on the scenario
    pub filename: String,
}

/// An opened game installation
pub struct Game {
    directory: PathBuf,
    profile: &'static GameProfile,
    store: LayeredStore,
    cache: Arc<TileCache>,
    config: ExtractConfig,
}

impl Game {
    /// Detect and open the game in `directory` with default settings
    pub fn open<P: AsRef<Path>>(directory: P) -> Result<Self> {
        Self::open_with_config(directory, ExtractConfig::default())
    }

    /// Detect and open the game in `directory`
    pub fn open_with_config<P: AsRef<Path>>(directory: P, config: ExtractConfig) -> Result<Self> {
        let directory = directory.as_ref();
        Self::with_profile(directory, detect(directory)?, config)
    }

    /// Open the game named by `config.game_directory`
    pub fn from_config(config: ExtractConfig) -> Result<Self> {
        let directory = config
            .game_directory
            .clone()
            .ok_or_else(|| Error::GameNotFound(PathBuf::new()))?;
        Self::open_with_config(directory, config)
    }

    /// Open `directory` as a specific game, skipping detection
    pub fn with_profile(
        directory: &Path,
        profile: &'static GameProfile,
        config: ExtractConfig,
    ) -> Result<Self> {
        if !profile.matches(directory) {
            return Err(Error::GameNotFound(directory.to_path_buf()));
        }

        let mut store = LayeredStore::new();
        for name in profile.data_files {
            let path = directory.join(name);
            if !path.is_file() {
                log::debug!("{} not present", path.display());
                continue;
            }
            let layer: Box<dyn ArchiveStore> = match profile.container {
                ContainerKind::Mpq => Box::new(MpqStore::open(&path)?),
                ContainerKind::Hed => Box::new(HedArchive::open(&path)?),
            };
            store.push(layer);
        }

        Ok(Self::from_store(directory, profile, store, config))
    }

    /// Wrap already opened data files
    pub fn from_store(
        directory: &Path,
        profile: &'static GameProfile,
        store: LayeredStore,
        config: ExtractConfig,
    ) -> Self {
        Self {
            directory: directory.to_path_buf(),
            profile,
            store,
            cache: Arc::new(TileCache::new()),
            config,
        }
    }

    /// Installation directory
    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Profile the game was opened with
    pub fn profile(&self) -> &'static GameProfile {
        self.profile
    }

    /// Game family
    pub fn family(&self) -> GameFamily {
        self.profile.family
    }

    /// The layered data files
    pub fn store(&self) -> &LayeredStore {
        &self.store
    }

    /// Active settings
    pub fn config(&self) -> &ExtractConfig {
        &self.config
    }

    /// The tile cache shared by all scenarios of this game
    pub fn tile_cache(&self) -> &Arc<TileCache> {
        &self.cache
    }

    /// A decoder for this game's scenario dialect
    pub fn decoder(&self) -> ScenarioDecoder<'_> {
        ScenarioDecoder::new(Dialect::for_family(self.family()), self)
            .with_options((&self.config).into())
    }

    /// Scenarios shipped inside the data files that are actually present
    pub fn scenario_entries(&self) -> Result<Vec<ScenarioEntry>> {
        let candidates: Vec<ScenarioEntry> = match self.family() {
            GameFamily::StarCraft => StringTable::parse(&self.store.read(MAP_DATA_TABLE)?)
                .iter()
                .filter(|dir| !dir.is_empty())
                .map(|dir| ScenarioEntry {
                    path: format!("{dir}\\{SCENARIO_CHK}"),
                    filename: basename(dir).to_string(),
                })
                .collect(),
            GameFamily::Warcraft2 => campaign_paths()
                .into_iter()
                .map(|path| ScenarioEntry {
                    filename: basename(&path).to_string(),
                    path,
                })
                .collect(),
            GameFamily::Armageddon => self
                .store
                .entry_names()
                .into_iter()
                .filter(|name| name.ends_with(".amm"))
                .map(|path| ScenarioEntry {
                    filename: basename(&path).to_string(),
                    path,
                })
                .collect(),
        };

        Ok(candidates
            .into_iter()
            .filter(|entry| {
                let present = self.store.contains(&entry.path);
                if !present {
                    log::debug!("{} not in data files", entry.path);
                }
                present
            })
            .collect())
    }

    /// Decode a scenario entry from the data files
    pub fn read_scenario(&self, entry: &ScenarioEntry) -> Result<Scenario> {
        let data = self.store.read(&entry.path)?;
        self.decoder().decode_bytes(&entry.filename, &data)
    }

    /// Decode every scenario shipped inside the data files
    pub fn extract_archive_scenarios(&self) -> Extraction {
        let mut extraction = Extraction::default();

        let entries = match self.scenario_entries() {
            Ok(entries) => entries,
            Err(error) => {
                extraction.record(MAP_DATA_TABLE, Err(error));
                return extraction;
            }
        };

        for entry in &entries {
            extraction.record(&entry.path, self.read_scenario(entry));
        }
        extraction
    }

    /// Decode a loose scenario file
    ///
    /// Returns `Ok(None)` for files whose extension this game does not read.
    /// StarCraft `.scm`/`.scx` files are MPQ archives holding the scenario.
    pub fn read_scenario_file(&self, path: &Path) -> Result<Option<Scenario>> {
        if !self.profile.is_scenario_file(path) {
            return Ok(None);
        }

        let filename = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        let extension = path
            .extension()
            .map(|ext| ext.to_string_lossy().to_lowercase())
            .unwrap_or_default();

        let data = match extension.as_str() {
            "scm" | "scx" => MpqStore::open(path)?.read(SCENARIO_CHK)?,
            _ => fs::read(path)?,
        };

        self.decoder().decode_bytes(&filename, &data).map(Some)
    }

    /// Decode every loose scenario under `directory`, recursively
    pub fn extract_directory(&self, directory: &Path) -> Extraction {
        let mut extraction = Extraction::default();
        if !directory.is_dir() {
            log::debug!("{} is not a directory", directory.display());
            return extraction;
        }

        for entry in WalkDir::new(directory).min_depth(1).sort_by_file_name() {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    let source = e
                        .path()
                        .map(|path| path.display().to_string())
                        .unwrap_or_else(|| directory.display().to_string());
                    extraction.record(&source, Err(Error::Io(e.into())));
                    continue;
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }

            let path = entry.path();
            if let Some(result) = self.read_scenario_file(path).transpose() {
                extraction.record(&path.display().to_string(), result);
            }
        }
        extraction
    }

    /// Decode shipped scenarios, the installation's `Maps` directory and
    /// every configured map directory
    pub fn extract_all(&self) -> Extraction {
        let mut extraction = self.extract_archive_scenarios();
        extraction.extend(self.extract_directory(&self.directory.join(MAPS_DIRECTORY)));
        for directory in &self.config.map_directories {
            extraction.extend(self.extract_directory(directory));
        }

        log::info!(
            "Extracted {} of {} scenarios",
            extraction.scenarios.len(),
            extraction.attempted()
        );
        extraction
    }
}

impl TileSource for Game {
    fn tiles(&self, tileset: Tileset) -> Result<Arc<[Tile]>> {
        self.cache
            .get_or_load(tileset, || load_tiles(tileset, &self.store))
    }
}

impl fmt::Debug for Game {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Game")
            .field("directory", &self.directory)
            .field("family", &self.profile.family)
            .field("layers", &self.store.len())
            .finish()
    }
}

/// Warcraft II campaign scenario paths
pub fn campaign_paths() -> Vec<String> {
    const CAMPAIGNS: [(&str, &str, u32); 4] = [
        ("Human", "Human", 14),
        ("Orc", "Orc", 14),
        ("XHuman", "2XHum", 12),
        ("XOrc", "2XOrc", 12),
    ];

    CAMPAIGNS
        .iter()
        .flat_map(|&(dir, prefix, count)| {
            (1..=count).map(move |i| format!("Campaign\\{dir}\\{prefix}{i:02}.pud"))
        })
        .collect()
}

fn basename(path: &str) -> &str {
    path.rsplit(|c| c == '\\' || c == '/').next().unwrap_or(path)
}
