//! Whole-installation extraction against synthetic game directories

mod common;

use common::{chk, init_logging, hed_index, pud, string_table, tileset_tables};
use mopaq::ArchiveBuilder;
use pretty_assertions::assert_eq;
use rtsmaps::{
    ArchiveStore, Error, ExtractConfig, Game, GameFamily, GameProfile, TileSource, Tileset,
};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn build_mpq(path: &Path, files: Vec<(String, Vec<u8>)>) {
    let mut builder = ArchiveBuilder::new();
    for (name, data) in files {
        builder = builder.add_file_data(data, &name);
    }
    builder.build(path).unwrap();
}

fn warcraft2_install() -> TempDir {
    init_logging();
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();

    let mut files = tileset_tables(Tileset::Forest, 2);
    files.push((
        "Campaign\\Human\\Human01.pud".to_string(),
        pud(0, 2, 2, &[0, 1, 16, 17], Some("Hold Hadrath")),
    ));
    files.push((
        "Campaign\\Orc\\Orc03.pud".to_string(),
        pud(0, 1, 1, &[5], None),
    ));
    build_mpq(&root.join("War2Dat.mpq"), files);

    fs::create_dir_all(root.join("Maps").join("Custom")).unwrap();
    fs::write(root.join("Maps").join("duel.pud"), pud(0, 1, 1, &[0], None)).unwrap();
    fs::write(
        root.join("Maps").join("Custom").join("island.PUD"),
        pud(0, 1, 1, &[1], None),
    )
    .unwrap();
    fs::write(root.join("Maps").join("broken.pud"), b"\xff\xff\xff\xff\0\0\0\0").unwrap();
    fs::write(root.join("Maps").join("readme.txt"), b"not a map").unwrap();

    temp_dir
}

#[test]
fn test_warcraft2_extraction() {
    let install = warcraft2_install();
    let game = Game::open(install.path()).unwrap();
    assert_eq!(game.family(), GameFamily::Warcraft2);
    assert_eq!(game.store().len(), 1);

    let archived = game.extract_archive_scenarios();
    assert!(archived.skipped.is_empty());
    let names: Vec<&str> = archived.scenarios.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, vec!["Human01.pud", "Orc03.pud"]);

    let human01 = &archived.scenarios[0];
    assert_eq!(human01.description, "Hold Hadrath");
    assert_eq!(human01.tileset, Tileset::Forest);
    assert_eq!(
        human01.tiles.indices().collect::<Vec<_>>(),
        vec![0, 1, 16, 17]
    );
    let walkable = &human01.tiles.get(1, 0).unwrap().minitiles[0][0];
    assert!(!walkable.walkable, "Warcraft II tiles carry no flags");
    assert_eq!(walkable.graphics_id, 1);
    assert!(human01.tiles.get(0, 1).unwrap().is_doodad());

    let all = game.extract_all();
    assert_eq!(all.scenarios.len(), 4);
    assert_eq!(all.skipped.len(), 1);
    assert!(all.skipped[0].source.ends_with("broken.pud"));
    assert!(matches!(all.skipped[0].error, Error::ChunkCorrupt(_)));
}

#[test]
fn test_tiles_are_loaded_once() {
    let install = warcraft2_install();
    let game = Game::open(install.path()).unwrap();
    assert!(game.tile_cache().is_empty());

    let first = game.tiles(Tileset::Forest).unwrap();
    let second = game.tiles(Tileset::Forest).unwrap();
    assert!(std::sync::Arc::ptr_eq(&first, &second));
    assert_eq!(first.len(), 32);
    assert_eq!(game.tile_cache().len(), 1);

    assert!(matches!(
        game.tiles(Tileset::Winter),
        Err(Error::EntryNotFound(_))
    ));
}

#[test]
fn test_configured_map_directories() {
    let install = warcraft2_install();
    let extra = TempDir::new().unwrap();
    fs::write(extra.path().join("extra.pud"), pud(0, 1, 1, &[0], None)).unwrap();

    let config = ExtractConfig {
        game_directory: Some(install.path().to_path_buf()),
        map_directories: vec![extra.path().to_path_buf()],
        default_description: "Win.".to_string(),
        ..ExtractConfig::default()
    };
    let game = Game::from_config(config).unwrap();

    let extraction = game.extract_all();
    assert_eq!(extraction.scenarios.len(), 5);
    let extra = extraction
        .scenarios
        .iter()
        .find(|s| s.filename == "extra.pud")
        .unwrap();
    assert_eq!(extra.description, "Win.");
}

#[test]
fn test_starcraft_layers_and_loose_maps() {
    init_logging();
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();

    let mut files = tileset_tables(Tileset::Jungle, 2);
    files.push((
        "arr\\mapdata.tbl".to_string(),
        string_table(&["campaign\\terran\\tutorial", "campaign\\terran\\terran01"]),
    ));
    files.push((
        "campaign\\terran\\tutorial\\staredit\\scenario.chk".to_string(),
        chk(4, 2, 1, &[0, 17]),
    ));
    files.push((
        "campaign\\terran\\terran01\\staredit\\scenario.chk".to_string(),
        chk(4, 2, 1, &[0, 0]),
    ));
    build_mpq(&root.join("StarDat.mpq"), files);

    // the patch replaces terran01 with a corrupt copy
    build_mpq(
        &root.join("patch_rt.mpq"),
        vec![(
            "campaign\\terran\\terran01\\staredit\\scenario.chk".to_string(),
            b"OWNR\x02\0\0\0\x06\x01".to_vec(),
        )],
    );

    fs::create_dir(root.join("Maps")).unwrap();
    build_mpq(
        &root.join("Maps").join("(2)Ridge.scx"),
        vec![("staredit\\scenario.chk".to_string(), chk(4, 1, 1, &[16]))],
    );
    fs::write(root.join("Maps").join("raw.chk"), chk(12, 1, 1, &[1])).unwrap();
    fs::write(root.join("Maps").join("war.pud"), pud(0, 1, 1, &[0], None)).unwrap();

    let game = Game::open(root).unwrap();
    assert_eq!(game.profile(), &GameProfile::STARCRAFT);
    assert_eq!(game.store().len(), 2);

    let entries = game.scenario_entries().unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].filename, "tutorial");

    let archived = game.extract_archive_scenarios();
    assert_eq!(archived.scenarios.len(), 1);
    assert_eq!(archived.scenarios[0].filename, "tutorial");
    assert_eq!(archived.scenarios[0].name, "Jungle Run");
    assert_eq!(archived.skipped.len(), 1);
    assert!(matches!(
        archived.skipped[0].error,
        Error::UnsupportedEnumValue { value: 1, .. }
    ));

    let all = game.extract_all();
    let mut loose: Vec<&str> = all.scenarios[1..]
        .iter()
        .map(|s| s.filename.as_str())
        .collect();
    loose.sort();
    assert_eq!(loose, vec!["(2)Ridge.scx", "raw.chk"]);

    let ridge = all
        .scenarios
        .iter()
        .find(|s| s.filename == "(2)Ridge.scx")
        .unwrap();
    assert!(ridge.tiles.get(0, 0).unwrap().is_doodad());
    assert!(!ridge.tiles.get(0, 0).unwrap().buildable());
}

#[test]
fn test_corrupt_mpq_map_is_skipped() {
    init_logging();
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();
    build_mpq(&root.join("StarDat.mpq"), tileset_tables(Tileset::Jungle, 2));

    let maps = root.join("Maps");
    fs::create_dir(&maps).unwrap();
    let broken = maps.join("(2)Broken.scm");
    build_mpq(
        &broken,
        vec![("staredit\\scenario.chk".to_string(), chk(4, 1, 1, &[16]))],
    );
    // sector size shift far beyond anything a real archive uses
    let mut bytes = fs::read(&broken).unwrap();
    bytes[14..16].copy_from_slice(&55u16.to_le_bytes());
    fs::write(&broken, bytes).unwrap();
    build_mpq(
        &maps.join("(2)Ridge.scm"),
        vec![("staredit\\scenario.chk".to_string(), chk(4, 1, 1, &[16]))],
    );

    let game = Game::open(root).unwrap();
    let extraction = game.extract_directory(&maps);
    assert_eq!(extraction.scenarios.len(), 1);
    assert_eq!(extraction.scenarios[0].filename, "(2)Ridge.scm");
    assert_eq!(extraction.skipped.len(), 1);
    assert!(extraction.skipped[0].source.ends_with("(2)Broken.scm"));
    assert!(matches!(
        extraction.skipped[0].error,
        Error::Mpq(mopaq::Error::InvalidHeader(_))
    ));
}

#[test]
fn test_armageddon() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();

    let (index, data) = hed_index(&[
        ("map\\first.amm", &b"VER \x02\0\0\0\x11\0"[..]),
        ("gfx\\unit.spr", &b"sprite"[..]),
    ]);
    fs::write(root.join("Armageddon.MFP"), data).unwrap();
    fs::write(root.join("armageddon.hed"), index).unwrap();

    let game = Game::open(root).unwrap();
    assert_eq!(game.family(), GameFamily::Armageddon);
    assert_eq!(game.store().read("gfx\\unit.spr").unwrap(), b"sprite");

    let extraction = game.extract_all();
    assert!(extraction.scenarios.is_empty());
    assert_eq!(extraction.skipped.len(), 1);
    assert_eq!(extraction.skipped[0].source, "map\\first.amm");
    assert!(matches!(
        extraction.skipped[0].error,
        Error::MissingRequiredField { .. }
    ));
}

#[test]
fn test_unknown_directory() {
    let temp_dir = TempDir::new().unwrap();
    assert!(matches!(
        Game::open(temp_dir.path()),
        Err(Error::GameNotFound(_))
    ));
    assert!(matches!(
        Game::from_config(ExtractConfig::default()),
        Err(Error::GameNotFound(_))
    ));
}
