use std::path::PathBuf;

use anyhow::Context;
use macroquad_tmx::{LoadOptions, Map};
use serde::Serialize;

#[derive(Serialize)]
struct MapSummary {
    width: u32,
    height: u32,
    tile_width: u32,
    tile_height: u32,
    orientation: String,
    tilesets: Vec<TilesetSummary>,
    layers: Vec<LayerSummary>,
    object_groups: Vec<ObjectGroupSummary>,
}

#[derive(Serialize)]
struct TilesetSummary {
    name: String,
    first_gid: u32,
    source: String,
    tile_count: u32,
    image: Option<String>,
    image_loaded: bool,
    tile_images_loaded: usize,
}

#[derive(Serialize)]
struct LayerSummary {
    name: String,
    width: u32,
    height: u32,
    encoding: String,
    compression: String,
    tiles: usize,
    non_empty: usize,
    flipped: usize,
}

#[derive(Serialize)]
struct ObjectGroupSummary {
    name: String,
    objects: usize,
}

fn summarize(map: &Map) -> MapSummary {
    MapSummary {
        width: map.width,
        height: map.height,
        tile_width: map.tile_width,
        tile_height: map.tile_height,
        orientation: map.orientation.clone(),
        tilesets: map
            .tilesets
            .iter()
            .map(|ts| TilesetSummary {
                name: ts.name.clone(),
                first_gid: ts.first_gid,
                source: ts.source.clone(),
                tile_count: ts.tile_count,
                image: ts.image.as_ref().map(|i| i.source.clone()),
                image_loaded: ts.image.as_ref().is_some_and(|i| i.is_loaded()),
                tile_images_loaded: ts
                    .tiles
                    .iter()
                    .filter(|t| t.image.as_ref().is_some_and(|i| i.is_loaded()))
                    .count(),
            })
            .collect(),
        layers: map
            .layers
            .iter()
            .map(|l| LayerSummary {
                name: l.name.clone(),
                width: l.width,
                height: l.height,
                encoding: l.data.encoding.clone(),
                compression: l.data.compression.clone(),
                tiles: l.tiles.len(),
                non_empty: l.occupied().count(),
                flipped: l
                    .occupied()
                    .filter(|(_, _, t)| t.horizontal_flip() || t.vertical_flip() || t.diagonal_flip())
                    .count(),
            })
            .collect(),
        object_groups: map
            .object_groups
            .iter()
            .map(|g| ObjectGroupSummary {
                name: g.name.clone(),
                objects: g.objects.len(),
            })
            .collect(),
    }
}

fn usage() -> ! {
    eprintln!("Usage:");
    eprintln!("  tmx_dump <map.tmx> [--options <options.json>] [--structural]");
    eprintln!();
    eprintln!("Examples:");
    eprintln!("  tmx_dump assets/external/track.tmx");
    eprintln!("  tmx_dump assets/external/track.tmx --structural");
    std::process::exit(1);
}

fn run(args: &[String]) -> anyhow::Result<()> {
    let mut map_path: Option<PathBuf> = None;
    let mut options = LoadOptions::default();

    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--structural" => options = LoadOptions::structural(),
            "--options" => {
                let Some(path) = iter.next() else { usage() };
                let txt = std::fs::read_to_string(path)
                    .with_context(|| format!("Reading options file {}", path))?;
                options = LoadOptions::from_json_str(&txt)
                    .with_context(|| format!("Parsing options file {}", path))?;
            }
            _ if map_path.is_none() => map_path = Some(PathBuf::from(arg)),
            _ => usage(),
        }
    }
    let Some(map_path) = map_path else { usage() };

    let map = Map::load_with_options(&map_path, &options)
        .with_context(|| format!("Loading map {}", map_path.display()))?;

    let json = serde_json::to_string_pretty(&summarize(&map))?;
    println!("{json}");
    Ok(())
}

fn main() {
    env_logger::init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    if let Err(e) = run(&args) {
        eprintln!("tmx_dump failed: {:?}", e);
        std::process::exit(1);
    }
}
