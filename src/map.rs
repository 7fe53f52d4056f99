use std::io::Read;
use std::path::{Path, PathBuf};

use log::debug;
use macroquad::prelude::*;

use crate::error::{MapError, PayloadError};
use crate::gid::{resolve_gid, Gid, TileInfo};
use crate::layer::Layer;
use crate::loader::layer_data::decode_layer_data;
use crate::loader::resolve::resolve_tilesets;
use crate::loader::tmx_loader::parse_map_document;
use crate::object::ObjectGroup;
use crate::options::LoadOptions;
use crate::properties::Properties;
use crate::tileset::TileSet;

/// A decoded TMX map.
#[derive(Debug, Clone, Default)]
pub struct Map {
    pub version: String,
    pub tiled_version: String,
    /// Carried verbatim; tiles are laid out with orthogonal semantics.
    pub orientation: String,
    pub render_order: String,
    pub width: u32,
    pub height: u32,
    pub tile_width: u32,
    pub tile_height: u32,
    pub infinite: bool,
    pub background_color: Option<Color>,
    pub next_layer_id: u32,
    pub next_object_id: u32,
    pub properties: Properties,
    /// Ascending `first_gid` order. Documents listing tilesets out of order
    /// are sorted on parse, so [`TileInfo::tileset_index`] refers to this
    /// sorted order rather than to document order.
    pub tilesets: Vec<TileSet>,
    pub layers: Vec<Layer>,
    pub object_groups: Vec<ObjectGroup>,
}

impl Map {
    /// Load a map file and resolve everything it references.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, MapError> {
        Self::load_with_options(path, &LoadOptions::default())
    }

    /// Load a map file, following external references as far as `options` say.
    ///
    /// Tileset and image paths are taken relative to the map's directory.
    pub fn load_with_options<P: AsRef<Path>>(
        path: P,
        options: &LoadOptions,
    ) -> Result<Self, MapError> {
        let p = path.as_ref();
        let xml = std::fs::read_to_string(p).map_err(|source| MapError::Io {
            path: p.to_path_buf(),
            source,
        })?;

        let base_dir = p
            .parent()
            .filter(|d| !d.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("./"));

        let mut map = parse_map_document(&xml)?;
        map.resolve(&base_dir, options)?;
        Ok(map)
    }

    /// Structural decode from an XML string: layers are decoded and their
    /// GIDs resolved, but no external tileset or image is touched.
    pub fn decode_str(xml: &str) -> Result<Self, MapError> {
        let mut map = parse_map_document(xml)?;
        map.resolve(Path::new("./"), &LoadOptions::structural())?;
        Ok(map)
    }

    /// Structural decode from any reader. See [`Map::decode_str`].
    pub fn decode<R: Read>(mut reader: R) -> Result<Self, MapError> {
        let mut xml = String::new();
        reader
            .read_to_string(&mut xml)
            .map_err(|source| MapError::Io {
                path: PathBuf::from("<reader>"),
                source,
            })?;
        Self::decode_str(&xml)
    }

    /// Resolve tilesets in document order, then decode every layer and
    /// resolve each of its GIDs. The first failure aborts.
    pub fn resolve(&mut self, base_dir: &Path, options: &LoadOptions) -> Result<(), MapError> {
        resolve_tilesets(&mut self.tilesets, base_dir, options)?;

        for layer in &mut self.layers {
            let gids = decode_layer_data(&layer.name, layer.width, layer.height, &layer.data)?;
            let mut tiles = Vec::new();
            tiles
                .try_reserve_exact(gids.len())
                .map_err(|_| MapError::Payload {
                    layer: layer.name.clone(),
                    source: PayloadError::GridTooLarge {
                        width: layer.width,
                        height: layer.height,
                    },
                })?;
            for gid in gids {
                tiles.push(resolve_gid(&self.tilesets, gid)?);
            }
            layer.tiles = tiles;
            debug!("layer '{}': {} tiles decoded", layer.name, layer.tiles.len());
        }
        Ok(())
    }

    /// Resolve a raw GID (e.g. from a tile object) against this map.
    pub fn tile_info(&self, gid: Gid) -> Result<TileInfo, MapError> {
        resolve_gid(&self.tilesets, gid)
    }

    /// The tileset a resolved tile belongs to; `None` for the nil tile.
    #[inline]
    pub fn tileset_of(&self, info: &TileInfo) -> Option<&TileSet> {
        info.tileset_index().and_then(|i| self.tilesets.get(i))
    }

    pub fn layer_by_name(&self, name: &str) -> Option<&Layer> {
        self.layers.iter().find(|l| l.name == name)
    }

    pub fn object_group_by_name(&self, name: &str) -> Option<&ObjectGroup> {
        self.object_groups.iter().find(|g| g.name == name)
    }
}
